//! Test data fixtures for the mock server.
//!
//! Provides factory functions for records in the shape the PMS API sends
//! them, so the client's schema mapping is exercised end to end.

use serde_json::{json, Value};

use super::state::{MockState, ReportFile};

/// Client ID accepted by the default scenario.
pub const TEST_CLIENT_ID: &str = "test-client";

/// Client secret accepted by the default scenario.
pub const TEST_CLIENT_SECRET: &str = "test-secret";

/// Collection of fixture factories for test data.
pub struct Fixtures;

impl Fixtures {
    // =========================================================================
    // Platform Fixtures
    // =========================================================================

    /// Create a platform with no users or emails.
    pub fn minimal_platform(id: &str, name: &str) -> Value {
        json!({
            "_id": id,
            "platform_name": name,
            "status": "enable",
            "userid_list": [],
            "email_list": []
        })
    }

    /// Create a platform with one administrator and one notification email.
    pub fn platform_with_members(id: &str, name: &str, admin: &str, email: &str) -> Value {
        let mut platform = Self::minimal_platform(id, name);
        platform["userid_list"] = json!([
            {"userid": admin, "jointime": "2023-05-01T08:00:00.000Z", "permission": "administrator"}
        ]);
        platform["email_list"] = json!([
            {"name": admin, "email": email, "group_list": []}
        ]);
        platform
    }

    // =========================================================================
    // Group Fixtures
    // =========================================================================

    /// Create an active group with its schedule switched off.
    pub fn minimal_group(id: &str, name: &str) -> Value {
        json!({
            "_id": id,
            "group_name": name,
            "district": "tw",
            "status": "active",
            "crontab": "false",
            "crontab_setting": {"min": "", "hour": "", "day": "", "month": "", "week": ""},
            "sample_count": 0,
            "export_count": 0
        })
    }

    /// Create a group that runs daily at the given hour.
    pub fn scheduled_group(id: &str, name: &str, hour: u32, samples: u64) -> Value {
        let mut group = Self::minimal_group(id, name);
        group["crontab"] = json!("true");
        group["crontab_setting"] = json!({
            "min": "0",
            "hour": hour.to_string(),
            "day": "*",
            "month": "*",
            "week": "*"
        });
        group["sample_count"] = json!(samples);
        group
    }

    // =========================================================================
    // Report Fixtures
    // =========================================================================

    /// Create a report history record.
    pub fn report(id: &str, group_id: &str, group_name: &str, created: &str) -> Value {
        json!({
            "_id": id,
            "createtime": created,
            "pms_groupid": group_id,
            "group_name": group_name,
            "district": "tw",
            "sample_size": 2
        })
    }

    /// Create the downloadable content of a report.
    pub fn report_file(file_stem: &str) -> ReportFile {
        ReportFile {
            file_stem: file_stem.to_string(),
            csv: "sku,price\nA-1,100\nA-2,250\n".to_string(),
            json: json!([
                {"sku": "A-1", "price": 100},
                {"sku": "A-2", "price": 250}
            ]),
            // Zip local file header magic, enough to stand in for an xlsx payload.
            excel: vec![0x50, 0x4b, 0x03, 0x04, 0x14, 0x00, 0x00, 0x00],
        }
    }

    // =========================================================================
    // Scenario Builders
    // =========================================================================

    /// Create a default scenario: one platform with two groups and three reports.
    pub fn default_scenario() -> MockState {
        MockState::new()
            .with_client(TEST_CLIENT_ID, TEST_CLIENT_SECRET)
            .with_platform(Self::platform_with_members(
                "plat-1",
                "Main Store",
                "admin-1",
                "ops@example.com",
            ))
            .with_platform(Self::minimal_platform("plat-2", "Outlet"))
            .with_group("plat-1", Self::scheduled_group("grp-1", "Phones", 9, 120))
            .with_group("plat-1", Self::minimal_group("grp-2", "Laptops"))
            .with_report(
                "plat-1",
                Self::report("rep-1", "grp-1", "Phones", "2024-01-05T09:00:00.000Z"),
                Self::report_file("phones-2024-01-05"),
            )
            .with_report(
                "plat-1",
                Self::report("rep-2", "grp-2", "Laptops", "2024-01-06T09:00:00.000Z"),
                Self::report_file("laptops-2024-01-06"),
            )
            .with_report(
                "plat-1",
                Self::report("rep-3", "grp-1", "Phones", "2024-01-07T09:00:00.000Z"),
                Self::report_file("phones 2024-01-07"),
            )
    }
}
