//! Execution tests for the platform, group, and report list endpoints.
//!
//! Uses wiremock to mock the PMS API and check the wire-to-entity mapping.

use biggo_pms::{
    get_groups, get_platforms, get_reports, GroupStatus, Permission, PlatformStatus, PmsClient,
    ReportListOptions, SortOrder,
};
use chrono::{TimeZone, Utc};
use serde_json::json;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn setup() -> (MockServer, PmsClient) {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .mount(&mock_server)
        .await;

    let client = PmsClient::builder("id", "secret")
        .api_url(format!("{}/api/v1/pms", mock_server.uri()))
        .auth_url(format!("{}/auth/v1/token", mock_server.uri()))
        .build()
        .unwrap();

    (mock_server, client)
}

#[tokio::test]
async fn test_get_platforms_maps_records() {
    let (mock_server, client) = setup().await;

    let response = json!({
        "result": true,
        "data": [
            {
                "_id": "p1",
                "platform_name": "Main Store",
                "status": "enable",
                "userid_list": [
                    {"userid": "u1", "jointime": "2023-05-01", "permission": "administrator"},
                    {"userid": "u2", "jointime": "2023-06-01", "permission": "standard"}
                ],
                "email_list": [
                    {"name": "Ops", "email": "ops@example.com", "group_list": ["g1"]}
                ]
            },
            {
                "_id": "p2",
                "platform_name": "Outlet",
                "status": "disable",
                "userid_list": [],
                "email_list": []
            }
        ]
    });

    Mock::given(method("GET"))
        .and(path("/api/v1/pms/platform"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&response))
        .expect(1)
        .mount(&mock_server)
        .await;

    let platforms = get_platforms(&client).await.unwrap();

    assert_eq!(platforms.len(), 2);
    assert_eq!(platforms[0].id, "p1");
    assert_eq!(platforms[0].name, "Main Store");
    assert_eq!(platforms[0].status, PlatformStatus::Enabled);
    assert_eq!(platforms[0].user_list[1].permission, Permission::Standard);
    assert_eq!(platforms[0].email_list[0].group_list, vec!["g1"]);
    assert_eq!(platforms[1].status, PlatformStatus::Disabled);
}

#[tokio::test]
async fn test_get_groups_sends_platform_id() {
    let (mock_server, client) = setup().await;

    let response = json!({
        "result": true,
        "data": [{
            "_id": "g1",
            "group_name": "Phones",
            "district": "tw",
            "status": "active",
            "crontab": "true",
            "crontab_setting": {"min": "0", "hour": "9", "day": "*", "month": "*", "week": "1"},
            "sample_count": "120",
            "export_count": 4
        }]
    });

    Mock::given(method("GET"))
        .and(path("/api/v1/pms/group"))
        .and(query_param("pms_platformid", "p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&response))
        .expect(1)
        .mount(&mock_server)
        .await;

    let groups = get_groups(&client, "p1").await.unwrap();

    assert_eq!(groups.len(), 1);
    let group = &groups[0];
    assert_eq!(group.name, "Phones");
    assert!(group.is_schedule_on);
    assert_eq!(group.schedule.to_string(), "0 9 * * 1");
    assert_eq!(group.status, GroupStatus::Active);
    assert_eq!(group.sample_count, 120);
    assert_eq!(group.export_count, 4);
}

#[tokio::test]
async fn test_get_reports_defaults_omit_filters() {
    let (mock_server, client) = setup().await;

    let response = json!({
        "result": true,
        "data": [{
            "_id": "r1",
            "createtime": "2024-01-05T09:00:00.000Z",
            "pms_groupid": "g1",
            "group_name": "Phones",
            "district": "tw",
            "sample_size": 2
        }]
    });

    Mock::given(method("GET"))
        .and(path("/api/v1/pms/export"))
        .and(query_param("pms_platformid", "p1"))
        .and(query_param("size", "5000"))
        .and(query_param("in_sort", "desc"))
        .and(query_param("in_form", "0"))
        .and(query_param_is_missing("in_opt[pms_groupid]"))
        .and(query_param_is_missing("in_opt[start]"))
        .and(query_param_is_missing("in_opt[end]"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&response))
        .expect(1)
        .mount(&mock_server)
        .await;

    let reports = get_reports(&client, "p1", ReportListOptions::default())
        .await
        .unwrap();

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].id, "r1");
    assert_eq!(reports[0].group_id, "g1");
    assert_eq!(reports[0].create_time, "2024-01-05T09:00:00.000Z");
}

#[tokio::test]
async fn test_get_reports_with_filters() {
    let (mock_server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/pms/export"))
        .and(query_param("size", "10"))
        .and(query_param("in_sort", "asc"))
        .and(query_param("in_form", "20"))
        .and(query_param("in_opt[pms_groupid]", "g1,g2"))
        .and(query_param("in_opt[start]", "2024-1-5"))
        .and(query_param("in_opt[end]", "2024-12-31"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "result": true, "data": [] })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let options = ReportListOptions {
        size: Some(10),
        start_index: Some(20),
        sort: Some(SortOrder::Asc),
        group_ids: vec!["g1".to_string(), "g2".to_string()],
        start_date: Some(Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap()),
        end_date: Some(Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 0).unwrap()),
    };

    let reports = get_reports(&client, "p1", options).await.unwrap();
    assert!(reports.is_empty());
}

#[tokio::test]
async fn test_get_reports_end_date_only() {
    let (mock_server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/pms/export"))
        .and(query_param("in_opt[end]", "2024-3-1"))
        .and(query_param_is_missing("in_opt[start]"))
        .and(query_param_is_missing("in_opt[pms_groupid]"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "result": true, "data": [] })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let options = ReportListOptions {
        end_date: Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()),
        ..Default::default()
    };

    get_reports(&client, "p1", options).await.unwrap();
}
