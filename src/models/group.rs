//! Monitoring group model and trait implementations.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{lenient_string, lenient_u64, map_list};
use crate::client::{ApiRequest, PmsClient};
use crate::error::Result;
use crate::traits::List;

/// A group of monitored products on a platform.
///
/// Groups are sampled on a cron-like schedule; each run produces a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub schedule: Schedule,
    /// Whether the schedule is active.
    pub is_schedule_on: bool,
    pub name: String,
    pub district: String,
    pub status: GroupStatus,
    pub sample_count: u64,
    pub export_count: u64,
}

/// Cron fields of a group's sampling schedule, verbatim from the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Schedule {
    #[serde(deserialize_with = "lenient_string")]
    pub min: String,
    #[serde(deserialize_with = "lenient_string")]
    pub hour: String,
    #[serde(deserialize_with = "lenient_string")]
    pub day: String,
    #[serde(deserialize_with = "lenient_string")]
    pub month: String,
    #[serde(deserialize_with = "lenient_string")]
    pub week: String,
}

impl fmt::Display for Schedule {
    /// Crontab order: minute, hour, day of month, month, day of week.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = |s: &str| if s.is_empty() { "*".to_string() } else { s.to_string() };
        write!(
            f,
            "{} {} {} {} {}",
            field(&self.min),
            field(&self.hour),
            field(&self.day),
            field(&self.month),
            field(&self.week)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupStatus {
    Active,
    Deleted,
    Unknown,
}

impl GroupStatus {
    fn from_wire(status: &str) -> Self {
        match status {
            "active" => Self::Active,
            "deleted" => Self::Deleted,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for GroupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Active => "active",
            Self::Deleted => "deleted",
            Self::Unknown => "unknown",
        })
    }
}

/// Group as returned by `GET /group`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GroupRecord {
    #[serde(rename = "_id", deserialize_with = "lenient_string")]
    pub id: String,
    pub crontab_setting: Option<Schedule>,
    /// `"true"` when the schedule is on; the server sends it as a string.
    pub crontab: Value,
    #[serde(deserialize_with = "lenient_string")]
    pub group_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub district: String,
    #[serde(deserialize_with = "lenient_string")]
    pub status: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub sample_count: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub export_count: u64,
}

impl From<GroupRecord> for Group {
    fn from(raw: GroupRecord) -> Self {
        Self {
            id: raw.id,
            schedule: raw.crontab_setting.unwrap_or_default(),
            is_schedule_on: raw.crontab.as_str() == Some("true"),
            name: raw.group_name,
            district: raw.district,
            status: GroupStatus::from_wire(&raw.status),
            sample_count: raw.sample_count,
            export_count: raw.export_count,
        }
    }
}

impl Group {
    pub fn is_active(&self) -> bool {
        self.status == GroupStatus::Active
    }
}

#[async_trait]
impl List for Group {
    /// Platform ID.
    type Query = str;

    #[tracing::instrument(skip(client))]
    async fn list(client: &PmsClient, platform_id: &str) -> Result<Vec<Self>> {
        let request = ApiRequest::get("group").query("pms_platformid", platform_id);
        let response = client.dispatch(request).await?;
        map_list::<GroupRecord, Group>(response)
    }
}

/// Get the groups of a platform.
pub async fn get_groups(client: &PmsClient, platform_id: &str) -> Result<Vec<Group>> {
    Group::list(client, platform_id).await
}
