//! Platform model and trait implementations.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{lenient_string, lenient_vec, map_list};
use crate::client::{ApiRequest, PmsClient};
use crate::error::Result;
use crate::traits::List;

/// A monitoring platform the authenticated client can access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Platform {
    pub id: String,
    pub name: String,
    pub status: PlatformStatus,
    /// Members of the platform.
    pub user_list: Vec<PlatformUser>,
    /// Report notification recipients.
    pub email_list: Vec<PlatformEmail>,
}

/// Whether a platform is switched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformStatus {
    Enabled,
    Disabled,
    Unknown,
}

impl PlatformStatus {
    fn from_wire(status: &str) -> Self {
        match status {
            "enable" | "enabled" => Self::Enabled,
            "disable" | "disabled" => Self::Disabled,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for PlatformStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
            Self::Unknown => "unknown",
        })
    }
}

/// A platform member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformUser {
    pub user_id: String,
    pub join_time: String,
    pub permission: Permission,
}

/// A member's role on a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Administrator,
    Standard,
    Unknown,
}

impl Permission {
    fn from_wire(permission: &str) -> Self {
        match permission {
            "administrator" => Self::Administrator,
            "standard" => Self::Standard,
            _ => Self::Unknown,
        }
    }
}

/// A report notification recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformEmail {
    pub name: String,
    pub email: String,
    /// Group IDs this recipient follows; `["all"]` means every group.
    pub group_list: Vec<String>,
}

/// Platform as returned by `GET /platform`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlatformRecord {
    #[serde(rename = "_id", deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub platform_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub status: String,
    #[serde(deserialize_with = "lenient_vec")]
    pub userid_list: Vec<PlatformUserRecord>,
    #[serde(deserialize_with = "lenient_vec")]
    pub email_list: Vec<PlatformEmailRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlatformUserRecord {
    #[serde(deserialize_with = "lenient_string")]
    pub userid: String,
    #[serde(deserialize_with = "lenient_string")]
    pub jointime: String,
    #[serde(deserialize_with = "lenient_string")]
    pub permission: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlatformEmailRecord {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(deserialize_with = "lenient_vec")]
    pub group_list: Vec<String>,
}

impl From<PlatformRecord> for Platform {
    fn from(raw: PlatformRecord) -> Self {
        Self {
            id: raw.id,
            name: raw.platform_name,
            status: PlatformStatus::from_wire(&raw.status),
            user_list: raw.userid_list.into_iter().map(PlatformUser::from).collect(),
            email_list: raw.email_list.into_iter().map(PlatformEmail::from).collect(),
        }
    }
}

impl From<PlatformUserRecord> for PlatformUser {
    fn from(raw: PlatformUserRecord) -> Self {
        Self {
            user_id: raw.userid,
            join_time: raw.jointime,
            permission: Permission::from_wire(&raw.permission),
        }
    }
}

impl From<PlatformEmailRecord> for PlatformEmail {
    fn from(raw: PlatformEmailRecord) -> Self {
        Self {
            name: raw.name,
            email: raw.email,
            group_list: raw.group_list,
        }
    }
}

impl Platform {
    pub fn is_enabled(&self) -> bool {
        self.status == PlatformStatus::Enabled
    }

    /// Members holding the administrator role.
    pub fn administrators(&self) -> impl Iterator<Item = &PlatformUser> {
        self.user_list
            .iter()
            .filter(|u| u.permission == Permission::Administrator)
    }
}

#[async_trait]
impl List for Platform {
    type Query = ();

    #[tracing::instrument(skip(client))]
    async fn list(client: &PmsClient, _query: &()) -> Result<Vec<Self>> {
        let response = client.dispatch(ApiRequest::get("platform")).await?;
        map_list::<PlatformRecord, Platform>(response)
    }
}

/// Get every platform visible to the client.
pub async fn get_platforms(client: &PmsClient) -> Result<Vec<Platform>> {
    Platform::list(client, &()).await
}
