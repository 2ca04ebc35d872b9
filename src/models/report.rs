//! Report history model and trait implementations.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::{lenient_string, lenient_u64, map_list};
use crate::client::{ApiRequest, PmsClient};
use crate::error::Result;
use crate::traits::List;

/// A generated report, as listed in a platform's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportListItem {
    pub id: String,
    pub create_time: String,
    pub group_id: String,
    pub group_name: String,
    pub district: String,
    pub sample_size: u64,
}

/// Report as returned by `GET /export`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReportRecord {
    #[serde(rename = "_id", deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub createtime: String,
    #[serde(deserialize_with = "lenient_string")]
    pub pms_groupid: String,
    #[serde(deserialize_with = "lenient_string")]
    pub group_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub district: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub sample_size: u64,
}

impl From<ReportRecord> for ReportListItem {
    fn from(raw: ReportRecord) -> Self {
        Self {
            id: raw.id,
            create_time: raw.createtime,
            group_id: raw.pms_groupid,
            group_name: raw.group_name,
            district: raw.district,
            sample_size: raw.sample_size,
        }
    }
}

/// Order of the report history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SortOrder {
    Asc,
    /// Newest first.
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for listing a platform's report history.
///
/// Every field is optional. Unset paging fields use the defaults below; the
/// filter fields (`group_ids`, `start_date`, `end_date`) are only sent when
/// at least one of them is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportListOptions {
    /// Maximum number of reports. Defaults to 5000.
    pub size: Option<u32>,
    /// Offset of the first report. Defaults to 0.
    pub start_index: Option<u32>,
    /// Defaults to [`SortOrder::Desc`].
    pub sort: Option<SortOrder>,
    /// Only reports of these groups.
    pub group_ids: Vec<String>,
    /// Only reports created on or after this UTC date.
    pub start_date: Option<DateTime<Utc>>,
    /// Only reports created on or before this UTC date.
    pub end_date: Option<DateTime<Utc>>,
}

impl ReportListOptions {
    pub const DEFAULT_SIZE: u32 = 5000;

    /// Whether any filter field is set.
    pub fn has_filter(&self) -> bool {
        !self.group_ids.is_empty() || self.start_date.is_some() || self.end_date.is_some()
    }

    /// Query parameters for `GET /export`.
    ///
    /// Filters go into the `in_opt` object, encoded with bracket keys
    /// (`in_opt[start]=2023-5-22`); unset filter keys are omitted.
    pub fn to_query(&self, platform_id: &str) -> Vec<(String, String)> {
        let mut query = vec![
            ("pms_platformid".to_string(), platform_id.to_string()),
            (
                "size".to_string(),
                self.size.unwrap_or(Self::DEFAULT_SIZE).to_string(),
            ),
            (
                "in_sort".to_string(),
                self.sort.unwrap_or_default().as_str().to_string(),
            ),
            (
                "in_form".to_string(),
                self.start_index.unwrap_or(0).to_string(),
            ),
        ];

        if self.has_filter() {
            if !self.group_ids.is_empty() {
                query.push(("in_opt[pms_groupid]".to_string(), self.group_ids.join(",")));
            }
            if let Some(start) = &self.start_date {
                query.push(("in_opt[start]".to_string(), format_filter_date(start)));
            }
            if let Some(end) = &self.end_date {
                query.push(("in_opt[end]".to_string(), format_filter_date(end)));
            }
        }

        query
    }
}

/// Format a filter bound as `YYYY-M-D` from its UTC calendar fields.
///
/// Month and day are not zero-padded, matching what earlier clients sent.
pub fn format_filter_date(date: &DateTime<Utc>) -> String {
    format!("{}-{}-{}", date.year(), date.month(), date.day())
}

/// Query type for report listing: platform ID and options.
pub type ReportQuery = (String, ReportListOptions);

#[async_trait]
impl List for ReportListItem {
    type Query = ReportQuery;

    #[tracing::instrument(skip(client))]
    async fn list(client: &PmsClient, query: &Self::Query) -> Result<Vec<Self>> {
        let (platform_id, options) = query;
        let request = ApiRequest::get("export").query_pairs(options.to_query(platform_id));
        let response = client.dispatch(request).await?;
        map_list::<ReportRecord, ReportListItem>(response)
    }
}

/// Get the report history of a platform.
pub async fn get_reports(
    client: &PmsClient,
    platform_id: &str,
    options: ReportListOptions,
) -> Result<Vec<ReportListItem>> {
    ReportListItem::list(client, &(platform_id.to_string(), options)).await
}
