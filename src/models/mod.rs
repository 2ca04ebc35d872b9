//! BigGo PMS model types.
//!
//! Each endpoint's wire record (`*Record`) is decoded leniently and then
//! mapped into a stable public type through a `From` impl. Mapping never
//! fails: missing fields fall back to empty values.

mod group;
mod platform;
mod report;

pub use group::*;
pub use platform::*;
pub use report::*;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{PmsError, Result};
use crate::transport::TransportResponse;

/// The `{ "data": [...] }` envelope every list endpoint returns.
#[derive(Debug, Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
struct ListEnvelope<T> {
    #[serde(default)]
    data: Vec<T>,
}

/// Decode a list response and map each record into its public type.
pub(crate) fn map_list<R, T>(response: TransportResponse) -> Result<Vec<T>>
where
    R: DeserializeOwned,
    T: From<R>,
{
    let envelope: ListEnvelope<R> = serde_json::from_value(response.body.into_json())
        .map_err(|e| PmsError::api(format!("unexpected response shape: {e}"), None))?;
    Ok(envelope.data.into_iter().map(T::from).collect())
}

/// Accept a count sent either as a number or a numeric string.
pub(crate) fn lenient_u64<'de, D>(deserializer: D) -> core::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    })
}

/// Accept a string field that may arrive as a number or null.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> core::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Accept a list that may arrive as null or as a non-array value.
///
/// Elements that fail to decode are dropped.
pub(crate) fn lenient_vec<'de, D, T>(deserializer: D) -> core::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}
