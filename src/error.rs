//! Error types for BigGo PMS operations.

use serde_json::Value;
use thiserror::Error;

/// Errors that can occur during BigGo PMS operations.
///
/// Failures reported by the service fall into two kinds: [`PmsError::Auth`]
/// for the token endpoint and [`PmsError::Api`] for every resource endpoint.
/// Transport failures are folded into whichever of the two the failing call
/// belongs to, so callers never see the HTTP client's own error type.
#[derive(Debug, Error)]
pub enum PmsError {
    /// Configuration is missing or incomplete.
    #[error("BigGo PMS configuration required: {0}")]
    ConfigMissing(String),

    /// Token acquisition failed.
    #[error("BigGo auth error: {message}")]
    Auth { message: String, code: Option<i64> },

    /// A resource request failed, either in transport or in-band.
    #[error("BigGo API error: {message}")]
    Api { message: String, code: Option<i64> },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    /// Report body could not be re-serialized.
    #[error("Failed to serialize report: {0}")]
    SerializeError(#[from] serde_json::Error),

    /// Filesystem error while saving a report.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PmsError {
    /// Build an auth error, renaming the server's credential parameter names
    /// to the ones this library exposes.
    pub(crate) fn auth(message: impl Into<String>, code: Option<i64>) -> Self {
        let message = message
            .into()
            .replace("( app_id )", "( clientID )")
            .replace("( app_key )", "( clientSecret )");
        Self::Auth { message, code }
    }

    pub(crate) fn api(message: impl Into<String>, code: Option<i64>) -> Self {
        Self::Api {
            message: message.into(),
            code,
        }
    }

    /// The numeric error code reported by the server, if any.
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Auth { code, .. } | Self::Api { code, .. } => *code,
            _ => None,
        }
    }

    /// Returns true for token endpoint failures.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}

/// Result type alias for BigGo PMS operations.
pub type Result<T> = core::result::Result<T, PmsError>;

/// Read a server error code, which arrives as a number or a numeric string.
pub(crate) fn numeric_code(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_renames_credential_params() {
        let err = PmsError::auth("invalid parameter ( app_id ) or ( app_key )", Some(1001));
        match err {
            PmsError::Auth { message, code } => {
                assert_eq!(message, "invalid parameter ( clientID ) or ( clientSecret )");
                assert_eq!(code, Some(1001));
            }
            other => panic!("Expected auth error, got {other:?}"),
        }
    }

    #[test]
    fn test_code_accessor() {
        assert_eq!(PmsError::api("boom", Some(5)).code(), Some(5));
        assert_eq!(PmsError::ConfigMissing("x".into()).code(), None);
        assert!(PmsError::auth("x", None).is_auth());
        assert!(!PmsError::api("x", None).is_auth());
    }

    #[test]
    fn test_numeric_code() {
        assert_eq!(numeric_code(&serde_json::json!(5)), Some(5));
        assert_eq!(numeric_code(&serde_json::json!("42")), Some(42));
        assert_eq!(numeric_code(&serde_json::json!("oops")), None);
        assert_eq!(numeric_code(&serde_json::json!(null)), None);
    }
}
