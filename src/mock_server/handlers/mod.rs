//! HTTP request handlers for the mock server.

pub mod auth;
pub mod groups;
pub mod platforms;
pub mod reports;

pub use auth::*;
pub use groups::*;
pub use platforms::*;
pub use reports::*;

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::mock_server::state::MockState;

/// In-band code returned when the bearer token is missing or unknown.
pub const INVALID_TOKEN_CODE: i64 = 1002;

/// In-band code returned for an unknown platform or report.
pub const NOT_FOUND_CODE: i64 = 5;

/// A PMS business error: HTTP 200 with `result: false` in the body.
pub(crate) fn business_error(code: i64, message: &str) -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "result": false,
            "error_code": code,
            "error": message
        })),
    )
        .into_response()
}

/// Check the bearer token against the issued set.
pub(crate) fn authorize(state: &MockState, headers: &HeaderMap) -> Result<(), Response> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match token {
        Some(token) if state.issued_tokens.contains(token) => Ok(()),
        _ => Err(business_error(INVALID_TOKEN_CODE, "invalid access token")),
    }
}
