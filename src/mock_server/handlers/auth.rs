//! Token endpoint handler.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Form, Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;

use crate::mock_server::state::MockState;

/// In-band code returned for bad client credentials.
pub const INVALID_CLIENT_CODE: i64 = 1001;

/// Form body of a token request.
#[derive(Debug, Default, Deserialize)]
pub struct TokenForm {
    pub grant_type: Option<String>,
}

/// POST /auth/v1/token
pub async fn issue_token(
    State(state): State<Arc<RwLock<MockState>>>,
    headers: HeaderMap,
    Form(form): Form<TokenForm>,
) -> impl IntoResponse {
    let mut state = state.write().await;
    state.token_requests += 1;

    if form.grant_type.as_deref() != Some("client_credentials") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "result": false,
                "error": {"code": 1000, "message": "unsupported grant_type"}
            })),
        );
    }

    let credentials = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_basic_auth);

    match credentials {
        Some((id, secret)) if state.accepts(&id, &secret) => {
            let token = state.issue_token();
            (
                StatusCode::OK,
                Json(json!({
                    "access_token": token,
                    "token_type": "bearer",
                    "expires_in": state.token_lifetime_secs,
                    "refresh_token": format!("refresh-{token}")
                })),
            )
        }
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "result": false,
                "error": {
                    "code": INVALID_CLIENT_CODE,
                    "message": "invalid ( app_id ) or ( app_key )"
                }
            })),
        ),
    }
}

/// Decode `Basic base64(id:secret)` into its two halves.
fn parse_basic_auth(value: &str) -> Option<(String, String)> {
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (id, secret) = decoded.split_once(':')?;
    Some((id.to_string(), secret.to_string()))
}
