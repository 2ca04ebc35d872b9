//! Platform endpoint handlers.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tokio::sync::RwLock;

use super::authorize;
use crate::mock_server::state::MockState;

/// GET /api/v1/pms/platform
pub async fn list_platforms(
    State(state): State<Arc<RwLock<MockState>>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let state = state.read().await;
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }

    (
        StatusCode::OK,
        Json(json!({ "result": true, "data": state.platforms })),
    )
        .into_response()
}
