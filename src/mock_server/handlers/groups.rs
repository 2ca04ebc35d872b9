//! Group endpoint handlers.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;

use super::{authorize, business_error, NOT_FOUND_CODE};
use crate::mock_server::state::MockState;

/// Query parameters for listing groups.
#[derive(Debug, Default, Deserialize)]
pub struct ListGroupsQuery {
    pub pms_platformid: Option<String>,
}

/// GET /api/v1/pms/group
pub async fn list_groups(
    State(state): State<Arc<RwLock<MockState>>>,
    headers: HeaderMap,
    Query(query): Query<ListGroupsQuery>,
) -> impl IntoResponse {
    let state = state.read().await;
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }

    let platform_id = query.pms_platformid.unwrap_or_default();
    if !state.has_platform(&platform_id) {
        return business_error(NOT_FOUND_CODE, "platform not found");
    }

    let groups = state.groups.get(&platform_id).cloned().unwrap_or_default();
    (StatusCode::OK, Json(json!({ "result": true, "data": groups }))).into_response()
}
