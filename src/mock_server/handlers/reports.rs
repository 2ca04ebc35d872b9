//! Report history and export handlers.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;

use super::{authorize, business_error, NOT_FOUND_CODE};
use crate::mock_server::state::MockState;

const DEFAULT_PAGE_SIZE: usize = 5000;

/// GET /api/v1/pms/export
///
/// Supports `size`, `in_sort`, `in_form`, and `in_opt[pms_groupid]`. The
/// date bounds are recorded but not applied.
pub async fn list_reports(
    State(state): State<Arc<RwLock<MockState>>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let mut state = state.write().await;
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }
    state.last_report_query = Some(query.clone());

    let platform_id = query.get("pms_platformid").cloned().unwrap_or_default();
    if !state.has_platform(&platform_id) {
        return business_error(NOT_FOUND_CODE, "platform not found");
    }

    let size = query
        .get("size")
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_PAGE_SIZE);
    let start = query
        .get("in_form")
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    let ascending = query.get("in_sort").map(String::as_str) == Some("asc");
    let group_ids = query.get("in_opt[pms_groupid]").map(String::as_str);

    let reports = state.list_reports(&platform_id, group_ids, ascending, start, size);
    (StatusCode::OK, Json(json!({ "result": true, "data": reports }))).into_response()
}

/// Query parameters for downloading a report.
#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    pub pms_platformid: Option<String>,
    pub file_type: Option<String>,
}

/// GET /api/v1/pms/export/{id}
pub async fn export_report(
    State(state): State<Arc<RwLock<MockState>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<ExportQuery>,
) -> impl IntoResponse {
    let state = state.read().await;
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }

    let platform_id = query.pms_platformid.unwrap_or_default();
    if !state.has_platform(&platform_id) {
        return business_error(NOT_FOUND_CODE, "platform not found");
    }
    let Some(file) = state.report_files.get(&id) else {
        return business_error(NOT_FOUND_CODE, "report not found");
    };

    let stem = urlencoding::encode(&file.file_stem);
    match query.file_type.as_deref().unwrap_or("csv") {
        "csv" => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{stem}.csv\""),
                ),
            ],
            file.csv.clone(),
        )
            .into_response(),
        "json" => (
            StatusCode::OK,
            [(
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={stem}.json"),
            )],
            Json(file.json.clone()),
        )
            .into_response(),
        "excel" => (
            StatusCode::OK,
            [
                (
                    header::CONTENT_TYPE,
                    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
                        .to_string(),
                ),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{stem}.xlsx\"; size=1"),
                ),
            ],
            file.excel.clone(),
        )
            .into_response(),
        other => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "result": false,
                "error_code": 400,
                "error": format!("unsupported file_type: {other}")
            })),
        )
            .into_response(),
    }
}
