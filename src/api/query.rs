use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiResponse, ApiResult};
use crate::engine::FieldKind;
use crate::error::SearchError;
use crate::models::{Pagination, SearchHit, SortKey};
use crate::state::AppState;

/// Term query / 关键词查询
const SEARCH_TERM: i32 = 1;
/// Numeric range query / 数值区间查询
const SEARCH_RANGE: i32 = 2;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub index_name: String,
    #[serde(rename = "type", default = "default_type")]
    pub search_type: i32,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub start: f64,
    #[serde(default)]
    pub end: f64,
    #[serde(default)]
    pub page: i64,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub sort: Option<String>,
}

fn default_type() -> i32 {
    SEARCH_TERM
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub total: u64,
    pub page: usize,
    pub size: usize,
    pub hits: Vec<SearchHit>,
}

/// POST /api/search - 搜索
pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> ApiResult<SearchResponse> {
    let page = Pagination::normalized(req.page, req.size);
    let window = state.config.index.max_result_window;
    if page.from().saturating_add(page.size()) > window {
        return Err(ApiError::BadRequest(format!(
            "page * size must not exceed {}",
            window
        )));
    }
    let sort = req.sort.as_deref().and_then(SortKey::parse);

    match req.search_type {
        SEARCH_TERM if req.query.trim().is_empty() => {
            return Err(ApiError::BadRequest("query must not be empty".to_string()));
        }
        SEARCH_TERM | SEARCH_RANGE => {}
        other => {
            return Err(ApiError::BadRequest(format!("unknown search type {}", other)));
        }
    }

    let registry = state.registry.clone();
    let result = tokio::task::spawn_blocking(move || {
        if req.search_type == SEARCH_RANGE {
            // Range dispatch requires a numeric field of this index
            let handle = registry.resolve(&req.index_name)?;
            if handle.field_kind(&req.field) != Some(FieldKind::Number) {
                return Err(SearchError::FieldMismatch {
                    field: req.field.clone(),
                    expected: FieldKind::Number.as_str(),
                });
            }
            registry.range_search(&req.index_name, &req.field, req.start, req.end, page, sort)
        } else {
            registry.search(&req.index_name, &req.query, page, sort)
        }
    })
    .await??;

    Ok(Json(ApiResponse::success(SearchResponse {
        total: result.total,
        page: page.page(),
        size: page.size(),
        hits: result.hits,
    })))
}
