use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::{run_blocking, ApiError, ApiResponse, ApiResult};
use crate::models::{FieldAnalyzerConfig, IndexStatistics, RangeDistribution};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateIndexRequest {
    pub index_name: String,
    /// Field name -> analyzer kind / 字段分析器配置
    #[serde(default)]
    pub fields: Option<FieldAnalyzerConfig>,
}

#[derive(Debug, Serialize)]
pub struct CreateIndexResponse {
    pub index_name: String,
}

/// POST /api/index - 创建索引
pub async fn create_index(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateIndexRequest>,
) -> ApiResult<CreateIndexResponse> {
    let registry = state.registry.clone();
    run_blocking(move || {
        registry.create(&req.index_name, req.fields.as_ref())?;
        Ok(CreateIndexResponse {
            index_name: req.index_name,
        })
    })
    .await
}

/// GET /api/index - 列出索引
pub async fn list_indexes(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Vec<String>>> {
    Json(ApiResponse::success(state.registry.names()))
}

#[derive(Debug, Deserialize)]
pub struct IndexNameRequest {
    pub index_name: String,
}

/// POST /api/index/stats - 索引统计
pub async fn index_stats(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IndexNameRequest>,
) -> ApiResult<IndexStatistics> {
    let registry = state.registry.clone();
    run_blocking(move || registry.index_statistics(&req.index_name)).await
}

#[derive(Debug, Deserialize)]
pub struct RangeDistributionRequest {
    pub index_name: String,
    pub field_name: String,
    pub ranges: Vec<[f64; 2]>,
}

/// Surround caller ranges with `(-inf, firstLo]` and `[lastHi, +inf)` / 补齐无穷区间
fn with_open_ends(ranges: &[[f64; 2]]) -> Option<Vec<[f64; 2]>> {
    let first = ranges.first()?;
    let last = ranges.last()?;
    let mut all = Vec::with_capacity(ranges.len() + 2);
    all.push([f64::NEG_INFINITY, first[0]]);
    all.extend_from_slice(ranges);
    all.push([last[1], f64::INFINITY]);
    Some(all)
}

/// POST /api/index/range - 数值字段区间分布
pub async fn range_distribution(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RangeDistributionRequest>,
) -> ApiResult<RangeDistribution> {
    let ranges = with_open_ends(&req.ranges)
        .ok_or_else(|| ApiError::BadRequest("ranges must not be empty".to_string()))?;
    if ranges.iter().any(|[lo, hi]| lo > hi) {
        return Err(ApiError::BadRequest("each range must satisfy lo <= hi".to_string()));
    }

    let registry = state.registry.clone();
    let sample_size = state.config.index.range_sample_size;
    run_blocking(move || {
        registry.range_distribution(&req.index_name, &req.field_name, &ranges, sample_size)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_util::call;
    use crate::test_support::app;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[test]
    fn test_with_open_ends() {
        assert_eq!(with_open_ends(&[]), None);
        let all = with_open_ends(&[[0.0, 10.0], [10.0, 20.0]]).unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0], [f64::NEG_INFINITY, 0.0]);
        assert_eq!(all[3], [20.0, f64::INFINITY]);
    }

    #[tokio::test]
    async fn test_create_list_and_conflict() {
        let (_dir, app) = app();
        let body = json!({"index_name": "books", "fields": {"title": "jieba", "price": "number"}});
        let (status, json) = call(&app, Method::POST, "/api/index", body.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["index_name"], "books");

        let (status, json) = call(&app, Method::POST, "/api/index", body).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["code"], 409);

        let (status, json) = call(
            &app,
            Method::POST,
            "/api/index",
            json!({"index_name": "bad name"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["message"].as_str().unwrap().contains("invalid index name"));

        let (_, json) = call(&app, Method::GET, "/api/index", json!(null)).await;
        assert_eq!(json["data"], json!(["books"]));
    }

    #[tokio::test]
    async fn test_range_endpoint_adds_open_ends() {
        let (_dir, app) = app();
        call(
            &app,
            Method::POST,
            "/api/index",
            json!({"index_name": "shop", "fields": {"price": "number"}}),
        )
        .await;
        for (id, price) in [("a", -5), ("b", 5), ("c", 50)] {
            let (status, _) = call(
                &app,
                Method::POST,
                "/api/document",
                json!({"index_name": "shop", "id": id, "fields": {"price": price}}),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, json) = call(
            &app,
            Method::POST,
            "/api/index/range",
            json!({"index_name": "shop", "field_name": "price", "ranges": [[0, 10]]}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let ranges = &json["data"]["ranges"];
        assert_eq!(ranges["-inf-0.00"], 1);
        assert_eq!(ranges["0.00-10.00"], 1);
        assert_eq!(ranges["10.00-inf"], 1);
        assert_eq!(json["data"]["count"], 3);

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/index/range",
            json!({"index_name": "shop", "field_name": "price", "ranges": []}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_stats_unknown_index() {
        let (_dir, app) = app();
        let (status, json) = call(
            &app,
            Method::POST,
            "/api/index/stats",
            json!({"index_name": "ghost"}),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["code"], 404);
    }
}
