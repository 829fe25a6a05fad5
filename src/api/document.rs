use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::{run_blocking, ApiError, ApiResponse, ApiResult};
use crate::models::{Document, Fields, TermFrequency};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DocumentRequest {
    pub index_name: String,
    pub id: String,
    #[serde(default)]
    pub fields: Fields,
}

#[derive(Debug, Deserialize)]
pub struct DocumentIdRequest {
    pub index_name: String,
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct DocumentAck {
    pub id: String,
}

/// POST /api/document - 添加文档
pub async fn add_document(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DocumentRequest>,
) -> ApiResult<DocumentAck> {
    let registry = state.registry.clone();
    run_blocking(move || {
        registry.add_document(&req.index_name, &req.id, &req.fields)?;
        Ok(DocumentAck { id: req.id })
    })
    .await
}

/// PUT /api/document - 更新文档（整体替换）
pub async fn update_document(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DocumentRequest>,
) -> ApiResult<DocumentAck> {
    let registry = state.registry.clone();
    run_blocking(move || {
        registry.update_document(&req.index_name, &req.id, &req.fields)?;
        Ok(DocumentAck { id: req.id })
    })
    .await
}

/// DELETE /api/document - 删除文档
pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DocumentIdRequest>,
) -> ApiResult<DocumentAck> {
    let registry = state.registry.clone();
    run_blocking(move || {
        registry.delete_document(&req.index_name, &req.id)?;
        Ok(DocumentAck { id: req.id })
    })
    .await
}

/// POST /api/document/get - 获取文档
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DocumentIdRequest>,
) -> ApiResult<Document> {
    let registry = state.registry.clone();
    let index_name = req.index_name.clone();
    let id = req.id.clone();
    let found =
        tokio::task::spawn_blocking(move || registry.get_document(&index_name, &id)).await??;
    found
        .map(|doc| Json(ApiResponse::success(doc)))
        .ok_or_else(|| ApiError::NotFound(format!("document not found: {}", req.id)))
}

#[derive(Debug, Deserialize)]
pub struct TermRankingRequest {
    pub index_name: String,
    /// Keep only the top N terms / 仅返回前 N 个词
    #[serde(default)]
    pub limit: Option<usize>,
}

/// POST /api/document/stats - 词频排行
pub async fn term_ranking(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TermRankingRequest>,
) -> ApiResult<Vec<TermFrequency>> {
    let registry = state.registry.clone();
    run_blocking(move || {
        let mut ranking = registry.term_frequency_ranking(&req.index_name)?;
        if let Some(limit) = req.limit {
            ranking.truncate(limit);
        }
        Ok(ranking)
    })
    .await
}
