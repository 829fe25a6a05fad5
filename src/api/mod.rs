pub mod document;
pub mod index;
pub mod query;
pub mod server;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::engine::EngineError;
use crate::error::SearchError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 200,
            message: "success".to_string(),
            data: Some(data),
        }
    }

    pub fn error(code: StatusCode, message: &str) -> Self {
        Self {
            code: code.as_u16() as i32,
            message: message.to_string(),
            data: None,
        }
    }
}

/// Handler error, rendered as an [`ApiResponse`] with a matching status / 接口错误
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Search(e) => match e {
                SearchError::InvalidName(_)
                | SearchError::InvalidArgument(_)
                | SearchError::FieldMismatch { .. }
                | SearchError::UnsupportedValueType(_) => StatusCode::BAD_REQUEST,
                SearchError::NotFound(_) => StatusCode::NOT_FOUND,
                SearchError::AlreadyExists(_) => StatusCode::CONFLICT,
                SearchError::EngineFailure(
                    EngineError::QueryParse(_)
                    | EngineError::InvalidMapping(_)
                    | EngineError::UnknownField(_),
                ) => StatusCode::BAD_REQUEST,
                SearchError::EngineFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }
        (status, Json(ApiResponse::<()>::error(status, &self.to_string()))).into_response()
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Run a blocking index operation on its own worker thread / 在阻塞线程池执行
pub async fn run_blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> crate::error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let data = tokio::task::spawn_blocking(f).await??;
    Ok(Json(ApiResponse::success(data)))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(server::health_check))
        .route("/api/version", get(server::get_version_info))
        .route("/api/index", post(index::create_index).get(index::list_indexes))
        .route("/api/index/stats", post(index::index_stats))
        .route("/api/index/range", post(index::range_distribution))
        .route(
            "/api/document",
            post(document::add_document)
                .put(document::update_document)
                .delete(document::delete_document),
        )
        .route("/api/document/get", post(document::get_document))
        .route("/api/document/stats", post(document::term_ranking))
        .route("/api/search", post(query::search))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let status = |e: SearchError| ApiError::from(e).status();
        assert_eq!(status(SearchError::InvalidName("x y".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(SearchError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status(SearchError::AlreadyExists("x".into())), StatusCode::CONFLICT);
        assert_eq!(
            status(SearchError::EngineFailure(EngineError::UnknownAnalyzer("x".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
