use axum::Json;
use serde_json::{json, Value};

/// GET /api/health - 健康检查
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "hansou 服务运行正常"
    }))
}

/// GET /api/version - 获取版本信息
pub async fn get_version_info() -> Json<Value> {
    Json(json!({
        "code": 200,
        "data": {
            "backend_version": env!("CARGO_PKG_VERSION"),
            "build_time": env!("BUILD_TIME"),
        }
    }))
}

#[cfg(test)]
mod tests {
    use crate::api::test_util::call;
    use crate::test_support::app;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_health_and_version() {
        let (_dir, app) = app();
        let (status, json) = call(&app, Method::GET, "/api/health", json!(null)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");

        let (_, json) = call(&app, Method::GET, "/api/version", json!(null)).await;
        assert_eq!(json["data"]["backend_version"], env!("CARGO_PKG_VERSION"));
    }
}
