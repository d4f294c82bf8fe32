use crate::{
    docs::ApiDoc,
    handlers::{AppState, get_file, upload_file},
};
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::Method,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

/// 创建API路由
pub fn create_api_routes() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_file)) // 上传文件
        .route("/{file_url}", get(get_file)) // 通过签名URL回源获取文件
}

/// 组装完整应用：API路由、OpenAPI文档、请求体限制、CORS与请求追踪
pub fn create_router(app_state: AppState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .merge(create_api_routes())
        .with_state(app_state)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
