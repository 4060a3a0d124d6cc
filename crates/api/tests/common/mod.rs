use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use eelgrass_api::config::ServerConfig;
use eelgrass_api::router::build_app_router;
use eelgrass_api::state::AppState;
use eelgrass_core::store::MemoryStore;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        database_max_connections: 1,
    }
}

/// Build the full application router over an in-memory archive.
///
/// Uses the same middleware stack as `main.rs`; only the storage differs.
pub fn build_test_app(archive: Arc<MemoryStore>) -> Router {
    let config = test_config();
    let state = AppState {
        archive,
        pool: None,
    };
    build_app_router(state, &config)
}

/// Send a request with an empty body.
pub async fn send(app: Router, method: Method, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
