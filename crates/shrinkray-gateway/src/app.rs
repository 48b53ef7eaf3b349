use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{create_url_handler, health_handler, redirect_handler};
use crate::state::AppState;

pub struct App {}

impl App {
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/api/v1/short-url", post(create_url_handler))
            .route("/{short_code}", get(redirect_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use shrinkray_shortener::{ShortenerService, ShortenerSettings};
    use shrinkray_storage::InMemoryRepository;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn router() -> Router {
        let settings = ShortenerSettings::builder()
            .base_url("https://shr.ink")
            .build();
        let service = ShortenerService::new(InMemoryRepository::new(), settings);
        App::router(AppState::new(Arc::new(service)))
    }

    async fn post_json(router: &Router, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/short-url")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn get(router: &Router, uri: &str) -> axum::response::Response {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        router.clone().oneshot(request).await.unwrap()
    }

    #[tokio::test]
    async fn health() {
        let response = get(&router(), "/health").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn shorten_returns_short_url() {
        let router = router();

        let (status, body) = post_json(&router, json!({ "longUrl": "https://example.com" })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["shortUrl"], "https://shr.ink/1");
        assert_eq!(body["longUrl"], "https://example.com");
        assert!(body["createdAt"].is_string());
    }

    #[tokio::test]
    async fn shorten_is_idempotent() {
        let router = router();

        let (_, first) = post_json(&router, json!({ "longUrl": "https://example.com" })).await;
        let (_, second) = post_json(&router, json!({ "longUrl": "https://example.com" })).await;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn shorten_rejects_invalid_url() {
        let router = router();

        let (status, body) = post_json(&router, json!({ "longUrl": "not a url" })).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "INVALID_URL");
    }

    #[tokio::test]
    async fn redirect_to_long_url() {
        let router = router();
        post_json(&router, json!({ "longUrl": "https://example.com/a" })).await;

        let response = get(&router, "/1").await;

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers()[header::LOCATION],
            "https://example.com/a"
        );
    }

    #[tokio::test]
    async fn redirect_unknown_code() {
        let response = get(&router(), "/abc").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn redirect_malformed_code() {
        let response = get(&router(), "/a-b").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
