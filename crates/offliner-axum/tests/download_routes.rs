//! Integration tests for the three HTTP Edge routes, wired against
//! in-memory fakes rather than a real Redis.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use offliner_axum::routes::create_router;
use offliner_axum::state::DefaultJobService;
use offliner_broker::InMemoryBroker;
use offliner_core::config::QuotaLimits;
use offliner_quota::QuotaTracker;
use offliner_store::InMemoryProgressStore;

fn test_router() -> axum::Router {
    let job_service = Arc::new(DefaultJobService {
        broker: Arc::new(InMemoryBroker::new()),
        progress: Arc::new(InMemoryProgressStore::new()),
        quota: Arc::new(QuotaTracker::new(QuotaLimits::default())),
        temp_root: std::env::temp_dir(),
    });
    create_router(job_service, tower_http::cors::CorsLayer::permissive())
}

#[tokio::test]
async fn health_check_is_unauthenticated_and_ok() {
    let app = test_router();
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn download_with_empty_input_is_rejected() {
    let app = test_router();
    let body = "inputURL=&is_playlist_mode=false&selected_urls=&user_config=%7B%7D&item_configs=%7B%7D";
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/download")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn download_file_for_unknown_request_id_is_404() {
    let app = test_router();
    let unknown = offliner_core::domain::RequestId::new();
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/download_file/{unknown}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    // Absent progress is a synthetic, already-`complete` error record, so
    // this 404s rather than 409s.
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(!bytes.is_empty());
}
