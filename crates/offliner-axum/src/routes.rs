//! Route definitions and router construction: `POST /download`,
//! `GET /stream_progress/{request_id}`, `GET /download_file/{request_id}`,
//! plus a `/health` check (spec §6).

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::{AppState, DefaultJobService, JobService};

pub fn create_router(job_service: Arc<DefaultJobService>, cors: CorsLayer) -> Router {
    let state: AppState = job_service as Arc<dyn JobService>;

    Router::new()
        .route("/health", get(health_check))
        .route("/download", post(handlers::download::download))
        .route(
            "/stream_progress/{request_id}",
            get(handlers::stream_progress::stream_progress),
        )
        .route(
            "/download_file/{request_id}",
            get(handlers::download_file::download_file),
        )
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub(crate) async fn health_check() -> &'static str {
    "OK"
}
