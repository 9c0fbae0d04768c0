//! `GET /download_file/{request_id}` (spec §6): streams the finished
//! artifact and then destroys the staged file so a second request for the
//! same id 404s instead of re-downloading stale bytes.

use std::path::Path as FsPath;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use offliner_core::domain::RequestId;

use crate::error::HttpError;
use crate::state::{AppState, JobService};

/// How long the finished artifact stays servable before it's swept. A
/// background sweep rather than an immediate delete, since the client
/// that triggers this request is the same client that just asked for
/// the file and may retry on a transient network blip.
const RETENTION_AFTER_SERVE: Duration = Duration::from_secs(30);

pub async fn download_file(
    State(state): State<AppState>,
    Path(request_id): Path<RequestId>,
) -> Result<Response, HttpError> {
    let record = state.observe(request_id).await;

    if !record.complete {
        return Err(HttpError::Conflict("download not finished".to_string()));
    }
    if record.error.is_some() {
        return Err(HttpError::NotFound("download failed".to_string()));
    }

    let file_path = record
        .file_path
        .ok_or_else(|| HttpError::NotFound("no artifact for this request".to_string()))?;

    let path = FsPath::new(&file_path);
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download".to_string());

    let file = File::open(path)
        .await
        .map_err(|e| HttpError::NotFound(format!("artifact missing on disk: {e}")))?;

    let stream = ReaderStream::new(file);
    let body = Body::from_stream(stream);

    let disposition = format!("attachment; filename=\"{file_name}\"");
    let response = (
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response();

    schedule_cleanup(state, request_id, file_path);

    Ok(response)
}

/// Spec §6: "on response close, destroys the session directory and
/// schedules Progress Record removal after ~30s." The true session
/// scratch directory is already gone by the time this handler runs (the
/// pipeline tears it down at job completion); what's left to clean up
/// here is the staged output file and the Progress Record itself.
fn schedule_cleanup(state: AppState, request_id: RequestId, file_path: String) {
    tokio::spawn(async move {
        tokio::time::sleep(RETENTION_AFTER_SERVE).await;
        let _ = tokio::fs::remove_file(&file_path).await;
        state.forget(request_id).await;
    });
}
