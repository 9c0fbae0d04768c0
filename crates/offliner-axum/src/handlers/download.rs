//! `POST /download` (spec §6).

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Form, State};
use axum::Json;

use offliner_core::domain::Request as DownloadRequest;
use offliner_core::domain::{ItemOverridesMap, RequestId};

use crate::dto::{DownloadAccepted, DownloadForm};
use crate::error::HttpError;
use crate::state::{AppState, JobService};

/// `client_identity` is the caller's remote address, matching the
/// source's `flask_limiter.util.get_remote_address` key function — this
/// is used only for quota accounting, never for auth.
pub async fn download(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Form(form): Form<DownloadForm>,
) -> Result<Json<DownloadAccepted>, HttpError> {
    let parsed = form.parse().map_err(HttpError::BadRequest)?;

    let request_id = RequestId::new();
    let item_configs: ItemOverridesMap = parsed.item_configs;
    let request = DownloadRequest {
        request_id,
        raw_input: form.input_url,
        is_playlist_mode: form.is_playlist_mode,
        selected_urls: parsed.selected_urls,
        user_config: parsed.user_config,
        item_configs,
        client_identity: addr.ip().to_string(),
    };

    let request_id = state.enqueue(request).await?;
    Ok(Json(DownloadAccepted { request_id }))
}
