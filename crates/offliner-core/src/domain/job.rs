//! The `Job` (spec §4.2): the serialized record dispatched through the broker.

use serde::{Deserialize, Serialize};

use super::{ItemOverridesMap, RequestId, UserConfig};

/// A dequeued unit of work. At-least-once delivery means a worker may see
/// the same `request_id` twice; the pipeline is safe to re-run because it
/// clears and recreates the session directory at the start of
/// `execute` (spec §4.2 "Failure modes").
///
/// Embeds `UserConfig`, whose own `Debug` impl redacts `credentials_blob`/
/// `credentials_path` — `#[derive(Debug)]` here is safe because it just
/// delegates to that field's impl.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub request_id: RequestId,
    pub user_config: UserConfig,
    pub raw_input: String,
    pub is_playlist_mode: bool,
    pub selected_urls: Vec<String>,
    pub item_configs: ItemOverridesMap,
    pub session_dir: String,
    /// Carried for parity with the source's job record (spec §4.2); the
    /// worker process reads its own `REDIS_URL` from the environment rather
    /// than trusting a value serialized by a potentially different caller,
    /// so this is informational only.
    pub broker_connection_string: String,
    /// The quota identity the request was enqueued under, so the worker can
    /// re-check/record quota usage once real per-target durations are known.
    pub client_identity: String,
}

impl Job {
    #[must_use]
    pub fn from_request(request: &super::Request, session_dir: impl Into<String>, broker_connection_string: impl Into<String>) -> Self {
        Self {
            request_id: request.request_id,
            user_config: request.user_config.clone(),
            raw_input: request.raw_input.clone(),
            is_playlist_mode: request.is_playlist_mode,
            selected_urls: request.selected_urls.clone(),
            item_configs: request.item_configs.clone(),
            session_dir: session_dir.into(),
            broker_connection_string: broker_connection_string.into(),
            client_identity: request.client_identity.clone(),
        }
    }
}
