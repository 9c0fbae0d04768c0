//! Client for the platform-B (Spotify-like) metadata API. Never downloads
//! audio — only resolves (title, artist) pairs, which the resolver then
//! translates into platform-A search targets (spec §4.3 "Cross-platform
//! translation").

use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Deserialize;
use thiserror::Error;

use offliner_core::config::PlatformBCredentials;

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const API_BASE: &str = "https://api.spotify.com/v1";

#[derive(Debug, Error)]
pub enum PlatformBError {
    #[error("platform-B credentials are not configured")]
    NotConfigured,
    #[error("platform-B request failed: {0}")]
    RequestFailed(String),
    #[error("platform-B returned malformed data: {0}")]
    MalformedResponse(String),
}

pub struct TrackMeta {
    pub title: String,
    pub artist: String,
    pub duration_secs: Option<u64>,
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Minimal client-credentials-flow client for the metadata API.
pub struct PlatformBClient {
    http: reqwest::Client,
    credentials: PlatformBCredentials,
    token: Mutex<Option<CachedToken>>,
}

impl PlatformBClient {
    #[must_use]
    pub fn new(credentials: PlatformBCredentials, http: reqwest::Client) -> Self {
        Self {
            http,
            credentials,
            token: Mutex::new(None),
        }
    }

    pub async fn track(&self, track_id: &str) -> Result<TrackMeta, PlatformBError> {
        let token = self.access_token().await?;
        let resp: TrackResponse = self
            .get(&format!("{API_BASE}/tracks/{track_id}"), &token)
            .await?;
        Ok(TrackMeta {
            title: resp.name,
            artist: resp
                .artists
                .first()
                .map(|a| a.name.clone())
                .unwrap_or_default(),
            duration_secs: Some(resp.duration_ms / 1000),
        })
    }

    /// Page through a playlist's or album's tracks, spec §4.3 page sizes
    /// (50 for albums, 100 for playlists) decided by the caller.
    pub async fn page(
        &self,
        collection_id: &str,
        is_album: bool,
        offset: usize,
        page_size: usize,
    ) -> Result<Vec<TrackMeta>, PlatformBError> {
        let token = self.access_token().await?;
        let kind = if is_album { "albums" } else { "playlists" };
        let field = if is_album { "tracks" } else { "items" };
        let url = format!(
            "{API_BASE}/{kind}/{collection_id}/tracks?limit={page_size}&offset={offset}&_field={field}"
        );
        let resp: PageResponse = self.get(&url, &token).await?;
        Ok(resp
            .items
            .into_iter()
            .map(|item| {
                let (name, artists, duration_ms) = match item.track {
                    Some(track) => (track.name, track.artists, track.duration_ms),
                    None => (
                        item.name.unwrap_or_default(),
                        item.artists.unwrap_or_default(),
                        item.duration_ms.unwrap_or(0),
                    ),
                };
                TrackMeta {
                    title: name,
                    artist: artists.first().map(|a| a.name.clone()).unwrap_or_default(),
                    duration_secs: Some(duration_ms / 1000),
                }
            })
            .collect())
    }

    async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        token: &str,
    ) -> Result<T, PlatformBError> {
        self.http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| PlatformBError::RequestFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| PlatformBError::RequestFailed(e.to_string()))?
            .json()
            .await
            .map_err(|e| PlatformBError::MalformedResponse(e.to_string()))
    }

    async fn access_token(&self) -> Result<String, PlatformBError> {
        if !self.credentials.is_configured() {
            return Err(PlatformBError::NotConfigured);
        }
        {
            let cached = self.token.lock().unwrap();
            if let Some(cached) = cached.as_ref() {
                if cached.expires_at > Instant::now() {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        let client_id = self.credentials.client_id.as_deref().unwrap_or_default();
        let client_secret = self
            .credentials
            .client_secret
            .as_deref()
            .unwrap_or_default();

        let resp: TokenResponse = self
            .http
            .post(TOKEN_URL)
            .form(&[("grant_type", "client_credentials")])
            .basic_auth(client_id, Some(client_secret))
            .send()
            .await
            .map_err(|e| PlatformBError::RequestFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| PlatformBError::RequestFailed(e.to_string()))?
            .json()
            .await
            .map_err(|e| PlatformBError::MalformedResponse(e.to_string()))?;

        let expires_at = Instant::now() + Duration::from_secs(resp.expires_in.saturating_sub(30));
        let mut cached = self.token.lock().unwrap();
        *cached = Some(CachedToken {
            access_token: resp.access_token.clone(),
            expires_at,
        });
        Ok(resp.access_token)
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Deserialize)]
struct Artist {
    name: String,
}

#[derive(Deserialize)]
struct TrackResponse {
    name: String,
    artists: Vec<Artist>,
    duration_ms: u64,
}

#[derive(Deserialize)]
struct PageResponse {
    items: Vec<PageItem>,
}

#[derive(Deserialize)]
struct PageItem {
    /// Present for playlist items (nested under `track`).
    #[serde(default)]
    track: Option<TrackResponse>,
    /// Present for album items, where the track fields sit inline instead.
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    artists: Option<Vec<Artist>>,
    #[serde(default)]
    duration_ms: Option<u64>,
}
