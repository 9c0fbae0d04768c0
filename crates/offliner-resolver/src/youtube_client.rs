//! Thin wrapper over the external media tool's metadata-probing mode
//! (`--dump-json`), used by the resolver to classify single items, list
//! playlist entries, and run free-text searches. Never downloads bytes —
//! that's the Download Engine's job.

use std::process::Stdio;

use serde::Deserialize;
use thiserror::Error;
use tokio::process::Command;

const YOUTUBE_TOOL_BINARY_ENV: &str = "OFFLINER_YT_DLP_BIN";
const DEFAULT_BINARY: &str = "yt-dlp";

#[derive(Debug, Error)]
pub enum YoutubeClientError {
    #[error("external media tool exited with an error: {0}")]
    ToolFailed(String),
    #[error("failed to spawn external media tool: {0}")]
    SpawnFailed(String),
    #[error("malformed metadata from external media tool: {0}")]
    MalformedOutput(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlatEntry {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    pub url: Option<String>,
    pub webpage_url: Option<String>,
}

impl FlatEntry {
    #[must_use]
    pub fn resolved_url(&self) -> Option<String> {
        self.webpage_url.clone().or_else(|| self.url.clone())
    }
}

/// Queries the external media tool's metadata mode; never writes to disk.
pub struct YoutubeToolClient {
    binary: String,
}

impl Default for YoutubeToolClient {
    fn default() -> Self {
        Self::new()
    }
}

impl YoutubeToolClient {
    #[must_use]
    pub fn new() -> Self {
        let binary =
            std::env::var(YOUTUBE_TOOL_BINARY_ENV).unwrap_or_else(|_| DEFAULT_BINARY.to_string());
        Self { binary }
    }

    /// List entries of a playlist/album URL without per-item probing
    /// (spec §4.3 "use a flat extractor to list item URLs").
    pub async fn list_flat(&self, url: &str) -> Result<Vec<FlatEntry>, YoutubeClientError> {
        self.dump_json(&["--flat-playlist", "--no-warnings", url])
            .await
    }

    /// Probe a single URL for its canonical metadata (id, title, uploader,
    /// duration), without downloading.
    pub async fn probe_single(&self, url: &str) -> Result<FlatEntry, YoutubeClientError> {
        let entries = self
            .dump_json(&["--no-warnings", "--no-playlist", url])
            .await?;
        entries.into_iter().next().ok_or_else(|| {
            YoutubeClientError::MalformedOutput("no metadata returned for single item".to_string())
        })
    }

    /// Free-text search against the general video catalog (platform A),
    /// returning up to `limit` candidates.
    pub async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<FlatEntry>, YoutubeClientError> {
        self.search_with_prefix("ytsearch", query, limit).await
    }

    /// Free-text search against the music-specialized catalog (platform C),
    /// used when `prefer_alternate_source` narrows an audio search.
    pub async fn search_music(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<FlatEntry>, YoutubeClientError> {
        self.search_with_prefix("ytmsearch", query, limit).await
    }

    async fn search_with_prefix(
        &self,
        prefix: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<FlatEntry>, YoutubeClientError> {
        let search_spec = format!("{prefix}{limit}:{query}");
        self.dump_json(&["--flat-playlist", "--no-warnings", &search_spec])
            .await
    }

    async fn dump_json(&self, extra_args: &[&str]) -> Result<Vec<FlatEntry>, YoutubeClientError> {
        let output = Command::new(&self.binary)
            .arg("--dump-json")
            .args(extra_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| YoutubeClientError::SpawnFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(YoutubeClientError::ToolFailed(stderr.trim().to_string()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line)
                    .map_err(|e| YoutubeClientError::MalformedOutput(e.to_string()))
            })
            .collect()
    }
}
