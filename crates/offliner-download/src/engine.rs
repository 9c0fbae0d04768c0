//! Download Engine (spec §4.4): produces exactly one on-disk artifact for
//! one (Target, Mode, UserConfig) tuple.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use offliner_core::domain::{Mode, UserConfig};
use offliner_core::error::CoreError;
use offliner_core::ports::{DownloadEnginePort, DownloadHooks, EngineRequest, TransferUpdate};

use crate::options::{self, supports_embedded_art};
use crate::protocol::{self, Event};
use crate::sanitize::{is_sidecar_of, sanitize_stem};

const TOOL_BINARY_ENV: &str = "OFFLINER_YT_DLP_BIN";
const DEFAULT_BINARY: &str = "yt-dlp";
const SPONSORBLOCK_FAILURE_MARKERS: &[&str] =
    &["SponsorBlock", "unexpected keyword argument 'action'"];
const CLIENT_SURFACE_FAILURE_MARKERS: &[&str] =
    &["HTTP Error 400", "Requested content is not available"];
const MAX_CURRENT_FILE_LEN: usize = 60;

/// Invokes the external media tool as a subprocess per download.
pub struct ExternalToolEngine {
    binary: String,
}

impl Default for ExternalToolEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ExternalToolEngine {
    #[must_use]
    pub fn new() -> Self {
        let binary =
            std::env::var(TOOL_BINARY_ENV).unwrap_or_else(|_| DEFAULT_BINARY.to_string());
        if which::which(&binary).is_err() {
            warn!(binary = %binary, "external media tool not found on PATH at startup");
        }
        Self { binary }
    }

    /// Extract info only (no download); returns `true` if any playable
    /// format is present. Retries once without the forced internal-client
    /// argument when credentials are in use and nothing playable is found
    /// (spec §4.4 "Pre-flight probe").
    async fn has_playable_formats(
        &self,
        url: &str,
        credentials_path: Option<&Path>,
        forced_client: Option<&str>,
    ) -> Result<bool, CoreError> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--dump-json").arg("--simulate").arg("--no-warnings");
        if let Some(path) = credentials_path {
            cmd.arg("--cookies").arg(path);
        }
        if let Some(client) = forced_client {
            cmd.arg("--extractor-args")
                .arg(format!("youtube:player_client={client}"));
        }
        cmd.arg(url).stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());

        let output = cmd.output().await.map_err(|e| CoreError::ExternalToolFailed {
            message: format!("failed to spawn probe: {e}"),
        })?;
        if !output.status.success() {
            return Ok(false);
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let Some(line) = stdout.lines().next() else {
            return Ok(false);
        };
        let value: serde_json::Value = serde_json::from_str(line).map_err(|e| {
            CoreError::ExternalToolFailed {
                message: format!("malformed probe metadata: {e}"),
            }
        })?;
        let formats = value.get("formats").and_then(|f| f.as_array());
        Ok(formats.is_some_and(|f| !f.is_empty()))
    }

    async fn run_once(
        &self,
        request: &EngineRequest<'_>,
        config: &UserConfig,
        output_template: &str,
        include_sponsor_skip: bool,
        forced_client: Option<&str>,
        hooks: &Arc<dyn DownloadHooks>,
    ) -> Result<DownloadOutcome, EngineRunError> {
        let credentials_path_str = request.credentials_path.map(|p| p.to_string_lossy().into_owned());
        let args = options::build_args(
            request.mode,
            config,
            credentials_path_str.as_deref(),
            include_sponsor_skip,
            forced_client,
        );

        let mut cmd = Command::new(&self.binary);
        cmd.args(&args)
            .arg("--newline")
            .arg("--progress-template")
            .arg("download:%(progress)j")
            .arg("--progress-template")
            .arg("postprocess:%(progress)j")
            .arg("-o")
            .arg(output_template)
            .arg(request.target.url.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| EngineRunError::Tool(format!("failed to spawn: {e}")))?;
        let stdout = child.stdout.take().expect("stdout was piped");
        let stderr = child.stderr.take().expect("stderr was piped");
        let mut lines = BufReader::new(stdout).lines();
        let mut stderr_lines = BufReader::new(stderr).lines();

        let stderr_task = tokio::spawn(async move {
            let mut collected = String::new();
            while let Ok(Some(line)) = stderr_lines.next_line().await {
                collected.push_str(&line);
                collected.push('\n');
            }
            collected
        });

        let mut reported_filename: Option<String> = None;
        let mut cancelled = false;

        loop {
            let Ok(Some(line)) = lines.next_line().await else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }
            match protocol::parse_line(&line) {
                Some(Event::Download(progress)) => {
                    if let Some(filename) = progress.filename.clone() {
                        reported_filename = Some(filename);
                    }
                    let stem = reported_filename
                        .as_deref()
                        .map(truncated_stem)
                        .unwrap_or_default();
                    let update = TransferUpdate {
                        bytes_downloaded: progress.downloaded_bytes,
                        bytes_total: progress.total_bytes(),
                        speed: progress.speed.map(|s| format!("{s:.0} B/s")),
                        eta: progress.eta.map(|e| e.to_string()),
                        current_file: stem,
                    };
                    if let Err(e) = hooks.on_transfer(progress.local_percent(), &update) {
                        warn!(error = %e, "transfer hook requested abort");
                        let _ = child.kill().await;
                        cancelled = true;
                        break;
                    }
                }
                Some(Event::Postprocess(progress)) => {
                    if progress.status == "started" {
                        let name = progress
                            .postprocessor
                            .unwrap_or_else(|| "Processing".to_string());
                        hooks.on_postprocess_started(&humanize_postprocessor(&name));
                    }
                }
                None => debug!(line = %line, "external tool output (not a progress event)"),
            }
        }

        if cancelled {
            let _ = child.wait().await;
            return Err(EngineRunError::Cancelled);
        }

        let status = child
            .wait()
            .await
            .map_err(|e| EngineRunError::Tool(format!("wait failed: {e}")))?;
        let stderr_text = stderr_task.await.unwrap_or_default();

        if !status.success() {
            return Err(EngineRunError::Tool(stderr_text));
        }

        Ok(DownloadOutcome { reported_filename })
    }

    /// After download, determine the produced file (spec §4.4 "Final path
    /// resolution"): prefer the tool's own reported path (preferring a
    /// converted-extension sibling for audio post-processing), else scan
    /// the session directory, else reconstruct the expected path.
    async fn resolve_final_path(
        &self,
        outcome: &DownloadOutcome,
        session_dir: &Path,
        stem: &str,
        mode: Mode,
        config: &UserConfig,
    ) -> Result<PathBuf, CoreError> {
        let container = match mode {
            Mode::Audio => config.audio_format.extension(),
            Mode::Video => config.video_format.extension(),
        };

        if let Some(reported) = &outcome.reported_filename {
            let reported_path = PathBuf::from(reported);
            if mode == Mode::Audio {
                let converted = reported_path.with_extension(container);
                if tokio::fs::metadata(&converted).await.is_ok() {
                    return Ok(converted);
                }
            }
            if tokio::fs::metadata(&reported_path).await.is_ok() {
                return Ok(reported_path);
            }
        }

        if let Ok(mut entries) = tokio::fs::read_dir(session_dir).await {
            let mut best: Option<(u64, PathBuf)> = None;
            while let Ok(Some(entry)) = entries.next_entry().await {
                let name = entry.file_name().to_string_lossy().into_owned();
                if !name.starts_with(stem) || is_sidecar_of(stem, &name) {
                    continue;
                }
                let Ok(metadata) = entry.metadata().await else {
                    continue;
                };
                if !metadata.is_file() {
                    continue;
                }
                let size = metadata.len();
                if best.as_ref().is_none_or(|(best_size, _)| size > *best_size) {
                    best = Some((size, entry.path()));
                }
            }
            if let Some((_, path)) = best {
                return Ok(path);
            }
        }

        Ok(session_dir.join(format!("{stem}.{container}")))
    }

    async fn clean_sidecars(&self, session_dir: &Path, stem: &str) {
        let Ok(mut entries) = tokio::fs::read_dir(session_dir).await else {
            return;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_sidecar_of(stem, &name) {
                if let Err(e) = tokio::fs::remove_file(entry.path()).await {
                    debug!(file = %name, error = %e, "failed to remove sidecar file");
                }
            }
        }
    }
}

struct DownloadOutcome {
    reported_filename: Option<String>,
}

enum EngineRunError {
    Tool(String),
    Cancelled,
}

fn truncated_stem(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string());
    stem.chars().take(MAX_CURRENT_FILE_LEN).collect()
}

fn humanize_postprocessor(name: &str) -> String {
    match name {
        "FFmpegExtractAudio" => "Extracting audio".to_string(),
        "FFmpegMetadata" => "Tagging metadata".to_string(),
        "FFmpegThumbnailsConvertor" => "Converting thumbnail".to_string(),
        "EmbedThumbnail" => "Embedding cover art".to_string(),
        "SponsorBlock" => "Removing sponsored segments".to_string(),
        other => other.to_string(),
    }
}

fn contains_marker(text: &str, markers: &[&str]) -> bool {
    markers.iter().any(|marker| text.contains(marker))
}

#[async_trait]
impl DownloadEnginePort for ExternalToolEngine {
    async fn download(
        &self,
        request: EngineRequest<'_>,
        config: &UserConfig,
        hooks: Arc<dyn DownloadHooks>,
    ) -> Result<PathBuf, CoreError> {
        let stem = sanitize_stem(&request.target.raw_stem());
        let output_template = request
            .session_dir
            .join(format!("{stem}.%(ext)s"))
            .to_string_lossy()
            .into_owned();

        let forced_client = request.credentials_path.map(|_| "web_creator");

        if request.credentials_path.is_some() {
            let has_formats = self
                .has_playable_formats(&request.target.url, request.credentials_path, forced_client)
                .await?;
            if !has_formats {
                let retried = self
                    .has_playable_formats(&request.target.url, request.credentials_path, None)
                    .await?;
                if !retried {
                    return Err(CoreError::DownloadItemFailed {
                        message: "no playable formats found; credentials may be invalid"
                            .to_string(),
                    });
                }
            }
        }

        let mut include_sponsor_skip = true;
        let mut forced_client = forced_client.map(str::to_string);
        let mut attempts = 0;
        let outcome = loop {
            attempts += 1;
            match self
                .run_once(
                    &request,
                    config,
                    &output_template,
                    include_sponsor_skip,
                    forced_client.as_deref(),
                    &hooks,
                )
                .await
            {
                Ok(outcome) => break outcome,
                Err(EngineRunError::Cancelled) => return Err(CoreError::Cancelled),
                Err(EngineRunError::Tool(stderr)) => {
                    if attempts == 1
                        && include_sponsor_skip
                        && contains_marker(&stderr, SPONSORBLOCK_FAILURE_MARKERS)
                    {
                        warn!("segment-removal post-processor failed, retrying without it");
                        include_sponsor_skip = false;
                        continue;
                    }
                    if attempts == 1
                        && forced_client.is_some()
                        && contains_marker(&stderr, CLIENT_SURFACE_FAILURE_MARKERS)
                    {
                        warn!("forced client rejected by credentialed probe, retrying auto-selected");
                        forced_client = None;
                        continue;
                    }
                    return Err(CoreError::ExternalToolFailed { message: stderr });
                }
            }
        };

        let final_path = self
            .resolve_final_path(&outcome, request.session_dir, &stem, request.mode, config)
            .await?;
        self.clean_sidecars(request.session_dir, &stem).await;
        info!(path = %final_path.display(), "download produced artifact");
        Ok(final_path)
    }
}
