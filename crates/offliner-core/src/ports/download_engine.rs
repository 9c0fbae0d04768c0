//! The Download Engine port (spec §4.4) and its progress/post-process hooks
//! (spec §4.4.1).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{ItemOverrides, Mode, Target, UserConfig};
use crate::error::CoreError;

/// A single byte-transfer callback from the external media tool.
#[derive(Clone, Debug, Default)]
pub struct TransferUpdate {
    pub bytes_downloaded: u64,
    pub bytes_total: Option<u64>,
    pub speed: Option<String>,
    pub eta: Option<String>,
    /// Current filename stem, already truncated to 60 chars (spec §4.4.1).
    pub current_file: String,
}

/// The two hooks the Download Engine installs on the external media tool
/// (spec §4.4.1). Implemented by the Job Pipeline, bridging into the
/// Progress Store; the engine itself never talks to the store directly.
pub trait DownloadHooks: Send + Sync {
    /// Called on every reported byte update. Returning
    /// `Err(CoreError::Cancelled)` tells the engine to raise a
    /// tool-specific abort the external tool surfaces as a clean
    /// cancellation (spec §4.4.1 "Before returning, check
    /// `is_cancelled`").
    fn on_transfer(&self, item_local_percent: u8, update: &TransferUpdate) -> Result<(), CoreError>;

    /// Called when a post-processor starts (`started` event). `name` is
    /// the humanized post-processor name.
    fn on_postprocess_started(&self, name: &str);
}

/// Everything the engine needs for one (target, mode) download, beyond the
/// `UserConfig`/override already folded into the call.
#[derive(Clone, Debug)]
pub struct EngineRequest<'a> {
    pub target: &'a Target,
    pub mode: Mode,
    pub overrides: Option<&'a ItemOverrides>,
    pub session_dir: &'a Path,
    pub credentials_path: Option<&'a Path>,
}

/// Produces exactly one on-disk artifact for one (Target, Mode, effective
/// UserConfig) tuple, inside a caller-supplied session directory.
#[async_trait]
pub trait DownloadEnginePort: Send + Sync {
    async fn download(
        &self,
        request: EngineRequest<'_>,
        config: &UserConfig,
        hooks: Arc<dyn DownloadHooks>,
    ) -> Result<PathBuf, CoreError>;
}
