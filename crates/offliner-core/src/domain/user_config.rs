//! `UserConfig` — the validated snapshot of recognized options (spec §3).

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Bitrate/resolution selector tier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Min,
    #[default]
    Avg,
    Max,
}

/// Final container/codec for audio output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Wav,
    M4a,
    Flac,
}

impl AudioFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::M4a => "m4a",
            Self::Flac => "flac",
        }
    }

    /// Whether this container can carry embedded cover art (spec §4.4).
    #[must_use]
    pub const fn supports_embedded_art(self) -> bool {
        matches!(self, Self::Mp3 | Self::M4a | Self::Flac)
    }
}

/// Final container for video output. Spec §9 Open Questions adopts the
/// modern set (`mp4`, `mov`, `mkv`, `webm`) over the legacy
/// (`mp4`, `mov`, `avi`, `flv`) one found in an older source variant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoFormat {
    #[default]
    Mp4,
    Mov,
    Mkv,
    Webm,
}

impl VideoFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Mov => "mov",
            Self::Mkv => "mkv",
            Self::Webm => "webm",
        }
    }

    /// Whether this container can carry embedded cover art (spec §4.4).
    #[must_use]
    pub const fn supports_embedded_art(self) -> bool {
        matches!(self, Self::Mp4 | Self::Mov | Self::Mkv)
    }
}

/// Per-item override: a target reference maps to a small record of just
/// `{mode, audio_format, video_format}` (spec §9 Design Notes), not a
/// heterogeneous dict.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemOverrides {
    pub mode: Option<super::Mode>,
    pub audio_format: Option<AudioFormat>,
    pub video_format: Option<VideoFormat>,
}

/// A validated snapshot of recognized options (spec §3 table).
///
/// Defaults carry no embedded credentials — spec §9 Open Questions treats
/// the source's hard-coded `DEFAULT_CONFIG` credentials as a security bug
/// and requires empty defaults here.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    pub quality: Quality,
    pub audio_format: AudioFormat,
    pub video_format: VideoFormat,
    pub want_audio: bool,
    pub want_video: bool,
    pub prefer_alternate_source: bool,
    pub embed_metadata: bool,
    pub sponsor_skip_enabled: bool,
    pub sponsor_skip_categories: HashSet<String>,
    /// Raw authentication cookie text, mutually optional with `credentials_path`.
    /// Never logged in full (spec §3 invariant): `UserConfig`'s hand-written
    /// `Debug` impl below prints `"<redacted>"` for this field instead of
    /// deriving it.
    pub credentials_blob: Option<String>,
    pub credentials_path: Option<String>,
    pub max_download_workers: u32,
}

impl std::fmt::Debug for UserConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserConfig")
            .field("quality", &self.quality)
            .field("audio_format", &self.audio_format)
            .field("video_format", &self.video_format)
            .field("want_audio", &self.want_audio)
            .field("want_video", &self.want_video)
            .field("prefer_alternate_source", &self.prefer_alternate_source)
            .field("embed_metadata", &self.embed_metadata)
            .field("sponsor_skip_enabled", &self.sponsor_skip_enabled)
            .field("sponsor_skip_categories", &self.sponsor_skip_categories)
            .field("credentials_blob", &self.credentials_blob.as_ref().map(|_| "<redacted>"))
            .field("credentials_path", &self.credentials_path.as_ref().map(|_| "<redacted>"))
            .field("max_download_workers", &self.max_download_workers)
            .finish()
    }
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            quality: Quality::default(),
            audio_format: AudioFormat::default(),
            video_format: VideoFormat::default(),
            want_audio: true,
            want_video: false,
            prefer_alternate_source: false,
            embed_metadata: true,
            sponsor_skip_enabled: false,
            sponsor_skip_categories: HashSet::new(),
            credentials_blob: None,
            credentials_path: None,
            max_download_workers: 4,
        }
    }
}

impl UserConfig {
    /// Validate constraints not expressible in the type system
    /// (`max_download_workers >= 1`, at most one credentials source).
    pub fn validate(&self) -> Result<(), String> {
        if self.max_download_workers < 1 {
            return Err("max_download_workers must be >= 1".to_string());
        }
        if self.credentials_blob.is_some() && self.credentials_path.is_some() {
            return Err("credentials_blob and credentials_path are mutually exclusive".to_string());
        }
        Ok(())
    }

    /// The modes requested for a target, honoring its per-item override
    /// when present (spec §4.5 step 5).
    #[must_use]
    pub fn effective_modes(&self, overrides: Option<&ItemOverrides>) -> Vec<super::Mode> {
        if let Some(mode) = overrides.and_then(|o| o.mode) {
            return vec![mode];
        }
        let mut modes = Vec::with_capacity(2);
        if self.want_audio {
            modes.push(super::Mode::Audio);
        }
        if self.want_video {
            modes.push(super::Mode::Video);
        }
        modes
    }
}

/// Target reference -> per-item override map (spec §3 `Request` field).
pub type ItemOverridesMap = HashMap<String, ItemOverrides>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_no_credentials() {
        let cfg = UserConfig::default();
        assert!(cfg.credentials_blob.is_none());
        assert!(cfg.credentials_path.is_none());
    }

    #[test]
    fn rejects_zero_workers() {
        let mut cfg = UserConfig::default();
        cfg.max_download_workers = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_both_credential_sources() {
        let mut cfg = UserConfig::default();
        cfg.credentials_blob = Some("blob".to_string());
        cfg.credentials_path = Some("/tmp/cookies.txt".to_string());
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn item_override_mode_wins_over_want_flags() {
        let cfg = UserConfig::default(); // want_audio=true, want_video=false
        let overrides = ItemOverrides {
            mode: Some(super::Mode::Video),
            ..Default::default()
        };
        assert_eq!(cfg.effective_modes(Some(&overrides)), vec![super::Mode::Video]);
    }
}
