//! A concrete downloadable item, and the audio/video mode it is fetched in.

use serde::{Deserialize, Serialize};

use super::Platform;

/// Which artifact to produce for a given `Target`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    Audio,
    Video,
}

impl Mode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }
}

/// A single concrete item to download, produced by the Media Resolver and
/// consumed by the Download Engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// Opaque source identifier (e.g. a YouTube video id).
    pub source_id: String,
    /// The URL the Download Engine should hand to the external media tool.
    pub url: String,
    pub title: String,
    pub uploader: String,
    /// Duration in seconds, when known.
    pub duration_secs: Option<u64>,
    pub platform: Platform,
    /// Per-item format override, if the caller supplied one for this target.
    pub override_mode: Option<Mode>,
}

impl Target {
    #[must_use]
    pub fn new(
        source_id: impl Into<String>,
        url: impl Into<String>,
        title: impl Into<String>,
        uploader: impl Into<String>,
        platform: Platform,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            url: url.into(),
            title: title.into(),
            uploader: uploader.into(),
            duration_secs: None,
            platform,
            override_mode: None,
        }
    }

    #[must_use]
    pub const fn with_duration(mut self, seconds: u64) -> Self {
        self.duration_secs = Some(seconds);
        self
    }

    /// The "{title} - {uploader}" stem, before sanitization (spec §4.4 "Path
    /// convention").
    #[must_use]
    pub fn raw_stem(&self) -> String {
        format!("{} - {}", self.title, self.uploader)
    }
}
