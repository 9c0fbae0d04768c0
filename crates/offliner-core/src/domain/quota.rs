//! The reason tags a `QuotaTracker` check can return (spec §4.6).

use serde::{Deserialize, Serialize};

/// Which quota check failed, in the order §4.6 evaluates them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaReason {
    ContentDurationExceeded,
    HourlyDownloadsExceeded,
    DailyDownloadsExceeded,
    HourlyDurationExceeded,
    DailyDurationExceeded,
}

impl QuotaReason {
    /// Wire-format tag, e.g. `"hourly_downloads_exceeded"` (spec §6, the
    /// HTTP edge's 429 `reason` field).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ContentDurationExceeded => "content_duration_exceeded",
            Self::HourlyDownloadsExceeded => "hourly_downloads_exceeded",
            Self::DailyDownloadsExceeded => "daily_downloads_exceeded",
            Self::HourlyDurationExceeded => "hourly_duration_exceeded",
            Self::DailyDurationExceeded => "daily_duration_exceeded",
        }
    }

    #[must_use]
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::ContentDurationExceeded => "This item is longer than the allowed single-item duration.",
            Self::HourlyDownloadsExceeded => "You've reached the hourly download limit.",
            Self::DailyDownloadsExceeded => "You've reached the daily download limit.",
            Self::HourlyDurationExceeded => "You've reached the hourly content duration limit.",
            Self::DailyDurationExceeded => "You've reached the daily content duration limit.",
        }
    }
}
