//! Environment-driven configuration (spec §6 "Environment variables
//! recognized by the core").
//!
//! Read once at process startup (supervisor, worker, and HTTP edge binaries
//! each call [`Config::from_env`]) into a plain struct, rather than reaching
//! for `std::env::var` scattered through call sites.

use std::env;

use crate::domain::QuotaReason;

fn env_u32(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Quota windows and limits (spec §4.6 "Windows & limits"), overridable via
/// environment variables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuotaLimits {
    pub downloads_per_hour: u32,
    pub downloads_per_day: u32,
    pub duration_minutes_per_hour: u32,
    pub duration_minutes_per_day: u32,
    pub max_content_duration_minutes: u32,
    pub max_playlist_items: u32,
}

impl Default for QuotaLimits {
    fn default() -> Self {
        Self {
            downloads_per_hour: 10,
            downloads_per_day: 50,
            duration_minutes_per_hour: 120,
            duration_minutes_per_day: 600,
            max_content_duration_minutes: 60,
            max_playlist_items: 100,
        }
    }
}

impl QuotaLimits {
    #[must_use]
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            downloads_per_hour: env_u32("MAX_DOWNLOADS_PER_HOUR", default.downloads_per_hour),
            downloads_per_day: env_u32("MAX_DOWNLOADS_PER_DAY", default.downloads_per_day),
            duration_minutes_per_hour: env_u32(
                "MAX_DURATION_PER_HOUR",
                default.duration_minutes_per_hour,
            ),
            duration_minutes_per_day: env_u32(
                "MAX_DURATION_PER_DAY",
                default.duration_minutes_per_day,
            ),
            max_content_duration_minutes: env_u32(
                "MAX_CONTENT_DURATION",
                default.max_content_duration_minutes,
            ),
            max_playlist_items: env_u32("MAX_PLAYLIST_ITEMS", default.max_playlist_items),
        }
    }

    /// Returns the first quota-limit violation for a single-item check
    /// (spec §4.6 step 1), independent of any sliding-window state.
    ///
    /// Spec §4.6: "Ties (equal to cap) are violations" — a value exactly
    /// at the cap is rejected, not just values above it.
    #[must_use]
    pub fn check_item_duration(&self, duration_minutes: f64) -> Option<QuotaReason> {
        (duration_minutes >= f64::from(self.max_content_duration_minutes))
            .then_some(QuotaReason::ContentDurationExceeded)
    }

    /// Returns whether a playlist's item count exceeds the configured cap
    /// (spec §8 boundary: exactly the cap is accepted, one more is rejected).
    #[must_use]
    pub fn playlist_exceeds_cap(&self, item_count: usize) -> bool {
        item_count as u64 > u64::from(self.max_playlist_items)
    }
}

/// Credentials for the platform-B (Spotify-like) metadata API.
#[derive(Clone, Debug, Default)]
pub struct PlatformBCredentials {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl PlatformBCredentials {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            client_id: env::var("PLATFORM_B_CLIENT_ID").ok(),
            client_secret: env::var("PLATFORM_B_CLIENT_SECRET").ok(),
        }
    }

    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }
}

/// Top-level process configuration, assembled once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    /// Broker/progress-store connection string (spec §6 `REDIS_URL`).
    pub redis_url: String,
    pub quota: QuotaLimits,
    pub platform_b: PlatformBCredentials,
}

impl Config {
    /// Load configuration from the environment, loading a local `.env`
    /// first if present (matching the teacher's CLI crate, which depends
    /// on `dotenvy` for exactly this).
    #[must_use]
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self {
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379/0".to_string()),
            quota: QuotaLimits::from_env(),
            platform_b: PlatformBCredentials::from_env(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_limits_default_matches_spec() {
        let limits = QuotaLimits::default();
        assert_eq!(limits.downloads_per_hour, 10);
        assert_eq!(limits.downloads_per_day, 50);
        assert_eq!(limits.duration_minutes_per_hour, 120);
        assert_eq!(limits.duration_minutes_per_day, 600);
        assert_eq!(limits.max_content_duration_minutes, 60);
        assert_eq!(limits.max_playlist_items, 100);
    }

    #[test]
    fn playlist_boundary_is_inclusive_of_cap() {
        let limits = QuotaLimits::default();
        assert!(!limits.playlist_exceeds_cap(100));
        assert!(limits.playlist_exceeds_cap(101));
    }

    #[test]
    fn item_duration_tie_at_cap_is_a_violation() {
        let limits = QuotaLimits::default();
        assert!(limits.check_item_duration(60.0).is_some());
        assert!(limits.check_item_duration(59.9).is_none());
    }
}
