//! Per-client sliding-window quota tracker (spec §4.6).
//!
//! In-process, mutex-guarded map — spec §5 is explicit that this is not
//! shared across replicas, unlike the Progress Store and Broker.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration as ChronoDuration, Utc};

use offliner_core::config::QuotaLimits;
use offliner_core::domain::QuotaReason;
use offliner_core::ports::{QuotaCheck, QuotaTrackerPort};

#[derive(Default)]
struct ClientWindows {
    hourly: Vec<(DateTime<Utc>, f64)>,
    daily: Vec<(DateTime<Utc>, f64)>,
}

impl ClientWindows {
    fn prune(&mut self, now: DateTime<Utc>) {
        let hour_ago = now - ChronoDuration::hours(1);
        let day_ago = now - ChronoDuration::days(1);
        self.hourly.retain(|(ts, _)| *ts > hour_ago);
        self.daily.retain(|(ts, _)| *ts > day_ago);
    }

    fn hourly_count(&self) -> usize {
        self.hourly.len()
    }

    fn daily_count(&self) -> usize {
        self.daily.len()
    }

    fn hourly_duration_minutes(&self) -> f64 {
        self.hourly.iter().map(|(_, d)| d).sum()
    }

    fn daily_duration_minutes(&self) -> f64 {
        self.daily.iter().map(|(_, d)| d).sum()
    }
}

/// In-process sliding-window tracker of per-client usage.
pub struct QuotaTracker {
    limits: QuotaLimits,
    clients: Mutex<HashMap<String, ClientWindows>>,
}

impl QuotaTracker {
    #[must_use]
    pub fn new(limits: QuotaLimits) -> Self {
        Self {
            limits,
            clients: Mutex::new(HashMap::new()),
        }
    }
}

impl QuotaTrackerPort for QuotaTracker {
    fn check(&self, identity: &str, duration_minutes: f64) -> QuotaCheck {
        // Step 1 doesn't depend on any client's window state.
        if self.limits.check_item_duration(duration_minutes).is_some() {
            return QuotaCheck::Denied {
                reason: QuotaReason::ContentDurationExceeded,
                limit: f64::from(self.limits.max_content_duration_minutes),
                observed: duration_minutes,
            };
        }

        let now = Utc::now();
        let mut clients = self.clients.lock().unwrap();
        let window = clients.entry(identity.to_string()).or_default();
        window.prune(now);

        let hourly_count = window.hourly_count() as u32;
        if hourly_count >= self.limits.downloads_per_hour {
            return QuotaCheck::Denied {
                reason: QuotaReason::HourlyDownloadsExceeded,
                limit: f64::from(self.limits.downloads_per_hour),
                observed: f64::from(hourly_count),
            };
        }

        let daily_count = window.daily_count() as u32;
        if daily_count >= self.limits.downloads_per_day {
            return QuotaCheck::Denied {
                reason: QuotaReason::DailyDownloadsExceeded,
                limit: f64::from(self.limits.downloads_per_day),
                observed: f64::from(daily_count),
            };
        }

        let projected_hourly = window.hourly_duration_minutes() + duration_minutes;
        if projected_hourly >= f64::from(self.limits.duration_minutes_per_hour) {
            return QuotaCheck::Denied {
                reason: QuotaReason::HourlyDurationExceeded,
                limit: f64::from(self.limits.duration_minutes_per_hour),
                observed: projected_hourly,
            };
        }

        let projected_daily = window.daily_duration_minutes() + duration_minutes;
        if projected_daily >= f64::from(self.limits.duration_minutes_per_day) {
            return QuotaCheck::Denied {
                reason: QuotaReason::DailyDurationExceeded,
                limit: f64::from(self.limits.duration_minutes_per_day),
                observed: projected_daily,
            };
        }

        QuotaCheck::Allowed
    }

    fn record(&self, identity: &str, duration_minutes: f64, count: u32) {
        let now = Utc::now();
        let mut clients = self.clients.lock().unwrap();
        let window = clients.entry(identity.to_string()).or_default();
        window.prune(now);
        for _ in 0..count {
            window.hourly.push((now, duration_minutes));
            window.daily.push((now, duration_minutes));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker_with(downloads_per_hour: u32) -> QuotaTracker {
        let mut limits = QuotaLimits::default();
        limits.downloads_per_hour = downloads_per_hour;
        QuotaTracker::new(limits)
    }

    #[test]
    fn allows_until_hourly_count_cap_then_denies() {
        let tracker = tracker_with(2);
        assert!(tracker.check("client-a", 3.0).is_allowed());
        tracker.record("client-a", 3.0, 1);
        assert!(tracker.check("client-a", 3.0).is_allowed());
        tracker.record("client-a", 3.0, 1);
        // Third request: hourly count has reached the cap (2), denied.
        match tracker.check("client-a", 3.0) {
            QuotaCheck::Denied { reason, .. } => {
                assert_eq!(reason, QuotaReason::HourlyDownloadsExceeded);
            }
            QuotaCheck::Allowed => panic!("expected denial at the cap"),
        }
    }

    #[test]
    fn per_client_windows_are_independent() {
        let tracker = tracker_with(1);
        tracker.record("client-a", 3.0, 1);
        assert!(!tracker.check("client-a", 3.0).is_allowed());
        assert!(tracker.check("client-b", 3.0).is_allowed());
    }

    #[test]
    fn single_item_duration_cap_checked_before_window_state() {
        let tracker = tracker_with(10);
        match tracker.check("client-a", 9999.0) {
            QuotaCheck::Denied { reason, .. } => {
                assert_eq!(reason, QuotaReason::ContentDurationExceeded);
            }
            QuotaCheck::Allowed => panic!("expected content duration denial"),
        }
    }

    #[test]
    fn projected_hourly_duration_tie_is_denied() {
        let mut limits = QuotaLimits::default();
        limits.duration_minutes_per_hour = 10;
        let tracker = QuotaTracker::new(limits);
        tracker.record("client-a", 5.0, 1);
        // 5 (already recorded) + 5 (this request) == 10 == cap -> denied.
        match tracker.check("client-a", 5.0) {
            QuotaCheck::Denied { reason, .. } => {
                assert_eq!(reason, QuotaReason::HourlyDurationExceeded);
            }
            QuotaCheck::Allowed => panic!("expected a tie-at-cap denial"),
        }
    }
}
