//! The Quota Tracker port (spec §4.6).

use crate::domain::QuotaReason;

/// Result of a `check` call: either allowed, or denied with the offending
/// reason and the numbers that triggered it (spec §4.6 "returns
/// allowed/denied plus a reason tag and the offending numbers").
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum QuotaCheck {
    Allowed,
    Denied {
        reason: QuotaReason,
        limit: f64,
        observed: f64,
    },
}

impl QuotaCheck {
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Per-client (by opaque identity token) sliding-window usage tracker.
/// In-process, not shared across replicas — matching spec §5 ("Quota
/// Tracker: in-process, mutex-guarded map").
pub trait QuotaTrackerPort: Send + Sync {
    /// Evaluate whether `identity` may make one more request for an item
    /// of `duration_minutes`, without mutating any counters.
    fn check(&self, identity: &str, duration_minutes: f64) -> QuotaCheck;

    /// Append `count` timestamped entries of `duration_minutes` each to
    /// both the hourly and daily windows for `identity`.
    fn record(&self, identity: &str, duration_minutes: f64, count: u32);
}
