//! Shared error taxonomy (spec §7).
//!
//! Designed to be serializable so it can ride inside a `ProgressRecord`
//! or cross a process boundary (HTTP edge <-> worker) without depending on
//! non-serializable types like `std::io::Error`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::QuotaReason;

/// Top-level error taxonomy shared across the core.
///
/// Adapter crates (store, broker, resolver, download engine) define their
/// own narrower `thiserror` enums for internal use and convert into this one
/// at the pipeline boundary, matching the teacher's pattern of keeping
/// per-adapter errors out of the cross-crate contract.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum CoreError {
    /// Empty input, malformed JSON, or a playlist exceeding the configured
    /// item cap. Surfaced to HTTP as 400.
    #[error("invalid input: {message}")]
    InputInvalid {
        /// Human-readable detail.
        message: String,
    },

    /// One of the five quota reasons in spec §4.6. Surfaced to HTTP as 429.
    #[error("quota exceeded: {reason:?}")]
    QuotaExceeded {
        /// Which check failed.
        reason: QuotaReason,
        /// The limit that was hit.
        limit: f64,
        /// The value that would have resulted.
        observed: f64,
    },

    /// No targets remained after classification/search.
    #[error("resolution failed: {message}")]
    ResolutionFailed {
        /// Human-readable detail.
        message: String,
    },

    /// A single (target, mode) task failed; the pipeline continues.
    #[error("item failed: {message}")]
    DownloadItemFailed {
        /// Human-readable detail.
        message: String,
    },

    /// Every item in the job failed.
    #[error("all items failed")]
    DownloadAllFailed,

    /// The external media tool raised something the engine doesn't
    /// recognize as one of its known-failure fallback markers.
    #[error("external tool failed: {message}")]
    ExternalToolFailed {
        /// Human-readable detail.
        message: String,
    },

    /// The progress store is unreachable.
    #[error("progress store unavailable: {message}")]
    StoreUnavailable {
        /// Human-readable detail.
        message: String,
    },

    /// The task broker is unreachable.
    #[error("broker unavailable: {message}")]
    BrokerUnavailable {
        /// Human-readable detail.
        message: String,
    },

    /// Cooperative cancellation was observed.
    #[error("cancelled by client disconnect")]
    Cancelled,
}

impl CoreError {
    /// The message a caller should show a user, independent of which
    /// variant this is.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InputInvalid { message }
            | Self::ResolutionFailed { message }
            | Self::DownloadItemFailed { message }
            | Self::ExternalToolFailed { message }
            | Self::StoreUnavailable { message }
            | Self::BrokerUnavailable { message } => message.clone(),
            Self::QuotaExceeded { reason, .. } => reason.user_message().to_string(),
            Self::DownloadAllFailed => "All items failed to download".to_string(),
            Self::Cancelled => "Cancelled by client disconnect".to_string(),
        }
    }
}
