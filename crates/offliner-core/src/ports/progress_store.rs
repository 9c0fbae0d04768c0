//! The Progress Store port (spec §4.1).

use async_trait::async_trait;

use crate::domain::{ProgressRecord, RequestId};
use crate::error::CoreError;

/// A process-external, TTL'd keyed store of `ProgressRecord`s.
///
/// Implementations fail with `CoreError::StoreUnavailable` when the backing
/// service is unreachable; per spec §4.1, callers log and continue where
/// possible rather than propagating that failure as a job-ending error.
#[async_trait]
pub trait ProgressStorePort: Send + Sync {
    /// Create a fresh record with TTL=3600s. Fails if a live (non-expired)
    /// record already exists for `id` — spec §4.1 treats a duplicate
    /// `create` as a client bug, not a silent overwrite.
    async fn create(&self, id: RequestId, total_items: u32, temp_dir: &str)
    -> Result<(), CoreError>;

    /// Merge `mutate`'s changes into the stored record, preserving the
    /// remaining TTL. A no-op if the key is absent.
    async fn update(
        &self,
        id: RequestId,
        mutate: &mut (dyn FnMut(&mut ProgressRecord) + Send),
    ) -> Result<(), CoreError>;

    /// The current record, or the synthetic "Unknown" record (spec §4.1)
    /// if absent.
    async fn get(&self, id: RequestId) -> ProgressRecord;

    /// Set `cancel_requested=true`, preserving TTL. Monotonic: never
    /// clears the flag once set.
    async fn request_cancel(&self, id: RequestId) -> Result<(), CoreError>;

    /// The current value of `cancel_requested`.
    async fn is_cancelled(&self, id: RequestId) -> Result<bool, CoreError>;

    /// Delete the key outright.
    async fn remove(&self, id: RequestId) -> Result<(), CoreError>;
}
