//! The narrow seam the HTTP edge depends on (spec §9 Design Notes
//! "Cyclic risk"): routes never see `BrokerPort`/`ProgressStorePort`/
//! `QuotaTrackerPort` directly, only `JobService`.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use offliner_core::domain::{ProgressRecord, Request, RequestId};
use offliner_core::error::CoreError;
use offliner_core::ports::{BrokerPort, ProgressStorePort, QuotaCheck, QuotaTrackerPort};
use offliner_quota::QuotaTracker;

/// Everything a route handler needs to accept a download request and
/// observe its progress, without naming broker/store/quota concretely.
#[async_trait]
pub trait JobService: Send + Sync {
    /// Validate, quota-check, create the Progress Record, enqueue the job.
    async fn enqueue(&self, request: Request) -> Result<RequestId, CoreError>;

    /// The current Progress Record for `id` (the synthetic "Unknown"
    /// record if absent).
    async fn observe(&self, id: RequestId) -> ProgressRecord;

    /// Set the cooperative cancellation flag (spec §6 "Client disconnect
    /// ⇒ `request_cancel(request_id)`").
    async fn request_cancel(&self, id: RequestId) -> Result<(), CoreError>;

    /// Evict the Progress Record outright (spec §6 `GET /download_file`:
    /// "schedules Progress Record removal after ~30s").
    async fn forget(&self, id: RequestId);
}

/// The concrete `JobService`: Redis broker + Redis progress store + the
/// in-process quota tracker, wired together at startup.
pub struct DefaultJobService {
    pub broker: Arc<dyn BrokerPort>,
    pub progress: Arc<dyn ProgressStorePort>,
    pub quota: Arc<QuotaTracker>,
    pub temp_root: PathBuf,
}

#[async_trait]
impl JobService for DefaultJobService {
    async fn enqueue(&self, request: Request) -> Result<RequestId, CoreError> {
        request
            .validate()
            .map_err(|message| CoreError::InputInvalid { message })?;

        // Per-target durations aren't known until the worker's Media Resolver
        // runs; this is a coarse pre-resolution gate against the download-count
        // caps only (duration 0.0 can never trip the content-duration cap). The
        // pipeline re-checks and records real per-target durations once they're
        // known, before dispatching downloads.
        let check = self.quota.check(&request.client_identity, 0.0);
        if let QuotaCheck::Denied { reason, limit, observed } = check {
            return Err(CoreError::QuotaExceeded { reason, limit, observed });
        }

        let session_dir = self.temp_root.join(request.request_id.to_string());
        self.progress
            .create(request.request_id, 0, &session_dir.to_string_lossy())
            .await?;

        let job = offliner_core::domain::Job::from_request(
            &request,
            session_dir.to_string_lossy().into_owned(),
            String::new(),
        );

        if let Err(e) = self.broker.enqueue(job).await {
            let _ = self.progress.remove(request.request_id).await;
            return Err(e);
        }

        Ok(request.request_id)
    }

    async fn observe(&self, id: RequestId) -> ProgressRecord {
        self.progress.get(id).await
    }

    async fn request_cancel(&self, id: RequestId) -> Result<(), CoreError> {
        self.progress.request_cancel(id).await
    }

    async fn forget(&self, id: RequestId) {
        let _ = self.progress.remove(id).await;
    }
}

/// Shared application state threaded through every handler.
pub type AppState = Arc<dyn JobService>;
