//! The Task Broker + Queue port (spec §4.2).

use async_trait::async_trait;

use crate::domain::Job;
use crate::error::CoreError;

/// Durable FIFO dispatch from the HTTP edge to the worker pool.
///
/// Guarantees at-least-once delivery. `enqueue` fails synchronously on
/// broker outage (spec §4.2 "Failure modes"); the HTTP edge reports an
/// error rather than accepting the request and losing it silently.
#[async_trait]
pub trait BrokerPort: Send + Sync {
    /// Enqueue `job`. The caller (HTTP edge) has already refused a
    /// duplicate `request_id`; the broker does not re-check this.
    async fn enqueue(&self, job: Job) -> Result<(), CoreError>;

    /// Block until a job is available or `timeout` elapses, returning
    /// `None` on timeout so the worker loop can check its own shutdown
    /// signal between polls. The job stays in an in-flight set until
    /// `ack`, so a worker crash leaves it eligible for redelivery
    /// (spec §4.2 "Failure modes").
    async fn dequeue(&self, timeout: std::time::Duration) -> Result<Option<Job>, CoreError>;

    /// Acknowledge that `request_id` finished (successfully or not),
    /// removing it from the in-flight set (spec §4.2 "acknowledgment
    /// happens when the worker completes or fails").
    async fn ack(&self, request_id: crate::domain::RequestId) -> Result<(), CoreError>;
}
