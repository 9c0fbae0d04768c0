//! Redis-backed Task Broker + Queue (spec §4.2).

mod memory;
mod redis_broker;

pub use memory::InMemoryBroker;
pub use redis_broker::RedisBroker;

/// Job timeout (spec §4.2/§5): the longest a worker lets a single dequeued
/// job run before treating it as stuck. The worker's dequeue loop wraps
/// `JobPipeline::execute` in a `tokio::time::timeout` of this length.
pub const JOB_TIMEOUT_SECS: u64 = 30 * 60;
