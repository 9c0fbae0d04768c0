//! Redis-backed Progress Store (spec §4.1).

mod memory;
mod redis_store;

pub use memory::InMemoryProgressStore;
pub use redis_store::RedisProgressStore;

/// TTL applied to every progress record (spec §4.1 "Sets TTL=3600 s").
pub const PROGRESS_TTL_SECS: u64 = 3600;
