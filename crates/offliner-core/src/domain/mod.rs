//! Pure domain types. No I/O, no adapter dependencies.

mod ids;
mod job;
mod platform;
mod progress;
mod quota;
mod request;
mod session;
mod target;
mod user_config;

pub use ids::RequestId;
pub use job::Job;
pub use platform::Platform;
pub use progress::{ProgressPhase, ProgressRecord};
pub use quota::QuotaReason;
pub use request::Request;
pub use session::Session;
pub use target::{Mode, Target};
pub use user_config::{AudioFormat, ItemOverrides, ItemOverridesMap, Quality, UserConfig, VideoFormat};
