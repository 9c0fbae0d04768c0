//! Port traits: the narrow interfaces adapters implement and the pipeline
//! depends on. Mirrors the teacher's "ports define the contract, adapters
//! satisfy it" split — no adapter crate is named here.

mod broker;
mod download_engine;
mod progress_store;
mod quota_tracker;
mod resolver;

pub use broker::BrokerPort;
pub use download_engine::{DownloadEnginePort, DownloadHooks, EngineRequest, TransferUpdate};
pub use progress_store::ProgressStorePort;
pub use quota_tracker::{QuotaCheck, QuotaTrackerPort};
pub use resolver::ResolverPort;
