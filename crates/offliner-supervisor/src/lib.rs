//! The Supervisor (spec §4.7): the single process an operator starts.
//!
//! Brings up the broker if nothing is listening, launches one worker
//! subprocess, and tears both down in order on SIGINT/SIGTERM (and
//! SIGBREAK, on Windows).

pub mod broker;
pub mod config;
pub mod shutdown;
pub mod worker;

pub use broker::{ensure_broker_running, BrokerHandle};
pub use config::SupervisorConfig;
pub use worker::spawn_worker;
