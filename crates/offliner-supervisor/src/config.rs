//! Supervisor startup configuration, layered on [`offliner_core::config::Config`].

use std::path::PathBuf;
use std::time::Duration;

use offliner_core::config::Config;

/// Max time to wait for a freshly started broker to accept connections
/// (spec §4.7: "Wait up to 5 s for the broker to accept connections").
const BROKER_READY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    pub redis_url: String,
    pub app_root: PathBuf,
    pub worker_binary: PathBuf,
    pub broker_ready_timeout: Duration,
}

impl SupervisorConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let core = Config::from_env();
        let app_root =
            PathBuf::from(std::env::var("OFFLINER_APP_ROOT").unwrap_or_else(|_| ".".to_string()));

        Self {
            redis_url: core.redis_url,
            worker_binary: worker_binary_path(std::env::var("OFFLINER_WORKER_BIN").ok()),
            app_root,
            broker_ready_timeout: BROKER_READY_TIMEOUT,
        }
    }
}

/// Resolve the `offliner-worker` binary: `override_path` (from
/// `OFFLINER_WORKER_BIN`) if given, otherwise a sibling of this binary (the
/// usual layout for a workspace release build), falling back to bare-name
/// resolution via `PATH`.
fn worker_binary_path(override_path: Option<String>) -> PathBuf {
    if let Some(path) = override_path {
        return PathBuf::from(path);
    }

    let name = if cfg!(windows) {
        "offliner-worker.exe"
    } else {
        "offliner-worker"
    };

    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(name)))
        .filter(|candidate| candidate.exists())
        .unwrap_or_else(|| PathBuf::from(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_binary_override_wins() {
        assert_eq!(
            worker_binary_path(Some("/opt/offliner/bin/offliner-worker".to_string())),
            PathBuf::from("/opt/offliner/bin/offliner-worker")
        );
    }

    #[test]
    fn worker_binary_falls_back_to_bare_name_when_no_sibling_exists() {
        let expected = if cfg!(windows) {
            "offliner-worker.exe"
        } else {
            "offliner-worker"
        };
        // In a `cargo test` binary the sibling path won't exist, so this
        // should fall through to bare-name `PATH` resolution.
        assert_eq!(worker_binary_path(None), PathBuf::from(expected));
    }
}
