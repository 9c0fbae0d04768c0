//! Shared `tracing` setup for the long-running binaries (supervisor, worker).
//!
//! Logs to stdout and to a daily-rotating file under `logs/`, matching the
//! teacher's Tauri entry point, which layers the same two writers behind a
//! single `EnvFilter`.

use std::path::Path;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize the global `tracing` subscriber for `app_name`, rotating logs
/// daily under `log_dir` (spec §6 filesystem layout: `<app-root>/logs/`).
///
/// `RUST_LOG` overrides the default filter (`info`). Safe to call more than
/// once per process; later calls are ignored.
pub fn init_tracing(log_dir: &Path, app_name: &str) {
    if let Err(e) = std::fs::create_dir_all(log_dir) {
        eprintln!("failed to create log directory {}: {e}", log_dir.display());
    }

    let file_appender = tracing_appender::rolling::daily(log_dir, app_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    // Leaked deliberately: the guard must outlive every subsequent log call,
    // and these processes only exit by being killed or calling `std::process::exit`.
    std::mem::forget(guard);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .try_init();
}
