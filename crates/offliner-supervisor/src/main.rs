//! Operator entry point (spec §4.7): the single process an operator starts.
//! Brings up the broker, launches one worker, and tears both down in order
//! on shutdown.

use offliner_supervisor::{ensure_broker_running, spawn_worker, SupervisorConfig};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = SupervisorConfig::from_env();
    offliner_core::logging::init_tracing(&config.app_root.join("logs"), "offliner-supervisor");

    let broker = ensure_broker_running(&config.redis_url, config.broker_ready_timeout).await?;
    let mut worker = spawn_worker(&config.worker_binary, &config.app_root)?;

    info!("supervisor ready");

    tokio::select! {
        () = offliner_supervisor::shutdown::wait_for_shutdown_signal() => {
            info!("shutdown signal received, stopping worker");
        }
        status = worker.wait() => {
            match status {
                Ok(status) => warn!(%status, "worker exited on its own"),
                Err(e) => error!(error = %e, "failed to wait on worker"),
            }
        }
    }

    if let Err(e) = offliner_supervisor::shutdown::shutdown_child(worker).await {
        warn!(error = %e, "failed to stop worker cleanly");
    }
    broker.shutdown().await;

    Ok(())
}
