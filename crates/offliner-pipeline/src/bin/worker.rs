//! The worker process (spec §5 "Worker Pool"): composition root wiring the
//! concrete Redis-backed adapters to `JobPipeline` and running the
//! dequeue loop. This is the one place in the workspace allowed to depend
//! on every adapter crate — everything else talks only to `offliner-core`'s
//! ports.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{error, info, warn};

use offliner_broker::{RedisBroker, JOB_TIMEOUT_SECS};
use offliner_core::config::Config;
use offliner_core::config::PlatformBCredentials;
use offliner_core::domain::RequestId;
use offliner_core::ports::{BrokerPort, ProgressStorePort};
use offliner_download::ExternalToolEngine;
use offliner_pipeline::JobPipeline;
use offliner_quota::QuotaTracker;
use offliner_resolver::{MediaResolver, PlatformBClient, YoutubeToolClient};
use offliner_store::RedisProgressStore;

const DEQUEUE_TIMEOUT: Duration = Duration::from_secs(5);
const JOB_TIMEOUT: Duration = Duration::from_secs(JOB_TIMEOUT_SECS);

/// Exit codes (spec §6 "worker binary"): 0 on clean shutdown, non-zero on
/// broker unreachable or fatal worker error — `anyhow::Result` gets this for
/// free from `#[tokio::main]`, which exits 1 and prints the error chain on
/// `Err`.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_root = std::env::var("OFFLINER_APP_ROOT").unwrap_or_else(|_| ".".to_string());
    offliner_core::logging::init_tracing(&PathBuf::from(&app_root).join("logs"), "offliner-worker");

    let config = Config::from_env();
    let temp_root = PathBuf::from(&app_root).join("Downloads").join("Temp");
    let output_root = PathBuf::from(&app_root).join("Downloads").join("Output");

    let broker = RedisBroker::connect(&config.redis_url)
        .await
        .context("failed to connect to broker")?;
    let progress: Arc<dyn ProgressStorePort> = Arc::new(
        RedisProgressStore::connect(&config.redis_url)
            .await
            .context("failed to connect to progress store")?,
    );

    let platform_b = platform_b_client(&config.platform_b);
    let resolver = MediaResolver::with_quota_limits(YoutubeToolClient::new(), platform_b, config.quota);
    let engine = ExternalToolEngine::new();
    let quota = Arc::new(QuotaTracker::new(config.quota));

    let pipeline = JobPipeline::new(
        Arc::new(resolver),
        Arc::new(engine),
        Arc::clone(&progress),
        quota,
        temp_root,
        output_root,
    );

    info!("worker ready, polling for jobs");
    run(broker, pipeline, progress).await;
    Ok(())
}

fn platform_b_client(credentials: &PlatformBCredentials) -> Option<PlatformBClient> {
    credentials
        .is_configured()
        .then(|| PlatformBClient::new(credentials.clone(), reqwest::Client::new()))
}

async fn run(broker: RedisBroker, pipeline: JobPipeline, progress: Arc<dyn ProgressStorePort>) {
    let mut shutdown = shutdown_signal();

    loop {
        tokio::select! {
            biased;
            () = &mut shutdown => {
                info!("shutdown signal received, draining");
                break;
            }
            dequeued = broker.dequeue(DEQUEUE_TIMEOUT) => {
                match dequeued {
                    Ok(Some(job)) => {
                        let request_id = job.request_id;
                        if tokio::time::timeout(JOB_TIMEOUT, pipeline.execute(job)).await.is_err() {
                            warn!(%request_id, "job exceeded timeout, marking errored");
                            mark_timed_out(&progress, request_id).await;
                        }
                        if let Err(e) = broker.ack(request_id).await {
                            warn!(%request_id, error = %e, "failed to ack completed job");
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        error!(error = %e, "dequeue failed, backing off");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        }
    }
}

/// The job's own task tree is dropped with the timed-out future, so no
/// terminal state is ever published for it — publish one here instead,
/// then still `ack` so the broker doesn't redeliver it forever.
async fn mark_timed_out(progress: &Arc<dyn ProgressStorePort>, request_id: RequestId) {
    if let Err(e) = progress
        .update(request_id, &mut |record| {
            record.mark_error("job exceeded the maximum allowed runtime".to_string());
        })
        .await
    {
        warn!(%request_id, error = %e, "failed to publish timeout error state");
    }
}

#[cfg(unix)]
fn shutdown_signal() -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>> {
    use tokio::signal::unix::{signal, SignalKind};
    Box::pin(async {
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        let mut int = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
        tokio::select! {
            _ = term.recv() => {}
            _ = int.recv() => {}
        }
    })
}

#[cfg(not(unix))]
fn shutdown_signal() -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>> {
    Box::pin(async {
        let _ = tokio::signal::ctrl_c().await;
    })
}
