//! Broker liveness check and local bring-up (spec §4.7, supplemented by
//! `original_source/services.py`'s local `redis-server` bring-up: start one
//! only if nothing is listening, wait up to 5s for it to accept
//! connections, and never kill a broker this process did not start).

use std::time::Duration;

use redis::ConnectionAddr;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::shutdown::shutdown_child;

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// The broker this process is relying on. `child` is `Some` only when this
/// process started it itself — the only case in which it's also this
/// process's job to stop it.
pub struct BrokerHandle {
    child: Option<Child>,
}

impl BrokerHandle {
    #[must_use]
    pub const fn started_by_us(&self) -> bool {
        self.child.is_some()
    }

    /// Stop the broker, but only if this process started it.
    pub async fn shutdown(self) {
        let Some(child) = self.child else {
            return;
        };
        info!("stopping broker this process started");
        if let Err(e) = shutdown_child(child).await {
            warn!(error = %e, "failed to stop broker cleanly");
        }
    }
}

/// Ping first; if nothing answers, spawn a local `redis-server` and wait up
/// to `ready_timeout` for it to start accepting connections.
pub async fn ensure_broker_running(
    redis_url: &str,
    ready_timeout: Duration,
) -> anyhow::Result<BrokerHandle> {
    if ping(redis_url).await.is_ok() {
        info!("broker already listening, not starting one");
        return Ok(BrokerHandle { child: None });
    }

    info!("no broker listening, starting a local redis-server");
    let mut child = spawn_redis_server(redis_url)?;

    let deadline = tokio::time::Instant::now() + ready_timeout;
    loop {
        if ping(redis_url).await.is_ok() {
            info!("broker accepting connections");
            return Ok(BrokerHandle { child: Some(child) });
        }
        if let Ok(Some(status)) = child.try_wait() {
            anyhow::bail!("redis-server exited early with status {status}");
        }
        if tokio::time::Instant::now() >= deadline {
            let _ = child.start_kill();
            anyhow::bail!("broker did not start accepting connections within {ready_timeout:?}");
        }
        sleep(POLL_INTERVAL).await;
    }
}

async fn ping(redis_url: &str) -> anyhow::Result<()> {
    let client = redis::Client::open(redis_url)?;
    let mut conn = client.get_multiplexed_tokio_connection().await?;
    let _: String = redis::cmd("PING").query_async(&mut conn).await?;
    Ok(())
}

fn spawn_redis_server(redis_url: &str) -> anyhow::Result<Child> {
    let info = redis::Client::open(redis_url)?.get_connection_info().clone();
    let ConnectionAddr::Tcp(host, port) = &info.addr else {
        anyhow::bail!(
            "don't know how to start a broker for non-TCP address {:?}; start it yourself",
            info.addr
        );
    };

    let mut cmd = Command::new("redis-server");
    cmd.arg("--bind")
        .arg(host)
        .arg("--port")
        .arg(port.to_string())
        .arg("--daemonize")
        .arg("no")
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped());

    let mut child = cmd
        .spawn()
        .map_err(|e| anyhow::anyhow!("failed to spawn redis-server: {e}"))?;

    relay_child_logs(&mut child);
    Ok(child)
}

/// Re-emit the child's stdout/stderr lines through `tracing`, so a locally
/// started broker's logs end up alongside the supervisor's own.
fn relay_child_logs(child: &mut Child) {
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                info!(target: "broker", "{line}");
            }
        });
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                error!(target: "broker", "{line}");
            }
        });
    }
}
