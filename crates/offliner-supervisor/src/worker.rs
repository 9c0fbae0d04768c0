//! Worker subprocess launch (spec §4.7 "launch one worker subprocess").

use std::path::{Path, PathBuf};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{error, info};

/// Spawn the `offliner-worker` binary at `binary_path`, with
/// `OFFLINER_APP_ROOT` set so it derives the same `Downloads/` layout this
/// supervisor was configured with.
pub fn spawn_worker(binary_path: &Path, app_root: &PathBuf) -> anyhow::Result<Child> {
    let mut cmd = Command::new(binary_path);
    cmd.env("OFFLINER_APP_ROOT", app_root)
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped());

    let mut child = cmd
        .spawn()
        .map_err(|e| anyhow::anyhow!("failed to spawn {}: {e}", binary_path.display()))?;

    info!(pid = ?child.id(), path = %binary_path.display(), "worker started");
    relay_child_logs(&mut child);
    Ok(child)
}

fn relay_child_logs(child: &mut Child) {
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                info!(target: "worker", "{line}");
            }
        });
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                error!(target: "worker", "{line}");
            }
        });
    }
}
