//! Session lifecycle: directory creation/teardown and credentials
//! provisioning (spec §4.5 steps 1-2).

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use offliner_core::domain::{Session, UserConfig};
use offliner_core::error::CoreError;

const CREDENTIALS_FILE_NAME: &str = "cookies.txt";

fn io_err(context: &str, e: std::io::Error) -> CoreError {
    CoreError::DownloadItemFailed {
        message: format!("{context}: {e}"),
    }
}

/// Ensure `session.dir` exists and is empty (spec §4.5 step 1). A prior
/// run's leftovers are wiped rather than trusted, since at-least-once
/// delivery means a worker may re-run a job whose session dir still has
/// partial output from a crashed attempt.
pub async fn prepare_directory(session: &Session) -> Result<(), CoreError> {
    if tokio::fs::metadata(&session.dir).await.is_ok() {
        tokio::fs::remove_dir_all(&session.dir)
            .await
            .map_err(|e| io_err("failed to clear stale session directory", e))?;
    }
    tokio::fs::create_dir_all(&session.dir)
        .await
        .map_err(|e| io_err("failed to create session directory", e))?;
    Ok(())
}

/// Write the job's credentials file into the session directory, from
/// either `credentials_blob` (raw cookie text) or `credentials_path` (an
/// existing file to copy). `UserConfig::validate` already guarantees at
/// most one of the two is set. Logs only the fact of provisioning, never
/// the blob contents (spec §3 `credentials_blob` invariant).
pub async fn provision_credentials(
    dir: &Path,
    config: &UserConfig,
) -> Result<Option<PathBuf>, CoreError> {
    let destination = dir.join(CREDENTIALS_FILE_NAME);

    if let Some(blob) = &config.credentials_blob {
        tokio::fs::write(&destination, blob)
            .await
            .map_err(|e| io_err("failed to write credentials file", e))?;
        info!("provisioned credentials from inline blob");
        return Ok(Some(destination));
    }

    if let Some(source) = &config.credentials_path {
        tokio::fs::copy(source, &destination)
            .await
            .map_err(|e| io_err("failed to copy credentials file", e))?;
        info!("provisioned credentials from source path");
        return Ok(Some(destination));
    }

    Ok(None)
}

/// Remove the session directory, when owned by the pipeline (spec §4.5
/// "Teardown"). A missing directory is not an error: `execute` may reach
/// teardown after an earlier step already failed to create it.
pub async fn teardown(session: &Session) {
    if !session.owns_directory() {
        return;
    }
    if let Err(e) = tokio::fs::remove_dir_all(&session.dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(dir = %session.dir.display(), error = %e, "failed to remove session directory");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use offliner_core::domain::RequestId;

    #[tokio::test]
    async fn prepare_directory_wipes_stale_contents() {
        let temp = tempfile::tempdir().unwrap();
        let session = Session::owned(RequestId::new(), temp.path());
        prepare_directory(&session).await.unwrap();
        tokio::fs::write(session.dir.join("stale.txt"), b"left over")
            .await
            .unwrap();

        prepare_directory(&session).await.unwrap();

        let mut entries = tokio::fs::read_dir(&session.dir).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn provision_credentials_from_blob_writes_file_and_returns_none_when_absent() {
        let temp = tempfile::tempdir().unwrap();
        let mut config = UserConfig::default();
        config.credentials_blob = Some("cookie-text".to_string());
        let path = provision_credentials(temp.path(), &config).await.unwrap();
        assert!(path.is_some());
        let contents = tokio::fs::read_to_string(path.unwrap()).await.unwrap();
        assert_eq!(contents, "cookie-text");

        let empty_config = UserConfig::default();
        let path = provision_credentials(temp.path(), &empty_config).await.unwrap();
        assert!(path.is_none());
    }

    #[tokio::test]
    async fn teardown_only_removes_owned_sessions() {
        let temp = tempfile::tempdir().unwrap();
        let external_dir = temp.path().join("external");
        tokio::fs::create_dir_all(&external_dir).await.unwrap();
        let session = Session::external(RequestId::new(), external_dir.clone());
        teardown(&session).await;
        assert!(tokio::fs::metadata(&external_dir).await.is_ok());
    }
}
