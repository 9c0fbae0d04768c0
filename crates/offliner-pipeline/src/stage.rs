//! Staging (spec §4.5 "Staging"): copies the finalized artifact out of the
//! session directory, which is destroyed on exit, into a durable `Output`
//! directory. Only run when the pipeline owns the session.

use std::path::{Path, PathBuf};

use rand::distributions::Alphanumeric;
use rand::Rng;

use offliner_core::error::CoreError;

const COLLISION_TOKEN_LEN: usize = 6;

fn io_err(context: &str, e: std::io::Error) -> CoreError {
    CoreError::DownloadItemFailed {
        message: format!("{context}: {e}"),
    }
}

fn random_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(COLLISION_TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Copy `artifact` into `output_dir`, suffixing a short random token onto
/// the stem if a same-named file already exists there.
pub async fn stage(artifact: &Path, output_dir: &Path) -> Result<PathBuf, CoreError> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|e| io_err("failed to create output directory", e))?;

    let file_name = artifact.file_name().ok_or_else(|| CoreError::DownloadItemFailed {
        message: "artifact path has no file name".to_string(),
    })?;
    let mut destination = output_dir.join(file_name);

    if tokio::fs::metadata(&destination).await.is_ok() {
        let stem = artifact
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = artifact.extension().map(|e| e.to_string_lossy().into_owned());
        let token = random_token();
        let new_name = match extension {
            Some(ext) => format!("{stem}_{token}.{ext}"),
            None => format!("{stem}_{token}"),
        };
        destination = output_dir.join(new_name);
    }

    tokio::fs::copy(artifact, &destination)
        .await
        .map_err(|e| io_err("failed to stage artifact", e))?;
    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stages_into_a_fresh_output_directory() {
        let temp = tempfile::tempdir().unwrap();
        let artifact = temp.path().join("song.mp3");
        tokio::fs::write(&artifact, b"data").await.unwrap();
        let output_dir = temp.path().join("Output");

        let staged = stage(&artifact, &output_dir).await.unwrap();
        assert_eq!(staged, output_dir.join("song.mp3"));
        assert!(tokio::fs::metadata(&staged).await.is_ok());
    }

    #[tokio::test]
    async fn collision_suffixes_a_random_token() {
        let temp = tempfile::tempdir().unwrap();
        let artifact = temp.path().join("song.mp3");
        tokio::fs::write(&artifact, b"data").await.unwrap();
        let output_dir = temp.path().join("Output");
        tokio::fs::create_dir_all(&output_dir).await.unwrap();
        tokio::fs::write(output_dir.join("song.mp3"), b"existing")
            .await
            .unwrap();

        let staged = stage(&artifact, &output_dir).await.unwrap();
        assert_ne!(staged, output_dir.join("song.mp3"));
        assert!(staged.file_name().unwrap().to_string_lossy().starts_with("song_"));
    }
}
