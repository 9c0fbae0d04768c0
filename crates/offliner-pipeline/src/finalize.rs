//! Finalize (spec §4.5 "Finalize"): packages a multi-file result into a
//! ZIP, or passes a single produced file through unchanged.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use offliner_core::error::CoreError;

const DEFAULT_ARCHIVE_STEM: &str = "archivos";
const FORBIDDEN_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

fn to_core_err(context: &str, e: impl std::fmt::Display) -> CoreError {
    CoreError::DownloadItemFailed {
        message: format!("{context}: {e}"),
    }
}

/// Sanitize a user-supplied archive name hint: strip filesystem-forbidden
/// characters, drop a redundant trailing `.zip` (so `"mix.zip"` doesn't
/// become `mix.zip.zip`), and fall back to a default stem if nothing is
/// left.
fn sanitize_archive_stem(hint: &str) -> String {
    let cleaned: String = hint
        .chars()
        .map(|c| if FORBIDDEN_CHARS.contains(&c) { '_' } else { c })
        .collect();
    let mut trimmed = cleaned.trim();
    while trimmed.to_ascii_lowercase().ends_with(".zip") {
        trimmed = &trimmed[..trimmed.len() - 4];
    }
    let trimmed = trimmed.trim_end_matches('.').trim();
    if trimmed.is_empty() {
        DEFAULT_ARCHIVE_STEM.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Synchronous; the caller runs this inside `spawn_blocking` since the
/// `zip` crate offers no async API.
pub fn pack(
    session_dir: &Path,
    produced_files: &[PathBuf],
    archive_name_hint: &str,
) -> Result<Option<PathBuf>, CoreError> {
    match produced_files.len() {
        0 => Ok(None),
        1 => Ok(Some(produced_files[0].clone())),
        _ => {
            let stem = sanitize_archive_stem(archive_name_hint);
            let zip_path = session_dir.join(format!("{stem}.zip"));
            write_zip(&zip_path, produced_files)?;
            for file in produced_files {
                if let Err(e) = std::fs::remove_file(file) {
                    tracing::debug!(file = %file.display(), error = %e, "failed to remove packed source file");
                }
            }
            Ok(Some(zip_path))
        }
    }
}

fn write_zip(zip_path: &Path, files: &[PathBuf]) -> Result<(), CoreError> {
    let file = File::create(zip_path).map_err(|e| to_core_err("failed to create archive", e))?;
    let mut writer = zip::ZipWriter::new(file);
    let options =
        zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        writer
            .start_file(name, options)
            .map_err(|e| to_core_err("failed to add archive entry", e))?;
        let mut source = File::open(path).map_err(|e| to_core_err("failed to read produced file", e))?;
        io::copy(&mut source, &mut writer).map_err(|e| to_core_err("failed to write archive entry", e))?;
    }

    writer.finish().map_err(|e| to_core_err("failed to finalize archive", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_and_deduplicates_zip_extension() {
        assert_eq!(sanitize_archive_stem("My Mix.zip"), "My Mix");
        assert_eq!(sanitize_archive_stem("weird:name.ZIP"), "weird_name");
        assert_eq!(sanitize_archive_stem(""), DEFAULT_ARCHIVE_STEM);
    }

    #[test]
    fn single_produced_file_passes_through_unchanged() {
        let path = PathBuf::from("/tmp/session/a.mp3");
        let result = pack(Path::new("/tmp/session"), &[path.clone()], "hint").unwrap();
        assert_eq!(result, Some(path));
    }

    #[test]
    fn zero_produced_files_is_null_artifact() {
        let result = pack(Path::new("/tmp/session"), &[], "hint").unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn multiple_files_pack_into_a_real_zip() {
        let temp = tempfile::tempdir().unwrap();
        let a = temp.path().join("a.mp3");
        let b = temp.path().join("b.mp3");
        std::fs::write(&a, b"one").unwrap();
        std::fs::write(&b, b"two").unwrap();

        let result = pack(temp.path(), &[a.clone(), b.clone()], "My Mix").unwrap();
        let zip_path = result.unwrap();
        assert_eq!(zip_path, temp.path().join("My Mix.zip"));
        assert!(zip_path.exists());
        assert!(!a.exists());
        assert!(!b.exists());

        let archive = zip::ZipArchive::new(File::open(&zip_path).unwrap()).unwrap();
        assert_eq!(archive.len(), 2);
    }
}
