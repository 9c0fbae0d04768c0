//! `Session` (spec §3): a job's owned scratch directory plus its optional
//! credentials file. Destruction is the Job Pipeline's responsibility
//! (spec §4.5 "Teardown") — this type is a plain data holder, not an RAII
//! guard, because teardown is async (`tokio::fs::remove_dir_all`) and must
//! run regardless of which exit path the pipeline takes.

use std::path::{Path, PathBuf};

use super::RequestId;

/// One per accepted job. `base_folder` distinguishes a session the pipeline
/// owns (it creates and destroys `dir`, and stages to `Output/` on success)
/// from one an external caller supplied (the caller owns cleanup; spec
/// §4.5 "Staging").
#[derive(Clone, Debug)]
pub struct Session {
    pub request_id: RequestId,
    pub dir: PathBuf,
    pub credentials_path: Option<PathBuf>,
    owns_dir: bool,
}

impl Session {
    /// A session the pipeline owns: `dir` is `<temp_root>/<request_id>/`.
    #[must_use]
    pub fn owned(request_id: RequestId, temp_root: &Path) -> Self {
        Self {
            dir: temp_root.join(request_id.to_string()),
            request_id,
            credentials_path: None,
            owns_dir: true,
        }
    }

    /// A session over a directory supplied by an external caller. The
    /// pipeline never removes `dir` for this variant.
    #[must_use]
    pub fn external(request_id: RequestId, dir: PathBuf) -> Self {
        Self {
            dir,
            request_id,
            credentials_path: None,
            owns_dir: false,
        }
    }

    #[must_use]
    pub const fn owns_directory(&self) -> bool {
        self.owns_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owned_session_directory_is_scoped_by_request_id() {
        let id = RequestId::new();
        let session = Session::owned(id, Path::new("/tmp/offliner/Temp"));
        assert!(session.dir.to_string_lossy().ends_with(&id.to_string()));
        assert!(session.owns_directory());
    }

    #[test]
    fn external_session_is_not_owned() {
        let id = RequestId::new();
        let session = Session::external(id, PathBuf::from("/mnt/shared"));
        assert!(!session.owns_directory());
    }
}
