//! Project identity.
//!
//! Cached tokens and per-project cache directories are keyed by a digest of
//! the project's canonical path, so two checkouts of the same repository are
//! distinct projects.

use camino::{Utf8Path, Utf8PathBuf};
use sha2::{Digest, Sha256};

/// Number of digest characters used in cache directory names.
const SHORT_ID_LEN: usize = 8;

/// Stable identifier of a project directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectIdentity {
    digest: String,
    name: String,
}

impl ProjectIdentity {
    /// Derive the identity of `project_dir`.
    ///
    /// The path is canonicalised when it exists; otherwise it is used as
    /// given.
    #[must_use]
    pub fn of(project_dir: &Utf8Path) -> Self {
        let canonical = project_dir
            .canonicalize_utf8()
            .unwrap_or_else(|_| project_dir.to_owned());
        Self::from_canonical(&canonical)
    }

    fn from_canonical(path: &Utf8Path) -> Self {
        let digest = format!("{:x}", Sha256::digest(path.as_str().as_bytes()));
        let name = path.file_name().unwrap_or("project").to_owned();
        Self { digest, name }
    }

    /// Full hex digest, used as the secret store key.
    #[must_use]
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Directory name for this project's cache, e.g. `app-1a2b3c4d`.
    #[must_use]
    pub fn cache_dir_name(&self) -> String {
        let short = self.digest.get(..SHORT_ID_LEN).unwrap_or(&self.digest);
        format!("{}-{short}", self.name)
    }

    /// This project's directory under `cache_root`.
    #[must_use]
    pub fn cache_dir(&self, cache_root: &Utf8Path) -> Utf8PathBuf {
        cache_root.join(self.cache_dir_name())
    }
}
