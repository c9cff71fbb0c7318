//! Platform directory lookup.

use directories_next::ProjectDirs;
use std::path::PathBuf;

/// Access to per-user base directories.
pub trait BaseDirs {
    /// Directory for caches that can be rebuilt, if the platform has one.
    fn cache_dir(&self) -> Option<PathBuf>;
}

/// Base directories reported by the operating system.
#[derive(Debug, Clone)]
pub struct SystemBaseDirs {
    project: Option<ProjectDirs>,
}

impl SystemBaseDirs {
    /// Look up the directories for the `qodana-prep` application.
    #[must_use]
    pub fn new() -> Self {
        Self {
            project: ProjectDirs::from("org", "JetBrains", "qodana-prep"),
        }
    }
}

impl Default for SystemBaseDirs {
    fn default() -> Self {
        Self::new()
    }
}

impl BaseDirs for SystemBaseDirs {
    fn cache_dir(&self) -> Option<PathBuf> {
        self.project
            .as_ref()
            .map(|dirs| dirs.cache_dir().to_path_buf())
    }
}
