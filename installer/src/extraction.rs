//! Unpacking downloaded distributions into an installation root.
//!
//! Tarballs and zips are unpacked in-process with path traversal protection.
//! Windows installers and macOS disk images are delegated to host tools
//! through a [`CommandExecutor`].

use flate2::read::GzDecoder;
use std::fs;
use std::io::{self, BufReader};
use std::path::{Component, Path, PathBuf};

use crate::command::{CommandExecutor, SystemCommandExecutor};
use crate::platform::ArchiveFormat;

/// Trait for extracting distributions, enabling test mocking.
///
/// # Examples
///
/// ```
/// use qodana_prep_installer::extraction::SystemExtractor;
///
/// let extractor = SystemExtractor::new();
/// // Use extractor.extract(archive_path, format, dest_dir) in production
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArtefactExtractor {
    /// Unpack the artefact at `archive_path` so that `dest_dir` becomes the
    /// installation root.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::PathTraversal`] if any entry
    /// attempts to escape the destination directory.
    /// Returns [`ExtractionError::EmptyArchive`] if nothing was unpacked.
    /// Returns [`ExtractionError::Command`] if a host tool fails.
    fn extract(
        &self,
        archive_path: &Path,
        format: ArchiveFormat,
        dest_dir: &Path,
    ) -> Result<(), ExtractionError>;
}

/// Errors arising from extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// I/O error during extraction.
    #[error("extraction I/O error: {0}")]
    Io(#[from] io::Error),

    /// The zip container is corrupt.
    #[error("invalid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },

    /// The archive contains no files below its top-level directory.
    #[error("archive contains no files")]
    EmptyArchive,

    /// A host tool exited unsuccessfully.
    #[error("`{program}` failed with {status}: {stderr}")]
    Command {
        /// The program that was run.
        program: String,
        /// Its exit status.
        status: String,
        /// Captured standard error.
        stderr: String,
    },

    /// The mounted disk image holds no application bundle.
    #[error("no application bundle found in {mount}")]
    MissingBundle {
        /// The mount point that was searched.
        mount: String,
    },

    /// A path cannot be passed to a host tool.
    #[error("path is not valid UTF-8: {path}")]
    NonUtf8Path {
        /// Lossy rendering of the path.
        path: String,
    },
}

/// Default extractor dispatching on the archive format.
#[derive(Debug, Clone)]
pub struct SystemExtractor<E = SystemCommandExecutor> {
    executor: E,
}

impl SystemExtractor {
    /// Extractor running host tools directly.
    #[must_use]
    pub fn new() -> Self {
        Self {
            executor: SystemCommandExecutor,
        }
    }
}

impl Default for SystemExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: CommandExecutor> SystemExtractor<E> {
    /// Use a custom executor for installer and disk-image formats.
    pub fn with_executor(executor: E) -> Self {
        Self { executor }
    }
}

impl<E: CommandExecutor> ArtefactExtractor for SystemExtractor<E> {
    fn extract(
        &self,
        archive_path: &Path,
        format: ArchiveFormat,
        dest_dir: &Path,
    ) -> Result<(), ExtractionError> {
        match format {
            ArchiveFormat::TarGz => extract_tar_gz(archive_path, dest_dir),
            ArchiveFormat::Zip => extract_zip(archive_path, dest_dir),
            ArchiveFormat::WindowsInstaller => {
                run_installer(&self.executor, archive_path, dest_dir)
            }
            ArchiveFormat::DiskImage => extract_disk_image(&self.executor, archive_path, dest_dir),
        }
    }
}

/// Unpack a tarball, dropping its single top-level directory.
///
/// Links are confined to the destination: symlink targets must resolve
/// inside it, hard links must name an entry of the same archive, and no entry
/// is written through a symlink unpacked earlier.
fn extract_tar_gz(archive_path: &Path, dest_dir: &Path) -> Result<(), ExtractionError> {
    let file = fs::File::open(archive_path)?;
    let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
    archive.set_preserve_permissions(true);
    let mut unpacked = 0usize;

    for entry_result in archive.entries()? {
        let mut entry = entry_result?;
        let entry_path = entry.path()?.into_owned();

        validate_entry_path(&entry_path)?;
        let Some(relative) = strip_top_level(&entry_path) else {
            continue;
        };
        reject_symlinked_ancestors(dest_dir, &relative, &entry_path)?;

        let dest_path = dest_dir.join(&relative);
        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)?;
        }
        match entry.header().entry_type() {
            tar::EntryType::Symlink => {
                let target = entry.link_name()?.unwrap_or_default().into_owned();
                if !link_stays_inside(&relative, &target) {
                    return Err(escaping_link(&entry_path, &target));
                }
                entry.unpack(&dest_path)?;
            }
            tar::EntryType::Link => {
                let target = entry.link_name()?.unwrap_or_default().into_owned();
                let source = hard_link_source(dest_dir, &target)
                    .ok_or_else(|| escaping_link(&entry_path, &target))?;
                reject_symlinked_ancestors(dest_dir, &source, &entry_path)?;
                fs::hard_link(dest_dir.join(source), &dest_path)?;
            }
            _ => {
                entry.unpack(&dest_path)?;
            }
        }
        unpacked += 1;
    }

    if unpacked == 0 {
        return Err(ExtractionError::EmptyArchive);
    }
    Ok(())
}

/// Fail if `relative`, or any directory above it, is already a symlink
/// below `dest_dir`.
fn reject_symlinked_ancestors(
    dest_dir: &Path,
    relative: &Path,
    entry_path: &Path,
) -> Result<(), ExtractionError> {
    let through_symlink = relative
        .ancestors()
        .filter(|ancestor| !ancestor.as_os_str().is_empty())
        .any(|ancestor| {
            fs::symlink_metadata(dest_dir.join(ancestor))
                .is_ok_and(|metadata| metadata.file_type().is_symlink())
        });
    if through_symlink {
        return Err(ExtractionError::PathTraversal {
            path: entry_path.display().to_string(),
        });
    }
    Ok(())
}

/// Whether a symlink at `link` pointing at `target` resolves inside the
/// destination, judged from the path text alone.
fn link_stays_inside(link: &Path, target: &Path) -> bool {
    if target.as_os_str().is_empty() || target.has_root() {
        return false;
    }
    let mut depth = link.components().count().saturating_sub(1);
    for component in target.components() {
        match component {
            Component::ParentDir => match depth.checked_sub(1) {
                Some(parent) => depth = parent,
                None => return false,
            },
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}

/// Destination-relative source of a hard link, named from the archive root.
fn hard_link_source(dest_dir: &Path, target: &Path) -> Option<PathBuf> {
    validate_entry_path(target).ok()?;
    let source = strip_top_level(target)?;
    dest_dir.join(&source).exists().then_some(source)
}

fn escaping_link(entry_path: &Path, target: &Path) -> ExtractionError {
    ExtractionError::PathTraversal {
        path: format!("{} -> {}", entry_path.display(), target.display()),
    }
}

/// Unpack a zip laid out relative to the installation root.
fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<(), ExtractionError> {
    let file = fs::File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))?;
    let mut unpacked = 0usize;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(ExtractionError::PathTraversal {
                path: entry.name().to_owned(),
            });
        };
        let dest_path = dest_dir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&dest_path)?;
            continue;
        }
        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut output = fs::File::create(&dest_path)?;
        io::copy(&mut entry, &mut output)?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&dest_path, fs::Permissions::from_mode(mode))?;
        }
        unpacked += 1;
    }

    if unpacked == 0 {
        return Err(ExtractionError::EmptyArchive);
    }
    Ok(())
}

/// Run an NSIS installer silently into `dest_dir`.
fn run_installer(
    executor: &dyn CommandExecutor,
    archive_path: &Path,
    dest_dir: &Path,
) -> Result<(), ExtractionError> {
    let program = utf8(archive_path)?;
    // NSIS requires /D to be the last argument and unquoted.
    let target = format!("/D={}", utf8(dest_dir)?);
    run_checked(executor, program, &["/S", target.as_str()])
}

/// Mount a disk image, copy its application bundle and unmount it.
fn extract_disk_image(
    executor: &dyn CommandExecutor,
    archive_path: &Path,
    dest_dir: &Path,
) -> Result<(), ExtractionError> {
    let mount = tempfile::Builder::new().prefix("qodana-dmg-").tempdir()?;
    let mount_point = utf8(mount.path())?;
    run_checked(
        executor,
        "hdiutil",
        &[
            "attach",
            "-nobrowse",
            "-readonly",
            "-noautoopen",
            "-mountpoint",
            mount_point,
            utf8(archive_path)?,
        ],
    )?;

    let copied = copy_bundle(executor, mount.path(), dest_dir);
    let detached = run_checked(executor, "hdiutil", &["detach", "-force", mount_point]);
    copied?;
    detached
}

fn copy_bundle(
    executor: &dyn CommandExecutor,
    mount: &Path,
    dest_dir: &Path,
) -> Result<(), ExtractionError> {
    let bundle = find_bundle(mount)?.ok_or_else(|| ExtractionError::MissingBundle {
        mount: mount.display().to_string(),
    })?;
    run_checked(executor, "ditto", &[utf8(&bundle)?, utf8(dest_dir)?])
}

fn find_bundle(mount: &Path) -> io::Result<Option<PathBuf>> {
    for entry in fs::read_dir(mount)? {
        let path = entry?.path();
        if path.is_dir() && path.extension().is_some_and(|ext| ext == "app") {
            return Ok(Some(path));
        }
    }
    Ok(None)
}

fn run_checked(
    executor: &dyn CommandExecutor,
    program: &str,
    args: &[&str],
) -> Result<(), ExtractionError> {
    let args: Vec<String> = args.iter().map(|arg| (*arg).to_owned()).collect();
    let output = executor.run(program, &args)?;
    if !output.status.success() {
        return Err(ExtractionError::Command {
            program: program.to_owned(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        });
    }
    Ok(())
}

fn utf8(path: &Path) -> Result<&str, ExtractionError> {
    path.to_str().ok_or_else(|| ExtractionError::NonUtf8Path {
        path: path.display().to_string(),
    })
}

/// Drop the first normal component of a tar entry path.
fn strip_top_level(path: &Path) -> Option<PathBuf> {
    let rest: PathBuf = path
        .components()
        .filter(|component| !matches!(component, Component::CurDir))
        .skip(1)
        .collect();
    (!rest.as_os_str().is_empty()).then_some(rest)
}

/// Validate that a tar entry path does not escape the destination
/// directory via `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), ExtractionError> {
    let escapes = path.is_absolute()
        || path
            .components()
            .any(|component| matches!(component, Component::ParentDir | Component::Prefix(_)));
    if escapes {
        return Err(ExtractionError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "extraction_tests.rs"]
mod tests;
