//! Tool acquisition orchestrator.
//!
//! Resolves the newest release of a product for the host, downloads and
//! verifies it, unpacks it into a staging directory beside the destination,
//! checks its product manifest and only then moves it into place. A failed
//! attempt leaves the destination untouched.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io::Write;
use std::path::Path;

use qodana_prep_common::write_stderr_line;

use crate::app_info::{ProductInfo, locate_home, read_product_info};
use crate::checksum::{Sha256Digest, verify_file};
use crate::download::ArtefactDownloader;
use crate::error::{AcquisitionError, AcquisitionFailure, Result};
use crate::extraction::ArtefactExtractor;
use crate::platform::HostPlatform;
use crate::product::{Channel, ProductCode, ProductRequest};
use crate::release::{SelectedRelease, release_feed_url, select_release};

/// Prefix of staging directories created next to the destination.
const STAGING_PREFIX: &str = ".qodana-staging-";

/// A product installation ready for use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledTool {
    /// The installed product.
    pub product: ProductCode,
    /// The channel it was requested from.
    pub channel: Channel,
    /// The installation root, equal to the requested destination.
    pub path: Utf8PathBuf,
    /// The directory containing `bin/`; differs from `path` for macOS bundles.
    pub home: Utf8PathBuf,
    /// Metadata read from the installation's manifest.
    pub info: ProductInfo,
    /// `false` when an existing installation was reused.
    pub freshly_installed: bool,
}

/// Installs products using injected transport and extraction.
pub struct ToolAcquirer<'a> {
    platform: HostPlatform,
    downloader: &'a dyn ArtefactDownloader,
    extractor: &'a dyn ArtefactExtractor,
    quiet: bool,
}

impl<'a> ToolAcquirer<'a> {
    /// Create an acquirer for `platform`.
    pub fn new(
        platform: HostPlatform,
        downloader: &'a dyn ArtefactDownloader,
        extractor: &'a dyn ArtefactExtractor,
    ) -> Self {
        Self {
            platform,
            downloader,
            extractor,
            quiet: false,
        }
    }

    /// Suppress progress output.
    #[must_use]
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Install the product named by `product_code` (optionally suffixed with
    /// `-EAP`) into `destination`.
    ///
    /// Unknown codes are rejected before the filesystem is touched. If the
    /// destination already holds a valid installation it is reused.
    ///
    /// # Errors
    ///
    /// Returns an [`AcquisitionError`] naming the product and destination.
    pub fn acquire(
        &self,
        product_code: &str,
        destination: &Utf8Path,
        stderr: &mut dyn Write,
    ) -> Result<InstalledTool> {
        let request: ProductRequest = product_code
            .parse()
            .map_err(|e| AcquisitionError::new(product_code, destination, e))?;
        self.acquire_request(request, destination, stderr)
    }

    /// Install an already-validated product request.
    ///
    /// # Errors
    ///
    /// Returns an [`AcquisitionError`] naming the product and destination.
    pub fn acquire_request(
        &self,
        request: ProductRequest,
        destination: &Utf8Path,
        stderr: &mut dyn Write,
    ) -> Result<InstalledTool> {
        self.run_pipeline(request, destination, stderr)
            .map_err(|failure| AcquisitionError::new(request.to_string(), destination, failure))
    }

    fn run_pipeline(
        &self,
        request: ProductRequest,
        destination: &Utf8Path,
        stderr: &mut dyn Write,
    ) -> std::result::Result<InstalledTool, AcquisitionFailure> {
        if let Some(existing) = existing_installation(request, destination)? {
            log::info!(
                "reusing {} {} at {destination}",
                existing.info.name,
                existing.info.build
            );
            return Ok(existing);
        }

        let selected = self.resolve_release(request)?;
        self.progress(
            stderr,
            format!(
                "Downloading {} {} ({})...",
                request.product.spec().name,
                selected.release.version,
                selected.release.build
            ),
        );

        let downloads = tempfile::tempdir()?;
        let archive = downloads.path().join(selected.file_name());
        self.downloader
            .download_to(&selected.download.link, &archive)?;
        self.verify(&selected, &archive)?;

        let staging = create_staging(destination)?;
        self.progress(stderr, format!("Extracting into {destination}..."));
        self.extractor
            .extract(&archive, selected.format, staging.path())?;
        let info = read_product_info(staging.path())?;
        promote(staging.path(), destination)?;

        self.progress(
            stderr,
            format!("Installed {} {} at {destination}", info.name, info.version),
        );
        Ok(installed(request, destination, info, true))
    }

    fn resolve_release(
        &self,
        request: ProductRequest,
    ) -> std::result::Result<SelectedRelease, AcquisitionFailure> {
        let url = release_feed_url(request.product, request.channel);
        let feed = self.downloader.fetch_text(&url)?;
        let selected = select_release(&feed, request.product, request.channel, self.platform)?;
        log::debug!(
            "selected {} build {} ({})",
            request,
            selected.release.build,
            selected.download_key
        );
        Ok(selected)
    }

    fn verify(
        &self,
        selected: &SelectedRelease,
        archive: &Path,
    ) -> std::result::Result<(), AcquisitionFailure> {
        let Some(checksum_link) = &selected.download.checksum_link else {
            log::warn!(
                "no checksum is published for {}; skipping verification",
                selected.download.link
            );
            return Ok(());
        };
        let published = self.downloader.fetch_text(checksum_link)?;
        let expected = Sha256Digest::from_checksum_file(&published)?;
        verify_file(archive, &expected)?;
        log::debug!("verified SHA-256 {expected}");
        Ok(())
    }

    fn progress(&self, stderr: &mut dyn Write, message: String) {
        if !self.quiet {
            write_stderr_line(stderr, message);
        }
    }
}

/// Inspect the destination before installing.
///
/// A missing or empty directory means "install"; a valid installation is
/// reused; anything else is refused.
fn existing_installation(
    request: ProductRequest,
    destination: &Utf8Path,
) -> std::result::Result<Option<InstalledTool>, AcquisitionFailure> {
    let path = destination.as_std_path();
    if !path.exists() {
        return Ok(None);
    }
    if !path.is_dir() {
        return Err(AcquisitionFailure::DestinationOccupied);
    }
    match read_product_info(path) {
        Ok(info) => Ok(Some(installed(request, destination, info, false))),
        Err(e) if is_empty_dir(path)? => {
            log::debug!("{destination} is empty: {e}");
            Ok(None)
        }
        Err(_) => Err(AcquisitionFailure::DestinationOccupied),
    }
}

fn installed(
    request: ProductRequest,
    destination: &Utf8Path,
    info: ProductInfo,
    freshly_installed: bool,
) -> InstalledTool {
    let home = locate_home(destination.as_std_path())
        .and_then(|home| Utf8PathBuf::try_from(home).ok())
        .unwrap_or_else(|| destination.to_owned());
    InstalledTool {
        product: request.product,
        channel: request.channel,
        path: destination.to_owned(),
        home,
        info,
        freshly_installed,
    }
}

fn is_empty_dir(path: &Path) -> std::io::Result<bool> {
    Ok(fs::read_dir(path)?.next().is_none())
}

/// Create a staging directory on the destination's filesystem so the final
/// move is a rename.
fn create_staging(destination: &Utf8Path) -> std::io::Result<tempfile::TempDir> {
    let parent = destination
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    fs::create_dir_all(parent)?;
    tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(parent)
}

/// Move a verified staging directory into place.
fn promote(staging: &Path, destination: &Utf8Path) -> std::io::Result<()> {
    if destination.exists() {
        fs::remove_dir(destination)?;
    }
    fs::rename(staging, destination)
}

#[cfg(test)]
#[path = "acquire_tests.rs"]
mod tests;
