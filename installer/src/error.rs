//! Error types for tool acquisition.
//!
//! Every failure names the product being installed and the destination it
//! was headed for, so callers can report it without extra context.

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::app_info::AppInfoError;
use crate::checksum::ChecksumError;
use crate::download::DownloadError;
use crate::extraction::ExtractionError;
use crate::platform::UnsupportedPlatform;
use crate::product::UnknownProduct;
use crate::release::ReleaseError;

/// A failed acquisition with its context.
#[derive(Debug, Error)]
#[error("failed to install {product} into {destination}: {failure}")]
pub struct AcquisitionError {
    /// The requested product code, as given.
    pub product: String,
    /// The requested installation directory.
    pub destination: Utf8PathBuf,
    /// What went wrong.
    #[source]
    pub failure: AcquisitionFailure,
}

impl AcquisitionError {
    /// Attach context to a failure.
    pub fn new(
        product: impl Into<String>,
        destination: impl Into<Utf8PathBuf>,
        failure: impl Into<AcquisitionFailure>,
    ) -> Self {
        Self {
            product: product.into(),
            destination: destination.into(),
            failure: failure.into(),
        }
    }
}

/// The cause of an [`AcquisitionError`].
#[derive(Debug, Error)]
pub enum AcquisitionFailure {
    /// The product code is not in the supported set.
    #[error(transparent)]
    UnknownProduct(#[from] UnknownProduct),

    /// The host has no published distribution.
    #[error(transparent)]
    UnsupportedPlatform(#[from] UnsupportedPlatform),

    /// The release feed could not be used.
    #[error(transparent)]
    Release(#[from] ReleaseError),

    /// A network transfer failed.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// The artefact failed integrity checks.
    #[error(transparent)]
    Checksum(#[from] ChecksumError),

    /// The artefact could not be unpacked.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// The unpacked installation has no usable product manifest.
    #[error("installation metadata is invalid: {0}")]
    Metadata(#[from] AppInfoError),

    /// The destination holds something other than a valid installation.
    #[error("destination is not empty and holds no valid installation")]
    DestinationOccupied,

    /// The destination could not be prepared or populated.
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for acquisition operations.
pub type Result<T> = std::result::Result<T, AcquisitionError>;
