//! Error types for the `qodana-prep` binary.
//!
//! Each component keeps its own error type; this module gathers them and
//! decides the process exit code in one place.

use crate::config::ConfigError;
use qodana_prep_credential::CredentialError;
use qodana_prep_installer::AcquisitionError;
use qodana_prep_installer::platform::UnsupportedPlatform;
use qodana_prep_properties::ConfigurationError;
use thiserror::Error;

/// Exit code for failures during preparation.
pub const EXIT_FAILURE: i32 = 1;

/// Exit code for unusable input: missing product, bad configuration file.
pub const EXIT_USAGE: i32 = 2;

/// Errors that stop the bootstrap.
#[derive(Debug, Error)]
pub enum AppError {
    /// The token was rejected, or the keyring failed.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// The linter could not be installed.
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    /// The VM options file could not be written.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// `qodana.yaml` could not be loaded.
    #[error(transparent)]
    ProjectConfig(#[from] ConfigError),

    /// No distribution exists for this host.
    #[error(transparent)]
    UnsupportedPlatform(#[from] UnsupportedPlatform),

    /// Neither the command line nor `qodana.yaml` names a product.
    #[error("no product selected; pass --product or set `ide` or `linter` in qodana.yaml")]
    NoProduct,

    /// The platform has no cache directory and none was given.
    #[error("could not determine a cache directory; pass --cache-dir")]
    NoCacheDirectory,
}

impl AppError {
    /// The process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::ProjectConfig(_) | Self::NoProduct | Self::NoCacheDirectory => EXIT_USAGE,
            Self::Credential(_)
            | Self::Acquisition(_)
            | Self::Configuration(_)
            | Self::UnsupportedPlatform(_) => EXIT_FAILURE,
        }
    }
}

/// Result type alias using [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;
