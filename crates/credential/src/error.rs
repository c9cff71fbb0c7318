//! Error types for credential resolution.

use crate::credential::CredentialSource;
use crate::secret_store::SecretStoreError;
use crate::validator::TransportError;
use thiserror::Error;

/// Message shown when the validation service rejects a token.
pub const INVALID_TOKEN_MESSAGE: &str =
    "invalid QODANA_TOKEN; check the token in your project settings or run with --token";

/// Errors that can occur while resolving a credential.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The validation service could not be reached or answered nonsense.
    ///
    /// Callers may continue without a credential.
    #[error("token validation unavailable: {0}")]
    Transport(#[from] TransportError),

    /// The validation service explicitly rejected a non-empty token.
    #[error(
        "invalid QODANA_TOKEN; check the token in your project settings or run with --token (token from {origin})"
    )]
    InvalidCredential {
        /// The source that supplied the rejected token.
        origin: CredentialSource,
    },

    /// The secret store failed while clearing a cached token.
    #[error("secret store error: {0}")]
    SecretStore(#[from] SecretStoreError),
}

impl CredentialError {
    /// Whether the process must stop rather than continue without a token.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Transport(_))
    }
}

/// Result type alias using [`CredentialError`].
pub type Result<T> = std::result::Result<T, CredentialError>;
