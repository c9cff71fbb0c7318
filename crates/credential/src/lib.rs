//! Usage token resolution for the qodana-prep bootstrap.
//!
//! A token is looked up from an ordered chain of sources (explicit argument,
//! environment, cached secret, interactive prompt), checked against the
//! remote identity service, and cached per project once it is known to be
//! valid.
//!
//! # Modules
//!
//! - [`credential`] - the resolved token and where it came from
//! - [`error`] - failure kinds surfaced to the orchestrator
//! - [`resolver`] - the fallback chain and validation outcomes
//! - [`secret_store`] - the platform secret store capability
//! - [`source`] - individual token sources
//! - [`validator`] - the remote validation capability

pub mod credential;
pub mod error;
pub mod resolver;
pub mod secret_store;
pub mod source;
pub mod validator;

pub use credential::{Credential, CredentialSource, Token};
pub use error::{CredentialError, Result};
pub use resolver::{CachePolicy, CredentialResolver};
pub use secret_store::{MemorySecretStore, SecretStore, SecretStoreError};
pub use source::{Prompter, TerminalPrompter, TokenSource};
pub use validator::{HttpTokenValidator, TokenValidator, TransportError};

#[cfg(feature = "keyring")]
pub use secret_store::KeyringSecretStore;
