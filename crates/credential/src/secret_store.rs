//! Platform secret store capability.
//!
//! Tokens are cached per project under a project-identity key. The storage
//! itself is platform-backed and treated as an external collaborator; this
//! module only defines the seam and ships an in-memory implementation plus an
//! optional keychain adapter.

use std::cell::RefCell;
use std::collections::BTreeMap;

/// Errors reported by a secret store backend.
#[derive(Debug, thiserror::Error)]
pub enum SecretStoreError {
    /// The backend could not be reached or refused the operation.
    #[error("secret store {operation} failed for {key}: {reason}")]
    Backend {
        /// The attempted operation (`get`, `set`, or `remove`).
        operation: &'static str,
        /// The key involved.
        key: String,
        /// Backend-specific description.
        reason: String,
    },
}

/// Get/set access to secrets keyed by project identity.
#[cfg_attr(test, mockall::automock)]
pub trait SecretStore {
    /// Look up the secret stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`SecretStoreError`] when the backend fails. A missing entry is
    /// `Ok(None)`, not an error.
    fn get(&self, key: &str) -> Result<Option<String>, SecretStoreError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`SecretStoreError`] when the backend fails.
    fn set(&self, key: &str, value: &str) -> Result<(), SecretStoreError>;

    /// Remove any secret stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`SecretStoreError`] when the backend fails.
    fn remove(&self, key: &str) -> Result<(), SecretStoreError> {
        self.set(key, "")
    }
}

/// A process-lifetime secret store.
///
/// # Examples
///
/// ```
/// use qodana_prep_credential::{MemorySecretStore, SecretStore};
///
/// let store = MemorySecretStore::default();
/// store.set("project-1234", "token").expect("memory store never fails");
/// assert_eq!(store.get("project-1234").expect("get").as_deref(), Some("token"));
/// ```
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    secrets: RefCell<BTreeMap<String, String>>,
}

impl MemorySecretStore {
    /// Number of non-empty secrets currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.secrets
            .borrow()
            .values()
            .filter(|v| !v.is_empty())
            .count()
    }

    /// Whether no non-empty secret is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SecretStore for MemorySecretStore {
    fn get(&self, key: &str) -> Result<Option<String>, SecretStoreError> {
        Ok(self
            .secrets
            .borrow()
            .get(key)
            .filter(|v| !v.is_empty())
            .cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SecretStoreError> {
        self.secrets
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SecretStoreError> {
        self.secrets.borrow_mut().remove(key);
        Ok(())
    }
}

/// Secret store backed by the platform keychain.
#[cfg(feature = "keyring")]
#[derive(Debug, Clone)]
pub struct KeyringSecretStore {
    service: String,
}

#[cfg(feature = "keyring")]
impl KeyringSecretStore {
    /// Create a store that files entries under `service`.
    #[must_use]
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, operation: &'static str, key: &str) -> Result<keyring::Entry, SecretStoreError> {
        keyring::Entry::new(&self.service, key).map_err(|e| backend_error(operation, key, &e))
    }
}

#[cfg(feature = "keyring")]
fn backend_error(operation: &'static str, key: &str, err: &keyring::Error) -> SecretStoreError {
    SecretStoreError::Backend {
        operation,
        key: key.to_owned(),
        reason: err.to_string(),
    }
}

#[cfg(feature = "keyring")]
impl SecretStore for KeyringSecretStore {
    fn get(&self, key: &str) -> Result<Option<String>, SecretStoreError> {
        match self.entry("get", key)?.get_password() {
            Ok(value) => Ok(Some(value).filter(|v| !v.is_empty())),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(backend_error("get", key, &e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SecretStoreError> {
        self.entry("set", key)?
            .set_password(value)
            .map_err(|e| backend_error("set", key, &e))
    }

    fn remove(&self, key: &str) -> Result<(), SecretStoreError> {
        match self.entry("remove", key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(backend_error("remove", key, &e)),
        }
    }
}
