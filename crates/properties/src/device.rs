//! Stable anonymous identifiers reported with usage statistics.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Device identifier and salt passed to the IDE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    /// UUID-formatted device identifier.
    pub id: String,
    /// Hex salt paired with the identifier.
    pub salt: String,
}

impl DeviceIdentity {
    /// Derive an identity from a seed such as the project's remote URL.
    ///
    /// The same seed always yields the same identity, so repeated runs on
    /// one project are counted as one device.
    ///
    /// # Examples
    ///
    /// ```
    /// use qodana_prep_properties::DeviceIdentity;
    ///
    /// let first = DeviceIdentity::derive("https://git.example/team/app.git");
    /// let second = DeviceIdentity::derive("https://git.example/team/app.git");
    /// assert_eq!(first, second);
    /// assert_eq!(first.id.len(), 36);
    /// ```
    #[must_use]
    pub fn derive(seed: &str) -> Self {
        let digest = Sha256::digest(seed.as_bytes());
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest[..16]);
        let id = Uuid::from_bytes(bytes).hyphenated().to_string();

        let mut salt_hasher = Sha256::new();
        salt_hasher.update(id.as_bytes());
        salt_hasher.update(seed.as_bytes());
        let salt = format!("{:x}", salt_hasher.finalize());

        Self { id, salt }
    }
}
