//! SHA-256 digests for downloaded distributions.
//!
//! JetBrains publishes a `.sha256` file next to each artefact in the usual
//! `sha256sum` format (`<hex>  *<file name>`).

use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;

const DIGEST_HEX_LEN: usize = 64;

/// A validated lowercase hex-encoded SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sha256Digest(String);

/// Errors arising while reading or comparing digests.
#[derive(Debug, thiserror::Error)]
pub enum ChecksumError {
    /// The published checksum is not a SHA-256 hex digest.
    #[error("invalid SHA-256 digest: {reason}")]
    InvalidDigest {
        /// What is wrong with the value.
        reason: String,
    },

    /// The artefact does not hash to the published digest.
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    Mismatch {
        /// The published digest.
        expected: Sha256Digest,
        /// The digest of the downloaded file.
        actual: Sha256Digest,
    },

    /// The artefact could not be read.
    #[error("failed to hash artefact: {0}")]
    Io(#[from] std::io::Error),
}

impl Sha256Digest {
    /// Parse a digest, accepting either case.
    ///
    /// # Errors
    ///
    /// Returns [`ChecksumError::InvalidDigest`] for malformed values.
    pub fn parse(value: &str) -> Result<Self, ChecksumError> {
        if value.len() != DIGEST_HEX_LEN {
            return Err(ChecksumError::InvalidDigest {
                reason: format!(
                    "expected {DIGEST_HEX_LEN} hex characters, got {}",
                    value.len()
                ),
            });
        }
        if let Some(bad) = value.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(ChecksumError::InvalidDigest {
                reason: format!("non-hex character '{bad}'"),
            });
        }
        Ok(Self(value.to_ascii_lowercase()))
    }

    /// Parse the first token of a `sha256sum`-style checksum file.
    ///
    /// # Errors
    ///
    /// Returns [`ChecksumError::InvalidDigest`] when the file holds no digest.
    ///
    /// # Examples
    ///
    /// ```
    /// use qodana_prep_installer::checksum::Sha256Digest;
    ///
    /// let line = format!("{}  *qodana.tar.gz\n", "AB".repeat(32));
    /// let digest = Sha256Digest::from_checksum_file(&line).expect("digest");
    /// assert_eq!(digest.as_str(), "ab".repeat(32));
    /// ```
    pub fn from_checksum_file(contents: &str) -> Result<Self, ChecksumError> {
        let token = contents
            .split_whitespace()
            .next()
            .ok_or_else(|| ChecksumError::InvalidDigest {
                reason: "checksum file is empty".to_owned(),
            })?;
        Self::parse(token)
    }

    /// The digest as lowercase hex.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stream a file through SHA-256.
///
/// # Errors
///
/// Returns [`ChecksumError::Io`] if the file cannot be read.
pub fn compute_sha256(path: &Path) -> Result<Sha256Digest, ChecksumError> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 64 * 1024];
    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(Sha256Digest(format!("{:x}", hasher.finalize())))
}

/// Check that the file at `path` hashes to `expected`.
///
/// # Errors
///
/// Returns [`ChecksumError::Mismatch`] when the digests differ.
pub fn verify_file(path: &Path, expected: &Sha256Digest) -> Result<(), ChecksumError> {
    let actual = compute_sha256(path)?;
    if &actual != expected {
        return Err(ChecksumError::Mismatch {
            expected: expected.clone(),
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    // sha256("hello world")
    const HELLO_DIGEST: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    #[test]
    fn hashes_file_contents() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("hello.txt");
        fs::write(&path, b"hello world").expect("write");
        let digest = compute_sha256(&path).expect("hash");
        assert_eq!(digest.as_str(), HELLO_DIGEST);
    }

    #[test]
    fn verify_detects_tampering() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("hello.txt");
        fs::write(&path, b"hello world!").expect("write");
        let expected = Sha256Digest::parse(HELLO_DIGEST).expect("digest");
        let err = verify_file(&path, &expected).expect_err("mismatch");
        assert!(matches!(err, ChecksumError::Mismatch { .. }));
    }

    #[test]
    fn verify_accepts_matching_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("hello.txt");
        fs::write(&path, b"hello world").expect("write");
        let expected = Sha256Digest::parse(&HELLO_DIGEST.to_uppercase()).expect("digest");
        verify_file(&path, &expected).expect("matching digest");
    }

    #[rstest]
    #[case::empty("")]
    #[case::blank("   \n")]
    #[case::short("abc  *file")]
    #[case::non_hex("gggggggggggggggggggggggggggggggggggggggggggggggggggggggggggggggg  *file")]
    fn rejects_malformed_checksum_files(#[case] contents: &str) {
        let err = Sha256Digest::from_checksum_file(contents).expect_err("invalid");
        assert!(matches!(err, ChecksumError::InvalidDigest { .. }));
    }

    #[test]
    fn reads_digest_without_file_name() {
        let digest = Sha256Digest::from_checksum_file(HELLO_DIGEST).expect("digest");
        assert_eq!(digest.as_str(), HELLO_DIGEST);
    }
}
