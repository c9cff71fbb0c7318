//! In-memory capabilities for driving [`crate::Bootstrap`] in tests.
//!
//! Enable the `test-support` feature in `[dev-dependencies]` to use these
//! from integration tests. The surface is not covered by semver guarantees.

use camino::Utf8Path;
use qodana_prep_credential::{Prompter, TokenValidator, TransportError};
use qodana_prep_installer::app_info::APP_INFO_FILE;
use qodana_prep_installer::download::{ArtefactDownloader, DownloadError};
use qodana_prep_installer::platform::{HostArch, HostOs, HostPlatform};
use qodana_prep_installer::test_utils::{app_info_xml, write_file};
use std::cell::{Cell, RefCell};
use std::path::Path;

/// A validator with a fixed answer that counts its calls.
#[derive(Debug)]
pub struct StubValidator {
    answer: Result<Option<String>, TransportError>,
    calls: Cell<usize>,
}

impl StubValidator {
    /// Accept every token as belonging to `project`.
    #[must_use]
    pub fn accepting(project: &str) -> Self {
        Self::answering(Ok(Some(project.to_owned())))
    }

    /// Reject every token.
    #[must_use]
    pub fn rejecting() -> Self {
        Self::answering(Ok(None))
    }

    /// Fail every request as if the service were down.
    #[must_use]
    pub fn unreachable() -> Self {
        Self::answering(Err(TransportError::Request {
            url: "https://qodana.test/api/v1/projects".to_owned(),
            reason: "connection refused".to_owned(),
        }))
    }

    const fn answering(answer: Result<Option<String>, TransportError>) -> Self {
        Self {
            answer,
            calls: Cell::new(0),
        }
    }

    /// How many tokens were validated.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl TokenValidator for StubValidator {
    fn validate(&self, _token: &str) -> Result<Option<String>, TransportError> {
        self.calls.set(self.calls.get() + 1);
        self.answer.clone()
    }
}

/// A prompter for a session without a terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTerminal;

impl Prompter for NoTerminal {
    fn is_interactive(&self) -> bool {
        false
    }

    fn read_token(&self) -> std::io::Result<String> {
        Err(std::io::Error::other("no terminal"))
    }
}

/// Serves a canned release feed and artefact, recording every request.
///
/// Without a feed every request fails with [`DownloadError::NotFound`].
#[derive(Debug, Default)]
pub struct CannedDownloader {
    feed: Option<String>,
    artefact: Vec<u8>,
    requests: RefCell<Vec<String>>,
}

impl CannedDownloader {
    /// A downloader with no network at all.
    #[must_use]
    pub fn offline() -> Self {
        Self::default()
    }

    /// Serve `feed` for feed requests and `artefact` for downloads.
    #[must_use]
    pub fn serving(feed: String, artefact: Vec<u8>) -> Self {
        Self {
            feed: Some(feed),
            artefact,
            requests: RefCell::default(),
        }
    }

    /// URLs requested so far.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl ArtefactDownloader for CannedDownloader {
    fn fetch_text(&self, url: &str) -> Result<String, DownloadError> {
        self.requests.borrow_mut().push(url.to_owned());
        self.feed.clone().ok_or_else(|| DownloadError::NotFound {
            url: url.to_owned(),
        })
    }

    fn download_to(&self, url: &str, dest: &Path) -> Result<(), DownloadError> {
        self.requests.borrow_mut().push(url.to_owned());
        if self.feed.is_none() {
            return Err(DownloadError::NotFound {
                url: url.to_owned(),
            });
        }
        std::fs::write(dest, &self.artefact).map_err(DownloadError::Io)
    }
}

/// The Linux x86-64 host, whose artefacts are tarballs.
#[must_use]
pub const fn linux_x64() -> HostPlatform {
    HostPlatform::new(HostOs::Linux, HostArch::X86_64)
}

/// Lay out a minimal installation of `product` with build `build` in `dir`.
///
/// # Panics
///
/// Panics on I/O failure.
pub fn seed_installation(dir: &Utf8Path, product: &str, build: &str) {
    let manifest = dir.join("bin").join(APP_INFO_FILE);
    write_file(manifest.as_std_path(), app_info_xml(product, build).as_bytes());
}
