//! HTTP retrieval of release feeds, checksums and distributions.
//!
//! Provides a trait-based abstraction so tests can exercise the acquisition
//! pipeline without network access.

use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

/// Connection timeout for feed and artefact requests.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
/// Time allowed for the server to start responding.
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(60);

/// Trait for fetching remote resources.
///
/// # Examples
///
/// ```
/// use qodana_prep_installer::download::HttpDownloader;
///
/// let downloader = HttpDownloader;
/// // Use downloader.fetch_text(url) or downloader.download_to(url, dest) in production
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArtefactDownloader {
    /// Fetch a small text resource such as the release feed.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not UTF-8.
    fn fetch_text(&self, url: &str) -> Result<String, DownloadError>;

    /// Stream the resource at `url` into the file `dest`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request or the file write fails.
    fn download_to(&self, url: &str, dest: &Path) -> Result<(), DownloadError>;
}

/// Errors arising from download operations.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// HTTP request failed.
    #[error("download failed for {url}: {reason}")]
    HttpError {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The resource was not found (HTTP 404).
    #[error("resource not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// I/O error writing the downloaded file.
    #[error("I/O error writing download: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP-based downloader using `ureq`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpDownloader;

impl ArtefactDownloader for HttpDownloader {
    fn fetch_text(&self, url: &str) -> Result<String, DownloadError> {
        log::debug!("fetching {url}");
        let response = http_agent()
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        response
            .into_body()
            .read_to_string()
            .map_err(|e| DownloadError::HttpError {
                url: url.to_owned(),
                reason: e.to_string(),
            })
    }

    fn download_to(&self, url: &str, dest: &Path) -> Result<(), DownloadError> {
        log::debug!("downloading {url} to {}", dest.display());
        let response = http_agent()
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        let mut file = std::fs::File::create(dest)?;
        std::io::copy(&mut response.into_body().as_reader(), &mut file)?;
        file.sync_all()?;
        Ok(())
    }
}

/// Shared `ureq` agent.
///
/// Distributions are hundreds of megabytes, so only connection set-up and
/// the first response byte are bounded; the body transfer is not.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_connect(Some(CONNECT_TIMEOUT))
            .timeout_recv_response(Some(RESPONSE_TIMEOUT))
            .build();
        ureq::Agent::new_with_config(config)
    })
}

/// Map a ureq error to a [`DownloadError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> DownloadError {
    match err {
        ureq::Error::StatusCode(404) => DownloadError::NotFound {
            url: url.to_owned(),
        },
        other => DownloadError::HttpError {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_ureq_error_maps_404_to_not_found() {
        let err = ureq::Error::StatusCode(404);
        let mapped = map_ureq_error("https://example.test/feed", &err);
        assert!(matches!(mapped, DownloadError::NotFound { .. }));
    }

    #[test]
    fn map_ureq_error_maps_other_status_to_http_error() {
        let err = ureq::Error::StatusCode(503);
        let mapped = map_ureq_error("https://example.test/feed", &err);
        match mapped {
            DownloadError::HttpError { url, .. } => assert_eq!(url, "https://example.test/feed"),
            other => panic!("expected HttpError, got {other:?}"),
        }
    }

    #[test]
    fn unreachable_host_is_an_http_error() {
        let err = HttpDownloader
            .fetch_text("http://127.0.0.1:9/products/releases")
            .expect_err("nothing listens on the discard port");
        assert!(matches!(err, DownloadError::HttpError { .. }));
    }
}
