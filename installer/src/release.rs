//! Release feed parsing and release selection.
//!
//! The feed is the JSON document served by
//! `https://data.services.jetbrains.com/products/releases`, keyed by product
//! code and listing releases newest first.

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::platform::{ArchiveFormat, HostPlatform};
use crate::product::{Channel, ProductCode};

/// Base URL of the JetBrains release feed.
pub const RELEASE_FEED_URL: &str = "https://data.services.jetbrains.com/products/releases";

/// One downloadable file of a release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Download {
    /// Direct download URL.
    pub link: String,
    /// Size in bytes, when published.
    #[serde(default)]
    pub size: Option<u64>,
    /// URL of the SHA-256 checksum file, when published.
    #[serde(default)]
    pub checksum_link: Option<String>,
}

/// One release entry of the feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    /// Release date as published.
    #[serde(default)]
    pub date: String,
    /// Release type, `release` or `eap`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Marketing version, e.g. `2024.1`.
    #[serde(default)]
    pub version: String,
    /// Build number, e.g. `241.14494.240`.
    #[serde(default)]
    pub build: String,
    /// Downloads keyed by platform.
    #[serde(default)]
    pub downloads: BTreeMap<String, Download>,
}

/// A release chosen for a host, with the matching download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedRelease {
    /// The chosen release.
    pub release: Release,
    /// Download key the artefact was chosen under.
    pub download_key: String,
    /// The artefact to fetch.
    pub download: Download,
    /// How the artefact is packaged.
    pub format: ArchiveFormat,
}

impl SelectedRelease {
    /// File name of the artefact, taken from the last URL path segment.
    #[must_use]
    pub fn file_name(&self) -> &str {
        let path = self.download.link.split(['?', '#']).next().unwrap_or_default();
        match path.rsplit('/').next() {
            Some(name) if !name.is_empty() => name,
            _ => "distribution",
        }
    }
}

/// Errors arising while interpreting the release feed.
#[derive(Debug, thiserror::Error)]
pub enum ReleaseError {
    /// The feed is not valid JSON of the expected shape.
    #[error("invalid release feed: {0}")]
    Parse(#[from] serde_json::Error),

    /// No release of the channel has a download for the host.
    #[error("no {channel} release of {product} is published for {platform}")]
    NoMatchingRelease {
        /// The requested product code.
        product: String,
        /// The requested channel.
        channel: Channel,
        /// The host platform.
        platform: String,
    },
}

/// Build the feed URL for a product and channel.
///
/// # Examples
///
/// ```
/// use qodana_prep_installer::product::{Channel, ProductCode};
/// use qodana_prep_installer::release::release_feed_url;
///
/// let code: ProductCode = "QDGO".parse().expect("known product");
/// let url = release_feed_url(code, Channel::EarlyAccess);
/// assert!(url.ends_with("?code=QDGO&type=eap"));
/// ```
#[must_use]
pub fn release_feed_url(product: ProductCode, channel: Channel) -> String {
    format!(
        "{RELEASE_FEED_URL}?code={}&type={}",
        product.as_str(),
        channel.feed_type()
    )
}

/// Parse the feed and pick the newest release usable on `platform`.
///
/// Releases of other channels are skipped even if the feed includes them.
///
/// # Errors
///
/// Returns [`ReleaseError::Parse`] for malformed feeds and
/// [`ReleaseError::NoMatchingRelease`] when nothing fits.
pub fn select_release(
    feed: &str,
    product: ProductCode,
    channel: Channel,
    platform: HostPlatform,
) -> Result<SelectedRelease, ReleaseError> {
    let mut parsed: BTreeMap<String, Vec<Release>> = serde_json::from_str(feed)?;
    let releases = parsed.remove(product.as_str()).unwrap_or_default();

    releases
        .into_iter()
        .filter(|release| release.kind == channel.feed_type())
        .find_map(|release| choose_download(release, platform))
        .ok_or_else(|| ReleaseError::NoMatchingRelease {
            product: product.to_string(),
            channel,
            platform: platform.to_string(),
        })
}

fn choose_download(release: Release, platform: HostPlatform) -> Option<SelectedRelease> {
    let (key, download, format) = platform.download_keys().iter().find_map(|key| {
        let download = release.downloads.get(*key)?;
        let format = ArchiveFormat::for_download_key(key)?;
        Some(((*key).to_owned(), download.clone(), format))
    })?;
    Some(SelectedRelease {
        release,
        download_key: key,
        download,
        format,
    })
}
