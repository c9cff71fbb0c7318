//! Reading the product manifest shipped with an installation.
//!
//! Every distribution carries `bin/QodanaAppInfo.xml`, which names the product
//! and its build. macOS bundles keep it under `Contents/`.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the product manifest.
pub const APP_INFO_FILE: &str = "QodanaAppInfo.xml";

/// Platform-family branch from which the newer configuration layout applies.
const LAYOUT_233_BRANCH: u32 = 233;

/// Product metadata read from an installation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductInfo {
    /// Short product name, e.g. `Qodana`.
    pub name: String,
    /// Full product name, e.g. `Qodana for JVM`.
    pub full_name: String,
    /// Marketing version, e.g. `2024.1.2`.
    pub version: String,
    /// Build number including any product prefix, e.g. `QDJVM-241.14494.240`.
    pub build: String,
}

impl ProductInfo {
    /// The build number without its product prefix.
    #[must_use]
    pub fn build_number(&self) -> &str {
        self.build
            .split_once('-')
            .map_or(self.build.as_str(), |(_, number)| number)
    }

    /// The platform branch, the first component of the build number.
    ///
    /// # Examples
    ///
    /// ```
    /// use qodana_prep_installer::app_info::ProductInfo;
    ///
    /// let info = ProductInfo {
    ///     build: "QDJVM-241.14494.240".to_owned(),
    ///     ..ProductInfo::default()
    /// };
    /// assert_eq!(info.version_branch(), Some("241"));
    /// assert!(info.is_233_or_newer());
    /// ```
    #[must_use]
    pub fn version_branch(&self) -> Option<&str> {
        let branch = self.build_number().split('.').next()?;
        (!branch.is_empty()).then_some(branch)
    }

    /// Whether the installation belongs to branch 233 or later.
    #[must_use]
    pub fn is_233_or_newer(&self) -> bool {
        self.version_branch()
            .and_then(|branch| branch.parse::<u32>().ok())
            .is_some_and(|branch| branch >= LAYOUT_233_BRANCH)
    }
}

/// Errors arising while reading the product manifest.
#[derive(Debug, thiserror::Error)]
pub enum AppInfoError {
    /// No manifest exists in either layout.
    #[error("{APP_INFO_FILE} not found under {root}")]
    Missing {
        /// The installation root that was searched.
        root: String,
    },

    /// The manifest could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// The manifest path.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The manifest is not well-formed.
    #[error("invalid {APP_INFO_FILE}: {0}")]
    Parse(#[from] quick_xml::DeError),

    /// The manifest does not name a product.
    #[error("{APP_INFO_FILE} does not name a product")]
    MissingName,
}

#[derive(Debug, Default, Deserialize)]
struct AppInfoDocument {
    #[serde(default)]
    version: VersionElement,
    #[serde(default)]
    build: BuildElement,
    #[serde(default)]
    names: NamesElement,
}

#[derive(Debug, Default, Deserialize)]
struct VersionElement {
    #[serde(rename = "@major", default)]
    major: String,
    #[serde(rename = "@minor", default)]
    minor: String,
    #[serde(rename = "@micro", default)]
    micro: String,
}

#[derive(Debug, Default, Deserialize)]
struct BuildElement {
    #[serde(rename = "@number", default)]
    number: String,
}

#[derive(Debug, Default, Deserialize)]
struct NamesElement {
    #[serde(rename = "@product", default)]
    product: String,
    #[serde(rename = "@fullname", default)]
    full_name: String,
}

/// Parse manifest XML.
///
/// # Errors
///
/// Returns [`AppInfoError::Parse`] for malformed XML and
/// [`AppInfoError::MissingName`] when no product name is present.
pub fn parse_app_info(xml: &str) -> Result<ProductInfo, AppInfoError> {
    let document: AppInfoDocument = quick_xml::de::from_str(xml)?;
    let name = document.names.product.trim().to_owned();
    if name.is_empty() {
        return Err(AppInfoError::MissingName);
    }

    let VersionElement {
        major,
        minor,
        micro,
    } = document.version;
    let version = [major, minor, micro]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(".");

    Ok(ProductInfo {
        name,
        full_name: document.names.full_name,
        version,
        build: document.build.number,
    })
}

/// Directory holding `bin/` for the installation at `root`.
///
/// Returns `root` for flat layouts and `root/Contents` for macOS bundles, or
/// `None` when neither contains a manifest.
#[must_use]
pub fn locate_home(root: &Path) -> Option<PathBuf> {
    [root.to_path_buf(), root.join("Contents")]
        .into_iter()
        .find(|home| manifest_path(home).is_file())
}

/// Read and parse the manifest of the installation at `root`.
///
/// # Errors
///
/// Returns [`AppInfoError::Missing`] when no manifest exists, otherwise the
/// errors of [`parse_app_info`].
pub fn read_product_info(root: &Path) -> Result<ProductInfo, AppInfoError> {
    let home = locate_home(root).ok_or_else(|| AppInfoError::Missing {
        root: root.display().to_string(),
    })?;
    let path = manifest_path(&home);
    let xml = fs::read_to_string(&path).map_err(|source| AppInfoError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_app_info(&xml)
}

fn manifest_path(home: &Path) -> PathBuf {
    home.join("bin").join(APP_INFO_FILE)
}
