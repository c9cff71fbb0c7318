//! Facts about the product being launched.

use camino::{Utf8Path, Utf8PathBuf};

use crate::device::DeviceIdentity;

/// Directories the IDE is pointed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdePaths {
    /// The product manifest of the installation.
    pub app_info: Utf8PathBuf,
    /// IDE system directory (caches, indexes).
    pub system: Utf8PathBuf,
    /// IDE configuration directory; the VM options file is written here.
    pub config: Utf8PathBuf,
    /// Directory for third-party plugins.
    pub plugins: Utf8PathBuf,
    /// Log directory, also receiving the GC log.
    pub log: Utf8PathBuf,
}

impl IdePaths {
    /// Lay out per-branch directories below a cache root.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use qodana_prep_properties::IdePaths;
    ///
    /// let paths = IdePaths::under_cache(
    ///     Utf8Path::new("/cache"),
    ///     Utf8Path::new("/opt/qodana/bin/QodanaAppInfo.xml"),
    ///     "241",
    /// );
    /// assert_eq!(paths.system.as_str(), "/cache/idea/241");
    /// assert_eq!(paths.plugins.as_str(), "/cache/plugins/241");
    /// ```
    #[must_use]
    pub fn under_cache(cache_dir: &Utf8Path, app_info: &Utf8Path, branch: &str) -> Self {
        Self {
            app_info: app_info.to_owned(),
            system: cache_dir.join("idea").join(branch),
            config: cache_dir.join("conf").join(branch),
            plugins: cache_dir.join("plugins").join(branch),
            log: cache_dir.join("log"),
        }
    }
}

/// Settings for the .NET integration, from the `dotnet` section of
/// `qodana.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DotNetSettings {
    /// Project to analyse; takes precedence over `solution`.
    pub project: Option<String>,
    /// Solution to analyse.
    pub solution: Option<String>,
    /// Build configuration, e.g. `Release`.
    pub configuration: Option<String>,
    /// Build platform, e.g. `x64`.
    pub platform: Option<String>,
}

impl DotNetSettings {
    /// Whether any setting is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        [
            &self.project,
            &self.solution,
            &self.configuration,
            &self.platform,
        ]
        .iter()
        .all(|value| value.as_deref().is_none_or(str::is_empty))
    }
}

/// Everything the assembler needs to know about the launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductContext {
    /// Product code, used to name the VM options file.
    pub product_code: String,
    /// Parent IDE platform prefix, e.g. `Idea` or `Rider`.
    pub parent_prefix: String,
    /// Environment variable the IDE launcher reads its VM options from.
    pub vm_options_env: String,
    /// Whether an early-access build is running.
    pub early_access: bool,
    /// Whether the installation is from branch 233 or later.
    pub is_233_or_newer: bool,
    /// Whether licensing should treat an early-access build as a release.
    pub treat_as_release: bool,
    /// Whether usage statistics may be sent.
    pub statistics_enabled: bool,
    /// IDE directories.
    pub paths: IdePaths,
    /// Statistics device identity.
    pub device: DeviceIdentity,
    /// Identifier of this analysis run.
    pub analysis_id: String,
    /// Required plugin ids.
    pub plugins: Vec<String>,
    /// Directory holding coverage reports to import.
    pub coverage_dir: Option<Utf8PathBuf>,
    /// .NET integration settings.
    pub dotnet: DotNetSettings,
}
