//! Project configuration loaded from `qodana.yaml`.
//!
//! The file belongs to the analysis engine and carries many sections the
//! bootstrap never reads; only the product selection, the `properties`
//! overrides, the required plugins and the .NET settings are modelled here.
//! Unknown keys are ignored so that a complete engine configuration loads
//! cleanly.

use camino::{Utf8Path, Utf8PathBuf};
use qodana_prep_properties::DotNetSettings;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fs;
use thiserror::Error;

/// File names searched for in the project root, in order.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["qodana.yaml", "qodana.yml"];

/// Linter image names and the product codes they run.
const LINTER_PRODUCTS: [(&str, &str); 10] = [
    ("qodana-jvm-community", "QDJVMC"),
    ("qodana-jvm-android", "QDAND"),
    ("qodana-android", "QDAND"),
    ("qodana-jvm", "QDJVM"),
    ("qodana-php", "QDPHP"),
    ("qodana-js", "QDJS"),
    ("qodana-dotnet", "QDNET"),
    ("qodana-python-community", "QDPYC"),
    ("qodana-python", "QDPY"),
    ("qodana-go", "QDGO"),
];

/// The sections of `qodana.yaml` used by the bootstrap.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct ProjectConfig {
    /// Product code to run natively, e.g. `QDJVM` or `QDNET-EAP`.
    pub ide: Option<String>,
    /// Container image of the linter, e.g. `jetbrains/qodana-jvm:2024.1`.
    ///
    /// Used to infer the product when [`Self::ide`] is absent.
    pub linter: Option<String>,
    /// JVM system properties passed to the linter.
    ///
    /// Scalar values of any YAML type are accepted and kept as text.
    #[serde(deserialize_with = "scalar_properties")]
    pub properties: BTreeMap<String, String>,
    /// Plugins the linter must load.
    pub plugins: Vec<PluginEntry>,
    /// .NET solution selection.
    pub dotnet: DotNetConfig,
}

/// One entry of the `plugins` list.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct PluginEntry {
    /// Marketplace plugin id.
    pub id: String,
    /// Requested plugin version, if pinned.
    #[serde(default)]
    pub version: Option<String>,
}

/// The `dotnet` section.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct DotNetConfig {
    /// Project file to open.
    pub project: Option<String>,
    /// Solution file to open; ignored when a project is given.
    pub solution: Option<String>,
    /// Build configuration, e.g. `Release`.
    pub configuration: Option<String>,
    /// Build platform, e.g. `x64`.
    pub platform: Option<String>,
}

/// Errors reading `qodana.yaml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// The configuration file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid YAML or has the wrong shape.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// The configuration file.
        path: Utf8PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_yaml::Error,
    },
}

impl ProjectConfig {
    /// Parse configuration text.
    ///
    /// An empty document yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns the YAML error when the text cannot be parsed.
    ///
    /// # Examples
    ///
    /// ```
    /// use qodana_prep::ProjectConfig;
    ///
    /// let config = ProjectConfig::parse("ide: QDJVM\nproperties:\n  idea.max.content.load.filesize: 20000\n")
    ///     .expect("valid configuration");
    /// assert_eq!(config.ide.as_deref(), Some("QDJVM"));
    /// assert_eq!(config.properties["idea.max.content.load.filesize"], "20000");
    /// ```
    pub fn parse(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Load the configuration from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Load `explicit` when given, otherwise the first of
    /// [`CONFIG_FILE_NAMES`] present in `project_dir`.
    ///
    /// A project without a configuration file gets the default
    /// configuration; an explicit path that does not exist is an error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the chosen file cannot be read or parsed.
    pub fn discover(project_dir: &Utf8Path, explicit: Option<&Utf8Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match find_config_file(project_dir) {
            Some(path) => {
                log::debug!("loading project configuration from {path}");
                Self::load(&path)
            }
            None => {
                log::debug!("no qodana.yaml in {project_dir}");
                Ok(Self::default())
            }
        }
    }

    /// The product code this configuration selects, from `ide` or else from
    /// the `linter` image name.
    #[must_use]
    pub fn product(&self) -> Option<String> {
        self.ide
            .as_deref()
            .map(str::trim)
            .filter(|ide| !ide.is_empty())
            .map(ToOwned::to_owned)
            .or_else(|| self.linter.as_deref().and_then(product_for_linter).map(ToOwned::to_owned))
    }

    /// Ids of the required plugins, in declaration order.
    #[must_use]
    pub fn plugin_ids(&self) -> Vec<String> {
        self.plugins
            .iter()
            .map(|plugin| plugin.id.trim())
            .filter(|id| !id.is_empty())
            .map(ToOwned::to_owned)
            .collect()
    }

    /// The .NET settings in the form the assembler expects.
    #[must_use]
    pub fn dotnet_settings(&self) -> DotNetSettings {
        DotNetSettings {
            project: self.dotnet.project.clone(),
            solution: self.dotnet.solution.clone(),
            configuration: self.dotnet.configuration.clone(),
            platform: self.dotnet.platform.clone(),
        }
    }
}

/// Map a linter image reference such as `jetbrains/qodana-jvm:2024.1` to
/// its product code.
///
/// # Examples
///
/// ```
/// use qodana_prep::config::product_for_linter;
///
/// assert_eq!(product_for_linter("jetbrains/qodana-jvm-community:2024.1"), Some("QDJVMC"));
/// assert_eq!(product_for_linter("registry.example/custom"), None);
/// ```
#[must_use]
pub fn product_for_linter(image: &str) -> Option<&'static str> {
    let last_segment = image.rsplit('/').next().unwrap_or(image);
    let name = last_segment.split(':').next().unwrap_or(last_segment);
    LINTER_PRODUCTS
        .iter()
        .find(|(linter, _)| *linter == name)
        .map(|(_, code)| *code)
}

fn find_config_file(project_dir: &Utf8Path) -> Option<Utf8PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| project_dir.join(name))
        .find(|path| path.is_file())
}

fn scalar_properties<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    raw.into_iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(text) => text,
                Value::Bool(flag) => flag.to_string(),
                Value::Number(number) => number.to_string(),
                Value::Null => String::new(),
                Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => {
                    return Err(D::Error::custom(format!(
                        "property {key} must be a string, number or boolean"
                    )));
                }
            };
            Ok((key, text))
        })
        .collect()
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
