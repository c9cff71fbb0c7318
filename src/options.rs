//! Settle the command line and `qodana.yaml` into one bootstrap request.

use camino::Utf8PathBuf;
use qodana_prep_credential::CachePolicy;

use crate::cli::Cli;
use crate::config::ProjectConfig;
use crate::dirs::BaseDirs;
use crate::error::{AppError, Result};
use crate::project::ProjectIdentity;

/// Everything the bootstrap needs, with defaults applied.
#[derive(Debug, Clone)]
pub struct BootstrapOptions {
    /// Token passed on the command line.
    pub token: Option<String>,
    /// Skip the cached token.
    pub refresh_token: bool,
    /// How cached tokens are treated.
    pub cache_policy: CachePolicy,
    /// Upper-case product code, possibly with an `-EAP` suffix.
    pub product: String,
    /// Project root.
    pub project_dir: Utf8PathBuf,
    /// Identity of the project root.
    pub project: ProjectIdentity,
    /// This project's cache directory.
    pub cache_dir: Utf8PathBuf,
    /// Raw `--property` arguments.
    pub cli_properties: Vec<String>,
    /// Fixed analysis id, if given.
    pub analysis_id: Option<String>,
    /// Coverage report directory, if given.
    pub coverage_dir: Option<Utf8PathBuf>,
    /// Suppress progress output.
    pub quiet: bool,
    /// The loaded project configuration.
    pub project_config: ProjectConfig,
}

impl BootstrapOptions {
    /// Load the project configuration and resolve the product and cache
    /// directory.
    ///
    /// `--product` wins over `qodana.yaml`. Without `--cache-dir` the
    /// project gets its own directory under the platform cache.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ProjectConfig`] when `qodana.yaml` cannot be
    /// loaded, [`AppError::NoProduct`] when no product is named and
    /// [`AppError::NoCacheDirectory`] when no cache directory can be found.
    pub fn from_cli(cli: &Cli, dirs: &dyn BaseDirs) -> Result<Self> {
        let project_config = ProjectConfig::discover(&cli.project_dir, cli.config.as_deref())?;
        let requested = cli
            .product
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(ToOwned::to_owned)
            .or_else(|| project_config.product())
            .ok_or(AppError::NoProduct)?;
        let product = requested.to_ascii_uppercase();

        let project = ProjectIdentity::of(&cli.project_dir);
        let cache_dir = match cli.cache_dir.clone() {
            Some(dir) => dir,
            None => default_cache_dir(dirs, &project)?,
        };

        let cache_policy = if cli.revalidate_cached_token {
            CachePolicy::AlwaysRevalidate
        } else {
            CachePolicy::TrustCache
        };

        Ok(Self {
            token: cli.token.clone(),
            refresh_token: cli.refresh_token,
            cache_policy,
            product,
            project_dir: cli.project_dir.clone(),
            project,
            cache_dir,
            cli_properties: cli.properties.clone(),
            analysis_id: cli.analysis_id.clone(),
            coverage_dir: cli.coverage_dir.clone(),
            quiet: cli.quiet,
            project_config,
        })
    }

    /// Where the product is installed.
    #[must_use]
    pub fn tool_dir(&self) -> Utf8PathBuf {
        self.cache_dir.join("tools").join(&self.product)
    }
}

fn default_cache_dir(dirs: &dyn BaseDirs, project: &ProjectIdentity) -> Result<Utf8PathBuf> {
    let platform_dir = dirs.cache_dir().ok_or(AppError::NoCacheDirectory)?;
    let base = Utf8PathBuf::from_path_buf(platform_dir).map_err(|_| AppError::NoCacheDirectory)?;
    Ok(project.cache_dir(&base))
}

#[cfg(test)]
#[path = "options_tests.rs"]
mod tests;
