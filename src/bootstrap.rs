//! The bootstrap pipeline: credential, then tool, then configuration.
//!
//! [`Bootstrap`] holds the capabilities each stage needs. The binary passes
//! the process environment, the platform keychain and real HTTP; tests pass
//! in-memory fakes. Data flows one way: the credential decides whether
//! statistics are enabled, the installed tool supplies product metadata and
//! the assembler turns both into the VM options file.

use camino::Utf8PathBuf;
use std::io::Write;

use qodana_prep_common::{
    Environment, QODANA_CLEAR_KEYRING, QODANA_TREAT_AS_RELEASE, write_stderr_line, write_warning,
};
use qodana_prep_credential::{Credential, CredentialResolver, Prompter, SecretStore, TokenValidator};
use qodana_prep_installer::app_info::APP_INFO_FILE;
use qodana_prep_installer::download::ArtefactDownloader;
use qodana_prep_installer::extraction::ArtefactExtractor;
use qodana_prep_installer::platform::HostPlatform;
use qodana_prep_installer::{Channel, InstalledTool, ToolAcquirer};
use qodana_prep_properties::{
    AssembledConfiguration, Baseline, ConfigurationLayer, DeviceIdentity, IdePaths,
    ProductContext, assemble, write_vm_options,
};
use uuid::Uuid;

use crate::error::Result;
use crate::options::BootstrapOptions;

/// The outcome of a successful bootstrap.
#[derive(Debug, Clone)]
pub struct Prepared {
    /// The token in use, if any source produced one.
    pub credential: Option<Credential>,
    /// The installed linter.
    pub tool: InstalledTool,
    /// The assembled VM options.
    pub configuration: AssembledConfiguration,
    /// Environment variable the linter reads its VM options from.
    pub vm_options_env: String,
    /// The written VM options file.
    pub vm_options_path: Utf8PathBuf,
}

/// Runs the three bootstrap stages against injected capabilities.
pub struct Bootstrap<'a> {
    /// Process environment.
    pub env: &'a dyn Environment,
    /// Token cache.
    pub store: &'a dyn SecretStore,
    /// Remote token validation.
    pub validator: &'a dyn TokenValidator,
    /// Interactive token entry.
    pub prompter: &'a dyn Prompter,
    /// Release feed and artefact transport.
    pub downloader: &'a dyn ArtefactDownloader,
    /// Archive and installer unpacking.
    pub extractor: &'a dyn ArtefactExtractor,
    /// The host the linter is installed for.
    pub platform: HostPlatform,
}

impl Bootstrap<'_> {
    /// Resolve the token, install the linter and write its VM options.
    ///
    /// An unreachable validation service is reported and the run continues
    /// without a token. A rejected token stops the run before anything is
    /// downloaded.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AppError`] when the token is rejected, the linter
    /// cannot be installed or the VM options file cannot be written.
    pub fn run(&self, options: &BootstrapOptions, stderr: &mut dyn Write) -> Result<Prepared> {
        // Step 1: Resolve and validate the token
        let credential = self.resolve_credential(options, stderr)?;

        // Step 2: Install the linter, or reuse an existing installation
        let tool_dir = options.tool_dir();
        let tool = ToolAcquirer::new(self.platform, self.downloader, self.extractor)
            .quiet(options.quiet)
            .acquire(&options.product, &tool_dir, stderr)?;
        if !options.quiet {
            write_stderr_line(
                stderr,
                format!("Using {} {} from {}", tool.info.name, tool.info.version, tool.path),
            );
        }

        // Step 3: Describe the launch
        let context = self.product_context(options, &tool, credential.as_ref());

        // Step 4: Merge the configuration layers and write them out
        let baseline = Baseline::standard(&context.paths.log, context.treat_as_release);
        let user = ConfigurationLayer::from_pairs(&options.project_config.properties);
        let cli = ConfigurationLayer::from_arguments(&options.cli_properties);
        let configuration = assemble(&baseline, &context, &user, &cli);
        let vm_options_path = write_vm_options(&configuration, &context, self.env)?;
        log::info!("{}={vm_options_path}", context.vm_options_env);

        Ok(Prepared {
            credential,
            tool,
            configuration,
            vm_options_env: context.vm_options_env,
            vm_options_path,
        })
    }

    fn resolve_credential(
        &self,
        options: &BootstrapOptions,
        stderr: &mut dyn Write,
    ) -> Result<Option<Credential>> {
        let resolver = CredentialResolver::new(self.validator, self.store, self.env)
            .with_project_identity(options.project.digest())
            .with_cache_policy(options.cache_policy)
            .with_default_sources(options.token.clone(), self.prompter);

        if self.env.var(QODANA_CLEAR_KEYRING).is_some() {
            resolver.clear_cached()?;
            log::debug!("{QODANA_CLEAR_KEYRING} is set; cached token discarded");
        }

        match resolver.validate(options.refresh_token, stderr) {
            Ok(credential) => Ok(credential),
            Err(err) if !err.is_fatal() => {
                write_warning(stderr, format!("{err}; continuing without a verified token"));
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn product_context(
        &self,
        options: &BootstrapOptions,
        tool: &InstalledTool,
        credential: Option<&Credential>,
    ) -> ProductContext {
        let spec = tool.product.spec();
        let branch = tool
            .info
            .version_branch()
            .unwrap_or_else(|| tool.info.build_number());
        let app_info = tool.home.join("bin").join(APP_INFO_FILE);
        let analysis_id = options
            .analysis_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        ProductContext {
            product_code: spec.code.to_owned(),
            parent_prefix: spec.parent_prefix.to_owned(),
            vm_options_env: spec.vm_options_env.to_owned(),
            early_access: tool.channel == Channel::EarlyAccess,
            is_233_or_newer: tool.info.is_233_or_newer(),
            treat_as_release: self.env.var(QODANA_TREAT_AS_RELEASE).as_deref() == Some("true"),
            statistics_enabled: credential.is_some(),
            paths: IdePaths::under_cache(&options.cache_dir, &app_info, branch),
            device: DeviceIdentity::derive(options.project.digest()),
            analysis_id,
            plugins: options.project_config.plugin_ids(),
            coverage_dir: options.coverage_dir.clone(),
            dotnet: options.project_config.dotnet_settings(),
        }
    }
}

#[cfg(test)]
#[path = "bootstrap_tests.rs"]
mod tests;
