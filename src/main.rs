//! CLI entrypoint for `qodana-prep`.
//!
//! Resolves the Qodana Cloud token, installs the linter distribution and
//! writes its VM options file, then prints the variable that points at the
//! file so that a launcher can pick it up.

use clap::Parser;
use log::LevelFilter;
use qodana_prep::bootstrap::{Bootstrap, Prepared};
use qodana_prep::cli::Cli;
use qodana_prep::dirs::SystemBaseDirs;
use qodana_prep::error::Result;
use qodana_prep::options::BootstrapOptions;
use qodana_prep_common::{
    Environment, ProcessEnvironment, QODANA_ENDPOINT, write_error, write_success,
};
use qodana_prep_credential::{HttpTokenValidator, SecretStore, TerminalPrompter};
use qodana_prep_installer::download::HttpDownloader;
use qodana_prep_installer::extraction::SystemExtractor;
use qodana_prep_installer::platform::HostPlatform;
use std::io::Write;

/// Service name under which tokens are filed in the platform keychain.
#[cfg(feature = "keyring")]
const KEYRING_SERVICE: &str = "qodana-prep";

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stdout, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// Main entry point for the bootstrap.
///
/// Loads the project configuration, wires the production capabilities and
/// runs the credential, tool and configuration stages in turn.
fn run(cli: &Cli, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Result<()> {
    // Step 1: Settle the product, cache directory and project configuration
    let options = BootstrapOptions::from_cli(cli, &SystemBaseDirs::new())?;
    log::debug!("preparing {} in {}", options.product, options.cache_dir);

    // Step 2: Wire the host capabilities
    let platform = HostPlatform::current()?;
    let env = ProcessEnvironment;
    let store = secret_store();
    let validator = validator_for(&env);
    let extractor = SystemExtractor::new();
    let bootstrap = Bootstrap {
        env: &env,
        store: store.as_ref(),
        validator: &validator,
        prompter: &TerminalPrompter,
        downloader: &HttpDownloader,
        extractor: &extractor,
        platform,
    };

    // Step 3: Run the pipeline
    let prepared = bootstrap.run(&options, stderr)?;

    // Step 4: Report the result
    report(&prepared, options.quiet, stdout, stderr);
    Ok(())
}

fn validator_for(env: &dyn Environment) -> HttpTokenValidator {
    env.var(QODANA_ENDPOINT)
        .map_or_else(HttpTokenValidator::default, HttpTokenValidator::new)
}

#[cfg(feature = "keyring")]
fn secret_store() -> Box<dyn SecretStore> {
    Box::new(qodana_prep_credential::KeyringSecretStore::new(KEYRING_SERVICE))
}

#[cfg(not(feature = "keyring"))]
fn secret_store() -> Box<dyn SecretStore> {
    log::debug!("built without keyring support; tokens are not cached");
    Box::new(qodana_prep_credential::MemorySecretStore::default())
}

fn report(prepared: &Prepared, quiet: bool, stdout: &mut dyn Write, stderr: &mut dyn Write) {
    if !quiet {
        write_success(
            stderr,
            format!(
                "Wrote {} VM options to {}",
                prepared.configuration.lines().len(),
                prepared.vm_options_path
            ),
        );
    }
    if writeln!(stdout, "{}={}", prepared.vm_options_env, prepared.vm_options_path).is_err() {
        log::warn!("could not write {} to stdout", prepared.vm_options_env);
    }
}

fn init_logging(cli: &Cli) {
    let level = match (cli.quiet, cli.verbosity) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Warn,
        (false, 1) => LevelFilter::Info,
        (false, _) => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_error(stderr, &err);
            err.exit_code()
        }
    }
}
