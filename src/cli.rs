//! CLI argument definitions for `qodana-prep`.
//!
//! This module defines the command-line interface using clap. It is kept
//! apart from the entrypoint so that argument parsing can be tested without
//! running the bootstrap.

use camino::Utf8PathBuf;
use clap::Parser;

/// Prepare a Qodana linter run.
#[derive(Parser, Debug, Clone)]
#[command(name = "qodana-prep")]
#[command(version, about)]
#[command(long_about = concat!(
    "Prepare a Qodana linter run.\n\n",
    "Resolves the Qodana Cloud token, installs the requested linter ",
    "distribution into the project cache and writes the VM options file the ",
    "linter is launched with.\n\n",
    "The token is taken from --token, then QODANA_TOKEN, then the system ",
    "keyring, then an interactive prompt. The product is taken from --product, ",
    "then the `ide` or `linter` entry of qodana.yaml.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Prepare the JVM linter for the current directory:\n",
    "    $ qodana-prep --product QDJVM\n\n",
    "  Use the early-access channel and override a property:\n",
    "    $ qodana-prep --product QDPY-EAP -p idea.log.level=2\n\n",
    "  Ignore the cached token and validate a fresh one:\n",
    "    $ qodana-prep --refresh-token\n\n",
    "The VM options variable is printed to stdout as NAME=PATH.",
))]
pub struct Cli {
    /// Qodana Cloud project token.
    #[arg(short = 't', long, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Product code to install, e.g. QDJVM or QDNET-EAP [default: from qodana.yaml].
    #[arg(long, value_name = "CODE")]
    pub product: Option<String>,

    /// Project root to analyse.
    #[arg(short = 'i', long, value_name = "DIR", default_value = ".")]
    pub project_dir: Utf8PathBuf,

    /// Cache directory for the linter and its state [default: platform-specific].
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<Utf8PathBuf>,

    /// Project configuration file [default: qodana.yaml in the project root].
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Extra VM property or flag (repeatable), e.g. `-p idea.log.level=2`.
    #[arg(
        short = 'p',
        long = "property",
        value_name = "KEY=VALUE",
        allow_hyphen_values = true
    )]
    pub properties: Vec<String>,

    /// Ignore the cached token and validate the one that is found.
    #[arg(long)]
    pub refresh_token: bool,

    /// Validate tokens taken from the keyring on every run.
    #[arg(long)]
    pub revalidate_cached_token: bool,

    /// Identifier of this analysis run [default: random].
    #[arg(long, value_name = "ID")]
    pub analysis_id: Option<String>,

    /// Directory with coverage reports to import.
    #[arg(long, value_name = "DIR")]
    pub coverage_dir: Option<Utf8PathBuf>,

    /// Increase log verbosity (repeatable: -v, -vv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}
