//! Prepares a Qodana linter run: resolves the usage token, installs the
//! linter distribution and writes the VM options file it is launched with.
//!
//! The binary wires production capabilities into [`bootstrap::Bootstrap`];
//! everything here can also be driven with in-memory fakes.
//!
//! # Modules
//!
//! - [`bootstrap`] - the credential, tool and configuration pipeline
//! - [`cli`] - command-line arguments
//! - [`config`] - `qodana.yaml` loading
//! - [`dirs`] - platform cache directory lookup
//! - [`error`] - application errors and exit codes
//! - [`options`] - settling CLI and project configuration into one request
//! - [`project`] - project identity derivation

pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod dirs;
pub mod error;
pub mod options;
pub mod project;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use bootstrap::{Bootstrap, Prepared};
pub use cli::Cli;
pub use config::{ConfigError, ProjectConfig};
pub use error::{AppError, Result};
pub use options::BootstrapOptions;
