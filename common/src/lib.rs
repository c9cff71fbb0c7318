//! Shared helpers for the qodana-prep bootstrap crates.
//!
//! - [`env`] - the ambient environment capability and well-known variable names
//! - [`output`] - best-effort, user-facing stderr messages

pub mod env;
pub mod output;

pub use env::{
    Environment, MemoryEnvironment, ProcessEnvironment, QODANA_CLEAR_KEYRING, QODANA_ENDPOINT,
    QODANA_TOKEN, QODANA_TREAT_AS_RELEASE, export_if_unset,
};
pub use output::{write_error, write_stderr_line, write_success, write_warning};
