//! Individual token sources.
//!
//! Each source answers one question: "do you have a token?". Sources share a
//! single signature so the resolver can walk them in order and stop at the
//! first non-empty answer.

use crate::credential::CredentialSource;
use crate::secret_store::SecretStore;
use log::debug;
use qodana_prep_common::{Environment, QODANA_TOKEN};
use std::io::IsTerminal;

/// A single place a token may come from.
#[cfg_attr(test, mockall::automock)]
pub trait TokenSource {
    /// Which kind of source this is.
    fn kind(&self) -> CredentialSource;

    /// Return a non-empty token, or `None` to defer to the next source.
    ///
    /// `refresh` is `true` when the caller wants cached values re-validated.
    fn fetch(&self, refresh: bool) -> Option<String>;
}

/// A token passed explicitly by the caller.
#[derive(Debug, Clone)]
pub struct ExplicitArgument(Option<String>);

impl ExplicitArgument {
    /// Wrap the optional `--token` value.
    #[must_use]
    pub fn new(token: Option<String>) -> Self {
        Self(token)
    }
}

impl TokenSource for ExplicitArgument {
    fn kind(&self) -> CredentialSource {
        CredentialSource::ExplicitArgument
    }

    fn fetch(&self, _refresh: bool) -> Option<String> {
        let token = self.0.clone().filter(|t| !t.is_empty())?;
        debug!("loaded token from command-line arguments");
        Some(token)
    }
}

/// The `QODANA_TOKEN` environment variable.
pub struct EnvironmentSource<'a> {
    env: &'a dyn Environment,
}

impl<'a> EnvironmentSource<'a> {
    /// Read tokens from `env`.
    #[must_use]
    pub fn new(env: &'a dyn Environment) -> Self {
        Self { env }
    }
}

impl TokenSource for EnvironmentSource<'_> {
    fn kind(&self) -> CredentialSource {
        CredentialSource::Environment
    }

    fn fetch(&self, _refresh: bool) -> Option<String> {
        let token = self.env.var(QODANA_TOKEN)?;
        debug!("loaded token from the {QODANA_TOKEN} environment variable");
        Some(token)
    }
}

/// The platform secret store, keyed by project identity.
///
/// Whether a cached value must be re-validated is decided by the resolver;
/// this source only reports what is stored.
pub struct SecretStoreSource<'a> {
    store: &'a dyn SecretStore,
    project_identity: Option<String>,
}

impl<'a> SecretStoreSource<'a> {
    /// Look up tokens in `store` under `project_identity`.
    #[must_use]
    pub fn new(store: &'a dyn SecretStore, project_identity: Option<String>) -> Self {
        Self {
            store,
            project_identity,
        }
    }
}

impl TokenSource for SecretStoreSource<'_> {
    fn kind(&self) -> CredentialSource {
        CredentialSource::CachedSecret
    }

    fn fetch(&self, refresh: bool) -> Option<String> {
        let key = self.project_identity.as_deref()?;
        match self.store.get(key) {
            Ok(token) => {
                let token = token.filter(|t| !t.is_empty())?;
                debug!("loaded token from the secret store with id {key} (refresh: {refresh})");
                Some(token)
            }
            Err(e) => {
                debug!("secret store lookup failed, trying the next source: {e}");
                None
            }
        }
    }
}

/// Interactive token entry.
#[cfg_attr(test, mockall::automock)]
pub trait Prompter {
    /// Whether the process is attached to an interactive terminal.
    fn is_interactive(&self) -> bool;

    /// Ask the user for a token.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised while reading from the terminal.
    fn read_token(&self) -> std::io::Result<String>;
}

/// Prompts on the controlling terminal without echoing input.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn is_interactive(&self) -> bool {
        std::io::stdin().is_terminal() && std::io::stderr().is_terminal()
    }

    fn read_token(&self) -> std::io::Result<String> {
        rpassword::prompt_password(format!(
            "{QODANA_TOKEN} is not set. Paste the project token from Qodana Cloud: "
        ))
    }
}

/// A token typed at the terminal.
///
/// The value is only persisted by the resolver once it has been validated.
pub struct PromptSource<'a> {
    prompter: &'a dyn Prompter,
}

impl<'a> PromptSource<'a> {
    /// Ask for tokens through `prompter`.
    #[must_use]
    pub fn new(prompter: &'a dyn Prompter) -> Self {
        Self { prompter }
    }
}

impl TokenSource for PromptSource<'_> {
    fn kind(&self) -> CredentialSource {
        CredentialSource::InteractiveInput
    }

    fn fetch(&self, _refresh: bool) -> Option<String> {
        if !self.prompter.is_interactive() {
            debug!("not attached to a terminal; skipping the token prompt");
            return None;
        }
        match self.prompter.read_token() {
            Ok(token) => Some(token.trim().to_owned()).filter(|t| !t.is_empty()),
            Err(e) => {
                debug!("token prompt failed: {e}");
                None
            }
        }
    }
}
