//! Ordered-fallback credential resolution.
//!
//! The resolver walks its sources in order and stops at the first non-empty
//! token. Validation then decides between three outcomes: a linked project
//! (token persisted and exported), a rejected token (fatal), or an
//! unreachable service (reported, non-fatal).

use crate::credential::{Credential, CredentialSource};
use crate::error::{CredentialError, Result};
use crate::secret_store::SecretStore;
use crate::source::{
    EnvironmentSource, ExplicitArgument, PromptSource, Prompter, SecretStoreSource, TokenSource,
};
use crate::validator::TokenValidator;
use log::debug;
use qodana_prep_common::{Environment, QODANA_TOKEN, export_if_unset, write_success, write_warning};
use std::io::Write;

/// How a token found in the secret store is treated when no refresh is
/// requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CachePolicy {
    /// Return the cached token without contacting the validation service.
    ///
    /// The caller remains responsible for validating before relying on it.
    #[default]
    TrustCache,
    /// Validate cached tokens exactly like tokens from any other source.
    AlwaysRevalidate,
}

/// Resolves, validates, and caches the usage token.
pub struct CredentialResolver<'a> {
    sources: Vec<Box<dyn TokenSource + 'a>>,
    validator: &'a dyn TokenValidator,
    store: &'a dyn SecretStore,
    env: &'a dyn Environment,
    project_identity: Option<String>,
    cache_policy: CachePolicy,
}

impl<'a> CredentialResolver<'a> {
    /// Create a resolver with no sources.
    #[must_use]
    pub fn new(
        validator: &'a dyn TokenValidator,
        store: &'a dyn SecretStore,
        env: &'a dyn Environment,
    ) -> Self {
        Self {
            sources: Vec::new(),
            validator,
            store,
            env,
            project_identity: None,
            cache_policy: CachePolicy::default(),
        }
    }

    /// Namespace cached tokens under `identity`.
    #[must_use]
    pub fn with_project_identity(mut self, identity: impl Into<String>) -> Self {
        self.project_identity = Some(identity.into());
        self
    }

    /// Choose how cached tokens are treated.
    #[must_use]
    pub fn with_cache_policy(mut self, policy: CachePolicy) -> Self {
        self.cache_policy = policy;
        self
    }

    /// Append `source` to the end of the chain.
    #[must_use]
    pub fn with_source(mut self, source: impl TokenSource + 'a) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Install the standard chain: explicit argument, environment, secret
    /// store, interactive prompt.
    ///
    /// Call [`Self::with_project_identity`] first so the secret store source
    /// is keyed correctly.
    #[must_use]
    pub fn with_default_sources(
        self,
        explicit: Option<String>,
        prompter: &'a dyn Prompter,
    ) -> Self {
        let env = self.env;
        let store = self.store;
        let identity = self.project_identity.clone();
        self.with_source(ExplicitArgument::new(explicit))
            .with_source(EnvironmentSource::new(env))
            .with_source(SecretStoreSource::new(store, identity))
            .with_source(PromptSource::new(prompter))
    }

    /// Return the first token any source produces, without validating it.
    #[must_use]
    pub fn resolve(&self, refresh: bool) -> Option<Credential> {
        self.sources.iter().find_map(|source| {
            source
                .fetch(refresh)
                .filter(|token| !token.is_empty())
                .map(|token| Credential::new(token, source.kind()))
        })
    }

    /// Check a raw token against the validation service.
    ///
    /// An empty token yields `Ok(None)` without contacting the service. Nothing
    /// is persisted.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::InvalidCredential`] when a non-empty token
    /// is rejected and [`CredentialError::Transport`] when the service cannot
    /// be reached.
    pub fn check(&self, token: &str, origin: CredentialSource) -> Result<Option<String>> {
        if token.is_empty() {
            return Ok(None);
        }
        match self.validator.validate(token)? {
            Some(name) if !name.is_empty() => Ok(Some(name)),
            _ => Err(CredentialError::InvalidCredential { origin }),
        }
    }

    /// Resolve the token, validate it, and cache it on success.
    ///
    /// Returns `Ok(None)` when no source produced a token. With
    /// [`CachePolicy::TrustCache`] and `refresh == false`, a cached token is
    /// returned unvalidated.
    ///
    /// # Errors
    ///
    /// See [`Self::check`]. A rejected token is never written to the secret
    /// store or the environment.
    pub fn validate(&self, refresh: bool, stderr: &mut dyn Write) -> Result<Option<Credential>> {
        let Some(candidate) = self.resolve(refresh) else {
            debug!("no token available from any source");
            return Ok(None);
        };

        if candidate.origin() == CredentialSource::CachedSecret {
            write_warning(
                stderr,
                format!(
                    "Got {QODANA_TOKEN} from the system keyring; declare the {QODANA_TOKEN} \
                     environment variable or pass --token to override it"
                ),
            );
            if !refresh && self.cache_policy == CachePolicy::TrustCache {
                export_if_unset(self.env, QODANA_TOKEN, candidate.token().expose());
                return Ok(Some(candidate));
            }
        }

        let name = self
            .check(candidate.token().expose(), candidate.origin())?
            .ok_or(CredentialError::InvalidCredential {
                origin: candidate.origin(),
            })?;
        write_success(stderr, format!("Linked project name: {name}"));
        self.persist(&candidate, stderr);
        Ok(Some(candidate.linked(name)))
    }

    /// Forget the cached token for this project.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::SecretStore`] when the backend fails.
    pub fn clear_cached(&self) -> Result<()> {
        if let Some(key) = self.project_identity.as_deref() {
            self.store.remove(key)?;
            debug!("cleared cached token for {key}");
        }
        Ok(())
    }

    /// Export a validated token and cache it when it did not come from the
    /// cache already.
    fn persist(&self, credential: &Credential, stderr: &mut dyn Write) {
        let token = credential.token().expose();
        export_if_unset(self.env, QODANA_TOKEN, token);

        if credential.origin() == CredentialSource::CachedSecret {
            return;
        }
        let Some(key) = self.project_identity.as_deref() else {
            debug!("no project identity; token not cached");
            return;
        };
        match self.store.set(key, token) {
            Ok(()) => debug!("saved token to the secret store with id {key}"),
            Err(e) => write_warning(stderr, format!("could not cache the token: {e}")),
        }
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
