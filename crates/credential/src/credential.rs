//! The resolved usage credential.

use std::fmt;

/// Where a token was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialSource {
    /// Passed explicitly by the caller (`--token`).
    ExplicitArgument,
    /// Read from the ambient environment.
    Environment,
    /// Read from the platform secret store.
    CachedSecret,
    /// Typed by the user at an interactive prompt.
    InteractiveInput,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::ExplicitArgument => "command-line argument",
            Self::Environment => "environment",
            Self::CachedSecret => "system keyring",
            Self::InteractiveInput => "interactive input",
        };
        f.write_str(label)
    }
}

/// A secret token whose `Debug` output never reveals the value.
///
/// # Examples
///
/// ```
/// use qodana_prep_credential::Token;
///
/// let token = Token::from("secret-value");
/// assert_eq!(format!("{token:?}"), "Token(****)");
/// assert_eq!(token.expose(), "secret-value");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    /// Return the raw token value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the token is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(****)")
    }
}

/// A token together with its origin and, once validated, the linked project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    token: Token,
    origin: CredentialSource,
    project_name: Option<String>,
}

impl Credential {
    /// Create an unvalidated credential.
    #[must_use]
    pub fn new(token: impl Into<Token>, origin: CredentialSource) -> Self {
        Self {
            token: token.into(),
            origin,
            project_name: None,
        }
    }

    /// Mark the credential as validated for `project_name`.
    #[must_use]
    pub fn linked(self, project_name: impl Into<String>) -> Self {
        Self {
            project_name: Some(project_name.into()),
            ..self
        }
    }

    /// The secret token.
    #[must_use]
    pub fn token(&self) -> &Token {
        &self.token
    }

    /// Which source produced the token.
    #[must_use]
    pub fn origin(&self) -> CredentialSource {
        self.origin
    }

    /// The project name returned by remote validation, if validated.
    #[must_use]
    pub fn project_name(&self) -> Option<&str> {
        self.project_name.as_deref()
    }

    /// Whether remote validation has succeeded for this credential.
    #[must_use]
    pub fn is_validated(&self) -> bool {
        self.project_name.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_token() {
        let credential = Credential::new("top-secret", CredentialSource::Environment);
        let rendered = format!("{credential:?}");
        assert!(!rendered.contains("top-secret"));
    }

    #[test]
    fn linking_marks_credential_validated() {
        let credential = Credential::new("t", CredentialSource::ExplicitArgument);
        assert!(!credential.is_validated());
        let linked = credential.linked("demo");
        assert!(linked.is_validated());
        assert_eq!(linked.project_name(), Some("demo"));
        assert_eq!(linked.origin(), CredentialSource::ExplicitArgument);
    }

    #[test]
    fn source_display_names_the_keyring() {
        assert_eq!(CredentialSource::CachedSecret.to_string(), "system keyring");
    }
}
