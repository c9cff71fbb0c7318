//! Remote token validation.
//!
//! The identity service answers "which project does this token belong to".
//! A well-formed rejection and an unreachable service are different
//! outcomes: the former yields `Ok(None)`, the latter a [`TransportError`].

use serde::Deserialize;
use std::sync::OnceLock;
use std::time::Duration;

/// Default validation endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://qodana.cloud/api";

/// Network timeout for validation requests.
const VALIDATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Validates a token against the remote identity service.
#[cfg_attr(test, mockall::automock)]
pub trait TokenValidator {
    /// Return the project name linked to `token`, or `None` when the service
    /// rejects it.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the service cannot be reached or its
    /// answer cannot be understood.
    fn validate(&self, token: &str) -> Result<Option<String>, TransportError>;
}

/// Failures talking to the validation service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The request could not be completed.
    #[error("request to {url} failed: {reason}")]
    Request {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The service answered with a body that could not be parsed.
    #[error("unexpected response from {url}: {reason}")]
    Response {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the parse failure.
        reason: String,
    },
}

#[derive(Debug, Deserialize)]
struct ProjectResponse {
    #[serde(default)]
    name: String,
}

/// HTTP validator using `ureq`.
#[derive(Debug, Clone)]
pub struct HttpTokenValidator {
    endpoint: String,
}

impl HttpTokenValidator {
    /// Create a validator for `endpoint` (without a trailing slash).
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        let endpoint: String = endpoint.into();
        Self {
            endpoint: endpoint.trim_end_matches('/').to_owned(),
        }
    }

    /// The URL queried for the token's project.
    ///
    /// # Examples
    ///
    /// ```
    /// use qodana_prep_credential::HttpTokenValidator;
    ///
    /// let validator = HttpTokenValidator::new("https://qodana.example/api/");
    /// assert_eq!(validator.project_url(), "https://qodana.example/api/v1/projects");
    /// ```
    #[must_use]
    pub fn project_url(&self) -> String {
        format!("{}/v1/projects", self.endpoint)
    }
}

impl Default for HttpTokenValidator {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

impl TokenValidator for HttpTokenValidator {
    fn validate(&self, token: &str) -> Result<Option<String>, TransportError> {
        let url = self.project_url();
        let response = http_agent()
            .get(&url)
            .header("Authorization", format!("Bearer {token}"))
            .call();
        let body = match response {
            Ok(response) => {
                response
                    .into_body()
                    .read_to_string()
                    .map_err(|e| TransportError::Request {
                        url: url.clone(),
                        reason: e.to_string(),
                    })?
            }
            Err(err) if is_rejection(&err) => return Ok(None),
            Err(err) => {
                return Err(TransportError::Request {
                    url,
                    reason: err.to_string(),
                });
            }
        };
        parse_project_name(&url, &body)
    }
}

/// Statuses that mean "the service understood the request and refused the token".
fn is_rejection(err: &ureq::Error) -> bool {
    matches!(err, ureq::Error::StatusCode(401 | 403 | 404))
}

fn parse_project_name(url: &str, body: &str) -> Result<Option<String>, TransportError> {
    let project: ProjectResponse =
        serde_json::from_str(body).map_err(|e| TransportError::Response {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;
    Ok(Some(project.name).filter(|name| !name.is_empty()))
}

/// Shared `ureq` agent with request timeout configuration.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(VALIDATION_TIMEOUT))
            .build();
        ureq::Agent::new_with_config(config)
    })
}
