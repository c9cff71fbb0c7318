//! Ambient environment capability.
//!
//! The bootstrap reads credentials from, and exports results to, process
//! environment variables. Components never touch `std::env` directly; they
//! receive an [`Environment`] so that tests can substitute
//! [`MemoryEnvironment`].

use log::debug;
use std::cell::RefCell;
use std::collections::BTreeMap;

/// Variable holding the usage token.
pub const QODANA_TOKEN: &str = "QODANA_TOKEN";

/// Variable overriding the credential validation endpoint.
pub const QODANA_ENDPOINT: &str = "QODANA_ENDPOINT";

/// When `true`, pre-release tool builds are licensed as releases.
pub const QODANA_TREAT_AS_RELEASE: &str = "QODANA_TREAT_AS_RELEASE";

/// When non-empty, the cached token is discarded before resolution.
pub const QODANA_CLEAR_KEYRING: &str = "QODANA_CLEAR_KEYRING";

/// Read and write access to named environment values.
pub trait Environment {
    /// Return the value of `name`, treating empty values as unset.
    fn var(&self, name: &str) -> Option<String>;

    /// Set `name` to `value` unconditionally.
    ///
    /// Callers that must not clobber external settings use
    /// [`export_if_unset`] instead.
    fn set_var(&self, name: &str, value: &str);
}

/// Export `value` under `name` only when `name` is currently unset and
/// `value` is non-empty.
///
/// Returns `true` when the variable was written.
///
/// # Examples
///
/// ```
/// use qodana_prep_common::{Environment, MemoryEnvironment, export_if_unset};
///
/// let env = MemoryEnvironment::default();
/// assert!(export_if_unset(&env, "QODANA_TOKEN", "abc"));
/// assert!(!export_if_unset(&env, "QODANA_TOKEN", "other"));
/// assert_eq!(env.var("QODANA_TOKEN").as_deref(), Some("abc"));
/// ```
pub fn export_if_unset(env: &dyn Environment, name: &str, value: &str) -> bool {
    if value.is_empty() || env.var(name).is_some() {
        return false;
    }
    env.set_var(name, value);
    debug!("exported {name}");
    true
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|value| !value.is_empty())
    }

    fn set_var(&self, name: &str, value: &str) {
        // SAFETY: the bootstrap runs single-threaded and finishes mutating the
        // environment before the analysis engine is launched.
        unsafe { std::env::set_var(name, value) };
    }
}

/// An in-memory environment for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryEnvironment {
    values: RefCell<BTreeMap<String, String>>,
}

impl MemoryEnvironment {
    /// Create an environment pre-populated with `pairs`.
    #[must_use]
    pub fn with_vars<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let values = pairs
            .into_iter()
            .map(|(name, value)| (name.to_owned(), value.to_owned()))
            .collect();
        Self {
            values: RefCell::new(values),
        }
    }

    /// Snapshot the current contents.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.values.borrow().clone()
    }
}

impl Environment for MemoryEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        self.values
            .borrow()
            .get(name)
            .filter(|value| !value.is_empty())
            .cloned()
    }

    fn set_var(&self, name: &str, value: &str) {
        self.values
            .borrow_mut()
            .insert(name.to_owned(), value.to_owned());
    }
}
