//! Property layers and key normalisation.
//!
//! Keys are stored in flag form: a key that does not start with `-` is a
//! system property and gains the `-D` prefix.

use std::collections::BTreeMap;

/// Prefix for JVM system properties.
const SYSTEM_PROPERTY_PREFIX: &str = "-D";

/// Bring a key into flag form.
///
/// # Examples
///
/// ```
/// use qodana_prep_properties::normalise_key;
///
/// assert_eq!(normalise_key("foo.bar"), "-Dfoo.bar");
/// assert_eq!(normalise_key("-Dfoo.bar"), "-Dfoo.bar");
/// assert_eq!(normalise_key("-XX:MaxRAMPercentage"), "-XX:MaxRAMPercentage");
/// ```
#[must_use]
pub fn normalise_key(key: &str) -> String {
    if key.starts_with('-') {
        key.to_owned()
    } else {
        format!("{SYSTEM_PROPERTY_PREFIX}{key}")
    }
}

/// One source of properties, keyed in flag form.
///
/// Inserting a key twice keeps the later value. Standalone flags (arguments
/// without `=`) are kept separately in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationLayer {
    properties: BTreeMap<String, String>,
    flags: Vec<String>,
}

impl ConfigurationLayer {
    /// An empty layer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a layer from key/value pairs, normalising keys.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut layer = Self::new();
        for (key, value) in pairs {
            layer.insert(key.as_ref(), value);
        }
        layer
    }

    /// Parse `--property` arguments.
    ///
    /// `key=value` splits at the first `=`; anything else is a standalone
    /// flag such as `-ea` or `-XX:+UseZGC`.
    ///
    /// # Examples
    ///
    /// ```
    /// use qodana_prep_properties::ConfigurationLayer;
    ///
    /// let layer = ConfigurationLayer::from_arguments(["idea.log=x=y", "-XX:+UseZGC"]);
    /// assert_eq!(layer.get("-Didea.log"), Some("x=y"));
    /// assert_eq!(layer.flags(), ["-XX:+UseZGC"]);
    /// ```
    pub fn from_arguments<S: AsRef<str>>(arguments: impl IntoIterator<Item = S>) -> Self {
        let mut layer = Self::new();
        for argument in arguments {
            let argument = argument.as_ref().trim();
            match argument.split_once('=') {
                Some((key, value)) if !key.is_empty() => layer.insert(key, value),
                _ if argument.is_empty() => {}
                _ => layer.push_flag(argument),
            }
        }
        layer
    }

    /// Set `key` (normalised) to `value`.
    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.properties.insert(normalise_key(key), value.into());
    }

    /// Record a standalone flag unless it is already present.
    pub fn push_flag(&mut self, flag: &str) {
        if !self.flags.iter().any(|existing| existing == flag) {
            self.flags.push(flag.to_owned());
        }
    }

    /// Value stored under a key in flag form.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Properties in key order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Standalone flags in insertion order.
    #[must_use]
    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    /// Whether the layer holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.flags.is_empty()
    }
}
