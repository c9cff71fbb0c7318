//! Supported products and release channels.
//!
//! The acquirer only knows a fixed set of Qodana linter distributions. A
//! product request is a product code optionally followed by `-EAP`, which
//! selects the early-access channel.

use std::fmt;
use std::str::FromStr;

/// Suffix selecting the early-access channel.
pub const EAP_SUFFIX: &str = "-EAP";

/// Release track of a product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Stable releases.
    #[default]
    Stable,
    /// Early-access previews.
    EarlyAccess,
}

impl Channel {
    /// The release `type` used by the JetBrains release feed.
    #[must_use]
    pub fn feed_type(self) -> &'static str {
        match self {
            Self::Stable => "release",
            Self::EarlyAccess => "eap",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stable => "stable",
            Self::EarlyAccess => "early-access",
        })
    }
}

/// Static description of one supported product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProductSpec {
    /// Qodana product code, also used as the release feed code.
    pub code: &'static str,
    /// Human-readable linter name.
    pub name: &'static str,
    /// Platform prefix of the parent IDE (`-Didea.parent.prefix`).
    pub parent_prefix: &'static str,
    /// Environment variable the IDE launcher reads its VM options file from.
    pub vm_options_env: &'static str,
}

const PRODUCTS: &[ProductSpec] = &[
    ProductSpec {
        code: "QDJVMC",
        name: "Qodana Community for JVM",
        parent_prefix: "IdeaIC",
        vm_options_env: "IDEA_VM_OPTIONS",
    },
    ProductSpec {
        code: "QDJVM",
        name: "Qodana for JVM",
        parent_prefix: "Idea",
        vm_options_env: "IDEA_VM_OPTIONS",
    },
    ProductSpec {
        code: "QDAND",
        name: "Qodana Community for Android",
        parent_prefix: "IdeaIC",
        vm_options_env: "IDEA_VM_OPTIONS",
    },
    ProductSpec {
        code: "QDPHP",
        name: "Qodana for PHP",
        parent_prefix: "PhpStorm",
        vm_options_env: "PHPSTORM_VM_OPTIONS",
    },
    ProductSpec {
        code: "QDJS",
        name: "Qodana for JS",
        parent_prefix: "WebStorm",
        vm_options_env: "WEBIDE_VM_OPTIONS",
    },
    ProductSpec {
        code: "QDNET",
        name: "Qodana for .NET",
        parent_prefix: "Rider",
        vm_options_env: "RIDER_VM_OPTIONS",
    },
    ProductSpec {
        code: "QDPY",
        name: "Qodana for Python",
        parent_prefix: "Python",
        vm_options_env: "PYCHARM_VM_OPTIONS",
    },
    ProductSpec {
        code: "QDPYC",
        name: "Qodana Community for Python",
        parent_prefix: "PyCharmCore",
        vm_options_env: "PYCHARM_VM_OPTIONS",
    },
    ProductSpec {
        code: "QDGO",
        name: "Qodana for Go",
        parent_prefix: "GoLand",
        vm_options_env: "GOLAND_VM_OPTIONS",
    },
];

/// A validated product code from the supported set.
///
/// # Examples
///
/// ```
/// use qodana_prep_installer::product::ProductCode;
///
/// let code: ProductCode = "QDJVM".parse().expect("supported product");
/// assert_eq!(code.spec().parent_prefix, "Idea");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProductCode(&'static ProductSpec);

impl ProductCode {
    /// Every supported product.
    pub fn all() -> impl Iterator<Item = Self> {
        PRODUCTS.iter().map(Self)
    }

    /// The static product description.
    #[must_use]
    pub fn spec(self) -> &'static ProductSpec {
        self.0
    }

    /// The product code string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.0.code
    }

    /// Comma-separated list of supported codes, for error messages.
    #[must_use]
    pub fn supported_list() -> String {
        PRODUCTS
            .iter()
            .map(|spec| spec.code)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ProductCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.code)
    }
}

/// Error returned for product codes outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown product code \"{value}\"; expected one of: {expected}")]
pub struct UnknownProduct {
    /// The rejected code.
    pub value: String,
    /// Comma-separated list of accepted codes.
    pub expected: String,
}

impl FromStr for ProductCode {
    type Err = UnknownProduct;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        PRODUCTS
            .iter()
            .find(|spec| spec.code == value)
            .map(Self)
            .ok_or_else(|| UnknownProduct {
                value: value.to_owned(),
                expected: Self::supported_list(),
            })
    }
}

/// A product together with the requested channel.
///
/// # Examples
///
/// ```
/// use qodana_prep_installer::product::{Channel, ProductRequest};
///
/// let request: ProductRequest = "QDNET-EAP".parse().expect("supported product");
/// assert_eq!(request.product.as_str(), "QDNET");
/// assert_eq!(request.channel, Channel::EarlyAccess);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductRequest {
    /// The requested product.
    pub product: ProductCode,
    /// The requested release channel.
    pub channel: Channel,
}

impl FromStr for ProductRequest {
    type Err = UnknownProduct;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (code, channel) = match value.strip_suffix(EAP_SUFFIX) {
            Some(code) => (code, Channel::EarlyAccess),
            None => (value, Channel::Stable),
        };
        let product = code.parse::<ProductCode>().map_err(|_| UnknownProduct {
            value: value.to_owned(),
            expected: ProductCode::supported_list(),
        })?;
        Ok(Self { product, channel })
    }
}

impl fmt::Display for ProductRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.channel {
            Channel::Stable => write!(f, "{}", self.product),
            Channel::EarlyAccess => write!(f, "{}{EAP_SUFFIX}", self.product),
        }
    }
}
