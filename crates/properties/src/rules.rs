//! Product-specific default properties.
//!
//! Some IDE families need extra keys: WebStorm and Rider select bundled
//! inspection profiles, and Rider starts its backend early. Each rule names
//! the family it applies to and an optional version condition.

use crate::context::ProductContext;

/// Condition on the running product version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionPredicate {
    /// Applies to every version.
    Any,
    /// Applies from branch 233 onwards.
    Branch233OrNewer,
}

impl VersionPredicate {
    fn matches(self, context: &ProductContext) -> bool {
        match self {
            Self::Any => true,
            Self::Branch233OrNewer => context.is_233_or_newer,
        }
    }
}

/// A set of properties contributed for one product family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductRule {
    /// Parent prefix the rule applies to.
    pub family: &'static str,
    /// Version condition.
    pub version: VersionPredicate,
    /// Keys and values contributed, in flag form.
    pub entries: &'static [(&'static str, &'static str)],
}

impl ProductRule {
    /// Whether the rule applies to `context`.
    #[must_use]
    pub fn applies_to(&self, context: &ProductContext) -> bool {
        self.family == context.parent_prefix && self.version.matches(context)
    }
}

/// Parent prefix of Rider, which also receives the .NET integration keys.
pub const RIDER_FAMILY: &str = "Rider";

/// All product rules.
pub const PRODUCT_RULES: &[ProductRule] = &[
    ProductRule {
        family: "WebStorm",
        version: VersionPredicate::Any,
        entries: &[
            (
                "-Dqodana.recommended.profile.resource",
                "qodana-js.recommended.yaml",
            ),
            ("-Dqodana.starter.profile.resource", "qodana-js.starter.yaml"),
        ],
    },
    ProductRule {
        family: RIDER_FAMILY,
        version: VersionPredicate::Branch233OrNewer,
        entries: &[
            (
                "-Dqodana.recommended.profile.resource",
                "qodana-dotnet.recommended.yaml",
            ),
            (
                "-Dqodana.starter.profile.resource",
                "qodana-dotnet.starter.yaml",
            ),
        ],
    },
    ProductRule {
        family: RIDER_FAMILY,
        version: VersionPredicate::Any,
        entries: &[
            (
                "-Didea.class.before.app",
                "com.jetbrains.rider.protocol.EarlyBackendStarter",
            ),
            ("-Drider.collect.full.container.statistics", "true"),
            ("-Drider.suppress.std.redirect", "true"),
        ],
    },
];

/// Entries of every rule applying to `context`, in table order.
pub fn matching_entries(
    context: &ProductContext,
) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
    PRODUCT_RULES
        .iter()
        .filter(|rule| rule.applies_to(context))
        .flat_map(|rule| rule.entries.iter().copied())
}
