//! Split rule data model — the types that describe package placement.

use kustsplit_core::{ResourceIdentity, validate_package_name};
use serde::{Deserialize, Serialize};

/// An ordered list of split rules.
///
/// Order is significant: the first rule whose matcher accepts a document
/// decides its package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RuleSet {
    /// Rules in declaration order.
    #[serde(default)]
    pub rules: Vec<SplitRule>,

    /// Compare matcher fields case-insensitively.
    #[serde(default)]
    pub ignore_case: bool,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule. It is evaluated after every rule already present.
    pub fn add(&mut self, rule: SplitRule) {
        self.rules.push(rule);
    }

    /// Validate all rules in the set.
    pub fn validate(&self) -> Result<(), crate::RuleError> {
        for (position, rule) in self.rules.iter().enumerate() {
            rule.validate(position)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// A single split rule: a matcher plus a target package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SplitRule {
    /// Which documents this rule accepts. Omitted = every document.
    #[serde(rename = "match", default)]
    pub matcher: Matcher,

    /// Target package. May reference `kind`, `name` and `namespace`
    /// (e.g. `ns-{{ namespace }}`).
    pub package: String,

    /// Free-form note shown by `kustsplit explain`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl SplitRule {
    pub fn new(matcher: Matcher, package: impl Into<String>) -> Self {
        Self {
            matcher,
            package: package.into(),
            description: String::new(),
        }
    }

    /// Validate that the rule is well-formed.
    pub fn validate(&self, position: usize) -> Result<(), crate::RuleError> {
        let target = self.package.trim();
        if target.is_empty() {
            return Err(crate::RuleError::InvalidRule {
                position,
                reason: "package target cannot be empty".into(),
            });
        }
        // Literal targets can be checked now; templated ones only once
        // they are rendered against a document.
        if !kustsplit_core::is_templated(target) {
            validate_package_name(target)
                .map_err(|reason| crate::RuleError::InvalidRule { position, reason })?;
        }
        Ok(())
    }

    /// Whether the target must be rendered per document.
    pub fn is_templated(&self) -> bool {
        kustsplit_core::is_templated(&self.package)
    }
}

/// Predicate over a document's identity. `None` fields are wildcards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Matcher {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Compared against the namespace, or `""` for cluster-scoped
    /// resources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl Matcher {
    pub fn kind(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            ..Self::default()
        }
    }

    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            ..Self::default()
        }
    }

    /// Does every non-wildcard field equal the identity's field?
    pub fn matches(&self, identity: &ResourceIdentity, ignore_case: bool) -> bool {
        let eq = |expected: &Option<String>, actual: &str| match expected {
            None => true,
            Some(e) if ignore_case => e.to_lowercase() == actual.to_lowercase(),
            Some(e) => e == actual,
        };
        eq(&self.kind, &identity.kind)
            && eq(&self.name, &identity.name)
            && eq(&self.namespace, identity.namespace_str())
    }

    /// A matcher without fields accepts every document.
    pub fn is_catch_all(&self) -> bool {
        self.kind.is_none() && self.name.is_none() && self.namespace.is_none()
    }
}
