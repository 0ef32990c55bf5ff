//! Rule evaluation engine.
//!
//! Places documents into packages. Rules are tried strictly in
//! declaration order and the first match wins; a later rule is never
//! consulted once an earlier one accepted the document, however specific
//! the later rule is.

use crate::model::{RuleSet, SplitRule};
use kustsplit_core::{
    ResourceDocument, ResourceIdentity, SplitError, TemplateEngine, validate_package_name,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Where a document goes, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// Resolved package name.
    pub package: String,

    /// Index of the rule that placed the document; `None` when the
    /// default package absorbed it.
    pub rule: Option<usize>,
}

impl Placement {
    pub fn is_default(&self) -> bool {
        self.rule.is_none()
    }
}

/// Evaluates a [`RuleSet`] against document identities.
pub struct RuleEngine {
    rules: RuleSet,
    default_package: Option<String>,
    templates: Arc<dyn TemplateEngine>,
}

impl std::fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleEngine")
            .field("rules", &self.rules)
            .field("default_package", &self.default_package)
            .field("templates", &self.templates.name())
            .finish()
    }
}

impl RuleEngine {
    /// Create an engine. Validates every rule, syntax-checks templated
    /// targets, and checks the default package name.
    pub fn new(
        rules: RuleSet,
        default_package: Option<String>,
        templates: Arc<dyn TemplateEngine>,
    ) -> Result<Self, crate::RuleError> {
        rules.validate()?;
        for (position, rule) in rules.rules.iter().enumerate() {
            if rule.is_templated() {
                templates.check(&rule.package).map_err(|e| {
                    crate::RuleError::TargetSyntax {
                        position,
                        detail: e.to_string(),
                    }
                })?;
            }
        }
        if let Some(name) = &default_package {
            validate_package_name(name).map_err(crate::RuleError::InvalidDefault)?;
        }
        Ok(Self {
            rules,
            default_package,
            templates,
        })
    }

    /// Place a parsed document.
    pub fn place(&self, document: &ResourceDocument) -> Result<Placement, SplitError> {
        self.place_identity(document.index, &document.identity)
    }

    /// Place the document at stream position `index` with `identity`.
    pub fn place_identity(
        &self,
        index: usize,
        identity: &ResourceIdentity,
    ) -> Result<Placement, SplitError> {
        let ignore_case = self.rules.ignore_case;
        let first = self
            .rules
            .rules
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.matcher.matches(identity, ignore_case));

        let placement = match first {
            Some((position, rule)) => Placement {
                package: self.resolve_target(position, rule, identity)?,
                rule: Some(position),
            },
            None => match &self.default_package {
                Some(name) => Placement {
                    package: name.clone(),
                    rule: None,
                },
                None => {
                    return Err(SplitError::UnmatchedDocument {
                        index,
                        identity: identity.clone(),
                    });
                }
            },
        };

        debug!(
            index,
            resource = %identity,
            package = %placement.package,
            rule = ?placement.rule,
            "Placed document"
        );
        Ok(placement)
    }

    /// Indices of every rule whose matcher accepts `identity`, in order.
    ///
    /// Diagnostic only: placement uses the first entry and nothing else.
    pub fn explain(&self, identity: &ResourceIdentity) -> Vec<usize> {
        self.rules
            .rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| rule.matcher.matches(identity, self.rules.ignore_case))
            .map(|(position, _)| position)
            .collect()
    }

    pub fn rules(&self) -> &[SplitRule] {
        &self.rules.rules
    }

    pub fn default_package(&self) -> Option<&str> {
        self.default_package.as_deref()
    }

    // ── Internal ───────────────────────────────────────────────────

    fn resolve_target(
        &self,
        position: usize,
        rule: &SplitRule,
        identity: &ResourceIdentity,
    ) -> Result<String, SplitError> {
        let invalid = |reason: String| SplitError::InvalidTarget {
            rule: position,
            reason,
        };

        if !rule.is_templated() {
            return Ok(rule.package.trim().to_string());
        }

        let mut bindings = identity.to_bindings();
        bindings["resource"] = identity.to_bindings();
        let rendered = self
            .templates
            .render(&rule.package, &bindings)
            .map_err(|e| invalid(format!("'{}' for {identity}: {e}", rule.package)))?;

        let name = rendered.trim();
        validate_package_name(name)
            .map_err(|reason| invalid(format!("'{}' for {identity}: {reason}", rule.package)))?;
        Ok(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Matcher;
    use kustsplit_core::TemplateError;

    /// Replaces `{{ field }}` placeholders with values from the bindings.
    /// Enough to exercise target interpolation without a real engine.
    struct Placeholders;

    impl TemplateEngine for Placeholders {
        fn name(&self) -> &str {
            "placeholders"
        }

        fn render(
            &self,
            template: &str,
            bindings: &serde_json::Value,
        ) -> Result<String, TemplateError> {
            let mut out = String::new();
            let mut rest = template;
            while let Some(start) = rest.find("{{") {
                out.push_str(&rest[..start]);
                let end = rest[start..]
                    .find("}}")
                    .ok_or_else(|| TemplateError::Syntax("unclosed '{{'".into()))?;
                let key = rest[start + 2..start + end].trim();
                let value = bindings
                    .get(key)
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| TemplateError::Render(format!("undefined value '{key}'")))?;
                out.push_str(value);
                rest = &rest[start + end + 2..];
            }
            out.push_str(rest);
            Ok(out)
        }

        fn check(&self, template: &str) -> Result<(), TemplateError> {
            if template.matches("{{").count() != template.matches("}}").count() {
                return Err(TemplateError::Syntax("unbalanced braces".into()));
            }
            Ok(())
        }
    }

    fn engine(rules: Vec<SplitRule>, default: Option<&str>) -> RuleEngine {
        let set = RuleSet {
            rules,
            ignore_case: false,
        };
        RuleEngine::new(set, default.map(String::from), Arc::new(Placeholders)).unwrap()
    }

    fn id(kind: &str, name: &str, ns: Option<&str>) -> ResourceIdentity {
        ResourceIdentity::new(kind, name, ns)
    }

    #[test]
    fn three_document_scenario() {
        let engine = engine(
            vec![
                SplitRule::new(Matcher::kind("Deployment"), "workloads"),
                SplitRule::new(Matcher::namespace("y"), "y-extras"),
            ],
            Some("misc"),
        );
        let a = engine.place_identity(0, &id("Deployment", "a", Some("x"))).unwrap();
        let b = engine.place_identity(1, &id("Service", "b", Some("x"))).unwrap();
        let c = engine.place_identity(2, &id("ConfigMap", "c", Some("y"))).unwrap();
        assert_eq!((a.package.as_str(), a.rule), ("workloads", Some(0)));
        assert_eq!((b.package.as_str(), b.rule), ("misc", None));
        assert!(b.is_default());
        assert_eq!((c.package.as_str(), c.rule), ("y-extras", Some(1)));
    }

    #[test]
    fn first_match_wins_over_more_specific_rule() {
        let engine = engine(
            vec![
                SplitRule::new(Matcher::namespace("prod"), "broad"),
                SplitRule::new(
                    Matcher {
                        kind: Some("Deployment".into()),
                        name: Some("api".into()),
                        namespace: Some("prod".into()),
                    },
                    "exact",
                ),
            ],
            None,
        );
        let placement = engine
            .place_identity(0, &id("Deployment", "api", Some("prod")))
            .unwrap();
        assert_eq!(placement.package, "broad");
        assert_eq!(placement.rule, Some(0));
        assert_eq!(engine.explain(&id("Deployment", "api", Some("prod"))), vec![0, 1]);
    }

    #[test]
    fn swapping_rule_order_swaps_the_winner() {
        let specific = SplitRule::new(Matcher::name("api"), "exact");
        let broad = SplitRule::new(Matcher::kind("Deployment"), "broad");
        let doc = id("Deployment", "api", None);

        let forward = engine(vec![specific.clone(), broad.clone()], None);
        let reverse = engine(vec![broad, specific], None);
        assert_eq!(forward.place_identity(0, &doc).unwrap().package, "exact");
        assert_eq!(reverse.place_identity(0, &doc).unwrap().package, "broad");
    }

    #[test]
    fn unmatched_without_default_fails() {
        let engine = engine(vec![SplitRule::new(Matcher::kind("Secret"), "secrets")], None);
        let err = engine
            .place_identity(7, &id("Service", "web", None))
            .unwrap_err();
        match err {
            SplitError::UnmatchedDocument { index, identity } => {
                assert_eq!(index, 7);
                assert_eq!(identity.name, "web");
            }
            other => panic!("Expected UnmatchedDocument, got: {other}"),
        }
    }

    #[test]
    fn empty_rule_set_routes_everything_to_default() {
        let engine = engine(vec![], Some("main"));
        let p = engine.place_identity(0, &id("Service", "web", None)).unwrap();
        assert_eq!(p.package, "main");
        assert!(p.is_default());
    }

    #[test]
    fn templated_target_uses_document_fields() {
        let engine = engine(
            vec![SplitRule::new(Matcher::kind("ConfigMap"), "ns-{{ namespace }}")],
            None,
        );
        let p = engine
            .place_identity(0, &id("ConfigMap", "c", Some("y")))
            .unwrap();
        assert_eq!(p.package, "ns-y");
    }

    #[test]
    fn templated_target_resolving_to_empty_is_invalid() {
        let engine = engine(
            vec![SplitRule::new(Matcher::default(), "{{ namespace }}")],
            None,
        );
        let err = engine
            .place_identity(0, &id("ClusterRole", "view", None))
            .unwrap_err();
        assert!(matches!(err, SplitError::InvalidTarget { rule: 0, .. }));
    }

    #[test]
    fn templated_target_render_failure_is_invalid() {
        let engine = engine(
            vec![SplitRule::new(Matcher::default(), "{{ missing }}")],
            None,
        );
        let err = engine.place_identity(0, &id("A", "b", None)).unwrap_err();
        assert!(err.to_string().contains("undefined"));
    }

    #[test]
    fn target_syntax_checked_up_front() {
        let set = RuleSet {
            rules: vec![SplitRule::new(Matcher::default(), "{{ kind")],
            ignore_case: false,
        };
        let err = RuleEngine::new(set, None, Arc::new(Placeholders)).unwrap_err();
        assert!(matches!(err, crate::RuleError::TargetSyntax { position: 0, .. }));
    }

    #[test]
    fn invalid_default_rejected() {
        let err = RuleEngine::new(
            RuleSet::new(),
            Some("bad/name".into()),
            Arc::new(Placeholders),
        )
        .unwrap_err();
        assert!(matches!(err, crate::RuleError::InvalidDefault(_)));
    }

    #[test]
    fn ignore_case_opt_in() {
        let set = RuleSet {
            rules: vec![SplitRule::new(Matcher::kind("clusterrole"), "cr")],
            ignore_case: true,
        };
        let engine = RuleEngine::new(set, None, Arc::new(Placeholders)).unwrap();
        let p = engine
            .place_identity(0, &id("ClusterRole", "view", None))
            .unwrap();
        assert_eq!(p.package, "cr");
    }

    #[test]
    fn place_uses_document_index() {
        let engine = engine(vec![], None);
        let doc = ResourceDocument::new(4, id("Service", "web", None), "kind: Service\n");
        assert!(matches!(
            engine.place(&doc),
            Err(SplitError::UnmatchedDocument { index: 4, .. })
        ));
    }
}
