//! Text reports for the `explain` and `check` commands.

use kustsplit_core::TemplateEngine;
use kustsplit_package::{DescriptorTemplates, Explanation};
use kustsplit_rules::SplitRule;

/// One line per document with its package and the deciding rule, plus an
/// `also matched` line for rules shadowed by an earlier match.
pub fn render_explanations(rules: &[SplitRule], explained: &[Explanation]) -> String {
    let mut out = String::new();
    for item in explained {
        let document = &item.document;
        let identity = document.identity.to_string();
        match &item.placement {
            Ok(placement) => {
                let why = match placement.rule.and_then(|i| rules.get(i).map(|r| (i, r))) {
                    Some((i, rule)) if rule.description.is_empty() => format!("rule #{i}"),
                    Some((i, rule)) => format!("rule #{i} ({})", rule.description),
                    None => "default package".to_string(),
                };
                out.push_str(&format!(
                    "#{:<4} {identity:<48} -> {} [{why}]\n",
                    document.index, placement.package
                ));
            }
            Err(e) => {
                out.push_str(&format!("#{:<4} {identity:<48} -> ERROR: {e}\n", document.index));
            }
        }
        let shadowed: Vec<String> = item.shadowed().iter().map(|i| format!("#{i}")).collect();
        if !shadowed.is_empty() {
            out.push_str(&format!("      also matched: {}\n", shadowed.join(", ")));
        }
    }
    out
}

/// Documents that could not be placed.
pub fn unplaced(explained: &[Explanation]) -> usize {
    explained.iter().filter(|e| e.placement.is_err()).count()
}

/// Syntax problems in descriptor templates. These do not fail the
/// configuration: at split time they cost only the packages using them.
pub fn descriptor_warnings(
    templates: &DescriptorTemplates,
    engine: &dyn TemplateEngine,
) -> Vec<String> {
    let mut warnings = Vec::new();
    if let Err(e) = engine.check(&templates.default) {
        warnings.push(format!("descriptor template: {e}"));
    }
    for (package, template) in &templates.overrides {
        if let Err(e) = engine.check(template) {
            warnings.push(format!("descriptor override for '{package}': {e}"));
        }
    }
    warnings
}
