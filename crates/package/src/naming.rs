//! Naming policy — maps a placed document to its output file name.

use kustsplit_core::{ResourceDocument, TemplateEngine};
use std::sync::Arc;

/// File-name template used when the configuration does not set one.
pub const DEFAULT_FILE_TEMPLATE: &str =
    "{{ resource.index | pad3 }}_{{ resource.kind | lower }}_{{ resource.name }}.yaml";

/// Everything a naming policy may look at.
#[derive(Debug, Clone, Copy)]
pub struct NameRequest<'a> {
    /// Package the document was placed in.
    pub package: &'a str,
    pub document: &'a ResourceDocument,
    /// Position the document will take inside its package.
    pub position: usize,
}

/// Computes file names for package members.
///
/// Uniqueness is not the policy's concern; the assembler detects
/// collisions.
pub trait NamingPolicy: Send + Sync {
    fn file_name(&self, request: &NameRequest<'_>) -> Result<String, String>;
}

impl<F> NamingPolicy for F
where
    F: Fn(&NameRequest<'_>) -> Result<String, String> + Send + Sync,
{
    fn file_name(&self, request: &NameRequest<'_>) -> Result<String, String> {
        self(request)
    }
}

/// Naming policy driven by a template.
///
/// Bindings: `packageName`, `package` (`{name}`), `top`, and `resource`
/// (`{index, position, kind, name, namespace}`).
pub struct TemplateNaming {
    template: String,
    engine: Arc<dyn TemplateEngine>,
    top: serde_json::Value,
}

impl TemplateNaming {
    pub fn new(
        template: impl Into<String>,
        engine: Arc<dyn TemplateEngine>,
        top: serde_json::Value,
    ) -> Self {
        Self {
            template: template.into(),
            engine,
            top,
        }
    }

    fn bindings(&self, request: &NameRequest<'_>) -> serde_json::Value {
        let identity = &request.document.identity;
        serde_json::json!({
            "packageName": request.package,
            "package": { "name": request.package },
            "top": self.top,
            "resource": {
                "index": request.document.index,
                "position": request.position,
                "kind": identity.kind,
                "name": identity.name,
                "namespace": identity.namespace_str(),
            },
        })
    }
}

impl NamingPolicy for TemplateNaming {
    fn file_name(&self, request: &NameRequest<'_>) -> Result<String, String> {
        let rendered = self
            .engine
            .render(&self.template, &self.bindings(request))
            .map_err(|e| e.to_string())?;
        let name = rendered.trim();
        validate_file_name(name)?;
        Ok(name.to_string())
    }
}

/// A file name must be a single, non-empty path component.
pub fn validate_file_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("file name is empty".into());
    }
    if name == "." || name == ".." {
        return Err(format!("'{name}' is not a file name"));
    }
    if name.contains(['/', '\\']) {
        return Err(format!("file name '{name}' contains a path separator"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::MiniJinjaEngine;
    use kustsplit_core::ResourceIdentity;

    fn doc(index: usize, kind: &str, name: &str, ns: Option<&str>) -> ResourceDocument {
        ResourceDocument::new(index, ResourceIdentity::new(kind, name, ns), "")
    }

    fn naming(template: &str) -> TemplateNaming {
        TemplateNaming::new(
            template,
            Arc::new(MiniJinjaEngine::new()),
            serde_json::json!({"name": "contour", "version": "1.14.0"}),
        )
    }

    #[test]
    fn default_template() {
        let naming = naming(DEFAULT_FILE_TEMPLATE);
        let d = doc(3, "ClusterRole", "contour", None);
        let name = naming
            .file_name(&NameRequest {
                package: "cr",
                document: &d,
                position: 0,
            })
            .unwrap();
        assert_eq!(name, "003_clusterrole_contour.yaml");
    }

    #[test]
    fn template_sees_package_position_and_top() {
        let naming = naming("{{ top.name }}-{{ packageName }}-{{ resource.position }}-{{ resource.namespace }}.yaml");
        let d = doc(9, "Service", "web", Some("prod"));
        let name = naming
            .file_name(&NameRequest {
                package: "svc",
                document: &d,
                position: 2,
            })
            .unwrap();
        assert_eq!(name, "contour-svc-2-prod.yaml");
    }

    #[test]
    fn path_separators_rejected() {
        let naming = naming("{{ resource.namespace }}/{{ resource.name }}.yaml");
        let d = doc(0, "Service", "web", Some("prod"));
        let err = naming
            .file_name(&NameRequest {
                package: "svc",
                document: &d,
                position: 0,
            })
            .unwrap_err();
        assert!(err.contains("path separator"));
    }

    #[test]
    fn render_errors_surface() {
        let naming = naming("{{ resource.missing }}.yaml");
        let d = doc(0, "Service", "web", None);
        assert!(
            naming
                .file_name(&NameRequest {
                    package: "svc",
                    document: &d,
                    position: 0,
                })
                .is_err()
        );
    }

    #[test]
    fn closures_are_policies() {
        let policy =
            |r: &NameRequest<'_>| Ok::<_, String>(format!("{}.yaml", r.document.identity.name));
        let d = doc(0, "Service", "web", None);
        let name = policy
            .file_name(&NameRequest {
                package: "p",
                document: &d,
                position: 0,
            })
            .unwrap();
        assert_eq!(name, "web.yaml");
    }

    #[test]
    fn file_name_validation() {
        assert!(validate_file_name("a.yaml").is_ok());
        assert!(validate_file_name("").is_err());
        assert!(validate_file_name("..").is_err());
        assert!(validate_file_name("a\\b.yaml").is_err());
    }
}
