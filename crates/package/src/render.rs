//! Descriptor renderer — produces the manifest-list file of each package.
//!
//! Rendering is independent per package. A failing template is recorded
//! against its package and the remaining packages are still rendered.

use kustsplit_core::{Package, SplitError, TemplateEngine};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Descriptor template used when the configuration does not set one.
pub const DEFAULT_DESCRIPTOR_TEMPLATE: &str = "\
apiVersion: kustomize.config.k8s.io/v1beta1
kind: Kustomization
resources:
{% for file in files %}
  - {{ file }}
{% endfor %}
";

/// Shared descriptor template plus per-package overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorTemplates {
    pub default: String,

    /// Package name → template replacing `default` for that package.
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,
}

impl Default for DescriptorTemplates {
    fn default() -> Self {
        Self {
            default: DEFAULT_DESCRIPTOR_TEMPLATE.to_string(),
            overrides: BTreeMap::new(),
        }
    }
}

impl DescriptorTemplates {
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            default: default.into(),
            overrides: BTreeMap::new(),
        }
    }

    pub fn with_override(mut self, package: impl Into<String>, template: impl Into<String>) -> Self {
        self.overrides.insert(package.into(), template.into());
        self
    }

    /// The template that applies to `package`.
    pub fn for_package(&self, package: &str) -> &str {
        self.overrides
            .get(package)
            .map(String::as_str)
            .unwrap_or(&self.default)
    }
}

/// Renders descriptors. Cheap to clone; clones share their state.
#[derive(Clone)]
pub struct Renderer {
    engine: Arc<dyn TemplateEngine>,
    templates: Arc<DescriptorTemplates>,
    top: Arc<serde_json::Value>,
}

impl Renderer {
    pub fn new(
        engine: Arc<dyn TemplateEngine>,
        templates: DescriptorTemplates,
        top: serde_json::Value,
    ) -> Self {
        Self {
            engine,
            templates: Arc::new(templates),
            top: Arc::new(top),
        }
    }

    pub fn templates(&self) -> &DescriptorTemplates {
        &self.templates
    }

    /// Variables visible to a package's descriptor template.
    pub fn bindings(&self, package: &Package) -> serde_json::Value {
        let files = package.file_names();
        let resources: Vec<_> = package
            .members
            .iter()
            .map(|m| {
                serde_json::json!({
                    "index": m.document,
                    "kind": m.identity.kind,
                    "name": m.identity.name,
                    "namespace": m.identity.namespace_str(),
                    "filename": m.file_name,
                })
            })
            .collect();
        serde_json::json!({
            "packageName": package.name,
            "package": {
                "name": package.name,
                "count": package.len(),
                "files": files,
                "resources": resources,
            },
            "files": files,
            "top": *self.top,
        })
    }

    /// Render the descriptor of one package.
    pub fn render(&self, package: &Package) -> Result<String, SplitError> {
        let template = self.templates.for_package(&package.name);
        self.engine
            .render(template, &self.bindings(package))
            .map_err(|e| SplitError::TemplateRender {
                package: package.name.clone(),
                reason: e.to_string(),
            })
    }

    /// Render every package, one after another.
    pub fn render_all(&self, packages: &[Package]) -> RenderReport {
        let mut report = RenderReport::default();
        for package in packages {
            report.record(&package.name, self.render(package));
        }
        report
    }

    /// Render every package on the blocking pool, one task per package.
    ///
    /// Produces the same report as [`Renderer::render_all`].
    pub async fn render_all_concurrent(&self, packages: &[Package]) -> RenderReport {
        let handles: Vec<_> = packages
            .iter()
            .map(|package| {
                let renderer = self.clone();
                let package = package.clone();
                let name = package.name.clone();
                let handle = tokio::task::spawn_blocking(move || renderer.render(&package));
                (name, handle)
            })
            .collect();

        let mut report = RenderReport::default();
        for (name, handle) in handles {
            let result = handle.await.unwrap_or_else(|e| {
                Err(SplitError::TemplateRender {
                    package: name.clone(),
                    reason: format!("render task failed: {e}"),
                })
            });
            report.record(&name, result);
        }
        report
    }
}

/// Outcome of rendering a set of packages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderReport {
    /// `(package, descriptor)` in package order.
    rendered: Vec<(String, String)>,
    failures: Vec<SplitError>,
}

impl RenderReport {
    fn record(&mut self, package: &str, result: Result<String, SplitError>) {
        match result {
            Ok(text) => {
                debug!(package, bytes = text.len(), "Rendered descriptor");
                self.rendered.push((package.to_string(), text));
            }
            Err(e) => {
                warn!(package, error = %e, "Descriptor rendering failed");
                self.failures.push(e);
            }
        }
    }

    pub fn rendered(&self) -> &[(String, String)] {
        &self.rendered
    }

    pub fn failures(&self) -> &[SplitError] {
        &self.failures
    }

    pub fn descriptor(&self, package: &str) -> Option<&str> {
        self.rendered
            .iter()
            .find(|(name, _)| name == package)
            .map(|(_, text)| text.as_str())
    }

    /// Names of packages whose descriptor rendered.
    pub fn succeeded(&self) -> Vec<&str> {
        self.rendered.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Names of packages whose descriptor failed.
    pub fn failed(&self) -> Vec<&str> {
        self.failures.iter().filter_map(SplitError::package).collect()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
