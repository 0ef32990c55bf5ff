//! The split pipeline: parse → place → assemble → render.
//!
//! Parsing, placement and assembly run strictly in stream order. Only the
//! descriptor stage may run concurrently.

use crate::assembler::{Assembler, Assembly};
use crate::naming::{DEFAULT_FILE_TEMPLATE, TemplateNaming};
use crate::render::{DescriptorTemplates, RenderReport, Renderer};
use crate::template::MiniJinjaEngine;
use kustsplit_core::{Package, ResourceDocument, SplitError, TemplateEngine};
use kustsplit_manifest::{ParseOptions, parse_stream};
use kustsplit_rules::{Placement, RuleEngine, RuleSet};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Everything a run needs, already loaded and validated by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPlan {
    pub rules: RuleSet,
    pub default_package: Option<String>,
    /// File-name template for package members.
    pub file_template: String,
    pub descriptors: DescriptorTemplates,
    /// Run metadata bound as `top` in every template.
    pub top: serde_json::Value,
    pub parse: ParseOptions,
}

impl Default for SplitPlan {
    fn default() -> Self {
        Self {
            rules: RuleSet::new(),
            default_package: None,
            file_template: DEFAULT_FILE_TEMPLATE.to_string(),
            descriptors: DescriptorTemplates::default(),
            top: serde_json::json!({}),
            parse: ParseOptions::default(),
        }
    }
}

/// A compiled plan.
pub struct Splitter {
    rules: RuleEngine,
    naming: TemplateNaming,
    renderer: Renderer,
    parse: ParseOptions,
}

impl Splitter {
    /// Compile `plan` with the default template engine.
    pub fn new(plan: SplitPlan) -> Result<Self, crate::PlanError> {
        Self::with_engine(plan, Arc::new(MiniJinjaEngine::new()))
    }

    /// Compile `plan` with a specific template engine.
    ///
    /// Rule targets and the file-name template are syntax-checked here,
    /// since a failure in either invalidates the whole run. Descriptor
    /// templates are not: a broken descriptor only costs its own package
    /// and is reported by [`Renderer::render`].
    pub fn with_engine(
        plan: SplitPlan,
        engine: Arc<dyn TemplateEngine>,
    ) -> Result<Self, crate::PlanError> {
        engine
            .check(&plan.file_template)
            .map_err(|e| crate::PlanError::Template {
                what: "file name template".into(),
                detail: e.to_string(),
            })?;

        let rules = RuleEngine::new(plan.rules, plan.default_package, engine.clone())?;
        let naming = TemplateNaming::new(plan.file_template, engine.clone(), plan.top.clone());
        let renderer = Renderer::new(engine, plan.descriptors, plan.top);

        Ok(Self {
            rules,
            naming,
            renderer,
            parse: plan.parse,
        })
    }

    pub fn rules(&self) -> &RuleEngine {
        &self.rules
    }

    /// The descriptor renderer, for diagnostics such as template checks.
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Parse, place and assemble. Stops at the first structural error.
    pub fn partition(&self, input: &str) -> Result<Partition, SplitError> {
        let mut documents = Vec::new();
        let mut placements = Vec::new();
        let mut assembler = Assembler::new(&self.naming);

        for document in parse_stream(input, self.parse.clone()) {
            let document = document?;
            let placement = self.rules.place(&document)?;
            assembler.push(&document, &placement.package)?;
            documents.push(document);
            placements.push(placement);
        }

        let assembly = assembler.finish();
        info!(
            documents = documents.len(),
            packages = assembly.packages().len(),
            rejected = assembly.rejected().len(),
            "Partitioned manifest stream"
        );
        Ok(Partition {
            documents,
            placements,
            assembly,
        })
    }

    /// Place every document without assembling anything, and list all the
    /// rules that matched it. A document that cannot be placed carries
    /// its error; only a parse error stops the walk.
    pub fn explain(&self, input: &str) -> Result<Vec<Explanation>, SplitError> {
        parse_stream(input, self.parse.clone())
            .map(|document| {
                let document = document?;
                Ok(Explanation {
                    matched: self.rules.explain(&document.identity),
                    placement: self.rules.place(&document),
                    document,
                })
            })
            .collect()
    }

    /// Run the whole pipeline, rendering descriptors sequentially.
    pub fn run(&self, input: &str) -> Result<SplitOutcome, SplitError> {
        let partition = self.partition(input)?;
        let report = self.renderer.render_all(partition.assembly.packages());
        Ok(SplitOutcome { partition, report })
    }

    /// Run the whole pipeline, rendering descriptors concurrently.
    pub async fn run_concurrent(&self, input: &str) -> Result<SplitOutcome, SplitError> {
        let partition = self.partition(input)?;
        let report = self
            .renderer
            .render_all_concurrent(partition.assembly.packages())
            .await;
        Ok(SplitOutcome { partition, report })
    }
}

/// Documents of a stream and where each one went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    /// Parsed documents; `documents[i].index == i`.
    pub documents: Vec<ResourceDocument>,
    /// `placements[i]` is the placement of `documents[i]`.
    pub placements: Vec<Placement>,
    pub assembly: Assembly,
}

impl Partition {
    /// Bodies of a package's members, paired with their file names.
    pub fn contents<'a>(&'a self, package: &'a Package) -> Vec<(&'a str, &'a str)> {
        package
            .members
            .iter()
            .map(|m| {
                (
                    m.file_name.as_str(),
                    self.documents[m.document].body.as_str(),
                )
            })
            .collect()
    }
}

/// Where one document goes, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    pub document: ResourceDocument,
    pub placement: Result<Placement, SplitError>,
    /// Every matching rule in declaration order.
    pub matched: Vec<usize>,
}

impl Explanation {
    /// Matching rules that lost to an earlier one.
    pub fn shadowed(&self) -> &[usize] {
        self.matched.get(1..).unwrap_or(&[])
    }
}

/// What a run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOutcome {
    pub partition: Partition,
    pub report: RenderReport,
}

/// One package ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageContents<'a> {
    pub name: &'a str,
    /// `(file name, document body)` in stream order.
    pub files: Vec<(&'a str, &'a str)>,
    /// `None` when the descriptor failed to render.
    pub descriptor: Option<&'a str>,
}

impl SplitOutcome {
    /// Accepted packages with their files and descriptor.
    pub fn package_contents(&self) -> Vec<PackageContents<'_>> {
        self.partition
            .assembly
            .packages()
            .iter()
            .map(|package| PackageContents {
                name: &package.name,
                files: self.partition.contents(package),
                descriptor: self.report.descriptor(&package.name),
            })
            .collect()
    }

    /// Package name → rendered descriptor.
    pub fn descriptors(&self) -> BTreeMap<&str, &str> {
        self.report
            .rendered()
            .iter()
            .map(|(name, text)| (name.as_str(), text.as_str()))
            .collect()
    }

    /// Every recoverable failure: collisions first, then descriptors.
    pub fn failures(&self) -> Vec<&SplitError> {
        self.partition
            .assembly
            .failures()
            .iter()
            .chain(self.report.failures())
            .collect()
    }

    pub fn is_clean(&self) -> bool {
        self.partition.assembly.is_clean() && self.report.is_clean()
    }
}
