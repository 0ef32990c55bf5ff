//! Configuration → pipeline plan.

use kustsplit_config::SplitConfig;
use kustsplit_manifest::ParseOptions;
use kustsplit_package::{DEFAULT_FILE_TEMPLATE, DescriptorTemplates, SplitPlan};
use kustsplit_rules::RuleSet;

/// Where packages land on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    /// Template for the directory of a package, relative to the output root.
    pub package_path: String,
    /// File name of the descriptor inside each package directory.
    pub descriptor_file: String,
}

impl OutputLayout {
    pub fn from_config(config: &SplitConfig) -> Self {
        Self {
            package_path: config.naming.package_path.clone(),
            descriptor_file: config.descriptor.filename.clone(),
        }
    }
}

/// Build the pipeline plan described by `config`.
pub fn build_plan(config: &SplitConfig) -> SplitPlan {
    let mut descriptors = match &config.descriptor.template {
        Some(template) => DescriptorTemplates::new(template.clone()),
        None => DescriptorTemplates::default(),
    };
    for (package, template) in &config.descriptor.overrides {
        descriptors = descriptors.with_override(package.clone(), template.clone());
    }

    SplitPlan {
        rules: RuleSet {
            rules: config.rules.clone(),
            ignore_case: config.ignore_case,
        },
        default_package: config.default_package.clone(),
        file_template: config
            .naming
            .file
            .clone()
            .unwrap_or_else(|| DEFAULT_FILE_TEMPLATE.to_string()),
        descriptors,
        top: config.top_value(),
        parse: ParseOptions {
            normalize: config.normalize,
            ..ParseOptions::default()
        },
    }
}
