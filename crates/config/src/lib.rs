//! Configuration loading and validation for kustsplit.
//!
//! A split is described by one file, YAML (`.yaml`/`.yml`) or TOML
//! (`.toml`). The file names the run metadata, the placement rules and
//! the templates used for file names and descriptors. Environment
//! variables may override selected settings.

use kustsplit_core::validate_package_name;
use kustsplit_rules::SplitRule;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The only accepted `apiVersion`.
pub const API_VERSION: &str = "kustsplit/v1alpha1";

/// Environment variable that replaces `defaultPackage`.
pub const ENV_DEFAULT_PACKAGE: &str = "KUSTSPLIT_DEFAULT_PACKAGE";

/// The root configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SplitConfig {
    /// Must equal [`API_VERSION`].
    pub api_version: String,

    /// Free-form run metadata, bound as `top` in every template.
    /// `top.source` optionally names the input stream.
    #[serde(default)]
    pub top: serde_json::Map<String, serde_json::Value>,

    /// Package for documents no rule matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_package: Option<String>,

    /// Compare rule fields case-insensitively.
    #[serde(default)]
    pub ignore_case: bool,

    /// Re-serialize document bodies instead of copying them verbatim.
    #[serde(default)]
    pub normalize: bool,

    #[serde(default)]
    pub naming: NamingConfig,

    #[serde(default)]
    pub descriptor: DescriptorConfig,

    /// Placement rules, first match wins.
    #[serde(default)]
    pub rules: Vec<SplitRule>,
}

/// Output naming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NamingConfig {
    /// File-name template for package members. Built-in when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Directory of each package, relative to the output root.
    #[serde(default = "default_package_path")]
    pub package_path: String,
}

fn default_package_path() -> String {
    "{{ packageName }}".into()
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            file: None,
            package_path: default_package_path(),
        }
    }
}

/// Descriptor output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DescriptorConfig {
    /// File name of the descriptor inside each package directory.
    #[serde(default = "default_descriptor_filename")]
    pub filename: String,

    /// Descriptor template. Built-in when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    /// Package name → template used for that package only.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<String, String>,
}

fn default_descriptor_filename() -> String {
    "kustomization.yaml".into()
}

impl Default for DescriptorConfig {
    fn default() -> Self {
        Self {
            filename: default_descriptor_filename(),
            template: None,
            overrides: BTreeMap::new(),
        }
    }
}

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some("toml") => Ok(Self::Toml),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

impl SplitConfig {
    /// Load, apply environment overrides, and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::read(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a file, ignoring the environment.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::read(path)?;
        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config = Self::parse(&content, format, path)?;
        tracing::debug!(path = %path.display(), rules = config.rules.len(), "Loaded config");
        Ok(config)
    }

    /// Parse `content` without validating it. `origin` is only used in
    /// error messages.
    pub fn parse(content: &str, format: ConfigFormat, origin: &Path) -> Result<Self, ConfigError> {
        let parsed = match format {
            ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        };
        parsed.map_err(|reason| ConfigError::ParseError {
            path: origin.to_path_buf(),
            reason,
        })
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// [`SplitConfig::load`]).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(package) = lookup(ENV_DEFAULT_PACKAGE) {
            let package = package.trim();
            if !package.is_empty() {
                tracing::debug!(package, "Default package overridden from environment");
                self.default_package = Some(package.to_string());
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_version != API_VERSION {
            return Err(ConfigError::ValidationError(format!(
                "apiVersion must be '{API_VERSION}', found '{}'",
                self.api_version
            )));
        }

        if let Some(source) = self.top.get("source")
            && !source.is_string()
        {
            return Err(ConfigError::ValidationError(
                "top.source must be a string".into(),
            ));
        }

        if let Some(name) = &self.default_package {
            validate_package_name(name)
                .map_err(|e| ConfigError::ValidationError(format!("defaultPackage: {e}")))?;
        }

        for (position, rule) in self.rules.iter().enumerate() {
            rule.validate(position)
                .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        }

        for name in self.descriptor.overrides.keys() {
            validate_package_name(name).map_err(|e| {
                ConfigError::ValidationError(format!("descriptor.overrides: {e}"))
            })?;
        }

        let templates = [
            ("naming.file", self.naming.file.as_deref()),
            ("naming.packagePath", Some(self.naming.package_path.as_str())),
            ("descriptor.template", self.descriptor.template.as_deref()),
        ];
        for (field, template) in templates {
            if template.is_some_and(|t| t.trim().is_empty()) {
                return Err(ConfigError::ValidationError(format!("{field} is empty")));
            }
        }

        let filename = self.descriptor.filename.trim();
        if filename.is_empty() || filename.contains(['/', '\\']) || filename == ".." {
            return Err(ConfigError::ValidationError(format!(
                "descriptor.filename '{}' must be a plain file name",
                self.descriptor.filename
            )));
        }

        Ok(())
    }

    /// `top` as a JSON value, ready to bind in templates.
    pub fn top_value(&self) -> serde_json::Value {
        serde_json::Value::Object(self.top.clone())
    }

    /// The input source template from `top.source`, if any.
    pub fn source(&self) -> Option<&str> {
        self.top.get("source").and_then(serde_json::Value::as_str)
    }

    /// Starter configuration written by `kustsplit init`.
    pub fn starter_yaml() -> &'static str {
        STARTER_YAML
    }
}

const STARTER_YAML: &str = r#"# kustsplit configuration
apiVersion: kustsplit/v1alpha1

# Run metadata, bound as `top` in every template.
top:
  name: my-app
  version: 0.1.0
  # source: https://example.com/releases/v{{ top.version }}/install.yaml

# Package for documents no rule matches. Without one, an unmatched
# document aborts the run.
defaultPackage: main

naming:
  file: "{{ resource.index | pad3 }}_{{ resource.kind | lower }}_{{ resource.name }}.yaml"
  packagePath: "{{ packageName }}"

descriptor:
  filename: kustomization.yaml

# Evaluated top to bottom. The first match wins.
rules:
  - match:
      kind: CustomResourceDefinition
    package: crd
    description: CRDs are installed before anything that uses them
  - match:
      kind: Namespace
    package: namespaces
"#;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Unsupported config format for {0}: expected .yaml, .yml or .toml")]
    UnsupportedFormat(PathBuf),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
