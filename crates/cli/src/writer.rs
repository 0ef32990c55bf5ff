//! Writer — persists the packages of a split outcome.
//!
//! Each package becomes a directory under the output root holding one
//! file per member plus the descriptor. A package whose descriptor failed
//! to render still gets its member files; the failure is reported. Every
//! path is checked before anything of the package is written: it must
//! stay below the root, and existing files are only replaced when forced.

use crate::plan::OutputLayout;
use kustsplit_core::TemplateEngine;
use kustsplit_package::{PackageContents, SplitOutcome};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A package laid out for writing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageWrite {
    pub package: String,
    /// Directory of the package, relative to the output root.
    pub dir: PathBuf,
    /// `(file name, contents)`; members first, descriptor last when
    /// there is one.
    pub files: Vec<(String, String)>,
}

impl PackageWrite {
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

/// Writes packages below an output root.
pub struct Writer {
    root: PathBuf,
    layout: OutputLayout,
    engine: Arc<dyn TemplateEngine>,
    top: serde_json::Value,
    force: bool,
    dry_run: bool,
}

impl Writer {
    pub fn new(
        root: impl Into<PathBuf>,
        layout: OutputLayout,
        engine: Arc<dyn TemplateEngine>,
        top: serde_json::Value,
    ) -> Self {
        Self {
            root: root.into(),
            layout,
            engine,
            top,
            force: false,
            dry_run: false,
        }
    }

    /// Replace existing files instead of failing the package.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Check and report, but write nothing.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lay out one package.
    pub fn layout(&self, contents: &PackageContents<'_>) -> Result<PackageWrite, WriteError> {
        let bindings = serde_json::json!({
            "packageName": contents.name,
            "package": { "name": contents.name },
            "top": self.top,
        });
        let rendered = self
            .engine
            .render(&self.layout.package_path, &bindings)
            .map_err(|e| WriteError::PackagePath {
                package: contents.name.to_string(),
                reason: e.to_string(),
            })?;
        let dir = validate_relative(rendered.trim()).map_err(|reason| WriteError::PackagePath {
            package: contents.name.to_string(),
            reason,
        })?;

        let mut files: Vec<(String, String)> = contents
            .files
            .iter()
            .map(|(name, body)| (name.to_string(), body.to_string()))
            .collect();
        if files.iter().any(|(name, _)| *name == self.layout.descriptor_file) {
            return Err(WriteError::PackagePath {
                package: contents.name.to_string(),
                reason: format!(
                    "member file '{}' clashes with the descriptor",
                    self.layout.descriptor_file
                ),
            });
        }
        if let Some(descriptor) = contents.descriptor {
            files.push((self.layout.descriptor_file.clone(), descriptor.to_string()));
        }

        Ok(PackageWrite {
            package: contents.name.to_string(),
            dir,
            files,
        })
    }

    /// Write every accepted package of `outcome`. A failing package never
    /// stops the others; failures of the split itself are copied into the
    /// report so it lists everything that went wrong.
    pub async fn write(&self, outcome: &SplitOutcome) -> WriteReport {
        let mut report = WriteReport {
            dry_run: self.dry_run,
            ..WriteReport::default()
        };
        for failure in outcome.failures() {
            report.failures.push(WriteFailure {
                package: failure.package().unwrap_or_default().to_string(),
                reason: failure.to_string(),
            });
        }

        // Package directory → package that claimed it.
        let mut claimed: HashMap<PathBuf, String> = HashMap::new();
        for contents in outcome.package_contents() {
            let result = match self.layout(&contents) {
                Ok(write) => match claimed.get(&write.dir) {
                    Some(owner) => Err(WriteError::PackagePath {
                        package: write.package.clone(),
                        reason: format!(
                            "directory '{}' is already used by package '{owner}'",
                            write.dir.display()
                        ),
                    }),
                    None => {
                        claimed.insert(write.dir.clone(), write.package.clone());
                        match self.write_package(&write).await {
                            Ok(()) => Ok(write),
                            Err(e) => Err(e),
                        }
                    }
                },
                Err(e) => Err(e),
            };
            match result {
                Ok(write) => {
                    info!(
                        package = %write.package,
                        dir = %write.dir.display(),
                        files = write.file_count(),
                        dry_run = self.dry_run,
                        "Wrote package"
                    );
                    report.written.push(write);
                }
                Err(e) => {
                    warn!(package = contents.name, error = %e, "Package not written");
                    report.failures.push(WriteFailure {
                        package: contents.name.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        report
    }

    async fn write_package(&self, write: &PackageWrite) -> Result<(), WriteError> {
        let dir = self.root.join(&write.dir);
        if !self.force {
            for (name, _) in &write.files {
                let path = dir.join(name);
                let exists = tokio::fs::try_exists(&path).await.map_err(|e| WriteError::Io {
                    package: write.package.clone(),
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
                if exists {
                    return Err(WriteError::Exists {
                        package: write.package.clone(),
                        path,
                    });
                }
            }
        }
        if self.dry_run {
            return Ok(());
        }

        let io_error = |path: &Path, e: std::io::Error| WriteError::Io {
            package: write.package.clone(),
            path: path.to_path_buf(),
            reason: e.to_string(),
        };
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| io_error(&dir, e))?;
        for (written, (name, contents)) in write.files.iter().enumerate() {
            let path = dir.join(name);
            if let Err(e) = tokio::fs::write(&path, contents).await {
                return Err(match written {
                    0 => io_error(&path, e),
                    _ => WriteError::PartiallyWritten {
                        package: write.package.clone(),
                        path,
                        written,
                        reason: e.to_string(),
                    },
                });
            }
            debug!(path = %path.display(), bytes = contents.len(), "Wrote file");
        }
        Ok(())
    }
}

/// Check that a rendered package directory stays below the output root.
pub fn validate_relative(path: &str) -> Result<PathBuf, String> {
    if path.is_empty() {
        return Err("package path is empty".into());
    }
    let normalized = path.replace('\\', "/");
    let candidate = Path::new(&normalized);
    let mut clean = PathBuf::new();
    for component in candidate.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(format!("package path '{path}' contains '..'"));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(format!("package path '{path}' is absolute"));
            }
        }
    }
    if clean.as_os_str().is_empty() {
        return Err(format!("package path '{path}' points at the output root"));
    }
    Ok(clean)
}

/// A package that could not be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteFailure {
    /// Empty for failures not tied to a package.
    pub package: String,
    pub reason: String,
}

/// End-of-run report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    pub dry_run: bool,
    pub written: Vec<PackageWrite>,
    pub failures: Vec<WriteFailure>,
}

impl WriteReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn file_count(&self) -> usize {
        self.written.iter().map(PackageWrite::file_count).sum()
    }

    /// Human-readable summary, one line per package.
    pub fn render(&self, root: &Path) -> String {
        let mut out = String::new();
        let verb = if self.dry_run { "would write" } else { "wrote" };
        for write in &self.written {
            out.push_str(&format!(
                "  ok    {:<24} {verb} {} file(s) to {}\n",
                write.package,
                write.file_count(),
                root.join(&write.dir).display()
            ));
        }
        for failure in &self.failures {
            let package = if failure.package.is_empty() {
                "-"
            } else {
                failure.package.as_str()
            };
            out.push_str(&format!("  FAIL  {package:<24} {}\n", failure.reason));
        }
        out.push_str(&format!(
            "\n{} package(s) {}, {} failure(s)\n",
            self.written.len(),
            if self.dry_run { "planned" } else { "written" },
            self.failures.len()
        ));
        out
    }
}

/// Errors that stop a single package from being written.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("invalid directory for package '{package}': {reason}")]
    PackagePath { package: String, reason: String },

    #[error("{path} already exists (use --force to overwrite)")]
    Exists { package: String, path: PathBuf },

    #[error("failed to write {path}: {reason}")]
    Io {
        package: String,
        path: PathBuf,
        reason: String,
    },

    #[error(
        "failed to write {path}: {reason}; package '{package}' is partially written \
         ({written} file(s) already on disk)"
    )]
    PartiallyWritten {
        package: String,
        path: PathBuf,
        written: usize,
        reason: String,
    },
}
