//! Package assembler — groups placed documents into packages.
//!
//! Packages appear in the order their first document was seen and keep
//! their members in stream order. A file-name collision poisons only the
//! package it happens in.

use crate::naming::{NameRequest, NamingPolicy};
use kustsplit_core::{Member, Package, ResourceDocument, SplitError};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Accumulates `(document, package)` pairs.
pub struct Assembler<'n> {
    naming: &'n dyn NamingPolicy,
    packages: Vec<Package>,
    /// Package name → position in `packages`.
    lookup: HashMap<String, usize>,
    /// Per package: file name → stream index of the document that owns it.
    claimed: Vec<HashMap<String, usize>>,
    /// Per package: whether a collision has been seen.
    poisoned: Vec<bool>,
    failures: Vec<SplitError>,
}

impl<'n> Assembler<'n> {
    pub fn new(naming: &'n dyn NamingPolicy) -> Self {
        Self {
            naming,
            packages: Vec::new(),
            lookup: HashMap::new(),
            claimed: Vec::new(),
            poisoned: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Add `document` to `package`.
    ///
    /// Only a naming failure is returned as an error; collisions are
    /// recorded and surface through [`Assembly::failures`].
    pub fn push(&mut self, document: &ResourceDocument, package: &str) -> Result<(), SplitError> {
        let slot = match self.lookup.get(package) {
            Some(&slot) => slot,
            None => {
                let slot = self.packages.len();
                self.packages.push(Package::new(package));
                self.claimed.push(HashMap::new());
                self.poisoned.push(false);
                self.lookup.insert(package.to_string(), slot);
                debug!(package, "Created package");
                slot
            }
        };

        let request = NameRequest {
            package,
            document,
            position: self.packages[slot].len(),
        };
        let file_name =
            self.naming
                .file_name(&request)
                .map_err(|reason| SplitError::InvalidFileName {
                    index: document.index,
                    reason,
                })?;

        if let Some(&first) = self.claimed[slot].get(&file_name) {
            warn!(
                package,
                file = %file_name,
                first,
                second = document.index,
                "Duplicate file name"
            );
            self.poisoned[slot] = true;
            self.failures.push(SplitError::DuplicateFileName {
                package: package.to_string(),
                file_name,
                first,
                second: document.index,
            });
            return Ok(());
        }

        self.claimed[slot].insert(file_name.clone(), document.index);
        self.packages[slot].members.push(Member {
            document: document.index,
            identity: document.identity.clone(),
            file_name,
        });
        Ok(())
    }

    /// Finish assembly. Poisoned packages are set aside.
    pub fn finish(self) -> Assembly {
        let mut packages = Vec::new();
        let mut rejected = Vec::new();
        for (package, poisoned) in self.packages.into_iter().zip(self.poisoned) {
            if poisoned {
                rejected.push(package);
            } else {
                packages.push(package);
            }
        }
        Assembly {
            packages,
            rejected,
            failures: self.failures,
        }
    }
}

/// The result of assembly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assembly {
    packages: Vec<Package>,
    rejected: Vec<Package>,
    failures: Vec<SplitError>,
}

impl Assembly {
    /// Packages without collisions, in first-seen order.
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    /// Packages withheld because of a file-name collision. Members whose
    /// names collided are not included.
    pub fn rejected(&self) -> &[Package] {
        &self.rejected
    }

    /// Every `DuplicateFileName` recorded, in stream order.
    pub fn failures(&self) -> &[SplitError] {
        &self.failures
    }

    pub fn get(&self, name: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.name == name)
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Total number of members across accepted packages.
    pub fn member_count(&self) -> usize {
        self.packages.iter().map(Package::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kustsplit_core::ResourceIdentity;

    fn doc(index: usize, kind: &str, name: &str) -> ResourceDocument {
        ResourceDocument::new(index, ResourceIdentity::new(kind, name, None), "")
    }

    fn by_name(r: &NameRequest<'_>) -> Result<String, String> {
        Ok(format!("{}.yaml", r.document.identity.name))
    }

    #[test]
    fn groups_in_first_seen_order_and_keeps_stream_order() {
        let mut asm = Assembler::new(&by_name);
        let docs = [
            doc(0, "Deployment", "a"),
            doc(1, "Service", "b"),
            doc(2, "Deployment", "c"),
            doc(3, "ConfigMap", "d"),
            doc(4, "Service", "e"),
        ];
        let targets = ["work", "net", "work", "cfg", "net"];
        for (d, t) in docs.iter().zip(targets) {
            asm.push(d, t).unwrap();
        }
        let assembly = asm.finish();
        let names: Vec<_> = assembly.packages().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["work", "net", "cfg"]);
        assert_eq!(assembly.get("work").unwrap().document_indices(), vec![0, 2]);
        assert_eq!(assembly.get("net").unwrap().document_indices(), vec![1, 4]);
        assert_eq!(assembly.member_count(), 5);
        assert!(assembly.is_clean());
    }

    #[test]
    fn position_counts_within_package() {
        let positional = |r: &NameRequest<'_>| Ok::<_, String>(format!("{}-{}", r.package, r.position));
        let mut asm = Assembler::new(&positional);
        asm.push(&doc(0, "A", "x"), "p").unwrap();
        asm.push(&doc(1, "A", "y"), "q").unwrap();
        asm.push(&doc(2, "A", "z"), "p").unwrap();
        let assembly = asm.finish();
        assert_eq!(assembly.get("p").unwrap().file_names(), vec!["p-0", "p-1"]);
        assert_eq!(assembly.get("q").unwrap().file_names(), vec!["q-0"]);
    }

    #[test]
    fn collision_poisons_only_its_package() {
        let mut asm = Assembler::new(&by_name);
        asm.push(&doc(0, "Service", "web"), "net").unwrap();
        asm.push(&doc(1, "Deployment", "web"), "net").unwrap();
        asm.push(&doc(2, "Deployment", "web"), "work").unwrap();
        let assembly = asm.finish();

        assert_eq!(assembly.packages().len(), 1);
        assert_eq!(assembly.packages()[0].name, "work");
        assert_eq!(assembly.rejected().len(), 1);
        assert_eq!(assembly.rejected()[0].document_indices(), vec![0]);
        assert!(assembly.get("net").is_none());

        match &assembly.failures()[0] {
            SplitError::DuplicateFileName {
                package,
                file_name,
                first,
                second,
            } => {
                assert_eq!(package, "net");
                assert_eq!(file_name, "web.yaml");
                assert_eq!((*first, *second), (0, 1));
            }
            other => panic!("Expected DuplicateFileName, got: {other}"),
        }
    }

    #[test]
    fn every_collision_is_reported() {
        let mut asm = Assembler::new(&by_name);
        for i in 0..3 {
            asm.push(&doc(i, "Service", "same"), "net").unwrap();
        }
        let assembly = asm.finish();
        assert_eq!(assembly.failures().len(), 2);
        assert!(
            assembly
                .failures()
                .iter()
                .all(|f| matches!(f, SplitError::DuplicateFileName { first: 0, .. }))
        );
    }

    #[test]
    fn naming_failure_is_fatal() {
        let failing = |_: &NameRequest<'_>| Err::<String, _>("no name".to_string());
        let mut asm = Assembler::new(&failing);
        let err = asm.push(&doc(5, "A", "x"), "p").unwrap_err();
        assert!(matches!(err, SplitError::InvalidFileName { index: 5, .. }));
    }
}
