//! Document parsing and identity extraction.

use crate::splitter::{Chunks, is_blank};
use kustsplit_core::{ResourceDocument, ResourceIdentity, SplitError};
use serde_yaml::Value;
use tracing::debug;

/// How documents are read out of the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Resolve YAML merge keys (`<<`) before extracting the identity.
    pub merge_keys: bool,

    /// Re-emit each document from its parsed value instead of keeping
    /// the original text. Merge keys are expanded in the output.
    pub normalize: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            merge_keys: true,
            normalize: false,
        }
    }
}

/// Lazy iterator over the documents of a stream.
///
/// Yields documents in stream order. After the first error the iterator
/// is exhausted: an unidentifiable document invalidates the whole run.
pub struct Documents<'a> {
    chunks: Chunks<'a>,
    options: ParseOptions,
    next_index: usize,
    failed: bool,
}

impl Iterator for Documents<'_> {
    type Item = Result<ResourceDocument, SplitError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            let chunk = self.chunks.next()?;
            if is_blank(&chunk) {
                continue;
            }
            match parse_document(self.next_index, &chunk, &self.options) {
                Ok(Some(doc)) => {
                    self.next_index += 1;
                    debug!(index = doc.index, resource = %doc.identity, "Parsed document");
                    return Some(Ok(doc));
                }
                Ok(None) => continue,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

impl std::iter::FusedIterator for Documents<'_> {}

/// Split `text` into documents.
pub fn parse_stream(text: &str, options: ParseOptions) -> Documents<'_> {
    Documents {
        chunks: Chunks::new(text),
        options,
        next_index: 0,
        failed: false,
    }
}

/// Parse the whole stream, stopping at the first error.
pub fn parse_all(text: &str, options: ParseOptions) -> Result<Vec<ResourceDocument>, SplitError> {
    parse_stream(text, options).collect()
}

/// Parse one chunk. `Ok(None)` means the chunk is an empty (null) document.
fn parse_document(
    index: usize,
    chunk: &str,
    options: &ParseOptions,
) -> Result<Option<ResourceDocument>, SplitError> {
    let malformed = |reason: String| SplitError::MalformedDocument { index, reason };

    let mut value: Value =
        serde_yaml::from_str(chunk).map_err(|e| malformed(format!("invalid YAML: {e}")))?;
    if value.is_null() {
        return Ok(None);
    }
    if !value.is_mapping() {
        return Err(malformed("top-level value is not a mapping".into()));
    }
    if options.merge_keys {
        value
            .apply_merge()
            .map_err(|e| malformed(format!("cannot apply merge keys: {e}")))?;
    }

    let identity = extract_identity(&value).map_err(malformed)?;

    let body = if options.normalize {
        serde_yaml::to_string(&value).map_err(|e| malformed(format!("cannot re-emit: {e}")))?
    } else {
        raw_body(chunk)
    };

    Ok(Some(ResourceDocument::new(index, identity, body)))
}

fn extract_identity(value: &Value) -> Result<ResourceIdentity, String> {
    let kind = required_str(value.get("kind"), "kind")?;
    let metadata = value.get("metadata");
    let name = required_str(metadata.and_then(|m| m.get("name")), "metadata.name")?;
    let namespace = match metadata.and_then(|m| m.get("namespace")) {
        None | Some(Value::Null) => None,
        Some(Value::String(ns)) => Some(ns.as_str()),
        Some(_) => return Err("metadata.namespace is not a string".into()),
    };
    Ok(ResourceIdentity::new(kind, name, namespace))
}

fn required_str<'v>(value: Option<&'v Value>, field: &str) -> Result<&'v str, String> {
    match value {
        None | Some(Value::Null) => Err(format!("missing {field}")),
        Some(Value::String(s)) if s.trim().is_empty() => Err(format!("{field} is empty")),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(format!("{field} is not a string")),
    }
}

/// Original text with surrounding blank lines removed and exactly one
/// trailing newline.
fn raw_body(chunk: &str) -> String {
    let start = chunk
        .split_inclusive('\n')
        .take_while(|line| line.trim().is_empty())
        .map(str::len)
        .sum::<usize>();
    let trimmed = chunk[start..].trim_end();
    format!("{trimmed}\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const STREAM: &str = "\
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: a
  namespace: x
---
apiVersion: v1
kind: Service
metadata:
  name: b
  namespace: x
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: c
  namespace: y
";

    fn ids(docs: &[ResourceDocument]) -> Vec<String> {
        docs.iter().map(|d| d.identity.to_string()).collect()
    }

    #[test]
    fn parses_identities_in_order() {
        let docs = parse_all(STREAM, ParseOptions::default()).unwrap();
        assert_eq!(ids(&docs), vec!["Deployment/x/a", "Service/x/b", "ConfigMap/y/c"]);
        assert_eq!(
            docs.iter().map(|d| d.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn raw_body_is_kept() {
        let docs = parse_all(STREAM, ParseOptions::default()).unwrap();
        assert_eq!(
            docs[1].body,
            "apiVersion: v1\nkind: Service\nmetadata:\n  name: b\n  namespace: x\n"
        );
    }

    #[test]
    fn empty_documents_are_skipped_without_consuming_an_index() {
        let text = "---\n\n---\n# just a comment\n---\nkind: A\nmetadata: {name: one}\n---\n   \n---\nkind: B\nmetadata: {name: two}\n";
        let docs = parse_all(text, ParseOptions::default()).unwrap();
        assert_eq!(ids(&docs), vec!["A/one", "B/two"]);
        assert_eq!(docs[1].index, 1);
    }

    #[test]
    fn explicit_null_document_is_skipped() {
        let text = "~\n---\nkind: A\nmetadata: {name: one}\n";
        let docs = parse_all(text, ParseOptions::default()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].index, 0);
    }

    #[test]
    fn empty_stream_has_no_documents() {
        assert!(parse_all("", ParseOptions::default()).unwrap().is_empty());
        assert!(parse_all("---\n---\n", ParseOptions::default()).unwrap().is_empty());
    }

    #[test]
    fn missing_kind_is_malformed() {
        let text = "kind: A\nmetadata: {name: one}\n---\nmetadata: {name: two}\n";
        let mut docs = parse_stream(text, ParseOptions::default());
        assert!(docs.next().unwrap().is_ok());
        match docs.next().unwrap() {
            Err(SplitError::MalformedDocument { index, reason }) => {
                assert_eq!(index, 1);
                assert!(reason.contains("kind"));
            }
            other => panic!("Expected MalformedDocument, got: {other:?}"),
        }
        assert!(docs.next().is_none());
    }

    #[test]
    fn missing_name_is_malformed() {
        let err = parse_all("kind: A\nmetadata: {namespace: x}\n", ParseOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            SplitError::MalformedDocument { ref reason, .. } if reason.contains("metadata.name")
        ));
    }

    #[test]
    fn non_string_identity_fields_are_malformed() {
        let err = parse_all("kind: 42\nmetadata: {name: a}\n", ParseOptions::default())
            .unwrap_err();
        assert!(matches!(err, SplitError::MalformedDocument { .. }));

        let err = parse_all(
            "kind: A\nmetadata: {name: a, namespace: [x]}\n",
            ParseOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SplitError::MalformedDocument { .. }));
    }

    #[test]
    fn non_mapping_document_is_malformed() {
        let err = parse_all("- a\n- b\n", ParseOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            SplitError::MalformedDocument { ref reason, .. } if reason.contains("mapping")
        ));
    }

    #[test]
    fn yaml_syntax_error_is_malformed() {
        let err = parse_all("kind: A\nmetadata: {name: [\n", ParseOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            SplitError::MalformedDocument { index: 0, ref reason } if reason.contains("invalid YAML")
        ));
    }

    #[test]
    fn empty_namespace_is_cluster_scoped() {
        let docs = parse_all(
            "kind: ClusterRole\nmetadata: {name: view, namespace: ''}\n",
            ParseOptions::default(),
        )
        .unwrap();
        assert_eq!(docs[0].identity.namespace, None);
    }

    #[test]
    fn merge_keys_feed_identity() {
        let text = "\
base: &base
  name: merged
  namespace: ns1
kind: ConfigMap
metadata:
  <<: *base
";
        let docs = parse_all(text, ParseOptions::default()).unwrap();
        assert_eq!(docs[0].identity.to_string(), "ConfigMap/ns1/merged");
    }

    #[test]
    fn normalize_reemits_merged_yaml() {
        let text = "\
defaults: &d
  namespace: ns1
kind: ConfigMap
metadata:
  <<: *d
  name: merged
";
        let options = ParseOptions {
            normalize: true,
            ..ParseOptions::default()
        };
        let docs = parse_all(text, options).unwrap();
        assert!(!docs[0].body.contains("<<"));
        assert!(docs[0].body.contains("namespace: ns1"));
        assert!(docs[0].body.ends_with('\n'));
    }

    #[test]
    fn raw_body_trims_surrounding_blank_lines() {
        assert_eq!(raw_body("\n\nkind: A\n\n\n"), "kind: A\n");
        assert_eq!(raw_body("# head\nkind: A"), "# head\nkind: A\n");
    }

    #[test]
    fn iterator_is_lazy() {
        // The broken second document is never reached.
        let text = "kind: A\nmetadata: {name: one}\n---\nnot: [valid\n";
        let first = parse_stream(text, ParseOptions::default()).next();
        assert!(matches!(first, Some(Ok(ref d)) if d.identity.name == "one"));
    }
}
