//! Input stream resolution: a file, standard input, or a URL.

use kustsplit_core::{TemplateEngine, is_templated};
use std::path::PathBuf;
use tokio::io::AsyncReadExt;

/// Where the manifest stream comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Stdin,
    File(PathBuf),
    Url(String),
}

impl Source {
    /// Interpret a location: `-` is standard input, `http://` and
    /// `https://` are fetched, anything else is a path.
    pub fn parse(location: &str) -> Self {
        let location = location.trim();
        if location == "-" {
            Self::Stdin
        } else if location.starts_with("http://") || location.starts_with("https://") {
            Self::Url(location.to_string())
        } else {
            Self::File(PathBuf::from(location))
        }
    }

    /// Pick the source of a run. An explicit `--input` wins over
    /// `top.source`; with neither, standard input is read.
    ///
    /// `top.source` may be a template bound to `top`.
    pub fn resolve(
        input: Option<&str>,
        configured: Option<&str>,
        top: &serde_json::Value,
        engine: &dyn TemplateEngine,
    ) -> Result<Self, SourceError> {
        if let Some(input) = input {
            return Ok(Self::parse(input));
        }
        let Some(configured) = configured else {
            return Ok(Self::Stdin);
        };
        let location = if is_templated(configured) {
            engine
                .render(configured, &serde_json::json!({ "top": top }))
                .map_err(|e| SourceError::Template(e.to_string()))?
        } else {
            configured.to_string()
        };
        Ok(Self::parse(&location))
    }

    /// Read the whole stream.
    pub async fn read(&self) -> Result<String, SourceError> {
        match self {
            Self::Stdin => {
                let mut text = String::new();
                tokio::io::stdin()
                    .read_to_string(&mut text)
                    .await
                    .map_err(|e| SourceError::Read {
                        location: "<stdin>".into(),
                        reason: e.to_string(),
                    })?;
                Ok(text)
            }
            Self::File(path) => {
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| SourceError::Read {
                        location: path.display().to_string(),
                        reason: e.to_string(),
                    })
            }
            Self::Url(url) => fetch(url).await,
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdin => write!(f, "<stdin>"),
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{url}"),
        }
    }
}

async fn fetch(url: &str) -> Result<String, SourceError> {
    tracing::info!(url, "Fetching manifest stream");
    let fetch_error = |e: reqwest::Error| SourceError::Fetch {
        url: url.to_string(),
        reason: e.to_string(),
    };
    let response = reqwest::get(url).await.map_err(fetch_error)?;
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Fetch {
            url: url.to_string(),
            reason: format!("HTTP {status}"),
        });
    }
    response.text().await.map_err(fetch_error)
}

/// Errors raised while resolving or reading the input stream.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("top.source is not a valid template: {0}")]
    Template(String),

    #[error("Failed to read {location}: {reason}")]
    Read { location: String, reason: String },

    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use kustsplit_package::MiniJinjaEngine;
    use serde_json::json;

    #[test]
    fn locations() {
        assert_eq!(Source::parse("-"), Source::Stdin);
        assert_eq!(
            Source::parse("https://example.com/a.yaml"),
            Source::Url("https://example.com/a.yaml".into())
        );
        assert_eq!(
            Source::parse("manifests/all.yaml"),
            Source::File(PathBuf::from("manifests/all.yaml"))
        );
    }

    #[test]
    fn explicit_input_wins() {
        let engine = MiniJinjaEngine::new();
        let source = Source::resolve(Some("in.yaml"), Some("other.yaml"), &json!({}), &engine);
        assert_eq!(source.unwrap(), Source::File(PathBuf::from("in.yaml")));
    }

    #[test]
    fn configured_source_is_rendered_with_top() {
        let engine = MiniJinjaEngine::new();
        let top = json!({"version": "1.14.0"});
        let source = Source::resolve(
            None,
            Some("https://example.com/v{{ top.version }}/contour.yaml"),
            &top,
            &engine,
        )
        .unwrap();
        assert_eq!(
            source,
            Source::Url("https://example.com/v1.14.0/contour.yaml".into())
        );
        assert_eq!(source.to_string(), "https://example.com/v1.14.0/contour.yaml");
    }

    #[test]
    fn defaults_to_stdin() {
        let engine = MiniJinjaEngine::new();
        let source = Source::resolve(None, None, &json!({}), &engine).unwrap();
        assert_eq!(source, Source::Stdin);
    }

    #[test]
    fn broken_source_template() {
        let engine = MiniJinjaEngine::new();
        let err = Source::resolve(None, Some("{{ top.missing }}"), &json!({}), &engine);
        assert!(matches!(err, Err(SourceError::Template(_))));
    }

    #[tokio::test]
    async fn reads_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.yaml");
        std::fs::write(&path, "kind: A\n").unwrap();
        let text = Source::File(path).read().await.unwrap();
        assert_eq!(text, "kind: A\n");

        let missing = Source::File(dir.path().join("nope.yaml")).read().await;
        assert!(matches!(missing, Err(SourceError::Read { .. })));
    }
}
