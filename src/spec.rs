//! OpenAPI document serving.

use std::path::Path;

use anyhow::Context;

/// The OpenAPI description served to clients.
///
/// The document is parsed once at load time and re-serialized per request:
/// keys and values survive the round trip, original formatting and comments
/// do not. With no document loaded the served body is empty - absent
/// configuration degrades to a no-op rather than an error.
#[derive(Debug, Clone, Default)]
pub struct SpecDocument {
    document: Option<serde_yaml::Value>,
}

impl SpecDocument {
    /// A spec server with nothing to serve.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load and structurally validate an OpenAPI document from a YAML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read OpenAPI document {}", path.display()))?;
        let document: serde_yaml::Value = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse OpenAPI document {}", path.display()))?;
        if !document.is_mapping() {
            anyhow::bail!(
                "OpenAPI document {} is not a YAML mapping",
                path.display()
            );
        }
        Ok(Self {
            document: Some(document),
        })
    }

    pub fn is_loaded(&self) -> bool {
        self.document.is_some()
    }

    /// Serialize the document back to YAML.
    pub fn render(&self) -> Result<String, serde_yaml::Error> {
        match &self.document {
            Some(document) => serde_yaml::to_string(document),
            None => Ok(String::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn round_trip_preserves_content() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/openapi.yaml");
        let spec = SpecDocument::from_file(Path::new(path)).unwrap();
        assert!(spec.is_loaded());

        let rendered = spec.render().unwrap();
        assert!(rendered.contains("openapi: 3.0.0"));
        assert!(rendered.contains("/weather"));
    }

    #[test]
    fn rejects_non_mapping_document() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"test").unwrap();
        assert!(SpecDocument::from_file(file.path()).is_err());
    }

    #[test]
    fn rejects_missing_file() {
        assert!(SpecDocument::from_file(Path::new("non-existing-file")).is_err());
    }

    #[test]
    fn empty_spec_renders_empty_body() {
        let spec = SpecDocument::empty();
        assert!(!spec.is_loaded());
        assert_eq!(spec.render().unwrap(), "");
    }
}
