//! JSON loading and saving for documents.

use std::path::Path;

use anyhow::{bail, Context, Result};

use super::Document;

impl Document {
    /// Parses a document from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed JSON, unknown component types or
    /// property keys, and documents reusing a page or component id.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let doc: Document = serde_json::from_str(json).context("failed to parse document JSON")?;
        if let Some(id) = doc.find_duplicate_id() {
            bail!("document contains duplicate id: {id}");
        }
        Ok(doc)
    }

    /// Serializes the document to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_string(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        json.context("failed to serialize document")
    }
}

/// Reads a document from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid document.
pub fn load_document(path: &Path) -> Result<Document> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read document: {}", path.display()))?;
    let doc = Document::from_json_str(&contents)
        .with_context(|| format!("invalid document: {}", path.display()))?;
    tracing::debug!(
        pages = doc.pages.len(),
        components = doc.component_count(),
        "Loaded {}",
        path.display()
    );
    Ok(doc)
}

/// Writes a document to a JSON file.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn save_document(path: &Path, doc: &Document, pretty: bool) -> Result<()> {
    let json = doc.to_json_string(pretty)?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write document: {}", path.display()))?;
    tracing::debug!("Saved {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Block, BlockKind, Component};
    use crate::document::Page;

    #[test]
    fn test_minimal_pages_parse() {
        let doc = Document::from_json_str(r#"{"pages":[{"id":"p1"},{"id":"p2"}]}"#).unwrap();
        assert_eq!(doc.pages.len(), 2);
        assert_eq!(doc.pages[0].id, "p1");
        assert!(doc.pages[0].components.is_empty());
        assert_eq!(doc.settings.font_family, "Inter");
    }

    #[test]
    fn test_empty_object_is_empty_document() {
        let doc = Document::from_json_str("{}").unwrap();
        assert_eq!(doc, Document::default());
    }

    #[test]
    fn test_unknown_top_level_field_rejected() {
        let err = Document::from_json_str(r#"{"pages":[],"theme":"dark"}"#).unwrap_err();
        assert!(format!("{err:#}").contains("theme"));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let json = r#"{"pages":[{"id":"p1"},{"id":"p1"}]}"#;
        let err = Document::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("duplicate id: p1"));
    }

    #[test]
    fn test_full_document_preserves_every_field() {
        let mut doc = Document::new("Riverside Institute");
        doc.settings.logo_url = Some("https://cdn.example.edu/logo.svg".to_string());
        let mut page = Page::new("Courses", "courses");
        let mut hidden = Component::new(Block::default_for(BlockKind::Testimonial));
        hidden.hidden = true;
        page.components.push(hidden);
        page.components.push(Component::new(Block::default_for(BlockKind::Image)));
        doc.pages.push(page);

        for pretty in [true, false] {
            let json = doc.to_json_string(pretty).unwrap();
            assert_eq!(Document::from_json_str(&json).unwrap(), doc);
        }
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.json");
        let mut doc = Document::new("Evening Academy");
        doc.pages.push(Page::new("Home", "home"));

        save_document(&path, &doc, true).unwrap();
        assert_eq!(load_document(&path).unwrap(), doc);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_document(&dir.path().join("missing.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read document"));
    }
}
