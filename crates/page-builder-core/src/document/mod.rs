//! The page-builder document: pages, their components, and site settings.
//!
//! `Document` is a plain owned value. Cloning it produces a fully independent
//! deep copy, which is what the history log stores for every snapshot. JSON
//! loading and saving live in the `json` submodule.

mod json;

pub use json::{load_document, save_document};

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::component::Component;

/// Generates a fresh identifier such as `page-3f2a...`.
pub(crate) fn new_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

/// The full configuration tree edited by the page builder.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Document {
    #[serde(default)]
    pub pages: Vec<Page>,
    #[serde(default)]
    pub settings: GlobalSettings,
}

/// One page of the catalogue or landing site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    /// Components in render order.
    #[serde(default)]
    pub components: Vec<Component>,
}

impl Page {
    /// Creates an empty page with a fresh id.
    pub fn new(title: &str, slug: &str) -> Self {
        Self {
            id: new_id("page"),
            title: title.to_string(),
            slug: slug.to_string(),
            components: Vec::new(),
        }
    }

    pub fn component(&self, component_id: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.id == component_id)
    }

    pub fn component_index(&self, component_id: &str) -> Option<usize> {
        self.components.iter().position(|c| c.id == component_id)
    }
}

/// Site-wide settings shared by every page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalSettings {
    pub site_title: String,
    /// CSS hex colour, e.g. `#1f6feb`.
    pub primary_color: String,
    pub font_family: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    pub show_footer: bool,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            site_title: String::new(),
            primary_color: "#1f6feb".to_string(),
            font_family: "Inter".to_string(),
            logo_url: None,
            show_footer: true,
        }
    }
}

impl Document {
    /// An empty document for a new site.
    pub fn new(site_title: &str) -> Self {
        Self {
            pages: Vec::new(),
            settings: GlobalSettings {
                site_title: site_title.to_string(),
                ..GlobalSettings::default()
            },
        }
    }

    pub fn page(&self, page_id: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == page_id)
    }

    pub fn page_mut(&mut self, page_id: &str) -> Option<&mut Page> {
        self.pages.iter_mut().find(|p| p.id == page_id)
    }

    pub fn page_index(&self, page_id: &str) -> Option<usize> {
        self.pages.iter().position(|p| p.id == page_id)
    }

    pub fn page_by_slug(&self, slug: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.slug == slug)
    }

    /// Finds a component anywhere in the document, with the page holding it.
    pub fn find_component(&self, component_id: &str) -> Option<(&Page, &Component)> {
        self.pages
            .iter()
            .find_map(|page| page.component(component_id).map(|c| (page, c)))
    }

    /// Total number of components across all pages.
    pub fn component_count(&self) -> usize {
        self.pages.iter().map(|p| p.components.len()).sum()
    }

    /// Returns the first page or component id that occurs more than once.
    pub fn find_duplicate_id(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        let ids = self.pages.iter().flat_map(|page| {
            std::iter::once(page.id.as_str()).chain(page.components.iter().map(|c| c.id.as_str()))
        });
        for id in ids {
            if !seen.insert(id) {
                return Some(id);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Block, BlockKind};

    fn sample() -> Document {
        let mut doc = Document::new("Northside College");
        let mut home = Page::new("Home", "home");
        home.components.push(Component::new(Block::default_for(BlockKind::Hero)));
        home.components.push(Component::new(Block::default_for(BlockKind::CourseGrid)));
        doc.pages.push(home);
        doc.pages.push(Page::new("About", "about"));
        doc
    }

    #[test]
    fn test_new_document() {
        let doc = Document::new("Northside College");
        assert!(doc.pages.is_empty());
        assert_eq!(doc.settings.site_title, "Northside College");
        assert!(doc.settings.show_footer);
    }

    #[test]
    fn test_lookups() {
        let doc = sample();
        let home_id = doc.pages[0].id.clone();
        let grid_id = doc.pages[0].components[1].id.clone();

        assert_eq!(doc.page(&home_id).map(|p| p.title.as_str()), Some("Home"));
        assert_eq!(doc.page_index(&doc.pages[1].id), Some(1));
        assert_eq!(doc.page_by_slug("about").map(|p| p.title.as_str()), Some("About"));
        assert!(doc.page("missing").is_none());

        let (page, component) = doc.find_component(&grid_id).unwrap();
        assert_eq!(page.id, home_id);
        assert_eq!(component.block.kind(), BlockKind::CourseGrid);
        assert_eq!(doc.component_count(), 2);
    }

    #[test]
    fn test_clone_is_independent() {
        let original = sample();
        let mut copy = original.clone();
        copy.pages[0].components.clear();
        copy.settings.site_title = "Changed".to_string();

        assert_eq!(original.pages[0].components.len(), 2);
        assert_eq!(original.settings.site_title, "Northside College");
    }

    #[test]
    fn test_find_duplicate_id() {
        let mut doc = sample();
        assert!(doc.find_duplicate_id().is_none());

        let dup = doc.pages[0].components[0].clone();
        doc.pages[1].components.push(dup.clone());
        assert_eq!(doc.find_duplicate_id(), Some(dup.id.as_str()));
    }

    #[test]
    fn test_new_ids_are_unique_and_prefixed() {
        let a = new_id("page");
        let b = new_id("page");
        assert_ne!(a, b);
        assert!(a.starts_with("page-"));
    }
}
