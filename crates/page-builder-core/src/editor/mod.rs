//! Editor session: the document being edited, its undo/redo history, and
//! the current selection.
//!
//! Every editing action works on a clone of the live document and commits the
//! result to the history store in one step. A rejected action commits
//! nothing, and an action that changes nothing is not recorded. File I/O is in
//! the `io` submodule.

mod io;

use std::path::PathBuf;

use crate::component::{Block, Component};
use crate::document::{Document, GlobalSettings, Page};
use crate::error::EditError;
use crate::history::DocumentHistory;
use crate::slug::{is_valid_slug, slugify, unique_slug};

/// What the user currently has selected in the builder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub page_id: Option<String>,
    pub component_id: Option<String>,
}

/// One open document in the builder.
pub struct EditorSession {
    /// Snapshot history; always initialized for a constructed session.
    history: DocumentHistory,
    /// The document as last loaded or saved.
    saved: Document,
    /// Current selection, kept pointing at existing pages/components.
    selection: Selection,
    /// File path on disk, if any.
    file_path: Option<PathBuf>,
    /// Timestamp of the last successful save to disk.
    pub last_saved_at: Option<chrono::DateTime<chrono::Local>>,
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("history", &self.history)
            .field("selection", &self.selection)
            .field("file_path", &self.file_path)
            .field("dirty", &self.is_dirty())
            .finish_non_exhaustive()
    }
}

impl EditorSession {
    /// Opens `doc` with in-memory-only history.
    pub fn new(doc: Document) -> Self {
        Self::with_history(doc, DocumentHistory::in_memory(), None)
    }

    /// Builds a session around an existing history store.
    ///
    /// A store restored from disk whose live document differs from `doc`
    /// gets `doc` committed on top, so the restored snapshots stay reachable
    /// through undo. An uninitialized store is initialized with `doc`.
    pub(crate) fn with_history(
        doc: Document,
        mut history: DocumentHistory,
        file_path: Option<PathBuf>,
    ) -> Self {
        match history.current().map(|current| *current == doc) {
            Some(true) => tracing::debug!("Resuming restored history"),
            Some(false) => {
                tracing::info!("Document changed outside the editor; recording it as a new step");
                if let Err(e) = history.commit(doc.clone()) {
                    tracing::warn!("Failed to extend restored history: {e}");
                    history.initialize(doc.clone());
                }
            }
            None => history.initialize(doc.clone()),
        }

        Self {
            history,
            saved: doc,
            selection: Selection::default(),
            file_path,
            last_saved_at: None,
        }
    }

    /// Replaces the document and starts a fresh history.
    pub fn open(&mut self, doc: Document) {
        self.history.initialize(doc.clone());
        self.saved = doc;
        self.selection = Selection::default();
    }

    /// The live document.
    pub fn document(&self) -> &Document {
        self.history.current().unwrap_or(&self.saved)
    }

    pub fn history(&self) -> &DocumentHistory {
        &self.history
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Whether the live document differs from the last loaded/saved one.
    pub fn is_dirty(&self) -> bool {
        *self.document() != self.saved
    }

    /// Records the live document as saved.
    pub fn mark_saved(&mut self) {
        self.saved = self.document().clone();
        self.last_saved_at = Some(chrono::Local::now());
    }

    // ── History ────────────────────────────────────────────────────────

    /// Steps back one edit. Returns `Ok(false)` if there is nothing to undo.
    ///
    /// # Errors
    ///
    /// Only fails if the history store was never initialized.
    pub fn undo(&mut self) -> Result<bool, EditError> {
        let moved = self.history.undo()?;
        if moved {
            self.repair_selection();
        }
        Ok(moved)
    }

    /// Re-applies one undone edit. Returns `Ok(false)` if there is nothing to redo.
    ///
    /// # Errors
    ///
    /// Only fails if the history store was never initialized.
    pub fn redo(&mut self) -> Result<bool, EditError> {
        let moved = self.history.redo()?;
        if moved {
            self.repair_selection();
        }
        Ok(moved)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ── Selection ──────────────────────────────────────────────────────

    /// Selects a page and clears the component selection.
    pub fn select_page(&mut self, page_id: &str) -> Result<(), EditError> {
        if self.document().page(page_id).is_none() {
            return Err(EditError::PageNotFound(page_id.to_string()));
        }
        self.selection = Selection {
            page_id: Some(page_id.to_string()),
            component_id: None,
        };
        Ok(())
    }

    /// Selects a component and the page holding it.
    pub fn select_component(&mut self, page_id: &str, component_id: &str) -> Result<(), EditError> {
        let page = self
            .document()
            .page(page_id)
            .ok_or_else(|| EditError::PageNotFound(page_id.to_string()))?;
        if page.component(component_id).is_none() {
            return Err(EditError::ComponentNotFound(component_id.to_string()));
        }
        self.selection = Selection {
            page_id: Some(page_id.to_string()),
            component_id: Some(component_id.to_string()),
        };
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::default();
    }

    /// Drops selected ids that no longer exist in the live document.
    fn repair_selection(&mut self) {
        let Some(page_id) = self.selection.page_id.clone() else {
            self.selection.component_id = None;
            return;
        };
        let Some(page) = self.document().page(&page_id) else {
            self.selection = Selection::default();
            return;
        };
        let component_exists = self
            .selection
            .component_id
            .as_deref()
            .is_some_and(|id| page.component(id).is_some());
        if !component_exists {
            self.selection.component_id = None;
        }
    }

    // ── Pages ──────────────────────────────────────────────────────────

    /// Appends a page and selects it. The slug is derived from the title and
    /// made unique. Returns the new page id.
    pub fn add_page(&mut self, title: &str) -> Result<String, EditError> {
        let page_id = self.apply("add_page", |doc| {
            let slug = unique_slug(&slugify(title), |s| doc.page_by_slug(s).is_some());
            let page = Page::new(title.trim(), &slug);
            let id = page.id.clone();
            doc.pages.push(page);
            Ok(id)
        })?;
        self.selection = Selection {
            page_id: Some(page_id.clone()),
            component_id: None,
        };
        Ok(page_id)
    }

    pub fn remove_page(&mut self, page_id: &str) -> Result<(), EditError> {
        self.apply("remove_page", |doc| {
            let index = find_page_index(doc, page_id)?;
            doc.pages.remove(index);
            Ok(())
        })?;
        self.repair_selection();
        Ok(())
    }

    pub fn rename_page(&mut self, page_id: &str, title: &str) -> Result<(), EditError> {
        self.apply("rename_page", |doc| {
            find_page_mut(doc, page_id)?.title = title.trim().to_string();
            Ok(())
        })
    }

    /// Sets a page slug. The slug must be valid and unused by other pages.
    pub fn set_page_slug(&mut self, page_id: &str, slug: &str) -> Result<(), EditError> {
        if !is_valid_slug(slug) {
            return Err(EditError::InvalidSlug(slug.to_string()));
        }
        self.apply("set_page_slug", |doc| {
            if let Some(other) = doc.page_by_slug(slug).filter(|p| p.id != page_id) {
                return Err(EditError::DuplicateSlug {
                    slug: slug.to_string(),
                    page_id: other.id.clone(),
                });
            }
            find_page_mut(doc, page_id)?.slug = slug.to_string();
            Ok(())
        })
    }

    /// Moves a page to `to_index` in the page order.
    pub fn move_page(&mut self, page_id: &str, to_index: usize) -> Result<(), EditError> {
        self.apply("move_page", |doc| {
            let from = find_page_index(doc, page_id)?;
            move_item(&mut doc.pages, from, to_index)
        })
    }

    // ── Components ─────────────────────────────────────────────────────

    /// Inserts a component at `index` (or at the end) and selects it.
    /// Returns the new component id.
    pub fn add_component(
        &mut self,
        page_id: &str,
        block: Block,
        index: Option<usize>,
    ) -> Result<String, EditError> {
        let component_id = self.apply("add_component", |doc| {
            let page = find_page_mut(doc, page_id)?;
            let len = page.components.len();
            let index = index.unwrap_or(len);
            if index > len {
                return Err(EditError::IndexOutOfRange { index, len });
            }
            let component = Component::new(block);
            let id = component.id.clone();
            page.components.insert(index, component);
            Ok(id)
        })?;
        self.selection = Selection {
            page_id: Some(page_id.to_string()),
            component_id: Some(component_id.clone()),
        };
        Ok(component_id)
    }

    /// Replaces a component's content. The block may change type.
    pub fn update_component(
        &mut self,
        page_id: &str,
        component_id: &str,
        block: Block,
    ) -> Result<(), EditError> {
        self.apply("update_component", |doc| {
            find_component_mut(doc, page_id, component_id)?.block = block;
            Ok(())
        })
    }

    pub fn set_component_hidden(
        &mut self,
        page_id: &str,
        component_id: &str,
        hidden: bool,
    ) -> Result<(), EditError> {
        self.apply("set_component_hidden", |doc| {
            find_component_mut(doc, page_id, component_id)?.hidden = hidden;
            Ok(())
        })
    }

    pub fn remove_component(&mut self, page_id: &str, component_id: &str) -> Result<(), EditError> {
        self.apply("remove_component", |doc| {
            let page = find_page_mut(doc, page_id)?;
            let index = page
                .component_index(component_id)
                .ok_or_else(|| EditError::ComponentNotFound(component_id.to_string()))?;
            page.components.remove(index);
            Ok(())
        })?;
        self.repair_selection();
        Ok(())
    }

    /// Moves a component to `to_index` within its page.
    pub fn move_component(
        &mut self,
        page_id: &str,
        component_id: &str,
        to_index: usize,
    ) -> Result<(), EditError> {
        self.apply("move_component", |doc| {
            let page = find_page_mut(doc, page_id)?;
            let from = page
                .component_index(component_id)
                .ok_or_else(|| EditError::ComponentNotFound(component_id.to_string()))?;
            move_item(&mut page.components, from, to_index)
        })
    }

    /// Inserts a copy right after the original and selects it.
    /// Returns the copy's id.
    pub fn duplicate_component(
        &mut self,
        page_id: &str,
        component_id: &str,
    ) -> Result<String, EditError> {
        let copy_id = self.apply("duplicate_component", |doc| {
            let page = find_page_mut(doc, page_id)?;
            let index = page
                .component_index(component_id)
                .ok_or_else(|| EditError::ComponentNotFound(component_id.to_string()))?;
            let copy = page.components[index].duplicate();
            let id = copy.id.clone();
            page.components.insert(index + 1, copy);
            Ok(id)
        })?;
        self.selection = Selection {
            page_id: Some(page_id.to_string()),
            component_id: Some(copy_id.clone()),
        };
        Ok(copy_id)
    }

    // ── Settings ───────────────────────────────────────────────────────

    pub fn update_settings(&mut self, settings: GlobalSettings) -> Result<(), EditError> {
        self.apply("update_settings", |doc| {
            doc.settings = settings;
            Ok(())
        })
    }

    /// Runs `edit` on a draft of the live document and commits the draft.
    ///
    /// Nothing is committed when `edit` fails or leaves the draft unchanged.
    fn apply<T>(
        &mut self,
        action: &'static str,
        edit: impl FnOnce(&mut Document) -> Result<T, EditError>,
    ) -> Result<T, EditError> {
        let mut draft = self.document().clone();
        let out = edit(&mut draft).inspect_err(|e| {
            tracing::debug!(action, "Edit rejected: {e}");
        })?;

        if draft == *self.document() {
            tracing::trace!(action, "Edit changed nothing; not recorded");
            return Ok(out);
        }
        self.history.commit(draft)?;
        tracing::debug!(action, cursor = self.history.cursor(), "Edit recorded");
        Ok(out)
    }
}

fn find_page_index(doc: &Document, page_id: &str) -> Result<usize, EditError> {
    doc.page_index(page_id)
        .ok_or_else(|| EditError::PageNotFound(page_id.to_string()))
}

fn find_page_mut<'a>(doc: &'a mut Document, page_id: &str) -> Result<&'a mut Page, EditError> {
    doc.page_mut(page_id)
        .ok_or_else(|| EditError::PageNotFound(page_id.to_string()))
}

fn find_component_mut<'a>(
    doc: &'a mut Document,
    page_id: &str,
    component_id: &str,
) -> Result<&'a mut Component, EditError> {
    find_page_mut(doc, page_id)?
        .components
        .iter_mut()
        .find(|c| c.id == component_id)
        .ok_or_else(|| EditError::ComponentNotFound(component_id.to_string()))
}

/// Moves `items[from]` so that it ends up at `to`.
fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) -> Result<(), EditError> {
    let len = items.len();
    if to >= len {
        return Err(EditError::IndexOutOfRange { index: to, len });
    }
    let item = items.remove(from);
    items.insert(to, item);
    Ok(())
}
