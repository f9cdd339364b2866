//! File I/O for editor sessions.
//!
//! Handles opening documents from disk, saving them back, and managing
//! persistent undo history.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use super::EditorSession;
use crate::document::{load_document, save_document, Document};
use crate::history::{
    doc_id_for_path, generate_unsaved_id, DocumentHistory, HistoryConfig, PersistenceLayer,
};

impl EditorSession {
    /// Opens a document file with in-memory-only history.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid document.
    pub fn open_file(path: &Path, config: &HistoryConfig) -> Result<Self> {
        Self::open_internal(path, config, None)
    }

    /// Opens a document file with persistent history.
    ///
    /// Loads existing undo history from disk if available.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or history loading fails.
    pub fn open_file_with_persistence(
        path: &Path,
        config: &HistoryConfig,
        persistence: Arc<PersistenceLayer>,
    ) -> Result<Self> {
        Self::open_internal(path, config, Some(persistence))
    }

    /// Creates a session for a document that has no file yet.
    pub fn new_unsaved(
        doc: Document,
        config: &HistoryConfig,
        persistence: Option<Arc<PersistenceLayer>>,
    ) -> Self {
        let history = DocumentHistory::new(generate_unsaved_id(), config.clone(), persistence);
        Self::with_history(doc, history, None)
    }

    fn open_internal(
        path: &Path,
        config: &HistoryConfig,
        persistence: Option<Arc<PersistenceLayer>>,
    ) -> Result<Self> {
        let doc = load_document(path)?;
        let history = match persistence {
            Some(pl) => DocumentHistory::load_or_new(doc_id_for_path(path), config.clone(), Some(pl))
                .context("failed to load undo history")?,
            None => DocumentHistory::new(doc_id_for_path(path), config.clone(), None),
        };
        Ok(Self::with_history(doc, history, Some(path.to_path_buf())))
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// Display name: the file name, or "Untitled".
    pub fn title(&self) -> String {
        self.file_path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Untitled".to_string())
    }

    /// Saves the document to its file path.
    ///
    /// # Errors
    ///
    /// Returns an error if no path is set or the file cannot be written.
    pub fn save(&mut self, pretty: bool) -> Result<()> {
        let path = self
            .file_path
            .as_ref()
            .context("no file path set for this document")?
            .clone();
        self.save_to(&path, pretty)
    }

    /// Saves the document to a specific path and makes it the session's path.
    ///
    /// The undo history moves to the new path's id, so reopening the file
    /// restores it. History stored for an unsaved document is deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or stale history
    /// cannot be removed.
    pub fn save_to(&mut self, path: &Path, pretty: bool) -> Result<()> {
        save_document(path, self.document(), pretty)?;
        let doc_id = doc_id_for_path(path);
        if self.history.doc_id() != doc_id {
            if self.file_path.is_none() {
                self.history.delete_history()?;
            }
            self.history.set_doc_id(doc_id);
        }
        self.file_path = Some(path.to_path_buf());
        self.mark_saved();
        Ok(())
    }

    /// Flushes the undo history to disk.
    ///
    /// No-op if using in-memory-only history.
    ///
    /// # Errors
    ///
    /// Returns an error if the disk write fails.
    pub fn flush_history(&mut self) -> Result<()> {
        self.history.flush()
    }

    /// Deletes all persisted undo history for this document.
    ///
    /// # Errors
    ///
    /// Returns an error if disk cleanup fails.
    pub fn delete_history(&mut self) -> Result<()> {
        self.history.delete_history()
    }
}
