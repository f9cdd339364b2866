/// Snapshot history store with linear undo/redo.
///
/// The store keeps the live document plus a bounded log of whole-document
/// snapshots and a cursor into that log. Committing after an undo discards
/// every snapshot past the cursor (the redo branch). The log can optionally
/// be written to disk through a shared `PersistenceLayer`.
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::HistoryConfig;
use crate::error::HistoryError;
use crate::persistence::PersistenceLayer;

/// Undo/redo history for a single document.
///
/// Each editor session owns its own `HistoryStore`. Snapshots are independent
/// clones of the document, so nothing in the log shares state with the live
/// value handed back by [`HistoryStore::current`].
///
/// Every operation is O(document size) because of the clone taken on commit,
/// undo and redo.
pub struct HistoryStore<D> {
    /// The document currently shown to the user. `None` until `initialize`.
    live: Option<D>,
    /// Snapshot log, oldest first. Never empty once initialized.
    log: Vec<D>,
    /// Index of the current snapshot in `log`.
    cursor: usize,
    /// Document identifier used as the persistence key.
    doc_id: String,
    /// Configuration parameters.
    config: HistoryConfig,
    /// Optional disk persistence (None = in-memory only).
    persistence: Option<Arc<PersistenceLayer>>,
    /// Whether the log or cursor changed since the last flush.
    dirty: bool,
}

impl<D> std::fmt::Debug for HistoryStore<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore")
            .field("doc_id", &self.doc_id)
            .field("initialized", &self.live.is_some())
            .field("len", &self.log.len())
            .field("cursor", &self.cursor)
            .field("cap", &self.config.cap())
            .field("persistent", &self.persistence.is_some())
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl<D: Clone> HistoryStore<D> {
    /// Creates an uninitialized store.
    ///
    /// Pass `persistence: None` for in-memory-only mode.
    pub fn new(
        doc_id: String,
        config: HistoryConfig,
        persistence: Option<Arc<PersistenceLayer>>,
    ) -> Self {
        Self {
            live: None,
            log: Vec::new(),
            cursor: 0,
            doc_id,
            config,
            persistence,
            dirty: false,
        }
    }

    /// Creates an in-memory-only store with default config.
    pub fn in_memory() -> Self {
        Self::new(String::from("memory"), HistoryConfig::default(), None)
    }

    /// Returns the document ID.
    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    /// Moves the history to a new persistence key.
    ///
    /// The whole log is written under `doc_id` on the next flush. Entries
    /// stored under the old key are left alone.
    pub fn set_doc_id(&mut self, doc_id: String) {
        if doc_id == self.doc_id {
            return;
        }
        tracing::debug!(from = %self.doc_id, to = %doc_id, "History re-keyed");
        self.doc_id = doc_id;
        self.dirty = true;
    }

    /// Maximum number of snapshots retained.
    pub fn capacity(&self) -> usize {
        self.config.cap()
    }

    /// Loads a document and resets the history to a single snapshot of it.
    ///
    /// May be called again at any time to discard the current history.
    pub fn initialize(&mut self, doc: D) {
        self.log.clear();
        self.log.push(doc.clone());
        self.cursor = 0;
        self.live = Some(doc);
        self.dirty = true;
        tracing::debug!(doc_id = %self.doc_id, "History initialized");
    }

    /// Records `doc` as the newest snapshot.
    ///
    /// Snapshots after the cursor are discarded first. When the log grows past
    /// the cap, the oldest snapshots are dropped. `doc` becomes the live
    /// document and the cursor points at its snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::NotInitialized`] if `initialize` was never
    /// called. The store is left untouched.
    pub fn commit(&mut self, doc: D) -> Result<(), HistoryError> {
        self.ensure_initialized("commit")?;

        let discarded = self.log.len() - (self.cursor + 1);
        self.log.truncate(self.cursor + 1);
        self.log.push(doc.clone());

        let cap = self.config.cap();
        let mut evicted = 0;
        if self.log.len() > cap {
            evicted = self.log.len() - cap;
            self.log.drain(..evicted);
        }

        self.cursor = self.log.len() - 1;
        self.live = Some(doc);
        self.dirty = true;

        tracing::debug!(
            doc_id = %self.doc_id,
            cursor = self.cursor,
            len = self.log.len(),
            discarded,
            evicted,
            "Committed snapshot"
        );
        Ok(())
    }

    /// Steps back one snapshot.
    ///
    /// Returns `Ok(false)` without changing anything when already at the
    /// oldest retained snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::NotInitialized`] if `initialize` was never called.
    pub fn undo(&mut self) -> Result<bool, HistoryError> {
        self.ensure_initialized("undo")?;
        if self.cursor == 0 {
            tracing::trace!(doc_id = %self.doc_id, "Nothing to undo");
            return Ok(false);
        }

        self.cursor -= 1;
        self.live = Some(self.log[self.cursor].clone());
        self.dirty = true;
        tracing::debug!(doc_id = %self.doc_id, cursor = self.cursor, "Undo");
        Ok(true)
    }

    /// Steps forward one snapshot.
    ///
    /// Returns `Ok(false)` without changing anything when already at the
    /// newest snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::NotInitialized`] if `initialize` was never called.
    pub fn redo(&mut self) -> Result<bool, HistoryError> {
        self.ensure_initialized("redo")?;
        if self.cursor + 1 >= self.log.len() {
            tracing::trace!(doc_id = %self.doc_id, "Nothing to redo");
            return Ok(false);
        }

        self.cursor += 1;
        self.live = Some(self.log[self.cursor].clone());
        self.dirty = true;
        tracing::debug!(doc_id = %self.doc_id, cursor = self.cursor, "Redo");
        Ok(true)
    }

    /// Whether undo is available. Always false before `initialize`.
    pub fn can_undo(&self) -> bool {
        self.live.is_some() && self.cursor > 0
    }

    /// Whether redo is available. Always false before `initialize`.
    pub fn can_redo(&self) -> bool {
        self.live.is_some() && self.cursor + 1 < self.log.len()
    }

    /// The live document, or `None` before `initialize`.
    pub fn current(&self) -> Option<&D> {
        self.live.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.live.is_some()
    }

    /// Index of the current snapshot. Zero before `initialize`.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of snapshots in the log.
    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// All retained snapshots, oldest first.
    pub fn snapshots(&self) -> &[D] {
        &self.log
    }

    /// Whether the log or cursor changed since the last flush.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn ensure_initialized(&self, operation: &'static str) -> Result<(), HistoryError> {
        if self.live.is_none() {
            tracing::warn!(doc_id = %self.doc_id, operation, "History store used before initialize");
            return Err(HistoryError::NotInitialized { operation });
        }
        Ok(())
    }
}

impl<D: Clone + Serialize + DeserializeOwned> HistoryStore<D> {
    /// Restores history from disk, or creates an uninitialized store.
    ///
    /// The restored store is positioned where it was when last flushed, redo
    /// branch included. If the stored log is longer than the configured cap,
    /// redo entries are dropped from the newest end first, then the oldest
    /// entries; the snapshot at the cursor is always kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the persistence layer fails to read.
    pub fn load_or_new(
        doc_id: String,
        config: HistoryConfig,
        persistence: Option<Arc<PersistenceLayer>>,
    ) -> Result<Self> {
        let mut store = Self::new(doc_id, config, persistence);
        let Some(pl) = store.persistence.clone() else {
            return Ok(store);
        };

        let Some(meta) = pl
            .load_meta(&store.doc_id)
            .context("Failed to load history metadata")?
        else {
            return Ok(store);
        };

        let mut log: Vec<D> = pl
            .read_snapshots(&store.doc_id)
            .context("Failed to load history from disk")?;
        if log.is_empty() {
            tracing::warn!(doc_id = %store.doc_id, "History metadata without snapshots; starting fresh");
            return Ok(store);
        }
        if log.len() as u64 != meta.len {
            tracing::warn!(
                doc_id = %store.doc_id,
                expected = meta.len,
                found = log.len(),
                "Stored snapshot count does not match metadata"
            );
        }

        let mut cursor = usize::try_from(meta.cursor).unwrap_or(usize::MAX);
        if cursor >= log.len() {
            tracing::warn!(doc_id = %store.doc_id, cursor, "Stored cursor out of range; clamping");
            cursor = log.len() - 1;
        }

        // Trim redo entries first, then the oldest, so log[cursor] survives.
        let cap = store.config.cap();
        if log.len() > cap {
            let excess = log.len() - cap;
            let from_back = excess.min(log.len() - 1 - cursor);
            log.truncate(log.len() - from_back);
            let from_front = excess - from_back;
            log.drain(..from_front);
            cursor -= from_front;
        }

        store.live = Some(log[cursor].clone());
        store.log = log;
        store.cursor = cursor;
        tracing::debug!(
            doc_id = %store.doc_id,
            len = store.log.len(),
            cursor = store.cursor,
            "Restored history"
        );
        Ok(store)
    }

    /// Writes the log and cursor to disk.
    ///
    /// No-op if the store is in-memory-only, uninitialized, or unchanged since
    /// the last flush.
    ///
    /// # Errors
    ///
    /// Returns an error if the disk write fails.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty || self.log.is_empty() {
            return Ok(());
        }

        if let Some(pl) = &self.persistence {
            pl.write_snapshots(&self.doc_id, &self.log, self.cursor)
                .context("Failed to flush history to disk")?;
            self.dirty = false;
        }
        Ok(())
    }

    /// Deletes all persisted history for this document.
    ///
    /// The in-memory log is kept; a later commit followed by `flush` writes it
    /// out again.
    ///
    /// # Errors
    ///
    /// Returns an error if disk cleanup fails.
    pub fn delete_history(&mut self) -> Result<()> {
        if let Some(pl) = &self.persistence {
            pl.delete_document(&self.doc_id)
                .context("Failed to delete history from disk")?;
        }
        self.dirty = false;
        Ok(())
    }
}
