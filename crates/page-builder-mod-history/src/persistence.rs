/// Disk persistence layer backed by redb.
///
/// Uses a single redb database file with two tables:
/// - `snapshots`: JSON-serialized document snapshots keyed by `"{doc_id}#{index:020}"`
/// - `meta`: bincode-serialized `HistoryMeta` keyed by `doc_id`
///
/// Snapshots are stored as JSON rather than bincode because documents use
/// tagged enums, which bincode cannot decode.
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Snapshot table: composite string key → JSON document.
const SNAPSHOT_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("snapshots");

/// Metadata table: doc_id → bincode-serialized HistoryMeta.
const META_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("meta");

/// Per-document metadata persisted alongside the snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMeta {
    /// Cursor position at the time of the write.
    pub cursor: u64,
    /// Number of snapshots written.
    pub len: u64,
    /// Unix timestamp of the write, in milliseconds.
    pub saved_at_ms: i64,
}

impl HistoryMeta {
    /// When the history was last written, if the timestamp is representable.
    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.saved_at_ms)
    }
}

/// Formats a snapshot table key from doc_id and log index.
///
/// The index is zero-padded to 20 digits to ensure correct
/// lexicographic ordering in the B-tree.
fn snapshot_key(doc_id: &str, index: usize) -> String {
    format!("{doc_id}#{index:020}")
}

/// Returns the exclusive range bounds for all snapshot entries of a document.
///
/// `$` is one ASCII codepoint above `#`, so the range captures exactly the
/// entries for the given doc_id.
fn doc_range(doc_id: &str) -> (String, String) {
    let start = format!("{doc_id}#");
    let end = format!("{doc_id}$");
    (start, end)
}

/// Persistence layer for document history backed by redb.
///
/// Thread-safe: redb supports concurrent readers and serialized writers.
/// Shared across documents via `Arc<PersistenceLayer>`.
pub struct PersistenceLayer {
    db: Database,
}

impl std::fmt::Debug for PersistenceLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceLayer").finish()
    }
}

impl PersistenceLayer {
    /// Opens or creates the history database in the given directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the database
    /// cannot be opened.
    pub fn open(data_dir: &Path) -> Result<Arc<Self>> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let db_path = data_dir.join("history.redb");
        let db = Database::create(&db_path)
            .with_context(|| format!("Failed to open history database: {}", db_path.display()))?;

        let write_txn = db
            .begin_write()
            .context("Failed to begin initial write transaction")?;
        {
            let _ = write_txn
                .open_table(SNAPSHOT_TABLE)
                .context("Failed to create snapshots table")?;
            let _ = write_txn
                .open_table(META_TABLE)
                .context("Failed to create meta table")?;
        }
        write_txn
            .commit()
            .context("Failed to commit initial transaction")?;

        tracing::debug!("Opened history database at {}", db_path.display());
        Ok(Arc::new(Self { db }))
    }

    /// Replaces the stored history of a document.
    ///
    /// Old snapshots are removed and the new log plus its metadata are written
    /// in the same transaction, so readers never observe a mix of both.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write transaction fails.
    pub fn write_snapshots<D: Serialize>(
        &self,
        doc_id: &str,
        snapshots: &[D],
        cursor: usize,
    ) -> Result<()> {
        let meta = HistoryMeta {
            cursor: cursor as u64,
            len: snapshots.len() as u64,
            saved_at_ms: Utc::now().timestamp_millis(),
        };
        let meta_bytes = bincode::serialize(&meta).context("Failed to serialize history metadata")?;

        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        {
            let mut table = write_txn
                .open_table(SNAPSHOT_TABLE)
                .context("Failed to open snapshots table")?;

            let (start, end) = doc_range(doc_id);
            let stale = table
                .range::<&str>(start.as_str()..end.as_str())
                .context("Failed to range query snapshots table")?
                .map(|entry| entry.map(|(k, _)| k.value().to_string()))
                .collect::<Result<Vec<String>, _>>()
                .context("Failed to read stale snapshot key")?;
            for key in &stale {
                table
                    .remove(key.as_str())
                    .context("Failed to remove stale snapshot")?;
            }

            for (index, snapshot) in snapshots.iter().enumerate() {
                let key = snapshot_key(doc_id, index);
                let bytes = serde_json::to_vec(snapshot).context("Failed to serialize snapshot")?;
                table
                    .insert(key.as_str(), bytes.as_slice())
                    .context("Failed to insert snapshot")?;
            }
        }
        {
            let mut meta_table = write_txn
                .open_table(META_TABLE)
                .context("Failed to open meta table")?;
            meta_table
                .insert(doc_id, meta_bytes.as_slice())
                .context("Failed to insert metadata")?;
        }
        write_txn
            .commit()
            .context("Failed to commit write transaction")?;

        tracing::trace!(doc_id, len = snapshots.len(), cursor, "Wrote history snapshots");
        Ok(())
    }

    /// Reads all snapshots for a document, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the read transaction or deserialization fails.
    pub fn read_snapshots<D: DeserializeOwned>(&self, doc_id: &str) -> Result<Vec<D>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;
        let table = read_txn
            .open_table(SNAPSHOT_TABLE)
            .context("Failed to open snapshots table")?;

        let (start, end) = doc_range(doc_id);
        let mut snapshots = Vec::new();

        for entry in table
            .range::<&str>(start.as_str()..end.as_str())
            .context("Failed to range query snapshots table")?
        {
            let (_, value_guard) = entry.context("Failed to read snapshot entry")?;
            let snapshot: D = serde_json::from_slice(value_guard.value())
                .context("Failed to deserialize snapshot")?;
            snapshots.push(snapshot);
        }

        Ok(snapshots)
    }

    /// Counts the snapshots stored for a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the read transaction fails.
    pub fn count_snapshots(&self, doc_id: &str) -> Result<usize> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;
        let table = read_txn
            .open_table(SNAPSHOT_TABLE)
            .context("Failed to open snapshots table")?;

        let (start, end) = doc_range(doc_id);
        let count = table
            .range::<&str>(start.as_str()..end.as_str())
            .context("Failed to range query for count")?
            .count();

        Ok(count)
    }

    /// Loads the metadata for a document.
    ///
    /// Returns `None` if no history exists for this document.
    ///
    /// # Errors
    ///
    /// Returns an error if the read transaction or deserialization fails.
    pub fn load_meta(&self, doc_id: &str) -> Result<Option<HistoryMeta>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;
        let table = read_txn
            .open_table(META_TABLE)
            .context("Failed to open meta table")?;

        match table.get(doc_id).context("Failed to read metadata")? {
            Some(guard) => {
                let meta: HistoryMeta = bincode::deserialize(guard.value())
                    .context("Failed to deserialize metadata")?;
                Ok(Some(meta))
            }
            None => Ok(None),
        }
    }

    /// Removes all snapshots and metadata for a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the write transaction fails.
    pub fn delete_document(&self, doc_id: &str) -> Result<()> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        {
            let mut table = write_txn
                .open_table(SNAPSHOT_TABLE)
                .context("Failed to open snapshots table")?;

            let (start, end) = doc_range(doc_id);
            let keys_to_remove = table
                .range::<&str>(start.as_str()..end.as_str())
                .context("Failed to range query for deletion")?
                .map(|entry| entry.map(|(k, _)| k.value().to_string()))
                .collect::<Result<Vec<String>, _>>()
                .context("Failed to read snapshot key for deletion")?;

            for key in &keys_to_remove {
                table
                    .remove(key.as_str())
                    .context("Failed to remove entry")?;
            }
        }
        {
            let mut meta_table = write_txn
                .open_table(META_TABLE)
                .context("Failed to open meta table")?;
            let _ = meta_table.remove(doc_id);
        }
        write_txn.commit().context("Failed to commit deletion")?;
        Ok(())
    }

    /// Lists all document IDs that have stored metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if the read transaction fails.
    pub fn list_documents(&self) -> Result<Vec<String>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;
        let table = read_txn
            .open_table(META_TABLE)
            .context("Failed to open meta table")?;

        let mut doc_ids = Vec::new();
        for entry in table.iter().context("Failed to iterate meta table")? {
            let (key_guard, _) = entry.context("Failed to read meta entry")?;
            doc_ids.push(key_guard.value().to_string());
        }
        Ok(doc_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn page_doc(ids: &[&str]) -> Value {
        let pages: Vec<Value> = ids.iter().map(|id| json!({ "id": id })).collect();
        json!({ "pages": pages })
    }

    fn open_test_db() -> (Arc<PersistenceLayer>, TempDir) {
        let dir = TempDir::new().expect("create temp dir");
        let pl = PersistenceLayer::open(dir.path()).expect("open db");
        (pl, dir)
    }

    #[test]
    fn test_open_creates_database() {
        let (pl, dir) = open_test_db();
        assert!(dir.path().join("history.redb").exists());
        let docs = pl.list_documents().expect("list docs");
        assert!(docs.is_empty());
    }

    #[test]
    fn test_write_and_read_snapshots() {
        let (pl, _dir) = open_test_db();
        let snapshots = vec![page_doc(&[]), page_doc(&["p1"]), page_doc(&["p1", "p2"])];
        pl.write_snapshots("landing", &snapshots, 2).expect("write");

        let loaded: Vec<Value> = pl.read_snapshots("landing").expect("read");
        assert_eq!(loaded, snapshots);

        let meta = pl.load_meta("landing").expect("meta").expect("exists");
        assert_eq!(meta.cursor, 2);
        assert_eq!(meta.len, 3);
        assert!(meta.saved_at().is_some());
    }

    #[test]
    fn test_rewrite_replaces_previous_log() {
        let (pl, _dir) = open_test_db();
        let long: Vec<Value> = (0..5).map(|i| json!({ "rev": i })).collect();
        pl.write_snapshots("doc", &long, 4).expect("write long");

        let short = vec![json!({ "rev": 10 }), json!({ "rev": 11 })];
        pl.write_snapshots("doc", &short, 0).expect("write short");

        let loaded: Vec<Value> = pl.read_snapshots("doc").expect("read");
        assert_eq!(loaded, short);
        assert_eq!(pl.count_snapshots("doc").expect("count"), 2);
        assert_eq!(pl.load_meta("doc").expect("meta").expect("exists").cursor, 0);
    }

    #[test]
    fn test_repeated_rewrites_remove_every_stale_entry() {
        let (pl, _dir) = open_test_db();
        let neighbour = vec![json!({ "rev": "n" })];
        pl.write_snapshots("doc-2", &neighbour, 0).expect("write neighbour");

        for len in [12, 7, 3, 1] {
            let log: Vec<Value> = (0..len).map(|i| json!({ "len": len, "rev": i })).collect();
            pl.write_snapshots("doc", &log, len - 1).expect("rewrite");

            let loaded: Vec<Value> = pl.read_snapshots("doc").expect("read");
            assert_eq!(loaded, log);
            assert_eq!(pl.count_snapshots("doc").expect("count"), len);
        }

        let kept: Vec<Value> = pl.read_snapshots("doc-2").expect("read neighbour");
        assert_eq!(kept, neighbour);
    }

    #[test]
    fn test_index_ordering_past_ten() {
        let (pl, _dir) = open_test_db();
        let snapshots: Vec<Value> = (0..12).map(|i| json!({ "rev": i })).collect();
        pl.write_snapshots("ordered", &snapshots, 11).expect("write");

        let loaded: Vec<Value> = pl.read_snapshots("ordered").expect("read");
        assert_eq!(loaded[10], json!({ "rev": 10 }));
        assert_eq!(loaded[11], json!({ "rev": 11 }));
    }

    #[test]
    fn test_read_unknown_document_is_empty() {
        let (pl, _dir) = open_test_db();
        let loaded: Vec<Value> = pl.read_snapshots("missing").expect("read");
        assert!(loaded.is_empty());
        assert!(pl.load_meta("missing").expect("meta").is_none());
    }

    #[test]
    fn test_delete_document() {
        let (pl, _dir) = open_test_db();
        pl.write_snapshots("delete-doc", &[page_doc(&["p1"])], 0)
            .expect("write");

        pl.delete_document("delete-doc").expect("delete");

        let loaded: Vec<Value> = pl.read_snapshots("delete-doc").expect("read");
        assert!(loaded.is_empty());
        assert!(pl.load_meta("delete-doc").expect("meta").is_none());
    }

    #[test]
    fn test_multi_document_isolation() {
        let (pl, _dir) = open_test_db();

        pl.write_snapshots("doc-a", &[page_doc(&["a1"]), page_doc(&["a2"])], 1)
            .expect("write a");
        pl.write_snapshots("doc-b", &[page_doc(&["b1"])], 0)
            .expect("write b");

        assert_eq!(pl.count_snapshots("doc-a").expect("count a"), 2);
        assert_eq!(pl.count_snapshots("doc-b").expect("count b"), 1);

        pl.delete_document("doc-a").expect("delete a");
        assert_eq!(pl.count_snapshots("doc-a").expect("count a"), 0);
        let b: Vec<Value> = pl.read_snapshots("doc-b").expect("read b");
        assert_eq!(b, vec![page_doc(&["b1"])]);
    }

    #[test]
    fn test_list_documents() {
        let (pl, _dir) = open_test_db();

        pl.write_snapshots("doc-x", &[json!(1)], 0).expect("write");
        pl.write_snapshots("doc-y", &[json!(2)], 0).expect("write");

        let mut docs = pl.list_documents().expect("list");
        docs.sort();
        assert_eq!(docs, vec!["doc-x", "doc-y"]);
    }

    #[test]
    fn test_reopen_database_preserves_data() {
        let dir = TempDir::new().expect("create temp dir");

        {
            let pl = PersistenceLayer::open(dir.path()).expect("open");
            pl.write_snapshots("doc", &[page_doc(&["persistent"])], 0)
                .expect("write");
        }

        {
            let pl = PersistenceLayer::open(dir.path()).expect("reopen");
            let loaded: Vec<Value> = pl.read_snapshots("doc").expect("read");
            assert_eq!(loaded, vec![page_doc(&["persistent"])]);
            assert_eq!(pl.load_meta("doc").expect("meta").expect("exists").len, 1);
        }
    }
}
