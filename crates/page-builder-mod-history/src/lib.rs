/// Snapshot-based undo/redo history for page-builder documents.
///
/// Provides a `HistoryStore` that keeps a bounded, linear log of whole-document
/// snapshots with a cursor into it. Committing after an undo discards the redo
/// branch. History can optionally be persisted per-document to an embedded
/// key-value store (redb) so it survives across editing sessions.
pub mod config;
pub mod error;
pub mod persistence;
pub mod store;

pub use config::HistoryConfig;
pub use error::HistoryError;
pub use persistence::{HistoryMeta, PersistenceLayer};
pub use store::HistoryStore;
