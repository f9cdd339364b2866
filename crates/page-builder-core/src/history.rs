// Re-exports from page-builder-mod-history.
// The editor session records `Document` snapshots through these types.
pub use page_builder_mod_history::config::{doc_id_for_path, generate_unsaved_id};
pub use page_builder_mod_history::{
    HistoryConfig, HistoryError, HistoryMeta, HistoryStore, PersistenceLayer,
};

/// History store specialised to page-builder documents.
pub type DocumentHistory = HistoryStore<crate::document::Document>;
