/// Configuration and utility functions for the history system.
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use page_builder_config::{resolve_data_dir, AppConfig, DEFAULT_HISTORY_DEPTH};

/// Configuration for the history system.
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Max snapshots kept in the log, including the current one.
    /// Values below 1 are treated as 1.
    pub max_snapshots: usize,
    /// Root directory for the persistence database.
    pub data_dir: PathBuf,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_snapshots: DEFAULT_HISTORY_DEPTH,
            data_dir: resolve_data_dir(""),
        }
    }
}

impl HistoryConfig {
    /// Builds the history configuration from the application config file.
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_snapshots: config.history_depth,
            data_dir: config.resolve_data_dir(),
        }
    }

    /// In-memory configuration with a custom cap. `data_dir` is unused
    /// unless a persistence layer is attached.
    pub fn with_max_snapshots(max_snapshots: usize) -> Self {
        Self {
            max_snapshots,
            data_dir: PathBuf::from("."),
        }
    }

    /// The effective cap, never below one.
    pub fn cap(&self) -> usize {
        self.max_snapshots.max(1)
    }
}

/// Generates a document ID for a file on disk.
///
/// Uses a hash of the canonical path for stability across sessions.
pub fn doc_id_for_path(path: &Path) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let mut hasher = DefaultHasher::new();
    canonical.hash(&mut hasher);
    format!("doc-{:016x}", hasher.finish())
}

/// Counter for generating unique unsaved document IDs within a session.
static UNSAVED_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generates a unique document ID for a document that has no file yet.
pub fn generate_unsaved_id() -> String {
    let count = UNSAVED_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("unsaved-{count}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HistoryConfig::default();
        assert_eq!(config.max_snapshots, 50);
        assert_eq!(config.cap(), 50);
    }

    #[test]
    fn test_cap_never_zero() {
        let config = HistoryConfig::with_max_snapshots(0);
        assert_eq!(config.cap(), 1);
    }

    #[test]
    fn test_from_app_config_uses_history_depth() {
        let mut app = AppConfig::default();
        app.history_depth = 7;
        app.data_dir = "/tmp/page-builder-test".to_string();
        let config = HistoryConfig::from_app_config(&app);
        assert_eq!(config.max_snapshots, 7);
    }

    #[test]
    fn test_generate_unsaved_ids_are_unique() {
        let id1 = generate_unsaved_id();
        let id2 = generate_unsaved_id();
        assert_ne!(id1, id2);
        assert!(id1.starts_with("unsaved-"));
        assert!(id2.starts_with("unsaved-"));
    }

    #[test]
    fn test_doc_id_for_path_consistent() {
        let path = PathBuf::from("catalogue.json");
        let id1 = doc_id_for_path(&path);
        let id2 = doc_id_for_path(&path);
        assert_eq!(id1, id2);
        assert!(id1.starts_with("doc-"));
    }

    #[test]
    fn test_doc_id_for_different_paths_differ() {
        let id1 = doc_id_for_path(Path::new("landing_a.json"));
        let id2 = doc_id_for_path(Path::new("landing_b.json"));
        assert_ne!(id1, id2);
    }
}
