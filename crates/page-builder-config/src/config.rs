/// Application configuration: load, save, and sanitize.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default number of snapshots kept in a document's undo history.
pub const DEFAULT_HISTORY_DEPTH: usize = 50;

/// Upper bound accepted for `history_depth`.
pub const MAX_HISTORY_DEPTH: usize = 1000;

/// Environment variable that overrides the data directory.
const DATA_DIR_ENV: &str = "PAGE_BUILDER_DATA_DIR";

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Snapshots kept per document, including the current one.
    pub history_depth: usize,
    /// Whether undo history is written to disk and restored on reopen.
    pub persist_history: bool,
    /// Directory for the history database. Empty = platform default.
    pub data_dir: String,
    /// Site title given to newly created documents.
    pub default_site_title: String,
    /// Whether saved documents are pretty-printed.
    pub pretty_json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            history_depth: DEFAULT_HISTORY_DEPTH,
            persist_history: true,
            data_dir: String::new(),
            default_site_title: "My Institute".to_string(),
            pretty_json: true,
        }
    }
}

impl AppConfig {
    /// Returns the config file path: exe directory + `page-builder.json`.
    pub fn config_path() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|d| d.join("page-builder.json")))
            .unwrap_or_else(|| PathBuf::from("page-builder.json"))
    }

    /// Loads config from `path`, creating a default file if it doesn't exist.
    /// Returns defaults on any error (missing file, parse error, etc.).
    pub fn load_or_create(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(contents) => match serde_json::from_str::<AppConfig>(&contents) {
                    Ok(mut config) => {
                        config.sanitize();
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {}: {e}", path.display());
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {}: {e}", path.display());
                }
            }
            // Don't overwrite a broken file.
            Self::default()
        } else {
            let config = Self::default();
            if let Err(e) = config.save(path) {
                tracing::warn!("Failed to create default config at {}: {e}", path.display());
            }
            config
        }
    }

    /// Saves config to `path` as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Clamps values to valid ranges and resets invalid fields.
    pub fn sanitize(&mut self) {
        self.history_depth = self.history_depth.clamp(1, MAX_HISTORY_DEPTH);
        if self.default_site_title.trim().is_empty() {
            self.default_site_title = Self::default().default_site_title;
        }
    }

    /// Directory holding the history database.
    pub fn resolve_data_dir(&self) -> PathBuf {
        resolve_data_dir(&self.data_dir)
    }
}

/// Resolves the data directory path.
///
/// Resolution order:
/// 1. `PAGE_BUILDER_DATA_DIR` environment variable
/// 2. `configured`, if non-empty
/// 3. the platform data directory (`dirs::data_dir()/page-builder`)
/// 4. `.data/` directory next to the executable
pub fn resolve_data_dir(configured: &str) -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    if !configured.trim().is_empty() {
        return PathBuf::from(configured);
    }
    if let Some(dir) = dirs::data_dir() {
        return dir.join("page-builder");
    }
    let exe = std::env::current_exe().unwrap_or_else(|_| PathBuf::from("."));
    exe.parent().unwrap_or(Path::new(".")).join(".data")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.history_depth, 50);
        assert!(config.persist_history);
        assert!(config.data_dir.is_empty());
        assert_eq!(config.default_site_title, "My Institute");
        assert!(config.pretty_json);
    }

    #[test]
    fn test_sanitize_clamps_history_depth() {
        let mut config = AppConfig::default();
        config.history_depth = 0;
        config.sanitize();
        assert_eq!(config.history_depth, 1);

        config.history_depth = 50_000;
        config.sanitize();
        assert_eq!(config.history_depth, MAX_HISTORY_DEPTH);

        config.history_depth = 75;
        config.sanitize();
        assert_eq!(config.history_depth, 75);
    }

    #[test]
    fn test_sanitize_resets_blank_site_title() {
        let mut config = AppConfig::default();
        config.default_site_title = "   ".to_string();
        config.sanitize();
        assert_eq!(config.default_site_title, "My Institute");
    }

    #[test]
    fn test_serde_round_trip() {
        let mut config = AppConfig::default();
        config.history_depth = 20;
        config.persist_history = false;
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.history_depth, 20);
        assert!(!parsed.persist_history);
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let json = r#"{"history_depth": 10}"#;
        let parsed: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.history_depth, 10);
        assert!(parsed.persist_history);
        assert_eq!(parsed.default_site_title, "My Institute");
    }

    #[test]
    fn test_resolve_data_dir_order() {
        // Save and restore env var
        let original = std::env::var(DATA_DIR_ENV).ok();

        std::env::remove_var(DATA_DIR_ENV);
        assert_eq!(
            resolve_data_dir("/configured/dir"),
            PathBuf::from("/configured/dir")
        );
        assert!(!resolve_data_dir("").as_os_str().is_empty());

        std::env::set_var(DATA_DIR_ENV, "/custom/path");
        assert_eq!(resolve_data_dir("/configured/dir"), PathBuf::from("/custom/path"));

        match original {
            Some(val) => std::env::set_var(DATA_DIR_ENV, val),
            None => std::env::remove_var(DATA_DIR_ENV),
        }
    }
}
