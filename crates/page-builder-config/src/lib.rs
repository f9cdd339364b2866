pub mod config;

pub use config::{resolve_data_dir, AppConfig, DEFAULT_HISTORY_DEPTH, MAX_HISTORY_DEPTH};
