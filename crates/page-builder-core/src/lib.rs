pub mod component;
pub mod document;
pub mod editor;
pub mod error;
pub mod history;
pub mod slug;

pub use component::{Block, BlockKind, Component};
pub use document::{load_document, save_document, Document, GlobalSettings, Page};
pub use editor::{EditorSession, Selection};
pub use error::EditError;
pub use history::{HistoryConfig, PersistenceLayer};
