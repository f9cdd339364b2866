/// Errors returned by editing actions.
use thiserror::Error;

use crate::history::HistoryError;

/// Why an editing action was rejected. A rejected action records nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("page not found: {0}")]
    PageNotFound(String),
    #[error("component not found: {0}")]
    ComponentNotFound(String),
    #[error("index {index} out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("invalid slug {0:?}: use lowercase letters, digits and single dashes")]
    InvalidSlug(String),
    #[error("slug {slug:?} is already used by page {page_id}")]
    DuplicateSlug { slug: String, page_id: String },
    #[error("unknown component type: {0}")]
    UnknownBlockKind(String),
    #[error(transparent)]
    History(#[from] HistoryError),
}
