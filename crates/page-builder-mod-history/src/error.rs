/// Errors reported by the history store.
use thiserror::Error;

/// Misuse of the history store.
///
/// Boundary conditions (undo at the oldest snapshot, redo at the newest) are
/// not errors; they are silent no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// `commit`, `undo` or `redo` was called before `initialize`.
    #[error("history store used before initialize (operation: {operation})")]
    NotInitialized { operation: &'static str },
}
