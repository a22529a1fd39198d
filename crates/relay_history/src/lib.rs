//! Relay history: storage side of the reconciliation engine.
//!
//! Loads stored conversation history (already ordered, one JSON event per
//! line) and persists the per-conversation cursor table between runs.
mod cursors;
mod error;
mod history;
mod persist;

pub use cursors::{CursorStore, SavedCursors, CURSORS_FILENAME};
pub use error::HistoryError;
pub use history::{load_history_file, parse_history, write_history_file};
pub use persist::{ensure_output_dir, AtomicFileWriter};
