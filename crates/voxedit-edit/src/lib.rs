//! Undoable map edits.
#![forbid(unsafe_code)]

pub mod command;
pub mod history;
pub mod map;

pub use command::{CommandTarget, EditCommand, EditKind};
pub use history::{CommandHistory, DEFAULT_HISTORY_DEPTH};
pub use map::{MapEditor, NullSink, VisualSink};
