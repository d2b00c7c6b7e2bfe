//! Authoring tools: clipboard staging of tile regions and undoable tile edits.
//!
//! # Invariants
//! - Copying never mutates the source level; pasting never mutates the grid.
//! - A clipboard payload either resolves every template or yields no grid.
//! - Every recorded edit is reversible by `Editor::undo`.

pub mod clipboard;
pub mod editor;

pub use clipboard::{
    ClipboardError, ClipboardEventTile, ClipboardPayload, ClipboardTile, MAX_PAYLOAD_CELLS,
    TriggerRecord, copy_region, paste, paste_footprint,
};
pub use editor::{EditCommand, EditError, Editor};
