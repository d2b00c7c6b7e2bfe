//! Shared types for the tileworld crates: object identifiers, integer
//! rectangles, and the coordinate algebra that folds level coordinates into
//! fixed-size rooms.
//!
//! # Invariants
//! - `floor_div` and `wrap` agree: `v == floor_div(v, d) * d + wrap(v, d)` for every `d > 0`.
//! - Room-local coordinates produced by `LevelSpace` always lie in `[0, room_size)`.

pub mod math;
pub mod space;
pub mod types;

pub use glam::IVec2;
pub use math::{ceil_div, ceil_div_vec, floor_div, floor_div_vec, wrap, wrap_vec};
pub use space::{LevelSpace, RoomCoord, TILE_SIZE};
pub use types::{ActionTileId, Rect2I, RoomId, TileId};
