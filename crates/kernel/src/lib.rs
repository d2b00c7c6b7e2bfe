//! World kernel: the in-memory world graph of levels, rooms and tiles.
//!
//! # Invariants
//! - A multi-cell tile is stored once; every cell of its footprint holds its
//!   id and only the anchor cell (`tile.location()`) owns it. Iterate with
//!   `placed_tiles()` to see each tile exactly once.
//! - A level's room array always matches its dimensions, and resizing keeps
//!   the identity of rooms inside both the old and new bounds.
//! - A world's start position refers to an existing level, room and tile.
//! - Templates are shared read-only `Arc`s; instances only override
//!   properties on top of them.

pub mod area;
pub mod error;
pub mod grid;
pub mod instance;
pub mod level;
pub mod room;
pub mod script;
pub mod tile_grid;
pub mod world;

pub use area::{AREA_EVENTS, Area, DungeonFloor, MapType, RespawnMode, SpawnMode};
pub use error::ModelError;
pub use grid::TileLayers;
pub use instance::{ActionTileDataInstance, TileDataInstance};
pub use level::{LEVEL_EVENTS, Level, MAX_LAYER_COUNT};
pub use room::{ROOM_EVENTS, Room};
pub use script::{Script, ScriptManager, Trigger, Triggers};
pub use tile_grid::TileGrid;
pub use world::{MAX_FLOOR_SPAN, WORLD_EVENTS, World};
