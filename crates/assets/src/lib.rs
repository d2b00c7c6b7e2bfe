//! Template catalog: the immutable, shared definitions placed objects are
//! stamped from, plus the named assets a saved world refers to.
//!
//! World data consumes templates by name, never by file path. The catalog is
//! built once (in code through [`CatalogBuilder`], or from a
//! [`CatalogManifest`] JSON file) and passed by reference afterwards.

mod catalog;
mod manifest;
mod templates;

pub use catalog::{CatalogBuilder, CatalogError, TemplateCatalog};
pub use manifest::{ActionTileDataDef, CatalogManifest, TileDataDef, TilesetDef};
pub use templates::{
    ActionTileData, Animation, AnimationFrame, CollisionModel, EventDefinition, ResourceKind,
    ScriptParameter, Sprite, TileData, Tileset, Zone,
};
