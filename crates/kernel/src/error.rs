use glam::IVec2;
use tileworld_common::TileId;

/// Errors from world graph mutations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("location {location} is outside a grid of size {size}")]
    OutOfBounds { location: IVec2, size: IVec2 },
    #[error("layer {layer} is out of range (layer count {layer_count})")]
    LayerOutOfRange { layer: usize, layer_count: usize },
    #[error("room {0} is outside the level")]
    RoomOutOfBounds(IVec2),
    #[error("invalid dimensions {0}")]
    InvalidDimensions(IVec2),
    #[error("grid of {size} cells on {layer_count} layers is too large")]
    InvalidShape { size: IVec2, layer_count: usize },
    #[error("layer count {layer_count} outside 1..={max}")]
    InvalidLayerCount { layer_count: usize, max: usize },
    #[error("level index {index} out of range ({count} levels)")]
    LevelOutOfRange { index: usize, count: usize },
    #[error("duplicate area id '{0}'")]
    DuplicateArea(String),
    #[error("tile {0:?} not found")]
    TileNotFound(TileId),
}
