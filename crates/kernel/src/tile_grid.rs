use std::sync::Arc;

use glam::IVec2;
use tileworld_assets::TileData;
use tileworld_common::{ActionTileId, Rect2I, TileId};

use crate::error::ModelError;
use crate::grid::TileLayers;
use crate::instance::{ActionTileDataInstance, TileDataInstance};

/// A detached block of tiles used for clipboard and staging.
///
/// Follows the same anchor/footprint rule as a room but with its own origin
/// at (0, 0). Grid layer `i` corresponds to level layer `start_layer + i`.
/// Event tile positions are pixels relative to the grid origin.
#[derive(Debug, Clone)]
pub struct TileGrid {
    start_layer: usize,
    tiles: TileLayers,
    event_tiles: Vec<ActionTileDataInstance>,
}

impl TileGrid {
    pub fn new(size: IVec2, start_layer: usize, layer_count: usize) -> Self {
        Self {
            start_layer,
            tiles: TileLayers::new(size, layer_count),
            event_tiles: Vec::new(),
        }
    }

    /// Grid of a shape from untrusted input.
    pub fn try_new(size: IVec2, start_layer: usize, layer_count: usize) -> Result<Self, ModelError> {
        Ok(Self {
            start_layer,
            tiles: TileLayers::try_new(size, layer_count)?,
            event_tiles: Vec::new(),
        })
    }

    pub fn size(&self) -> IVec2 {
        self.tiles.size()
    }

    pub fn start_layer(&self) -> usize {
        self.start_layer
    }

    pub fn layer_count(&self) -> usize {
        self.tiles.layer_count()
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
        self.event_tiles.clear();
    }

    pub fn place_tile(
        &mut self,
        tile: TileDataInstance,
        location: IVec2,
        layer: usize,
    ) -> Result<TileId, ModelError> {
        self.tiles.place_tile(tile, location, layer)
    }

    /// Place a tile whose footprint is limited to `clip` (grid coordinates),
    /// such as a tile copied from a room that clipped it at its edge.
    pub fn place_tile_clipped(
        &mut self,
        tile: TileDataInstance,
        location: IVec2,
        layer: usize,
        clip: Option<Rect2I>,
    ) -> Result<TileId, ModelError> {
        self.tiles.place_tile_clipped(tile, location, layer, clip)
    }

    pub fn create_tile(
        &mut self,
        template: Arc<TileData>,
        location: IVec2,
        layer: usize,
    ) -> Result<TileId, ModelError> {
        self.place_tile(TileDataInstance::new(template), location, layer)
    }

    pub fn remove_tile(&mut self, id: TileId) -> Option<TileDataInstance> {
        self.tiles.remove_tile(id)
    }

    pub fn remove_tile_at(&mut self, location: IVec2, layer: usize) -> Option<TileDataInstance> {
        self.tiles.remove_tile_at(location, layer)
    }

    /// Raw slot read.
    pub fn get_tile(&self, location: IVec2, layer: usize) -> Option<&TileDataInstance> {
        self.tiles.get_tile(location, layer)
    }

    /// Each tile exactly once.
    pub fn placed_tiles(&self) -> impl Iterator<Item = &TileDataInstance> {
        self.tiles.placed_tiles()
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.tile_count()
    }

    pub fn event_tiles(&self) -> &[ActionTileDataInstance] {
        &self.event_tiles
    }

    pub fn add_event_tile(&mut self, tile: ActionTileDataInstance) -> ActionTileId {
        let id = tile.id();
        self.event_tiles.push(tile);
        id
    }

    pub fn remove_event_tile(&mut self, id: ActionTileId) -> Option<ActionTileDataInstance> {
        let index = self.event_tiles.iter().position(|t| t.id() == id)?;
        Some(self.event_tiles.remove(index))
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty() && self.event_tiles.is_empty()
    }

    /// Deep copy with fresh instance ids; templates stay shared.
    pub fn duplicate(&self) -> Self {
        let mut copy = Self::new(self.size(), self.start_layer, self.layer_count());
        for tile in self.placed_tiles() {
            let placed =
                copy.place_tile_clipped(tile.duplicate(), tile.location(), tile.layer(), tile.clip());
            debug_assert!(placed.is_ok(), "tile of the source grid does not fit its copy");
        }
        copy.event_tiles = self.event_tiles.iter().map(|t| t.duplicate()).collect();
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tileworld_assets::ActionTileData;

    fn grid_with_content() -> TileGrid {
        let mut grid = TileGrid::new(IVec2::new(4, 4), 1, 2);
        let statue = Arc::new(TileData::new("statue").with_size(IVec2::new(2, 2)));
        grid.create_tile(statue, IVec2::new(1, 1), 0).unwrap();
        grid.create_tile(Arc::new(TileData::new("bush")), IVec2::ZERO, 1)
            .unwrap();
        grid.add_event_tile(ActionTileDataInstance::new(
            Arc::new(ActionTileData::new("npc")),
            IVec2::new(8, 24),
        ));
        grid
    }

    #[test]
    fn grid_uses_room_footprint_rule() {
        let grid = grid_with_content();
        let anchor = grid.get_tile(IVec2::new(1, 1), 0).unwrap();
        assert_eq!(grid.get_tile(IVec2::new(2, 2), 0).unwrap().id(), anchor.id());
        assert_eq!(grid.placed_tiles().count(), 2);
        assert_eq!(grid.start_layer(), 1);
    }

    #[test]
    fn duplicate_is_independent() {
        let grid = grid_with_content();
        let mut copy = grid.duplicate();

        let ids: Vec<TileId> = grid.placed_tiles().map(TileDataInstance::id).collect();
        for tile in copy.placed_tiles() {
            assert!(!ids.contains(&tile.id()));
            let source = grid.get_tile(tile.location(), tile.layer()).unwrap();
            assert!(Arc::ptr_eq(source.template(), tile.template()));
        }
        assert_ne!(copy.event_tiles()[0].id(), grid.event_tiles()[0].id());
        assert_eq!(copy.event_tiles()[0].position, IVec2::new(8, 24));

        copy.get_tile(IVec2::new(2, 1), 0)
            .map(TileDataInstance::id)
            .and_then(|id| copy.remove_tile(id))
            .unwrap();
        assert!(copy.get_tile(IVec2::new(1, 2), 0).is_none());
        assert!(grid.get_tile(IVec2::new(1, 2), 0).is_some());
    }

    #[test]
    fn duplicate_keeps_clipped_footprints() {
        let mut grid = TileGrid::new(IVec2::new(8, 4), 0, 1);
        let statue = Arc::new(TileData::new("statue").with_size(IVec2::new(2, 2)));
        let clip = Rect2I::new(IVec2::ZERO, IVec2::new(4, 4));
        grid.place_tile_clipped(TileDataInstance::new(statue), IVec2::new(3, 0), 0, Some(clip))
            .unwrap();
        grid.create_tile(Arc::new(TileData::new("grass")), IVec2::new(4, 0), 0)
            .unwrap();

        let copy = grid.duplicate();
        assert_eq!(copy.tile_count(), 2);
        assert_eq!(copy.get_tile(IVec2::new(3, 0), 0).unwrap().clip(), Some(clip));
        assert_eq!(copy.get_tile(IVec2::new(4, 0), 0).unwrap().template().name, "grass");
    }

    #[test]
    fn untrusted_shape_is_checked() {
        assert!(matches!(
            TileGrid::try_new(IVec2::new(2, 2), 0, usize::MAX / 2),
            Err(ModelError::InvalidShape { .. })
        ));
        assert!(TileGrid::try_new(IVec2::new(2, 2), 3, 2).is_ok());
    }

    #[test]
    fn clear_empties_tiles_and_event_tiles() {
        let mut grid = grid_with_content();
        let id = grid.event_tiles()[0].id();
        assert!(grid.remove_event_tile(id).is_some());
        assert!(grid.remove_event_tile(id).is_none());
        grid.clear();
        assert!(grid.is_empty());
        assert_eq!(grid.size(), IVec2::new(4, 4));
    }
}
