use std::collections::BTreeMap;

use glam::IVec2;
use tileworld_common::{Rect2I, TileId};

use crate::error::ModelError;
use crate::instance::TileDataInstance;

/// Layered cell grid with multi-cell tile occupancy.
///
/// Every cell covered by a tile's footprint holds that tile's id; the
/// instance itself is stored once. The cell equal to `tile.location()` is the
/// anchor. Use [`TileLayers::placed_tiles`] to visit each tile exactly once.
#[derive(Debug, Clone)]
pub struct TileLayers {
    size: IVec2,
    layer_count: usize,
    cells: Vec<Option<TileId>>,
    tiles: BTreeMap<TileId, TileDataInstance>,
}

impl TileLayers {
    /// Grid of an already validated shape. Negative sizes are treated as
    /// zero; a shape whose cell count does not fit yields an empty grid.
    pub fn new(size: IVec2, layer_count: usize) -> Self {
        let size = size.max(IVec2::ZERO);
        Self::try_new(size, layer_count).unwrap_or_else(|err| {
            tracing::warn!(%err, "tile layer shape rejected");
            Self {
                size: IVec2::ZERO,
                layer_count: 0,
                cells: Vec::new(),
                tiles: BTreeMap::new(),
            }
        })
    }

    /// Grid of a shape from untrusted input.
    pub fn try_new(size: IVec2, layer_count: usize) -> Result<Self, ModelError> {
        let count = Self::cell_count(size, layer_count)
            .ok_or(ModelError::InvalidShape { size, layer_count })?;
        Ok(Self {
            size,
            layer_count,
            cells: vec![None; count],
            tiles: BTreeMap::new(),
        })
    }

    /// Total cells of a shape, or `None` when the size is negative or the
    /// count overflows the grid's index arithmetic.
    pub fn cell_count(size: IVec2, layer_count: usize) -> Option<usize> {
        if size.cmplt(IVec2::ZERO).any() {
            return None;
        }
        let per_layer = usize::try_from(size.x.checked_mul(size.y)?).ok()?;
        per_layer.checked_mul(layer_count)
    }

    pub fn size(&self) -> IVec2 {
        self.size
    }

    pub fn layer_count(&self) -> usize {
        self.layer_count
    }

    pub fn bounds(&self) -> Rect2I {
        Rect2I::new(IVec2::ZERO, self.size)
    }

    fn index(&self, location: IVec2, layer: usize) -> Option<usize> {
        if layer >= self.layer_count || !self.bounds().contains(location) {
            return None;
        }
        let per_layer = (self.size.x * self.size.y) as usize;
        Some(layer * per_layer + (location.y * self.size.x + location.x) as usize)
    }

    fn check(&self, location: IVec2, layer: usize) -> Result<(), ModelError> {
        if layer >= self.layer_count {
            return Err(ModelError::LayerOutOfRange {
                layer,
                layer_count: self.layer_count,
            });
        }
        if !self.bounds().contains(location) {
            return Err(ModelError::OutOfBounds {
                location,
                size: self.size,
            });
        }
        Ok(())
    }

    /// Footprint of a tile clipped to the grid and to the tile's own clip.
    fn footprint(&self, tile: &TileDataInstance) -> Rect2I {
        let footprint = tile.bounds().intersect(&self.bounds());
        match tile.clip {
            Some(clip) => footprint.intersect(&clip),
            None => footprint,
        }
    }

    /// Raw slot read: any covered cell returns the tile, not only its anchor.
    pub fn get_tile(&self, location: IVec2, layer: usize) -> Option<&TileDataInstance> {
        let id = (*self.cells.get(self.index(location, layer)?)?)?;
        self.tiles.get(&id)
    }

    pub fn tile(&self, id: TileId) -> Option<&TileDataInstance> {
        self.tiles.get(&id)
    }

    pub fn tile_mut(&mut self, id: TileId) -> Option<&mut TileDataInstance> {
        self.tiles.get_mut(&id)
    }

    /// Place `tile` with its anchor at `location`.
    ///
    /// Any other tile overlapping the footprint is removed entirely first.
    /// Placing a tile that is already in the grid moves it.
    pub fn place_tile(
        &mut self,
        tile: TileDataInstance,
        location: IVec2,
        layer: usize,
    ) -> Result<TileId, ModelError> {
        self.place_tile_clipped(tile, location, layer, None)
    }

    /// Like [`TileLayers::place_tile`], with the footprint further limited
    /// to `clip`, which must contain the anchor.
    pub fn place_tile_clipped(
        &mut self,
        mut tile: TileDataInstance,
        location: IVec2,
        layer: usize,
        clip: Option<Rect2I>,
    ) -> Result<TileId, ModelError> {
        self.check(location, layer)?;
        if let Some(clip) = clip {
            if !clip.contains(location) {
                return Err(ModelError::OutOfBounds {
                    location,
                    size: clip.size,
                });
            }
        }
        let id = tile.id();
        self.remove_tile(id);

        tile.location = location;
        tile.layer = layer;
        tile.clip = clip;
        let footprint = self.footprint(&tile);

        let mut displaced: Vec<TileId> = Vec::new();
        for cell in footprint.cells() {
            if let Some(Some(other)) = self.index(cell, layer).map(|i| self.cells[i]) {
                if !displaced.contains(&other) {
                    displaced.push(other);
                }
            }
        }
        for other in displaced {
            tracing::trace!(?other, "tile displaced by placement");
            self.remove_tile(other);
        }

        for cell in footprint.cells() {
            if let Some(i) = self.index(cell, layer) {
                self.cells[i] = Some(id);
            }
        }
        self.tiles.insert(id, tile);
        Ok(id)
    }

    /// Remove a tile and clear every cell of its footprint.
    pub fn remove_tile(&mut self, id: TileId) -> Option<TileDataInstance> {
        let tile = self.tiles.remove(&id)?;
        for cell in self.footprint(&tile).cells() {
            if let Some(i) = self.index(cell, tile.layer) {
                if self.cells[i] == Some(id) {
                    self.cells[i] = None;
                }
            }
        }
        Some(tile)
    }

    /// Remove whichever tile covers the cell, anchor or not.
    pub fn remove_tile_at(&mut self, location: IVec2, layer: usize) -> Option<TileDataInstance> {
        let id = self.get_tile(location, layer)?.id();
        self.remove_tile(id)
    }

    /// Each placed tile once, in (layer, y, x) order of its anchor.
    pub fn placed_tiles(&self) -> impl Iterator<Item = &TileDataInstance> {
        self.cells.iter().enumerate().filter_map(move |(i, slot)| {
            let tile = self.tiles.get(slot.as_ref()?)?;
            (self.index(tile.location, tile.layer) == Some(i)).then_some(tile)
        })
    }

    pub fn placed_tiles_mut(&mut self) -> impl Iterator<Item = &mut TileDataInstance> {
        self.tiles.values_mut()
    }

    /// Anchored tiles of one layer.
    pub fn layer_tiles(&self, layer: usize) -> impl Iterator<Item = &TileDataInstance> {
        self.placed_tiles().filter(move |t| t.layer == layer)
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
        self.cells.fill(None);
    }

    pub fn clear_layer(&mut self, layer: usize) {
        let ids: Vec<TileId> = self.layer_tiles(layer).map(TileDataInstance::id).collect();
        for id in ids {
            self.remove_tile(id);
        }
    }

    /// Change the number of layers; tiles on dropped layers are discarded.
    pub fn set_layer_count(&mut self, layer_count: usize) {
        if layer_count == self.layer_count {
            return;
        }
        let per_layer = (self.size.x * self.size.y) as usize;
        let dropped: Vec<TileId> = self
            .tiles
            .values()
            .filter(|t| t.layer >= layer_count)
            .map(TileDataInstance::id)
            .collect();
        for id in dropped {
            self.remove_tile(id);
        }
        self.cells.resize(per_layer * layer_count, None);
        self.layer_count = layer_count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tileworld_assets::TileData;

    fn tile(size: IVec2) -> TileDataInstance {
        TileDataInstance::new(Arc::new(TileData::new("t").with_size(size)))
    }

    #[test]
    fn anchor_invariant_holds_after_placement() {
        let mut g = TileLayers::new(IVec2::new(10, 8), 2);
        let id = g.place_tile(tile(IVec2::new(3, 2)), IVec2::new(4, 5), 1).unwrap();
        for cell in Rect2I::new(IVec2::new(4, 5), IVec2::new(3, 2)).cells() {
            let t = g.get_tile(cell, 1).unwrap();
            assert_eq!(t.id(), id);
            assert_eq!(t.is_anchor(cell), cell == IVec2::new(4, 5));
        }
        assert!(g.get_tile(IVec2::new(4, 5), 0).is_none());
        assert_eq!(g.placed_tiles().count(), 1);
    }

    #[test]
    fn overlapping_placement_removes_whole_loser() {
        let mut g = TileLayers::new(IVec2::new(10, 8), 1);
        let big = g.place_tile(tile(IVec2::new(2, 2)), IVec2::new(0, 0), 0).unwrap();
        let small = g.place_tile(tile(IVec2::ONE), IVec2::new(1, 1), 0).unwrap();
        assert!(g.tile(big).is_none());
        assert!(g.get_tile(IVec2::new(0, 0), 0).is_none());
        assert!(g.get_tile(IVec2::new(1, 0), 0).is_none());
        assert_eq!(g.get_tile(IVec2::new(1, 1), 0).unwrap().id(), small);
        assert_eq!(g.tile_count(), 1);
    }

    #[test]
    fn footprint_is_clipped_to_grid() {
        let mut g = TileLayers::new(IVec2::new(4, 4), 1);
        let id = g.place_tile(tile(IVec2::new(3, 3)), IVec2::new(3, 3), 0).unwrap();
        assert_eq!(g.get_tile(IVec2::new(3, 3), 0).unwrap().id(), id);
        assert!(g.remove_tile(id).is_some());
        assert!(g.cells.iter().all(Option::is_none));
    }

    #[test]
    fn placement_outside_grid_fails() {
        let mut g = TileLayers::new(IVec2::new(4, 4), 1);
        assert!(matches!(
            g.place_tile(tile(IVec2::ONE), IVec2::new(4, 0), 0),
            Err(ModelError::OutOfBounds { .. })
        ));
        assert!(matches!(
            g.place_tile(tile(IVec2::ONE), IVec2::ZERO, 1),
            Err(ModelError::LayerOutOfRange { layer: 1, layer_count: 1 })
        ));
    }

    #[test]
    fn replacing_moves_existing_tile() {
        let mut g = TileLayers::new(IVec2::new(6, 6), 1);
        let t = tile(IVec2::new(2, 1));
        let id = g.place_tile(t.clone(), IVec2::ZERO, 0).unwrap();
        g.place_tile(t, IVec2::new(3, 3), 0).unwrap();
        assert!(g.get_tile(IVec2::ZERO, 0).is_none());
        assert_eq!(g.get_tile(IVec2::new(4, 3), 0).unwrap().id(), id);
        assert_eq!(g.tile_count(), 1);
    }

    #[test]
    fn clipped_footprint_leaves_neighbours_alone() {
        let mut g = TileLayers::new(IVec2::new(8, 4), 1);
        let clip = Rect2I::new(IVec2::ZERO, IVec2::new(4, 4));
        let big = g
            .place_tile_clipped(tile(IVec2::new(2, 2)), IVec2::new(3, 0), 0, Some(clip))
            .unwrap();
        let small = g.place_tile(tile(IVec2::ONE), IVec2::new(4, 0), 0).unwrap();
        assert_eq!(g.tile_count(), 2);
        assert_eq!(g.get_tile(IVec2::new(3, 1), 0).unwrap().id(), big);
        assert_eq!(g.get_tile(IVec2::new(4, 0), 0).unwrap().id(), small);
        assert!(g.get_tile(IVec2::new(4, 1), 0).is_none());

        assert!(matches!(
            g.place_tile_clipped(tile(IVec2::ONE), IVec2::new(5, 0), 0, Some(clip)),
            Err(ModelError::OutOfBounds { .. })
        ));
        g.remove_tile(big);
        assert_eq!(g.get_tile(IVec2::new(4, 0), 0).unwrap().id(), small);
    }

    #[test]
    fn oversized_shape_is_rejected() {
        assert!(matches!(
            TileLayers::try_new(IVec2::new(2, 2), usize::MAX / 2),
            Err(ModelError::InvalidShape { .. })
        ));
        assert!(TileLayers::try_new(IVec2::new(i32::MAX, 2), 1).is_err());
        assert!(TileLayers::try_new(IVec2::new(-1, 2), 1).is_err());
        assert_eq!(TileLayers::cell_count(IVec2::new(3, 2), 2), Some(12));

        let g = TileLayers::new(IVec2::new(2, 2), usize::MAX / 2);
        assert_eq!(g.layer_count(), 0);
        assert!(g.is_empty());
    }

    #[test]
    fn shrinking_layers_drops_tiles() {
        let mut g = TileLayers::new(IVec2::new(2, 2), 3);
        g.place_tile(tile(IVec2::ONE), IVec2::ZERO, 0).unwrap();
        g.place_tile(tile(IVec2::ONE), IVec2::ZERO, 2).unwrap();
        g.set_layer_count(2);
        assert_eq!(g.tile_count(), 1);
        assert_eq!(g.cells.len(), 8);
        g.set_layer_count(4);
        assert_eq!(g.cells.len(), 16);
        assert!(g.get_tile(IVec2::ZERO, 3).is_none());
    }
}
