use std::sync::Arc;

use glam::IVec2;
use tileworld_assets::{ActionTileData, TileData, Zone};
use tileworld_common::{ActionTileId, RoomId, TileId};
use tileworld_properties::Properties;

use crate::error::ModelError;
use crate::grid::TileLayers;
use crate::instance::{ActionTileDataInstance, TileDataInstance};
use crate::script::Triggers;

/// Events every room can raise.
pub const ROOM_EVENTS: &[&str] = &["room_start", "all_monsters_dead"];

/// One screen of a level: a layered tile grid plus free-positioned action tiles.
#[derive(Debug, Clone)]
pub struct Room {
    id: RoomId,
    location: IVec2,
    tiles: TileLayers,
    action_tiles: Vec<ActionTileDataInstance>,
    /// Overrides the level's zone when set.
    zone: Option<Arc<Zone>>,
    pub properties: Properties,
    pub triggers: Triggers,
}

impl Room {
    pub fn new(location: IVec2, size: IVec2, layer_count: usize) -> Self {
        Self {
            id: RoomId::new(),
            location,
            tiles: TileLayers::new(size, layer_count),
            action_tiles: Vec::new(),
            zone: None,
            properties: Properties::new(),
            triggers: Triggers::new(),
        }
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    /// Location in the owning level's room grid.
    pub fn location(&self) -> IVec2 {
        self.location
    }

    pub(crate) fn set_location(&mut self, location: IVec2) {
        self.location = location;
        for tile in self.tiles.placed_tiles_mut() {
            tile.room = Some(location);
        }
    }

    /// Size in tiles.
    pub fn size(&self) -> IVec2 {
        self.tiles.size()
    }

    pub fn layer_count(&self) -> usize {
        self.tiles.layer_count()
    }

    pub fn zone(&self) -> Option<&Arc<Zone>> {
        self.zone.as_ref()
    }

    pub fn set_zone(&mut self, zone: Option<Arc<Zone>>) {
        self.zone = zone;
    }

    /// Raw slot read; also returns multi-cell tiles at non-anchor cells.
    pub fn get_tile(&self, location: IVec2, layer: usize) -> Option<&TileDataInstance> {
        self.tiles.get_tile(location, layer)
    }

    pub fn tile(&self, id: TileId) -> Option<&TileDataInstance> {
        self.tiles.tile(id)
    }

    pub fn tile_mut(&mut self, id: TileId) -> Option<&mut TileDataInstance> {
        self.tiles.tile_mut(id)
    }

    pub fn place_tile(
        &mut self,
        mut tile: TileDataInstance,
        location: IVec2,
        layer: usize,
    ) -> Result<TileId, ModelError> {
        tile.room = Some(self.location);
        self.tiles.place_tile(tile, location, layer)
    }

    /// Stamp a new instance of `template` at `location`.
    pub fn create_tile(
        &mut self,
        template: Arc<TileData>,
        location: IVec2,
        layer: usize,
    ) -> Result<TileId, ModelError> {
        self.place_tile(TileDataInstance::new(template), location, layer)
    }

    pub fn remove_tile(&mut self, id: TileId) -> Option<TileDataInstance> {
        let mut tile = self.tiles.remove_tile(id)?;
        tile.room = None;
        Some(tile)
    }

    pub fn remove_tile_at(&mut self, location: IVec2, layer: usize) -> Option<TileDataInstance> {
        let id = self.get_tile(location, layer)?.id();
        self.remove_tile(id)
    }

    /// Each placed tile exactly once.
    pub fn placed_tiles(&self) -> impl Iterator<Item = &TileDataInstance> {
        self.tiles.placed_tiles()
    }

    pub fn layer_tiles(&self, layer: usize) -> impl Iterator<Item = &TileDataInstance> {
        self.tiles.layer_tiles(layer)
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.tile_count()
    }

    pub fn clear_layer(&mut self, layer: usize) {
        self.tiles.clear_layer(layer);
    }

    /// Only [`Level`](crate::Level) may change the layer count, so every
    /// room of a level keeps the same one.
    pub(crate) fn set_layer_count(&mut self, layer_count: usize) {
        self.tiles.set_layer_count(layer_count);
    }

    pub fn action_tiles(&self) -> &[ActionTileDataInstance] {
        &self.action_tiles
    }

    pub fn action_tile(&self, id: ActionTileId) -> Option<&ActionTileDataInstance> {
        self.action_tiles.iter().find(|t| t.id() == id)
    }

    pub fn action_tile_mut(&mut self, id: ActionTileId) -> Option<&mut ActionTileDataInstance> {
        self.action_tiles.iter_mut().find(|t| t.id() == id)
    }

    pub fn add_action_tile(&mut self, tile: ActionTileDataInstance) -> ActionTileId {
        let id = tile.id();
        self.action_tiles.push(tile);
        id
    }

    /// Stamp a new action tile at a room-local pixel position.
    pub fn create_action_tile(
        &mut self,
        template: Arc<ActionTileData>,
        position: IVec2,
    ) -> ActionTileId {
        self.add_action_tile(ActionTileDataInstance::new(template, position))
    }

    pub fn remove_action_tile(&mut self, id: ActionTileId) -> Option<ActionTileDataInstance> {
        let index = self.action_tiles.iter().position(|t| t.id() == id)?;
        Some(self.action_tiles.remove(index))
    }

    pub fn action_tile_count(&self) -> usize {
        self.action_tiles.len()
    }

    /// Remove every tile and action tile; properties and triggers stay.
    pub fn clear(&mut self) {
        self.tiles.clear();
        self.action_tiles.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty() && self.action_tiles.is_empty()
    }

    pub fn defined_events(&self) -> Vec<&str> {
        ROOM_EVENTS.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tileworld_common::Rect2I;

    fn statue() -> Arc<TileData> {
        Arc::new(TileData::new("statue").with_size(IVec2::new(2, 2)))
    }

    #[test]
    fn two_by_two_tile_fills_four_cells_and_clears_them() {
        let mut room = Room::new(IVec2::ZERO, IVec2::new(10, 8), 2);
        let id = room.create_tile(statue(), IVec2::new(3, 3), 0).unwrap();
        let cells = [
            IVec2::new(3, 3),
            IVec2::new(4, 3),
            IVec2::new(3, 4),
            IVec2::new(4, 4),
        ];
        for cell in cells {
            assert_eq!(room.get_tile(cell, 0).unwrap().id(), id);
        }
        let anchors: Vec<IVec2> = Rect2I::new(IVec2::ZERO, room.size())
            .cells()
            .filter(|c| room.get_tile(*c, 0).is_some_and(|t| t.location() == *c))
            .collect();
        assert_eq!(anchors, vec![IVec2::new(3, 3)]);

        let removed = room.remove_tile(id).unwrap();
        assert!(removed.room().is_none());
        for cell in cells {
            assert!(room.get_tile(cell, 0).is_none());
        }
    }

    #[test]
    fn remove_at_non_anchor_cell_removes_tile() {
        let mut room = Room::new(IVec2::ZERO, IVec2::new(10, 8), 1);
        room.create_tile(statue(), IVec2::new(1, 1), 0).unwrap();
        assert!(room.remove_tile_at(IVec2::new(2, 2), 0).is_some());
        assert_eq!(room.tile_count(), 0);
    }

    #[test]
    fn placed_tiles_records_owning_room() {
        let mut room = Room::new(IVec2::new(1, 0), IVec2::new(4, 4), 1);
        room.create_tile(statue(), IVec2::ZERO, 0).unwrap();
        assert_eq!(room.placed_tiles().next().unwrap().room(), Some(IVec2::new(1, 0)));
        room.set_location(IVec2::new(2, 2));
        assert_eq!(room.placed_tiles().next().unwrap().room(), Some(IVec2::new(2, 2)));
    }

    #[test]
    fn action_tiles_are_a_flat_list() {
        let mut room = Room::new(IVec2::ZERO, IVec2::new(10, 8), 1);
        let warp = Arc::new(ActionTileData::new("warp"));
        let a = room.create_action_tile(warp.clone(), IVec2::new(8, 8));
        let b = room.create_action_tile(warp, IVec2::new(8, 8));
        assert_ne!(a, b);
        assert_eq!(room.action_tile_count(), 2);
        assert!(room.remove_action_tile(a).is_some());
        assert_eq!(room.action_tiles()[0].id(), b);
    }
}
