use std::sync::Arc;

use glam::IVec2;
use tileworld_assets::{ActionTileData, TileData, Zone};
use tileworld_common::{ActionTileId, LevelSpace, Rect2I, TileId};
use tileworld_properties::Properties;

use crate::error::ModelError;
use crate::grid::TileLayers;
use crate::instance::TileDataInstance;
use crate::room::Room;
use crate::script::Triggers;

/// Events every level can raise.
pub const LEVEL_EVENTS: &[&str] = &["level_start"];

/// Most layers a level may carry; world files reject anything above it.
pub const MAX_LAYER_COUNT: usize = 16;

const AREA_PROPERTY: &str = "area";
const DUNGEON_FLOOR_PROPERTY: &str = "dungeon_floor";

/// A rectangular grid of equally sized rooms.
///
/// # Invariants
/// - `rooms.len() == dimensions.x * dimensions.y`, stored row-major.
/// - The room at index `y * dimensions.x + x` has location `(x, y)`.
/// - Every room has size `room_size` and `layer_count` layers.
/// - `layer_count` is within `1..=MAX_LAYER_COUNT`.
#[derive(Debug, Clone)]
pub struct Level {
    id: String,
    dimensions: IVec2,
    room_size: IVec2,
    layer_count: usize,
    rooms: Vec<Room>,
    zone: Option<Arc<Zone>>,
    pub properties: Properties,
    pub triggers: Triggers,
}

impl Level {
    pub fn new(
        id: impl Into<String>,
        dimensions: IVec2,
        room_size: IVec2,
        layer_count: usize,
    ) -> Result<Self, ModelError> {
        if dimensions.cmple(IVec2::ZERO).any() {
            return Err(ModelError::InvalidDimensions(dimensions));
        }
        if room_size.cmple(IVec2::ZERO).any() {
            return Err(ModelError::InvalidDimensions(room_size));
        }
        check_layer_count(layer_count)?;
        if dimensions.x.checked_mul(dimensions.y).is_none() {
            return Err(ModelError::InvalidDimensions(dimensions));
        }
        if TileLayers::cell_count(room_size, layer_count).is_none() {
            return Err(ModelError::InvalidShape {
                size: room_size,
                layer_count,
            });
        }
        let rooms = Rect2I::new(IVec2::ZERO, dimensions)
            .cells()
            .map(|location| Room::new(location, room_size, layer_count))
            .collect();
        Ok(Self {
            id: id.into(),
            dimensions,
            room_size,
            layer_count,
            rooms,
            zone: None,
            properties: Properties::new(),
            triggers: Triggers::new(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Size in rooms.
    pub fn dimensions(&self) -> IVec2 {
        self.dimensions
    }

    /// Size of every room in tiles.
    pub fn room_size(&self) -> IVec2 {
        self.room_size
    }

    pub fn layer_count(&self) -> usize {
        self.layer_count
    }

    /// Coordinate algebra for this level's shape.
    pub fn space(&self) -> LevelSpace {
        LevelSpace::new(self.dimensions, self.room_size)
    }

    pub fn zone(&self) -> Option<&Arc<Zone>> {
        self.zone.as_ref()
    }

    pub fn set_zone(&mut self, zone: Option<Arc<Zone>>) {
        self.zone = zone;
    }

    /// Zone in effect for a room: its own, else the level default.
    pub fn room_zone(&self, location: IVec2) -> Option<&Arc<Zone>> {
        self.room_at(location)
            .and_then(Room::zone)
            .or(self.zone.as_ref())
    }

    pub fn area_id(&self) -> Option<String> {
        match self.properties.get_string(AREA_PROPERTY, "") {
            id if id.is_empty() => None,
            id => Some(id),
        }
    }

    pub fn set_area_id(&mut self, area: Option<&str>) {
        match area {
            Some(id) => self.properties.set(AREA_PROPERTY, id),
            None => {
                self.properties.remove(AREA_PROPERTY);
            }
        }
    }

    pub fn dungeon_floor(&self) -> Option<i32> {
        self.properties
            .get_value(DUNGEON_FLOOR_PROPERTY)
            .and_then(|v| v.as_int())
    }

    pub fn set_dungeon_floor(&mut self, floor: Option<i32>) {
        match floor {
            Some(floor) => self.properties.set(DUNGEON_FLOOR_PROPERTY, floor),
            None => {
                self.properties.remove(DUNGEON_FLOOR_PROPERTY);
            }
        }
    }

    fn room_index(&self, location: IVec2) -> Option<usize> {
        self.space()
            .contains_room(location)
            .then(|| (location.y * self.dimensions.x + location.x) as usize)
    }

    pub fn contains_room(&self, location: IVec2) -> bool {
        self.room_index(location).is_some()
    }

    pub fn room_at(&self, location: IVec2) -> Option<&Room> {
        self.rooms.get(self.room_index(location)?)
    }

    pub fn room_at_mut(&mut self, location: IVec2) -> Option<&mut Room> {
        let index = self.room_index(location)?;
        self.rooms.get_mut(index)
    }

    /// Rooms in row-major order.
    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.iter()
    }

    pub fn rooms_mut(&mut self) -> impl Iterator<Item = &mut Room> {
        self.rooms.iter_mut()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn tile_count(&self) -> usize {
        self.rooms.iter().map(Room::tile_count).sum()
    }

    pub fn action_tile_count(&self) -> usize {
        self.rooms.iter().map(Room::action_tile_count).sum()
    }

    /// Every placed tile once, with the level coordinate of its anchor.
    pub fn placed_tiles(&self) -> impl Iterator<Item = (IVec2, &TileDataInstance)> {
        let size = self.room_size;
        self.rooms.iter().flat_map(move |room| {
            let origin = room.location() * size;
            room.placed_tiles().map(move |t| (origin + t.location(), t))
        })
    }

    /// Raw slot read at a level coordinate.
    pub fn get_tile_at(&self, coord: IVec2, layer: usize) -> Option<&TileDataInstance> {
        let rc = self.space().level_to_room_coord(coord, false);
        self.room_at(rc.location)?.get_tile(rc.local, layer)
    }

    /// Place a tile by level coordinate. The footprint is clipped to the
    /// anchor's room.
    pub fn place_tile_at(
        &mut self,
        tile: TileDataInstance,
        coord: IVec2,
        layer: usize,
    ) -> Result<TileId, ModelError> {
        let rc = self.space().level_to_room_coord(coord, false);
        self.room_at_mut(rc.location)
            .ok_or(ModelError::RoomOutOfBounds(rc.location))?
            .place_tile(tile, rc.local, layer)
    }

    pub fn create_tile_at(
        &mut self,
        template: Arc<TileData>,
        coord: IVec2,
        layer: usize,
    ) -> Result<TileId, ModelError> {
        self.place_tile_at(TileDataInstance::new(template), coord, layer)
    }

    pub fn remove_tile_at(&mut self, coord: IVec2, layer: usize) -> Option<TileDataInstance> {
        let rc = self.space().level_to_room_coord(coord, false);
        self.room_at_mut(rc.location)?.remove_tile_at(rc.local, layer)
    }

    /// Stamp an action tile at a level pixel position into the room containing it.
    pub fn create_action_tile_at(
        &mut self,
        template: Arc<ActionTileData>,
        pixel: IVec2,
    ) -> Result<ActionTileId, ModelError> {
        let space = self.space();
        let location = space.level_pixel_to_room_location(pixel, false);
        let local = space.level_pixel_to_room_pixel(pixel);
        Ok(self
            .room_at_mut(location)
            .ok_or(ModelError::RoomOutOfBounds(location))?
            .create_action_tile(template, local))
    }

    /// Change the level size in rooms.
    ///
    /// Rooms inside both the old and new bounds keep their identity; new
    /// locations receive empty rooms; rooms outside the new bounds are dropped.
    pub fn resize(&mut self, dimensions: IVec2) -> Result<(), ModelError> {
        if dimensions.cmple(IVec2::ZERO).any() {
            return Err(ModelError::InvalidDimensions(dimensions));
        }
        self.rebuild_rooms(dimensions, IVec2::ZERO);
        Ok(())
    }

    /// Move every room by `offset` room locations, keeping the dimensions.
    ///
    /// Rooms pushed outside are dropped; vacated locations get empty rooms.
    pub fn shift(&mut self, offset: IVec2) {
        self.rebuild_rooms(self.dimensions, offset);
    }

    fn rebuild_rooms(&mut self, dimensions: IVec2, offset: IVec2) {
        let old_dimensions = self.dimensions;
        let mut old: Vec<Option<Room>> = std::mem::take(&mut self.rooms)
            .into_iter()
            .map(Some)
            .collect();
        let old_bounds = Rect2I::new(IVec2::ZERO, old_dimensions);

        self.rooms = Rect2I::new(IVec2::ZERO, dimensions)
            .cells()
            .map(|location| {
                let source = location - offset;
                let kept = old_bounds
                    .contains(source)
                    .then(|| old[(source.y * old_dimensions.x + source.x) as usize].take())
                    .flatten();
                match kept {
                    Some(mut room) => {
                        room.set_location(location);
                        room
                    }
                    None => Room::new(location, self.room_size, self.layer_count),
                }
            })
            .collect();
        self.dimensions = dimensions;
        tracing::debug!(level = %self.id, ?dimensions, ?offset, "level rooms rebuilt");
    }

    /// Change the layer count of every room. Tiles on dropped layers are
    /// discarded.
    pub fn set_layer_count(&mut self, layer_count: usize) -> Result<(), ModelError> {
        check_layer_count(layer_count)?;
        for room in &mut self.rooms {
            room.set_layer_count(layer_count);
        }
        self.layer_count = layer_count;
        Ok(())
    }

    pub fn defined_events(&self) -> Vec<&str> {
        LEVEL_EVENTS.to_vec()
    }
}

fn check_layer_count(layer_count: usize) -> Result<(), ModelError> {
    if (1..=MAX_LAYER_COUNT).contains(&layer_count) {
        Ok(())
    } else {
        Err(ModelError::InvalidLayerCount {
            layer_count,
            max: MAX_LAYER_COUNT,
        })
    }
}
