use glam::IVec2;

use crate::math::{ceil_div_vec, floor_div_vec, wrap_vec};
use crate::types::Rect2I;

/// Width and height of one tile in pixels.
pub const TILE_SIZE: i32 = 16;

/// A level coordinate split into the room it falls in and its offset inside that room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoomCoord {
    pub location: IVec2,
    pub local: IVec2,
}

/// Coordinate spaces of one level.
///
/// - level pixel: absolute pixel position inside the level
/// - level coord: absolute tile position inside the level
/// - room local: tile position inside a room, always in `[0, room_size)`
/// - room location: position of a room in the level's room grid
///
/// Raw conversions accept any input (an out-of-canvas cursor produces room
/// locations outside the level). Pass `clamp = true` before indexing rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelSpace {
    /// Level size in rooms.
    pub dimensions: IVec2,
    /// Room size in tiles.
    pub room_size: IVec2,
    /// Tile size in pixels.
    pub tile_size: i32,
}

impl LevelSpace {
    pub fn new(dimensions: IVec2, room_size: IVec2) -> Self {
        Self {
            dimensions,
            room_size,
            tile_size: TILE_SIZE,
        }
    }

    /// Level size in tiles.
    pub fn tile_dimensions(&self) -> IVec2 {
        self.dimensions * self.room_size
    }

    /// Room size in pixels.
    pub fn room_pixel_size(&self) -> IVec2 {
        self.room_size * self.tile_size
    }

    /// Level size in pixels.
    pub fn pixel_dimensions(&self) -> IVec2 {
        self.tile_dimensions() * self.tile_size
    }

    /// Bounds of the level in room locations.
    pub fn room_bounds(&self) -> Rect2I {
        Rect2I::new(IVec2::ZERO, self.dimensions)
    }

    pub fn contains_room(&self, location: IVec2) -> bool {
        self.room_bounds().contains(location)
    }

    pub fn clamp_room_location(&self, location: IVec2) -> IVec2 {
        location.clamp(IVec2::ZERO, (self.dimensions - IVec2::ONE).max(IVec2::ZERO))
    }

    /// Clamp a level coordinate into the level's tile bounds.
    pub fn clamp_level_coord(&self, coord: IVec2) -> IVec2 {
        coord.clamp(IVec2::ZERO, (self.tile_dimensions() - IVec2::ONE).max(IVec2::ZERO))
    }

    pub fn level_to_room_location(&self, coord: IVec2, clamp: bool) -> IVec2 {
        let location = floor_div_vec(coord, self.room_size);
        if clamp { self.clamp_room_location(location) } else { location }
    }

    /// Split a level coordinate into room location and room-local coordinate.
    ///
    /// With `clamp`, the coordinate is first clamped into the level so both
    /// halves are valid indices.
    pub fn level_to_room_coord(&self, coord: IVec2, clamp: bool) -> RoomCoord {
        let coord = if clamp { self.clamp_level_coord(coord) } else { coord };
        RoomCoord {
            location: floor_div_vec(coord, self.room_size),
            local: wrap_vec(coord, self.room_size),
        }
    }

    pub fn room_to_level_coord(&self, room: RoomCoord) -> IVec2 {
        room.location * self.room_size + room.local
    }

    pub fn room_location_to_level_coord(&self, location: IVec2) -> IVec2 {
        location * self.room_size
    }

    pub fn level_pixel_to_level_coord(&self, pixel: IVec2) -> IVec2 {
        floor_div_vec(pixel, IVec2::splat(self.tile_size))
    }

    pub fn level_coord_to_level_pixel(&self, coord: IVec2) -> IVec2 {
        coord * self.tile_size
    }

    pub fn level_pixel_to_room_location(&self, pixel: IVec2, clamp: bool) -> IVec2 {
        let location = floor_div_vec(pixel, self.room_pixel_size());
        if clamp { self.clamp_room_location(location) } else { location }
    }

    /// Pixel offset of a level pixel inside the room that contains it.
    pub fn level_pixel_to_room_pixel(&self, pixel: IVec2) -> IVec2 {
        wrap_vec(pixel, self.room_pixel_size())
    }

    pub fn room_pixel_to_level_pixel(&self, location: IVec2, pixel: IVec2) -> IVec2 {
        location * self.room_pixel_size() + pixel
    }

    /// Smallest room-location rectangle covering a level-coordinate rectangle.
    pub fn level_rect_to_room_rect(&self, rect: Rect2I, clamp: bool) -> Rect2I {
        let min = floor_div_vec(rect.min(), self.room_size);
        let max = ceil_div_vec(rect.max(), self.room_size);
        let covered = Rect2I::from_min_max(min, max);
        if clamp { covered.intersect(&self.room_bounds()) } else { covered }
    }

    /// Smallest level-coordinate rectangle covering a level-pixel rectangle.
    pub fn level_pixel_rect_to_level_rect(&self, rect: Rect2I, clamp: bool) -> Rect2I {
        let tile = IVec2::splat(self.tile_size);
        let covered =
            Rect2I::from_min_max(floor_div_vec(rect.min(), tile), ceil_div_vec(rect.max(), tile));
        if clamp {
            covered.intersect(&Rect2I::new(IVec2::ZERO, self.tile_dimensions()))
        } else {
            covered
        }
    }

    /// Smallest room-location rectangle covering a level-pixel rectangle.
    pub fn level_pixel_rect_to_room_rect(&self, rect: Rect2I, clamp: bool) -> Rect2I {
        let room = self.room_pixel_size();
        let covered =
            Rect2I::from_min_max(floor_div_vec(rect.min(), room), ceil_div_vec(rect.max(), room));
        if clamp { covered.intersect(&self.room_bounds()) } else { covered }
    }
}
