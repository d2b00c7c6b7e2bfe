use glam::IVec2;
use tileworld_properties::Properties;

use crate::area::{Area, DungeonFloor};
use crate::error::ModelError;
use crate::level::Level;
use crate::script::{ScriptManager, Triggers};

/// Events the world itself can raise.
pub const WORLD_EVENTS: &[&str] = &["start_game"];

/// Widest floor range [`World::dungeon_floors`] fills with empty floors.
pub const MAX_FLOOR_SPAN: i64 = 1024;

/// The top-level aggregate: ordered levels and areas, scripts and the
/// player's start position.
///
/// The start position always refers to an existing level, a room inside it
/// and a tile inside that room, except while the world has no levels, when
/// it is all zeros.
#[derive(Debug, Clone, Default)]
pub struct World {
    id: String,
    levels: Vec<Level>,
    areas: Vec<Area>,
    pub scripts: ScriptManager,
    start_level_index: usize,
    start_room: IVec2,
    start_tile: IVec2,
    pub properties: Properties,
    pub triggers: Triggers,
}

impl World {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    // --- levels ---

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn levels_mut(&mut self) -> impl Iterator<Item = &mut Level> {
        self.levels.iter_mut()
    }

    pub fn level(&self, index: usize) -> Option<&Level> {
        self.levels.get(index)
    }

    pub fn level_mut(&mut self, index: usize) -> Option<&mut Level> {
        self.levels.get_mut(index)
    }

    pub fn level_index(&self, id: &str) -> Option<usize> {
        self.levels.iter().position(|l| l.id() == id)
    }

    pub fn level_by_id(&self, id: &str) -> Option<&Level> {
        self.levels.iter().find(|l| l.id() == id)
    }

    pub fn level_by_id_mut(&mut self, id: &str) -> Option<&mut Level> {
        self.levels.iter_mut().find(|l| l.id() == id)
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Append a level and return its index.
    pub fn add_level(&mut self, level: Level) -> usize {
        self.levels.push(level);
        self.ensure_valid_start();
        self.levels.len() - 1
    }

    pub fn insert_level(&mut self, index: usize, level: Level) -> Result<(), ModelError> {
        if index > self.levels.len() {
            return Err(ModelError::LevelOutOfRange {
                index,
                count: self.levels.len(),
            });
        }
        self.levels.insert(index, level);
        if self.levels.len() > 1 && index <= self.start_level_index {
            self.start_level_index += 1;
        }
        self.ensure_valid_start();
        Ok(())
    }

    /// Remove a level. The start position follows its level, or is reset
    /// to the first level when the start level itself is removed.
    pub fn remove_level(&mut self, index: usize) -> Result<Level, ModelError> {
        if index >= self.levels.len() {
            return Err(ModelError::LevelOutOfRange {
                index,
                count: self.levels.len(),
            });
        }
        let level = self.levels.remove(index);
        if index < self.start_level_index {
            self.start_level_index -= 1;
        } else if index == self.start_level_index {
            self.start_level_index = 0;
            self.start_room = IVec2::ZERO;
            self.start_tile = IVec2::ZERO;
        }
        self.ensure_valid_start();
        Ok(level)
    }

    pub fn room_count(&self) -> usize {
        self.levels.iter().map(Level::room_count).sum()
    }

    pub fn tile_count(&self) -> usize {
        self.levels.iter().map(Level::tile_count).sum()
    }

    pub fn action_tile_count(&self) -> usize {
        self.levels.iter().map(Level::action_tile_count).sum()
    }

    // --- areas ---

    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    pub fn areas_mut(&mut self) -> impl Iterator<Item = &mut Area> {
        self.areas.iter_mut()
    }

    pub fn area(&self, id: &str) -> Option<&Area> {
        self.areas.iter().find(|a| a.id() == id)
    }

    pub fn area_mut(&mut self, id: &str) -> Option<&mut Area> {
        self.areas.iter_mut().find(|a| a.id() == id)
    }

    pub fn add_area(&mut self, area: Area) -> Result<(), ModelError> {
        if self.area(area.id()).is_some() {
            return Err(ModelError::DuplicateArea(area.id().to_string()));
        }
        self.areas.push(area);
        Ok(())
    }

    /// Remove an area and detach every level that referenced it.
    pub fn remove_area(&mut self, id: &str) -> Option<Area> {
        let index = self.areas.iter().position(|a| a.id() == id)?;
        for level in &mut self.levels {
            if level.area_id().as_deref() == Some(id) {
                level.set_area_id(None);
            }
        }
        Some(self.areas.remove(index))
    }

    /// Areas whose map type is dungeon, in area order.
    pub fn dungeons(&self) -> impl Iterator<Item = &Area> {
        self.areas.iter().filter(|a| a.is_dungeon())
    }

    /// Indices of the levels that belong to `area_id`.
    pub fn area_levels(&self, area_id: &str) -> Vec<usize> {
        self.levels
            .iter()
            .enumerate()
            .filter(|(_, l)| l.area_id().as_deref() == Some(area_id))
            .map(|(i, _)| i)
            .collect()
    }

    /// Floors of an area from the lowest to the highest numbered floor.
    ///
    /// Floor numbers with no level are reported with `level: None`. When two
    /// levels claim the same floor, the first one wins. Gaps are only filled
    /// while the span stays within [`MAX_FLOOR_SPAN`]; wider spans list the
    /// numbered floors alone.
    pub fn dungeon_floors(&self, area_id: &str) -> Vec<DungeonFloor> {
        let mut numbered: Vec<(i32, usize)> = self
            .area_levels(area_id)
            .into_iter()
            .filter_map(|i| Some((self.levels[i].dungeon_floor()?, i)))
            .collect();
        let (Some(min), Some(max)) = (
            numbered.iter().map(|(f, _)| *f).min(),
            numbered.iter().map(|(f, _)| *f).max(),
        ) else {
            return Vec::new();
        };
        let span = i64::from(max) - i64::from(min) + 1;
        if span > MAX_FLOOR_SPAN {
            tracing::warn!(area = area_id, min, max, "dungeon floor span too wide, gaps not filled");
            // Stable sort keeps the first level per floor in front.
            numbered.sort_by_key(|(f, _)| *f);
            numbered.dedup_by_key(|(f, _)| *f);
            return numbered
                .into_iter()
                .map(|(floor_number, i)| DungeonFloor {
                    floor_number,
                    level: Some(i),
                })
                .collect();
        }
        (min..=max)
            .map(|floor_number| DungeonFloor {
                floor_number,
                level: numbered
                    .iter()
                    .find(|(f, _)| *f == floor_number)
                    .map(|(_, i)| *i),
            })
            .collect()
    }

    // --- start position ---

    pub fn start_level_index(&self) -> usize {
        self.start_level_index
    }

    pub fn start_room(&self) -> IVec2 {
        self.start_room
    }

    pub fn start_tile(&self) -> IVec2 {
        self.start_tile
    }

    pub fn start_level(&self) -> Option<&Level> {
        self.levels.get(self.start_level_index)
    }

    /// Set the start position, rejecting anything that does not exist.
    pub fn set_start(&mut self, level: usize, room: IVec2, tile: IVec2) -> Result<(), ModelError> {
        let target = self.levels.get(level).ok_or(ModelError::LevelOutOfRange {
            index: level,
            count: self.levels.len(),
        })?;
        if !target.contains_room(room) {
            return Err(ModelError::RoomOutOfBounds(room));
        }
        let room_size = target.room_size();
        if tile.cmplt(IVec2::ZERO).any() || tile.cmpge(room_size).any() {
            return Err(ModelError::OutOfBounds {
                location: tile,
                size: room_size,
            });
        }
        self.start_level_index = level;
        self.start_room = room;
        self.start_tile = tile;
        Ok(())
    }

    /// Set the start position, clamping it into range instead of failing.
    /// Returns whether the values had to be repaired.
    pub fn restore_start(&mut self, level: usize, room: IVec2, tile: IVec2) -> bool {
        self.start_level_index = level;
        self.start_room = room;
        self.start_tile = tile;
        self.ensure_valid_start()
    }

    /// Clamp the start position into range. Returns whether anything changed.
    pub fn ensure_valid_start(&mut self) -> bool {
        let before = (self.start_level_index, self.start_room, self.start_tile);
        match self.levels.len() {
            0 => {
                self.start_level_index = 0;
                self.start_room = IVec2::ZERO;
                self.start_tile = IVec2::ZERO;
            }
            count => {
                self.start_level_index = self.start_level_index.min(count - 1);
                let level = &self.levels[self.start_level_index];
                self.start_room = level.space().clamp_room_location(self.start_room);
                self.start_tile = self
                    .start_tile
                    .clamp(IVec2::ZERO, level.room_size() - IVec2::ONE);
            }
        }
        let changed = before != (self.start_level_index, self.start_room, self.start_tile);
        if changed {
            tracing::warn!(
                level = self.start_level_index,
                room = ?self.start_room,
                tile = ?self.start_tile,
                "start position repaired"
            );
        }
        changed
    }

    pub fn defined_events(&self) -> Vec<&str> {
        WORLD_EVENTS.to_vec()
    }
}
