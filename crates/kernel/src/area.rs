use tileworld_properties::Properties;

use crate::script::Triggers;

/// Events every area can raise.
pub const AREA_EVENTS: &[&str] = &["area_start"];

/// How the map screen renders an area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapType {
    #[default]
    None,
    Overworld,
    Dungeon,
}

impl MapType {
    pub fn from_i32(value: i32) -> Self {
        match value {
            1 => Self::Overworld,
            2 => Self::Dungeon,
            _ => Self::None,
        }
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// When defeated monsters come back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RespawnMode {
    #[default]
    Normal,
    Always,
    Never,
}

impl RespawnMode {
    pub fn from_i32(value: i32) -> Self {
        match value {
            1 => Self::Always,
            2 => Self::Never,
            _ => Self::Normal,
        }
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// Where the player reappears after dying inside the area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpawnMode {
    #[default]
    Normal,
    RoomStart,
    AreaStart,
}

impl SpawnMode {
    pub fn from_i32(value: i32) -> Self {
        match value {
            1 => Self::RoomStart,
            2 => Self::AreaStart,
            _ => Self::Normal,
        }
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// One floor of a dungeon; `level` is `None` for a gap in the floor range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DungeonFloor {
    pub floor_number: i32,
    /// Index into the world's level list.
    pub level: Option<usize>,
}

/// A logical grouping of levels such as a dungeon or the overworld.
///
/// Everything except the id lives in `properties` so that the generic
/// property codec persists it. Member levels are not stored here; a level
/// names its area through its own `area` property.
#[derive(Debug, Clone, Default)]
pub struct Area {
    id: String,
    pub properties: Properties,
    pub triggers: Triggers,
}

impl Area {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            properties: Properties::new(),
            triggers: Triggers::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> String {
        self.properties.get_string("name", &self.id)
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.properties.set("name", name.into());
    }

    pub fn map_type(&self) -> MapType {
        MapType::from_i32(self.properties.get_int("map_type", 0))
    }

    pub fn set_map_type(&mut self, map_type: MapType) {
        self.properties.set("map_type", map_type.as_i32());
    }

    pub fn is_dungeon(&self) -> bool {
        self.map_type() == MapType::Dungeon
    }

    pub fn respawn_mode(&self) -> RespawnMode {
        RespawnMode::from_i32(self.properties.get_int("respawn_mode", 0))
    }

    pub fn set_respawn_mode(&mut self, mode: RespawnMode) {
        self.properties.set("respawn_mode", mode.as_i32());
    }

    pub fn spawn_mode(&self) -> SpawnMode {
        SpawnMode::from_i32(self.properties.get_int("spawn_mode", 0))
    }

    pub fn set_spawn_mode(&mut self, mode: SpawnMode) {
        self.properties.set("spawn_mode", mode.as_i32());
    }

    pub fn small_keys(&self) -> i32 {
        self.properties.get_int("small_keys", 0)
    }

    pub fn set_small_keys(&mut self, count: i32) {
        self.properties.set("small_keys", count.max(0));
    }

    pub fn has_boss_key(&self) -> bool {
        self.properties.get_bool("boss_key", false)
    }

    pub fn set_boss_key(&mut self, value: bool) {
        self.properties.set("boss_key", value);
    }

    pub fn has_map(&self) -> bool {
        self.properties.get_bool("map", false)
    }

    pub fn set_map(&mut self, value: bool) {
        self.properties.set("map", value);
    }

    pub fn has_compass(&self) -> bool {
        self.properties.get_bool("compass", false)
    }

    pub fn set_compass(&mut self, value: bool) {
        self.properties.set("compass", value);
    }

    pub fn is_completed(&self) -> bool {
        self.properties.get_bool("completed", false)
    }

    pub fn set_completed(&mut self, value: bool) {
        self.properties.set("completed", value);
    }

    pub fn defined_events(&self) -> Vec<&str> {
        AREA_EVENTS.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_properties() {
        let area = Area::new("forest");
        assert_eq!(area.name(), "forest");
        assert_eq!(area.map_type(), MapType::None);
        assert_eq!(area.respawn_mode(), RespawnMode::Normal);
        assert_eq!(area.small_keys(), 0);
        assert!(!area.has_boss_key());
        assert!(!area.is_completed());
    }

    #[test]
    fn progress_round_trips_through_properties() {
        let mut area = Area::new("dungeon1");
        area.set_name("Eagle's Tower");
        area.set_map_type(MapType::Dungeon);
        area.set_small_keys(3);
        area.set_compass(true);
        area.set_spawn_mode(SpawnMode::AreaStart);
        assert!(area.is_dungeon());
        assert_eq!(area.properties.get_int("small_keys", 0), 3);
        assert_eq!(area.spawn_mode(), SpawnMode::AreaStart);
        assert!(area.has_compass());
        assert_eq!(area.name(), "Eagle's Tower");

        area.set_small_keys(-2);
        assert_eq!(area.small_keys(), 0);
    }

    #[test]
    fn unknown_enum_values_fall_back() {
        assert_eq!(MapType::from_i32(99), MapType::None);
        assert_eq!(RespawnMode::from_i32(-1), RespawnMode::Normal);
        assert_eq!(SpawnMode::from_i32(2).as_i32(), 2);
    }
}
