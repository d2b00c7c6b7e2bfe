use std::fmt;
use std::sync::Arc;

use glam::IVec2;
use serde::{Deserialize, Serialize};
use tileworld_common::Rect2I;
use tileworld_properties::Properties;

/// The kinds of named resources a saved world can reference.
///
/// `ALL` is the order in which resource tables appear in a world file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    TileType,
    Zone,
    Tileset,
    CollisionModel,
    Sprite,
    Animation,
    TileData,
    ActionTileData,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 8] = [
        Self::TileType,
        Self::Zone,
        Self::Tileset,
        Self::CollisionModel,
        Self::Sprite,
        Self::Animation,
        Self::TileData,
        Self::ActionTileData,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TileType => "tile type",
            Self::Zone => "zone",
            Self::Tileset => "tileset",
            Self::CollisionModel => "collision model",
            Self::Sprite => "sprite",
            Self::Animation => "animation",
            Self::TileData => "tile data",
            Self::ActionTileData => "action tile data",
        }
    }

    /// Position in `ALL`.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed parameter of a script or event signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptParameter {
    pub type_name: String,
    pub name: String,
}

impl ScriptParameter {
    pub fn new(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            name: name.into(),
        }
    }
}

/// An event an object can raise, which triggers bind scripts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDefinition {
    pub name: String,
    #[serde(default)]
    pub readable_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<ScriptParameter>,
}

impl EventDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            readable_name: name.clone(),
            name,
            description: String::new(),
            parameters: Vec::new(),
        }
    }
}

/// Named render/logic variant of a level or room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
    /// Palette variant used by the renderer.
    pub image_variant_id: i32,
    /// Template used to fill empty rooms of this zone.
    #[serde(default)]
    pub default_tile_data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionModel {
    pub name: String,
    pub boxes: Vec<Rect2I>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprite {
    pub name: String,
    pub sheet: String,
    pub source: Rect2I,
    #[serde(default)]
    pub draw_offset: IVec2,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationFrame {
    pub sprite: String,
    pub start_time: u32,
    pub duration: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Animation {
    pub name: String,
    pub frames: Vec<AnimationFrame>,
    #[serde(default)]
    pub looped: bool,
}

/// Template for grid tiles.
#[derive(Debug, Clone)]
pub struct TileData {
    pub name: String,
    /// Behaviour type name the game instantiates for this tile.
    pub tile_type: Option<String>,
    /// Footprint in cells; at least 1×1.
    pub size: IVec2,
    pub sprite: Option<String>,
    pub animation: Option<String>,
    pub collision_model: Option<String>,
    /// Defaults every instance inherits.
    pub properties: Arc<Properties>,
    pub events: Vec<EventDefinition>,
}

impl TileData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tile_type: None,
            size: IVec2::ONE,
            sprite: None,
            animation: None,
            collision_model: None,
            properties: Arc::new(Properties::new()),
            events: Vec::new(),
        }
    }

    pub fn with_size(mut self, size: IVec2) -> Self {
        self.size = size.max(IVec2::ONE);
        self
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = Arc::new(properties);
        self
    }

    pub fn with_events<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.events = events.into_iter().map(EventDefinition::new).collect();
        self
    }

    pub fn defines_event(&self, name: &str) -> bool {
        self.events.iter().any(|e| e.name == name)
    }
}

/// Template for free-positioned action tiles (NPCs, warps, triggers).
#[derive(Debug, Clone)]
pub struct ActionTileData {
    pub name: String,
    pub tile_type: Option<String>,
    /// Size in pixels.
    pub size: IVec2,
    pub sprite: Option<String>,
    pub animation: Option<String>,
    pub properties: Arc<Properties>,
    pub events: Vec<EventDefinition>,
}

impl ActionTileData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tile_type: None,
            size: IVec2::splat(tileworld_common::TILE_SIZE),
            sprite: None,
            animation: None,
            properties: Arc::new(Properties::new()),
            events: Vec::new(),
        }
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = Arc::new(properties);
        self
    }

    pub fn with_events<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.events = events.into_iter().map(EventDefinition::new).collect();
        self
    }
}

/// A sheet of tile templates addressed by cell.
#[derive(Debug, Clone)]
pub struct Tileset {
    pub name: String,
    /// Sheet size in cells.
    pub size: IVec2,
    /// Row-major cells; `None` is an empty sheet slot.
    pub tiles: Vec<Option<Arc<TileData>>>,
}

impl Tileset {
    pub fn get_tile(&self, cell: IVec2) -> Option<&Arc<TileData>> {
        if cell.x < 0 || cell.y < 0 || cell.x >= self.size.x || cell.y >= self.size.y {
            return None;
        }
        self.tiles
            .get((cell.y * self.size.x + cell.x) as usize)
            .and_then(Option::as_ref)
    }

    /// First cell holding the named template.
    pub fn cell_of(&self, template: &str) -> Option<IVec2> {
        self.tiles.iter().enumerate().find_map(|(i, t)| {
            t.as_ref()
                .filter(|t| t.name == template)
                .map(|_| IVec2::new(i as i32 % self.size.x, i as i32 / self.size.x))
        })
    }
}
