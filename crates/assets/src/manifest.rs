//! JSON description of a catalog, used by tools that need a catalog without
//! the game's asset pipeline.

use std::path::Path;

use glam::IVec2;
use serde::{Deserialize, Serialize};
use tileworld_properties::{Properties, Property};

use crate::catalog::{CatalogBuilder, CatalogError, TemplateCatalog};
use crate::templates::{
    ActionTileData, Animation, CollisionModel, EventDefinition, Sprite, TileData, Zone,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TileDataDef {
    pub name: String,
    #[serde(default)]
    pub tile_type: Option<String>,
    #[serde(default = "one_cell")]
    pub size: IVec2,
    #[serde(default)]
    pub sprite: Option<String>,
    #[serde(default)]
    pub animation: Option<String>,
    #[serde(default)]
    pub collision_model: Option<String>,
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(default)]
    pub events: Vec<EventDefinition>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionTileDataDef {
    pub name: String,
    #[serde(default)]
    pub tile_type: Option<String>,
    #[serde(default = "one_tile_in_pixels")]
    pub size: IVec2,
    #[serde(default)]
    pub sprite: Option<String>,
    #[serde(default)]
    pub animation: Option<String>,
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(default)]
    pub events: Vec<EventDefinition>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TilesetDef {
    pub name: String,
    pub size: IVec2,
    pub cells: Vec<Option<String>>,
}

/// Serializable catalog contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogManifest {
    #[serde(default)]
    pub tile_types: Vec<String>,
    #[serde(default)]
    pub zones: Vec<Zone>,
    #[serde(default)]
    pub tilesets: Vec<TilesetDef>,
    #[serde(default)]
    pub collision_models: Vec<CollisionModel>,
    #[serde(default)]
    pub sprites: Vec<Sprite>,
    #[serde(default)]
    pub animations: Vec<Animation>,
    #[serde(default)]
    pub tile_data: Vec<TileDataDef>,
    #[serde(default)]
    pub action_tile_data: Vec<ActionTileDataDef>,
}

fn one_cell() -> IVec2 {
    IVec2::ONE
}

fn one_tile_in_pixels() -> IVec2 {
    IVec2::splat(tileworld_common::TILE_SIZE)
}

impl CatalogManifest {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), CatalogError> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Register everything through a [`CatalogBuilder`] and build.
    pub fn into_catalog(self) -> Result<TemplateCatalog, CatalogError> {
        let mut b = CatalogBuilder::new();
        for name in self.tile_types {
            b.add_tile_type(name)?;
        }
        for zone in self.zones {
            b.add_zone(zone)?;
        }
        for model in self.collision_models {
            b.add_collision_model(model)?;
        }
        for sprite in self.sprites {
            b.add_sprite(sprite)?;
        }
        for animation in self.animations {
            b.add_animation(animation)?;
        }
        for def in self.tile_data {
            let mut tile = TileData::new(def.name)
                .with_size(def.size)
                .with_properties(Properties::from_properties(def.properties));
            tile.tile_type = def.tile_type;
            tile.sprite = def.sprite;
            tile.animation = def.animation;
            tile.collision_model = def.collision_model;
            tile.events = def.events;
            b.add_tile_data(tile)?;
        }
        for def in self.action_tile_data {
            let mut tile = ActionTileData::new(def.name)
                .with_properties(Properties::from_properties(def.properties));
            tile.tile_type = def.tile_type;
            tile.size = def.size;
            tile.sprite = def.sprite;
            tile.animation = def.animation;
            tile.events = def.events;
            b.add_action_tile_data(tile)?;
        }
        for set in self.tilesets {
            b.add_tileset(set.name, set.size, set.cells)?;
        }
        b.build()
    }

    pub fn load_catalog(path: impl AsRef<Path>) -> Result<TemplateCatalog, CatalogError> {
        Self::load(path)?.into_catalog()
    }
}
