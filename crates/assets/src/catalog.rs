use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use glam::IVec2;

use crate::templates::{
    ActionTileData, Animation, CollisionModel, ResourceKind, Sprite, TileData, Tileset, Zone,
};

/// Errors from building a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate {kind} '{name}'")]
    Duplicate { kind: ResourceKind, name: String },
    #[error("'{owner}' references unknown {kind} '{name}'")]
    UnknownReference {
        kind: ResourceKind,
        name: String,
        owner: String,
    },
    #[error("tileset '{name}' has {actual} cells, expected {expected}")]
    TilesetShape {
        name: String,
        expected: usize,
        actual: usize,
    },
}

/// Immutable set of named templates and assets.
///
/// Populated once through [`CatalogBuilder`] before any world is loaded and
/// passed by reference to everything that resolves names.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    tile_types: BTreeSet<String>,
    zones: BTreeMap<String, Arc<Zone>>,
    tilesets: BTreeMap<String, Arc<Tileset>>,
    collision_models: BTreeMap<String, Arc<CollisionModel>>,
    sprites: BTreeMap<String, Arc<Sprite>>,
    animations: BTreeMap<String, Arc<Animation>>,
    tile_data: BTreeMap<String, Arc<TileData>>,
    action_tile_data: BTreeMap<String, Arc<ActionTileData>>,
    /// Template name -> first (tileset, cell) that holds it.
    tileset_index: BTreeMap<String, (String, IVec2)>,
}

impl TemplateCatalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    pub fn has_tile_type(&self, name: &str) -> bool {
        self.tile_types.contains(name)
    }

    pub fn zone(&self, id: &str) -> Option<&Arc<Zone>> {
        self.zones.get(id)
    }

    pub fn tileset(&self, name: &str) -> Option<&Arc<Tileset>> {
        self.tilesets.get(name)
    }

    pub fn collision_model(&self, name: &str) -> Option<&Arc<CollisionModel>> {
        self.collision_models.get(name)
    }

    pub fn sprite(&self, name: &str) -> Option<&Arc<Sprite>> {
        self.sprites.get(name)
    }

    pub fn animation(&self, name: &str) -> Option<&Arc<Animation>> {
        self.animations.get(name)
    }

    pub fn tile_data(&self, name: &str) -> Option<&Arc<TileData>> {
        self.tile_data.get(name)
    }

    pub fn action_tile_data(&self, name: &str) -> Option<&Arc<ActionTileData>> {
        self.action_tile_data.get(name)
    }

    /// Whether a resource of `kind` named `name` is registered.
    pub fn contains(&self, kind: ResourceKind, name: &str) -> bool {
        match kind {
            ResourceKind::TileType => self.tile_types.contains(name),
            ResourceKind::Zone => self.zones.contains_key(name),
            ResourceKind::Tileset => self.tilesets.contains_key(name),
            ResourceKind::CollisionModel => self.collision_models.contains_key(name),
            ResourceKind::Sprite => self.sprites.contains_key(name),
            ResourceKind::Animation => self.animations.contains_key(name),
            ResourceKind::TileData => self.tile_data.contains_key(name),
            ResourceKind::ActionTileData => self.action_tile_data.contains_key(name),
        }
    }

    /// Registered names of one kind, sorted.
    pub fn names(&self, kind: ResourceKind) -> Vec<&str> {
        match kind {
            ResourceKind::TileType => self.tile_types.iter().map(String::as_str).collect(),
            ResourceKind::Zone => self.zones.keys().map(String::as_str).collect(),
            ResourceKind::Tileset => self.tilesets.keys().map(String::as_str).collect(),
            ResourceKind::CollisionModel => {
                self.collision_models.keys().map(String::as_str).collect()
            }
            ResourceKind::Sprite => self.sprites.keys().map(String::as_str).collect(),
            ResourceKind::Animation => self.animations.keys().map(String::as_str).collect(),
            ResourceKind::TileData => self.tile_data.keys().map(String::as_str).collect(),
            ResourceKind::ActionTileData => {
                self.action_tile_data.keys().map(String::as_str).collect()
            }
        }
    }

    /// Tileset and sheet cell through which a template is addressed, if any.
    pub fn tileset_location(&self, template: &str) -> Option<(&Arc<Tileset>, IVec2)> {
        let (tileset, cell) = self.tileset_index.get(template)?;
        self.tilesets.get(tileset).map(|t| (t, *cell))
    }

    /// Total number of registered resources across all kinds.
    pub fn len(&self) -> usize {
        ResourceKind::ALL
            .iter()
            .map(|kind| self.names(*kind).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Tileset registration waiting for its cells to be resolved.
#[derive(Debug, Clone)]
struct PendingTileset {
    name: String,
    size: IVec2,
    cells: Vec<Option<String>>,
}

/// Explicit registry that fills the catalog's typed slots by name.
///
/// Cross references (tileset cells, template sprites, zone defaults) are
/// checked in [`CatalogBuilder::build`], so registration order does not matter.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    catalog: TemplateCatalog,
    tilesets: Vec<PendingTileset>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_tile_type(&mut self, name: impl Into<String>) -> Result<(), CatalogError> {
        let name = name.into();
        if !self.catalog.tile_types.insert(name.clone()) {
            return Err(CatalogError::Duplicate {
                kind: ResourceKind::TileType,
                name,
            });
        }
        Ok(())
    }

    pub fn add_zone(&mut self, zone: Zone) -> Result<(), CatalogError> {
        insert_unique(&mut self.catalog.zones, ResourceKind::Zone, zone.id.clone(), zone)
    }

    pub fn add_collision_model(&mut self, model: CollisionModel) -> Result<(), CatalogError> {
        insert_unique(
            &mut self.catalog.collision_models,
            ResourceKind::CollisionModel,
            model.name.clone(),
            model,
        )
    }

    pub fn add_sprite(&mut self, sprite: Sprite) -> Result<(), CatalogError> {
        insert_unique(&mut self.catalog.sprites, ResourceKind::Sprite, sprite.name.clone(), sprite)
    }

    pub fn add_animation(&mut self, animation: Animation) -> Result<(), CatalogError> {
        insert_unique(
            &mut self.catalog.animations,
            ResourceKind::Animation,
            animation.name.clone(),
            animation,
        )
    }

    pub fn add_tile_data(&mut self, tile: TileData) -> Result<(), CatalogError> {
        insert_unique(&mut self.catalog.tile_data, ResourceKind::TileData, tile.name.clone(), tile)
    }

    pub fn add_action_tile_data(&mut self, tile: ActionTileData) -> Result<(), CatalogError> {
        insert_unique(
            &mut self.catalog.action_tile_data,
            ResourceKind::ActionTileData,
            tile.name.clone(),
            tile,
        )
    }

    /// Register a tileset whose row-major cells name tile data templates.
    pub fn add_tileset(
        &mut self,
        name: impl Into<String>,
        size: IVec2,
        cells: Vec<Option<String>>,
    ) -> Result<(), CatalogError> {
        let name = name.into();
        if self.tilesets.iter().any(|t| t.name == name) {
            return Err(CatalogError::Duplicate {
                kind: ResourceKind::Tileset,
                name,
            });
        }
        let expected = (size.x.max(0) * size.y.max(0)) as usize;
        if cells.len() != expected {
            return Err(CatalogError::TilesetShape {
                name,
                expected,
                actual: cells.len(),
            });
        }
        self.tilesets.push(PendingTileset { name, size, cells });
        Ok(())
    }

    /// Resolve cross references and freeze the catalog.
    pub fn build(mut self) -> Result<TemplateCatalog, CatalogError> {
        for pending in std::mem::take(&mut self.tilesets) {
            let mut tiles = Vec::with_capacity(pending.cells.len());
            for (i, cell) in pending.cells.iter().enumerate() {
                let Some(template) = cell else {
                    tiles.push(None);
                    continue;
                };
                let data = self.catalog.tile_data.get(template).cloned().ok_or_else(|| {
                    CatalogError::UnknownReference {
                        kind: ResourceKind::TileData,
                        name: template.clone(),
                        owner: pending.name.clone(),
                    }
                })?;
                let location = IVec2::new(i as i32 % pending.size.x, i as i32 / pending.size.x);
                self.catalog
                    .tileset_index
                    .entry(template.clone())
                    .or_insert_with(|| (pending.name.clone(), location));
                tiles.push(Some(data));
            }
            self.catalog.tilesets.insert(
                pending.name.clone(),
                Arc::new(Tileset {
                    name: pending.name,
                    size: pending.size,
                    tiles,
                }),
            );
        }

        let catalog = self.catalog;
        for tile in catalog.tile_data.values() {
            check_ref(&catalog, ResourceKind::TileType, tile.tile_type.as_deref(), &tile.name)?;
            check_ref(&catalog, ResourceKind::Sprite, tile.sprite.as_deref(), &tile.name)?;
            check_ref(&catalog, ResourceKind::Animation, tile.animation.as_deref(), &tile.name)?;
            check_ref(
                &catalog,
                ResourceKind::CollisionModel,
                tile.collision_model.as_deref(),
                &tile.name,
            )?;
        }
        for tile in catalog.action_tile_data.values() {
            check_ref(&catalog, ResourceKind::TileType, tile.tile_type.as_deref(), &tile.name)?;
            check_ref(&catalog, ResourceKind::Sprite, tile.sprite.as_deref(), &tile.name)?;
            check_ref(&catalog, ResourceKind::Animation, tile.animation.as_deref(), &tile.name)?;
        }
        for animation in catalog.animations.values() {
            for frame in &animation.frames {
                check_ref(&catalog, ResourceKind::Sprite, Some(&frame.sprite), &animation.name)?;
            }
        }
        for zone in catalog.zones.values() {
            check_ref(
                &catalog,
                ResourceKind::TileData,
                zone.default_tile_data.as_deref(),
                &zone.id,
            )?;
        }

        tracing::debug!(
            zones = catalog.zones.len(),
            tilesets = catalog.tilesets.len(),
            tile_data = catalog.tile_data.len(),
            action_tile_data = catalog.action_tile_data.len(),
            "template catalog built"
        );
        Ok(catalog)
    }
}

fn insert_unique<T>(
    map: &mut BTreeMap<String, Arc<T>>,
    kind: ResourceKind,
    name: String,
    value: T,
) -> Result<(), CatalogError> {
    if map.contains_key(&name) {
        return Err(CatalogError::Duplicate { kind, name });
    }
    map.insert(name, Arc::new(value));
    Ok(())
}

fn check_ref(
    catalog: &TemplateCatalog,
    kind: ResourceKind,
    name: Option<&str>,
    owner: &str,
) -> Result<(), CatalogError> {
    match name {
        Some(name) if !catalog.contains(kind, name) => Err(CatalogError::UnknownReference {
            kind,
            name: name.to_string(),
            owner: owner.to_string(),
        }),
        _ => Ok(()),
    }
}
