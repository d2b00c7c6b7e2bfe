use std::sync::Arc;

use glam::IVec2;
use serde::{Deserialize, Serialize};
use tileworld_assets::TemplateCatalog;
use tileworld_common::Rect2I;
use tileworld_kernel::{
    ActionTileDataInstance, Level, MAX_LAYER_COUNT, TileDataInstance, TileGrid, TileLayers,
    Trigger, Triggers,
};
use tileworld_properties::{Properties, Property};

/// Most cells (size times layers) a decoded payload may allocate.
pub const MAX_PAYLOAD_CELLS: usize = 1 << 22;

/// Errors from clipboard staging.
#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("CBOR encode error: {0}")]
    CborEncode(String),
    #[error("CBOR decode error: {0}")]
    CborDecode(String),
    #[error("template '{0}' is not in the catalog")]
    MissingTemplate(String),
    #[error("action tile template '{0}' is not in the catalog")]
    MissingActionTemplate(String),
    #[error("clipboard grid of {size} cells on layers {start_layer}+{layer_count} is not allowed")]
    InvalidShape {
        size: IVec2,
        start_layer: usize,
        layer_count: usize,
    },
    #[error("clipboard tile '{template}' at {location} on layer {layer} does not fit the grid")]
    InvalidPlacement {
        template: String,
        location: IVec2,
        layer: usize,
    },
}

/// Copy every tile anchored inside `rect` (level coordinates) on layers
/// `start_layer..start_layer + layer_count` into a detached grid.
///
/// The rectangle is clipped to the level first. Tiles get fresh ids; action
/// tiles whose position falls inside the rectangle's pixel area come along.
/// Each tile keeps its source room as a clip, so a footprint running past
/// the room edge cannot cover a neighbour copied from the next room.
pub fn copy_region(level: &Level, rect: Rect2I, start_layer: usize, layer_count: usize) -> TileGrid {
    let space = level.space();
    let rect = rect.intersect(&Rect2I::new(IVec2::ZERO, space.tile_dimensions()));
    let layer_count = layer_count.min(level.layer_count().saturating_sub(start_layer));
    let mut grid = TileGrid::new(rect.size, start_layer, layer_count);
    if rect.is_empty() {
        return grid;
    }

    let layers = start_layer..start_layer + layer_count;
    for (coord, tile) in level.placed_tiles() {
        if !rect.contains(coord) || !layers.contains(&tile.layer()) {
            continue;
        }
        let location = space.level_to_room_location(coord, false);
        let room = Rect2I::new(location * level.room_size() - rect.point, level.room_size());
        let layer = tile.layer() - start_layer;
        let placed =
            grid.place_tile_clipped(tile.duplicate(), coord - rect.point, layer, Some(room));
        if let Err(err) = placed {
            tracing::warn!(%err, %coord, layer, "tile not copied");
        }
    }

    let origin = space.level_coord_to_level_pixel(rect.point);
    let pixel_rect = Rect2I::new(origin, rect.size * space.tile_size);
    for room in level.rooms() {
        for action in room.action_tiles() {
            let pixel = space.room_pixel_to_level_pixel(room.location(), action.position);
            if pixel_rect.contains(pixel) {
                let mut copy = action.duplicate();
                copy.position = pixel - origin;
                grid.add_event_tile(copy);
            }
        }
    }

    tracing::debug!(
        ?rect,
        tiles = grid.tile_count(),
        event_tiles = grid.event_tiles().len(),
        "region copied"
    );
    grid
}

/// Rooms a paste of `grid` at `coord` can touch, clipped to the level.
pub fn paste_footprint(level: &Level, grid: &TileGrid, coord: IVec2) -> Vec<IVec2> {
    let space = level.space();
    let mut rooms: Vec<IVec2> = space
        .level_rect_to_room_rect(Rect2I::new(coord, grid.size()), true)
        .cells()
        .collect();
    let origin = space.level_coord_to_level_pixel(coord);
    for action in grid.event_tiles() {
        let location = space.level_pixel_to_room_location(origin + action.position, false);
        if space.contains_room(location) && !rooms.contains(&location) {
            rooms.push(location);
        }
    }
    rooms
}

/// Merge a duplicate of `grid` into `level` with its origin at `coord`.
///
/// Grid layer `i` lands on level layer `grid.start_layer() + i`. Tiles whose
/// anchor or layer falls outside the level are skipped, as are action tiles
/// outside its pixel area. Returns the number of objects pasted.
pub fn paste(level: &mut Level, grid: &TileGrid, coord: IVec2) -> usize {
    let space = level.space();
    let bounds = Rect2I::new(IVec2::ZERO, space.tile_dimensions());
    let copy = grid.duplicate();
    let mut pasted = 0;
    let mut skipped = 0;

    let tiles: Vec<_> = copy.placed_tiles().cloned().collect();
    for tile in tiles {
        let target = coord + tile.location();
        let layer = copy.start_layer() + tile.layer();
        if !bounds.contains(target) || layer >= level.layer_count() {
            skipped += 1;
            continue;
        }
        match level.place_tile_at(tile, target, layer) {
            Ok(_) => pasted += 1,
            Err(_) => skipped += 1,
        }
    }

    let origin = space.level_coord_to_level_pixel(coord);
    for action in copy.event_tiles() {
        let pixel = origin + action.position;
        let location = space.level_pixel_to_room_location(pixel, false);
        let Some(room) = level.room_at_mut(location) else {
            skipped += 1;
            continue;
        };
        let mut action = action.clone();
        action.position = space.level_pixel_to_room_pixel(pixel);
        room.add_action_tile(action);
        pasted += 1;
    }

    tracing::debug!(?coord, pasted, skipped, "tile grid pasted");
    pasted
}

/// Serializable form of a [`TileGrid`] for the system clipboard.
///
/// Templates are stored by name and resolved against a catalog when the
/// payload is turned back into a grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipboardPayload {
    pub size: IVec2,
    pub start_layer: usize,
    pub layer_count: usize,
    pub tiles: Vec<ClipboardTile>,
    pub event_tiles: Vec<ClipboardEventTile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipboardTile {
    pub template: String,
    pub location: IVec2,
    pub layer: usize,
    /// Footprint limit in grid coordinates, carried over from the source room.
    #[serde(default)]
    pub clip: Option<Rect2I>,
    pub properties: Vec<Property>,
    pub triggers: Vec<TriggerRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipboardEventTile {
    pub template: String,
    pub position: IVec2,
    pub properties: Vec<Property>,
    pub triggers: Vec<TriggerRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerRecord {
    pub name: String,
    pub event: Option<String>,
    pub script: Option<String>,
    pub enabled: bool,
    pub fire_once: bool,
    pub description: String,
}

impl From<&Trigger> for TriggerRecord {
    fn from(trigger: &Trigger) -> Self {
        Self {
            name: trigger.name.clone(),
            event: trigger.event.clone(),
            script: trigger.script.clone(),
            enabled: trigger.enabled,
            fire_once: trigger.fire_once,
            description: trigger.description.clone(),
        }
    }
}

impl From<TriggerRecord> for Trigger {
    fn from(record: TriggerRecord) -> Self {
        let mut trigger = Trigger::new(record.name);
        trigger.event = record.event;
        trigger.script = record.script;
        trigger.enabled = record.enabled;
        trigger.fire_once = record.fire_once;
        trigger.description = record.description;
        trigger
    }
}

fn records(triggers: &Triggers) -> Vec<TriggerRecord> {
    triggers.iter().map(TriggerRecord::from).collect()
}

fn restore_triggers(records: Vec<TriggerRecord>) -> Triggers {
    let mut triggers = Triggers::new();
    for record in records {
        triggers.push(record.into());
    }
    triggers
}

fn restore_properties(base: Arc<Properties>, own: Vec<Property>) -> Properties {
    let mut properties = Properties::with_base(base);
    for property in own {
        properties.set_property(property);
    }
    properties
}

impl ClipboardPayload {
    pub fn from_tile_grid(grid: &TileGrid) -> Self {
        Self {
            size: grid.size(),
            start_layer: grid.start_layer(),
            layer_count: grid.layer_count(),
            tiles: grid
                .placed_tiles()
                .map(|tile| ClipboardTile {
                    template: tile.template().name.clone(),
                    location: tile.location(),
                    layer: tile.layer(),
                    clip: tile.clip(),
                    properties: tile.properties.own().cloned().collect(),
                    triggers: records(&tile.triggers),
                })
                .collect(),
            event_tiles: grid
                .event_tiles()
                .iter()
                .map(|action| ClipboardEventTile {
                    template: action.template().name.clone(),
                    position: action.position,
                    properties: action.properties.own().cloned().collect(),
                    triggers: records(&action.triggers),
                })
                .collect(),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, ClipboardError> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| ClipboardError::CborEncode(e.to_string()))?;
        Ok(buf)
    }

    pub fn decode(data: &[u8]) -> Result<Self, ClipboardError> {
        ciborium::from_reader(data).map_err(|e| ClipboardError::CborDecode(e.to_string()))
    }

    /// Rebuild the grid against `catalog`.
    ///
    /// Every template is resolved before anything is built, so a payload
    /// naming a template the catalog lacks yields no grid at all. The grid
    /// shape is checked first: layers must stay within `MAX_LAYER_COUNT` and
    /// cells within [`MAX_PAYLOAD_CELLS`].
    pub fn into_tile_grid(self, catalog: &TemplateCatalog) -> Result<TileGrid, ClipboardError> {
        let invalid_shape = ClipboardError::InvalidShape {
            size: self.size,
            start_layer: self.start_layer,
            layer_count: self.layer_count,
        };
        let layers_fit = self
            .start_layer
            .checked_add(self.layer_count)
            .is_some_and(|end| end <= MAX_LAYER_COUNT);
        let cells_fit = TileLayers::cell_count(self.size, self.layer_count)
            .is_some_and(|cells| cells <= MAX_PAYLOAD_CELLS);
        if !layers_fit || !cells_fit {
            return Err(invalid_shape);
        }

        for tile in &self.tiles {
            if catalog.tile_data(&tile.template).is_none() {
                return Err(ClipboardError::MissingTemplate(tile.template.clone()));
            }
        }
        for action in &self.event_tiles {
            if catalog.action_tile_data(&action.template).is_none() {
                return Err(ClipboardError::MissingActionTemplate(action.template.clone()));
            }
        }

        let mut grid = TileGrid::try_new(self.size, self.start_layer, self.layer_count)
            .map_err(|_| invalid_shape)?;
        for tile in self.tiles {
            let Some(template) = catalog.tile_data(&tile.template) else {
                return Err(ClipboardError::MissingTemplate(tile.template));
            };
            let mut instance = TileDataInstance::new(template.clone());
            instance.properties = restore_properties(template.properties.clone(), tile.properties);
            instance.triggers = restore_triggers(tile.triggers);
            let clip = match tile.clip {
                Some(clip) => Some(checked_clip(clip).ok_or_else(|| {
                    ClipboardError::InvalidPlacement {
                        template: tile.template.clone(),
                        location: tile.location,
                        layer: tile.layer,
                    }
                })?),
                None => None,
            };
            grid.place_tile_clipped(instance, tile.location, tile.layer, clip)
                .map_err(|_| ClipboardError::InvalidPlacement {
                    template: tile.template,
                    location: tile.location,
                    layer: tile.layer,
                })?;
        }
        for action in self.event_tiles {
            let Some(template) = catalog.action_tile_data(&action.template) else {
                return Err(ClipboardError::MissingActionTemplate(action.template));
            };
            let mut instance = ActionTileDataInstance::new(template.clone(), action.position);
            instance.properties = restore_properties(template.properties.clone(), action.properties);
            instance.triggers = restore_triggers(action.triggers);
            grid.add_event_tile(instance);
        }
        Ok(grid)
    }
}

/// A decoded clip whose far corner is representable.
fn checked_clip(clip: Rect2I) -> Option<Rect2I> {
    if clip.size.cmplt(IVec2::ZERO).any() {
        return None;
    }
    clip.point.x.checked_add(clip.size.x)?;
    clip.point.y.checked_add(clip.size.y)?;
    Some(clip)
}
