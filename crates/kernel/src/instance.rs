use std::sync::Arc;

use glam::IVec2;
use tileworld_assets::{ActionTileData, TileData};
use tileworld_common::{ActionTileId, Rect2I, TileId};
use tileworld_properties::Properties;

use crate::script::Triggers;

/// A grid tile stamped from a [`TileData`] template.
///
/// Only the anchor cell (`location`) owns the tile; the other cells of its
/// footprint merely reference it.
#[derive(Debug, Clone)]
pub struct TileDataInstance {
    id: TileId,
    template: Arc<TileData>,
    /// Overrides on top of the template's properties.
    pub properties: Properties,
    pub triggers: Triggers,
    pub(crate) location: IVec2,
    pub(crate) layer: usize,
    pub(crate) room: Option<IVec2>,
    /// Extra limit on the footprint, in the owning grid's coordinates.
    pub(crate) clip: Option<Rect2I>,
}

impl TileDataInstance {
    pub fn new(template: Arc<TileData>) -> Self {
        Self::with_id(TileId::new(), template)
    }

    pub fn with_id(id: TileId, template: Arc<TileData>) -> Self {
        Self {
            id,
            properties: Properties::with_base(template.properties.clone()),
            template,
            triggers: Triggers::new(),
            location: IVec2::ZERO,
            layer: 0,
            room: None,
            clip: None,
        }
    }

    pub fn id(&self) -> TileId {
        self.id
    }

    pub fn template(&self) -> &Arc<TileData> {
        &self.template
    }

    /// Anchor cell.
    pub fn location(&self) -> IVec2 {
        self.location
    }

    pub fn layer(&self) -> usize {
        self.layer
    }

    /// Footprint size in cells.
    pub fn size(&self) -> IVec2 {
        self.template.size.max(IVec2::ONE)
    }

    /// Unclipped footprint rectangle.
    pub fn bounds(&self) -> Rect2I {
        Rect2I::new(self.location, self.size())
    }

    /// Limit on the footprint beyond the grid edges, set when a tile was
    /// lifted out of a room into a detached grid.
    pub fn clip(&self) -> Option<Rect2I> {
        self.clip
    }

    /// Location of the owning room, when placed in one.
    pub fn room(&self) -> Option<IVec2> {
        self.room
    }

    pub fn is_anchor(&self, location: IVec2) -> bool {
        self.location == location
    }

    /// Event names this tile can raise.
    pub fn defined_events(&self) -> Vec<&str> {
        self.template.events.iter().map(|e| e.name.as_str()).collect()
    }

    /// Independent copy with a fresh id and the same template.
    pub fn duplicate(&self) -> Self {
        Self {
            id: TileId::new(),
            ..self.clone()
        }
    }
}

/// A free-positioned tile stamped from an [`ActionTileData`] template.
#[derive(Debug, Clone)]
pub struct ActionTileDataInstance {
    id: ActionTileId,
    template: Arc<ActionTileData>,
    pub properties: Properties,
    pub triggers: Triggers,
    /// Pixel position relative to the owning room (or tile grid).
    pub position: IVec2,
}

impl ActionTileDataInstance {
    pub fn new(template: Arc<ActionTileData>, position: IVec2) -> Self {
        Self {
            id: ActionTileId::new(),
            properties: Properties::with_base(template.properties.clone()),
            template,
            triggers: Triggers::new(),
            position,
        }
    }

    pub fn id(&self) -> ActionTileId {
        self.id
    }

    pub fn template(&self) -> &Arc<ActionTileData> {
        &self.template
    }

    pub fn size(&self) -> IVec2 {
        self.template.size
    }

    pub fn bounds(&self) -> Rect2I {
        Rect2I::new(self.position, self.template.size)
    }

    pub fn defined_events(&self) -> Vec<&str> {
        self.template.events.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn duplicate(&self) -> Self {
        Self {
            id: ActionTileId::new(),
            ..self.clone()
        }
    }
}
