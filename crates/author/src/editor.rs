use std::sync::Arc;

use glam::IVec2;
use tileworld_assets::TileData;
use tileworld_common::TileId;
use tileworld_kernel::{Level, ModelError, Room, TileDataInstance, TileGrid, World};

use crate::clipboard;

/// Room state captured before an edit.
#[derive(Debug, Clone)]
struct RoomSnapshot {
    level: usize,
    room: Room,
}

/// One reversible edit: the rooms it touched, as they were on the other side
/// of the edit. Applying it swaps them with the live rooms, which turns it
/// into its own inverse.
#[derive(Debug, Clone)]
pub struct EditCommand {
    label: &'static str,
    rooms: Vec<RoomSnapshot>,
}

impl EditCommand {
    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn apply(&mut self, world: &mut World) {
        for snapshot in &mut self.rooms {
            let location = snapshot.room.location();
            let Some(live) = world
                .level_mut(snapshot.level)
                .and_then(|level| level.room_at_mut(location))
            else {
                tracing::warn!(level = snapshot.level, %location, "room gone, edit skipped");
                continue;
            };
            if live.id() != snapshot.room.id() {
                tracing::warn!(level = snapshot.level, %location, "room replaced, edit skipped");
                continue;
            }
            std::mem::swap(live, &mut snapshot.room);
        }
    }
}

/// Errors from edit operations.
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("level {0} not found")]
    LevelNotFound(usize),
    #[error("no tile at {coord} on layer {layer}")]
    NoTileAt { coord: IVec2, layer: usize },
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Undo/redo wrapper for tile edits on a [`World`].
///
/// Every edit records the rooms it is about to change; undo and redo swap
/// those snapshots with the live rooms.
pub struct Editor {
    undo_stack: Vec<EditCommand>,
    redo_stack: Vec<EditCommand>,
}

impl Editor {
    pub fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    /// Stamp `template` at a level coordinate.
    pub fn place_tile(
        &mut self,
        world: &mut World,
        level: usize,
        template: Arc<TileData>,
        coord: IVec2,
        layer: usize,
    ) -> Result<TileId, EditError> {
        let target = level_mut(world, level)?;
        let location = target.space().level_to_room_location(coord, false);
        let before = snapshot(target, level, &[location]);
        let id = target.create_tile_at(template, coord, layer)?;
        self.record("place tile", before);
        Ok(id)
    }

    /// Remove the tile covering a level coordinate.
    pub fn remove_tile(
        &mut self,
        world: &mut World,
        level: usize,
        coord: IVec2,
        layer: usize,
    ) -> Result<TileDataInstance, EditError> {
        let target = level_mut(world, level)?;
        let location = target.space().level_to_room_location(coord, false);
        let before = snapshot(target, level, &[location]);
        let tile = target
            .remove_tile_at(coord, layer)
            .ok_or(EditError::NoTileAt { coord, layer })?;
        self.record("remove tile", before);
        Ok(tile)
    }

    /// Paste a staged grid with its origin at `coord`. Returns the number of
    /// objects pasted; an empty paste records nothing.
    pub fn paste(
        &mut self,
        world: &mut World,
        level: usize,
        grid: &TileGrid,
        coord: IVec2,
    ) -> Result<usize, EditError> {
        let target = level_mut(world, level)?;
        let rooms = clipboard::paste_footprint(target, grid, coord);
        let before = snapshot(target, level, &rooms);
        let pasted = clipboard::paste(target, grid, coord);
        if pasted > 0 {
            self.record("paste", before);
        }
        Ok(pasted)
    }

    fn record(&mut self, label: &'static str, rooms: Vec<RoomSnapshot>) {
        tracing::debug!(label, rooms = rooms.len(), "edit recorded");
        self.undo_stack.push(EditCommand { label, rooms });
        self.redo_stack.clear();
    }

    /// Undo the last edit. Returns true if an edit was undone.
    pub fn undo(&mut self, world: &mut World) -> bool {
        let Some(mut cmd) = self.undo_stack.pop() else {
            return false;
        };
        cmd.apply(world);
        self.redo_stack.push(cmd);
        true
    }

    /// Redo the last undone edit. Returns true if an edit was redone.
    pub fn redo(&mut self, world: &mut World) -> bool {
        let Some(mut cmd) = self.redo_stack.pop() else {
            return false;
        };
        cmd.apply(world);
        self.undo_stack.push(cmd);
        true
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Label of the edit `undo` would revert.
    pub fn last_edit(&self) -> Option<&'static str> {
        self.undo_stack.last().map(EditCommand::label)
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

fn level_mut(world: &mut World, index: usize) -> Result<&mut Level, EditError> {
    world.level_mut(index).ok_or(EditError::LevelNotFound(index))
}

fn snapshot(level: &Level, index: usize, locations: &[IVec2]) -> Vec<RoomSnapshot> {
    locations
        .iter()
        .filter_map(|&location| level.room_at(location))
        .map(|room| RoomSnapshot {
            level: index,
            room: room.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World {
        let mut world = World::new("test");
        world.add_level(Level::new("l0", IVec2::new(2, 2), IVec2::new(4, 4), 2).unwrap());
        world
    }

    fn grass() -> Arc<TileData> {
        Arc::new(TileData::new("grass"))
    }

    #[test]
    fn place_and_undo() {
        let mut world = world();
        let mut editor = Editor::new();

        editor
            .place_tile(&mut world, 0, grass(), IVec2::new(5, 1), 0)
            .unwrap();
        assert_eq!(world.tile_count(), 1);
        assert_eq!(editor.last_edit(), Some("place tile"));

        assert!(editor.undo(&mut world));
        assert_eq!(world.tile_count(), 0);
        assert!(editor.can_redo());
    }

    #[test]
    fn place_undo_redo_keeps_tile_id() {
        let mut world = world();
        let mut editor = Editor::new();

        let id = editor
            .place_tile(&mut world, 0, grass(), IVec2::new(1, 1), 1)
            .unwrap();
        editor.undo(&mut world);
        editor.redo(&mut world);

        let level = world.level(0).unwrap();
        assert_eq!(level.get_tile_at(IVec2::new(1, 1), 1).unwrap().id(), id);
        assert_eq!(editor.undo_count(), 1);
        assert_eq!(editor.redo_count(), 0);
    }

    #[test]
    fn remove_and_undo() {
        let mut world = world();
        let mut editor = Editor::new();
        editor
            .place_tile(&mut world, 0, grass(), IVec2::new(2, 6), 0)
            .unwrap();

        let removed = editor
            .remove_tile(&mut world, 0, IVec2::new(2, 6), 0)
            .unwrap();
        assert_eq!(removed.template().name, "grass");
        assert_eq!(world.tile_count(), 0);

        editor.undo(&mut world);
        assert_eq!(world.tile_count(), 1);
    }

    #[test]
    fn remove_missing_records_nothing() {
        let mut world = world();
        let mut editor = Editor::new();
        let err = editor.remove_tile(&mut world, 0, IVec2::ZERO, 0).unwrap_err();
        assert!(matches!(err, EditError::NoTileAt { .. }));
        assert!(!editor.can_undo());
    }

    #[test]
    fn failed_place_records_nothing() {
        let mut world = world();
        let mut editor = Editor::new();
        assert!(editor
            .place_tile(&mut world, 0, grass(), IVec2::new(20, 20), 0)
            .is_err());
        assert!(matches!(
            editor.place_tile(&mut world, 3, grass(), IVec2::ZERO, 0),
            Err(EditError::LevelNotFound(3))
        ));
        assert_eq!(editor.undo_count(), 0);
    }

    #[test]
    fn paste_undo_restores_every_room() {
        let mut world = world();
        let mut editor = Editor::new();
        let mut grid = TileGrid::new(IVec2::new(2, 2), 0, 1);
        for cell in [IVec2::ZERO, IVec2::new(1, 0), IVec2::new(0, 1), IVec2::ONE] {
            grid.create_tile(grass(), cell, 0).unwrap();
        }

        // Straddles all four rooms.
        let pasted = editor.paste(&mut world, 0, &grid, IVec2::new(3, 3)).unwrap();
        assert_eq!(pasted, 4);
        assert_eq!(editor.undo_stack[0].room_count(), 4);

        editor.undo(&mut world);
        assert_eq!(world.tile_count(), 0);
        editor.redo(&mut world);
        assert_eq!(world.tile_count(), 4);
    }

    #[test]
    fn new_edit_clears_redo() {
        let mut world = world();
        let mut editor = Editor::new();
        editor
            .place_tile(&mut world, 0, grass(), IVec2::ZERO, 0)
            .unwrap();
        editor.undo(&mut world);
        editor
            .place_tile(&mut world, 0, grass(), IVec2::ONE, 0)
            .unwrap();
        assert!(!editor.can_redo());
    }

    #[test]
    fn undo_after_resize_skips_dropped_room() {
        let mut world = world();
        let mut editor = Editor::new();
        editor
            .place_tile(&mut world, 0, grass(), IVec2::new(6, 6), 0)
            .unwrap();
        world.level_mut(0).unwrap().resize(IVec2::ONE).unwrap();

        assert!(editor.undo(&mut world));
        assert_eq!(world.tile_count(), 0);
    }

    #[test]
    fn empty_stacks() {
        let mut world = world();
        let mut editor = Editor::default();
        assert!(!editor.undo(&mut world));
        assert!(!editor.redo(&mut world));
    }
}
