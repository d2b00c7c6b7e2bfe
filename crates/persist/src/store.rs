//! Entry points for saving and loading world files.

use std::path::Path;

use tileworld_assets::TemplateCatalog;
use tileworld_kernel::World;

use crate::format::{SaveOptions, WorldFileError};
use crate::reader::{LoadedWorld, NoLocator, ResourceLocator, WorldReader};
use crate::writer::WorldWriter;

/// The binary world file codec.
///
/// Both directions need the template catalog: saving looks up which tileset
/// addresses each template, loading resolves every stored name.
pub struct WorldFile;

impl WorldFile {
    /// Encode `world` into a byte buffer.
    pub fn save(
        world: &World,
        catalog: &TemplateCatalog,
        options: SaveOptions,
    ) -> Result<Vec<u8>, WorldFileError> {
        let _span = tracing::info_span!("save_world", world = %world.id(), version = options.version)
            .entered();
        let bytes = WorldWriter::new(catalog, options)?.write(world);
        tracing::info!(bytes = bytes.len(), levels = world.level_count(), "world saved");
        Ok(bytes)
    }

    /// Decode a world; missing resources are recorded in the report.
    pub fn load(data: &[u8], catalog: &TemplateCatalog) -> Result<LoadedWorld, WorldFileError> {
        Self::load_with(data, catalog, &mut NoLocator)
    }

    /// Decode a world, asking `locator` for substitutes of missing resources.
    pub fn load_with(
        data: &[u8],
        catalog: &TemplateCatalog,
        locator: &mut dyn ResourceLocator,
    ) -> Result<LoadedWorld, WorldFileError> {
        let _span = tracing::info_span!("load_world", bytes = data.len()).entered();
        let loaded = WorldReader::new(data, catalog, locator).read()?;
        tracing::info!(
            world = %loaded.world.id(),
            version = loaded.version,
            levels = loaded.world.level_count(),
            clean = loaded.report.is_clean(),
            "world loaded"
        );
        Ok(loaded)
    }

    /// Save to `path` through a sibling temporary file, so a failed write
    /// never leaves a half-written world behind.
    pub fn save_to_path(
        path: impl AsRef<Path>,
        world: &World,
        catalog: &TemplateCatalog,
        options: SaveOptions,
    ) -> Result<(), WorldFileError> {
        let path = path.as_ref();
        let bytes = Self::save(world, catalog, options)?;
        let mut temp = path.as_os_str().to_owned();
        temp.push(".tmp");
        std::fs::write(&temp, &bytes)?;
        std::fs::rename(&temp, path)?;
        tracing::debug!(path = %path.display(), "world file written");
        Ok(())
    }

    pub fn load_from_path(
        path: impl AsRef<Path>,
        catalog: &TemplateCatalog,
        locator: &mut dyn ResourceLocator,
    ) -> Result<LoadedWorld, WorldFileError> {
        let data = std::fs::read(path.as_ref())?;
        Self::load_with(&data, catalog, locator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{FormatError, MAGIC};
    use crate::reader::Located;
    use glam::IVec2;
    use std::sync::Arc;
    use tileworld_assets::{ActionTileData, CatalogBuilder, ResourceKind, TileData, Zone};
    use tileworld_kernel::{Area, Level, MapType, Script, Trigger};
    use tileworld_properties::{Property, PropertyValue, Properties};

    fn catalog() -> TemplateCatalog {
        let mut b = CatalogBuilder::new();
        b.add_tile_type("solid").unwrap();
        b.add_zone(Zone {
            id: "forest".into(),
            name: "Forest".into(),
            image_variant_id: 3,
            default_tile_data: None,
        })
        .unwrap();
        b.add_zone(Zone {
            id: "cave".into(),
            name: "Cave".into(),
            image_variant_id: 1,
            default_tile_data: None,
        })
        .unwrap();
        let mut defaults = Properties::new();
        defaults.set("hp", 4);
        let mut chest = TileData::new("chest")
            .with_properties(defaults)
            .with_events(["opened"]);
        chest.tile_type = Some("solid".into());
        b.add_tile_data(chest).unwrap();
        b.add_tile_data(TileData::new("statue").with_size(IVec2::new(2, 2)))
            .unwrap();
        b.add_tile_data(TileData::new("bush")).unwrap();
        b.add_tile_data(TileData::new("rock")).unwrap();
        b.add_action_tile_data(ActionTileData::new("warp").with_events(["touched"]))
            .unwrap();
        b.add_tileset(
            "overworld",
            IVec2::new(2, 1),
            vec![Some("bush".into()), Some("rock".into())],
        )
        .unwrap();
        b.build().unwrap()
    }

    fn sample_world(catalog: &TemplateCatalog) -> World {
        let mut world = World::new("demo");
        world.scripts.insert(Script::new("give_key", "give(key);"));
        let mut described = Script::new("open_gate", "gate.open();");
        described.description = "Opens the gate".into();
        described
            .parameters
            .push(tileworld_assets::ScriptParameter::new("Room", "room"));
        world.scripts.insert(described);
        world.properties.set("title", "Demo");
        world.triggers.push(Trigger::for_event("start_game", "open_gate"));

        let mut dungeon = Area::new("d1");
        dungeon.set_map_type(MapType::Dungeon);
        dungeon.set_small_keys(2);
        world.add_area(dungeon).unwrap();

        let mut level = Level::new("overworld", IVec2::new(2, 2), IVec2::new(10, 8), 2).unwrap();
        level.set_area_id(Some("d1"));
        level.set_dungeon_floor(Some(1));
        level.set_zone(catalog.zone("forest").cloned());
        level.properties.set_property(Property::new(
            "spawns",
            vec![
                Property::new("first", IVec2::new(1, 2)),
                Property::new("second", 2.5f32),
                Property::new("third", true),
            ],
        ));

        let room = level.room_at_mut(IVec2::new(1, 0)).unwrap();
        room.set_zone(catalog.zone("cave").cloned());
        room.properties.set("dark", true);
        let chest = catalog.tile_data("chest").unwrap().clone();
        let id = room.create_tile(chest, IVec2::new(2, 2), 0).unwrap();
        let tile = room.tile_mut(id).unwrap();
        tile.properties.set("hp", 9);
        tile.triggers.push(Trigger::for_event("opened", "give_key"));
        room.create_tile(catalog.tile_data("statue").unwrap().clone(), IVec2::new(5, 5), 1)
            .unwrap();
        room.create_tile(catalog.tile_data("rock").unwrap().clone(), IVec2::new(0, 0), 0)
            .unwrap();
        let warp = room.create_action_tile(
            catalog.action_tile_data("warp").unwrap().clone(),
            IVec2::new(40, 24),
        );
        room.action_tile_mut(warp)
            .unwrap()
            .triggers
            .push(Trigger::for_event("touched", "open_gate"));

        world.add_level(level);
        world.set_start(0, IVec2::new(1, 0), IVec2::new(4, 3)).unwrap();
        world
    }

    #[test]
    fn round_trip_every_version() {
        let catalog = catalog();
        let world = sample_world(&catalog);
        for version in [2, 3, 4] {
            let bytes = WorldFile::save(&world, &catalog, SaveOptions::version(version)).unwrap();
            let loaded = WorldFile::load(&bytes, &catalog).unwrap();
            assert_eq!(loaded.version, version);
            assert!(loaded.report.is_clean(), "v{version}: {:?}", loaded.report);
            let w = &loaded.world;

            assert_eq!(w.id(), "demo");
            assert_eq!(w.level_count(), 1);
            assert_eq!(w.room_count(), world.room_count());
            assert_eq!(w.tile_count(), world.tile_count());
            assert_eq!(w.action_tile_count(), 1);
            assert_eq!(w.start_level_index(), 0);
            assert_eq!(w.start_room(), IVec2::new(1, 0));
            assert_eq!(w.start_tile(), IVec2::new(4, 3));
            assert_eq!(w.properties, world.properties);
            assert_eq!(w.scripts.len(), 2);
            assert_eq!(w.area("d1").unwrap().small_keys(), 2);
            assert_eq!(w.dungeons().count(), 1);

            let level = w.level(0).unwrap();
            assert_eq!(level.properties, world.level(0).unwrap().properties);
            let names: Vec<&str> = level
                .properties
                .get_list("spawns")
                .iter()
                .map(|p| p.name.as_str())
                .collect();
            assert_eq!(names, vec!["first", "second", "third"]);
            assert_eq!(level.zone().unwrap().id, "forest");
            assert_eq!(w.dungeon_floors("d1")[0].level, Some(0));

            let room = level.room_at(IVec2::new(1, 0)).unwrap();
            assert_eq!(room.zone().unwrap().image_variant_id, 1);
            assert!(room.properties.get_bool("dark", false));
            let chest = room.get_tile(IVec2::new(2, 2), 0).unwrap();
            assert_eq!(chest.template().name, "chest");
            assert_eq!(chest.properties.get_int("hp", 0), 9);
            assert!(chest.triggers.handles_event("opened"));
            let statue = room.get_tile(IVec2::new(6, 6), 1).unwrap();
            assert_eq!(statue.location(), IVec2::new(5, 5));
            assert_eq!(room.get_tile(IVec2::ZERO, 0).unwrap().template().name, "rock");
            assert_eq!(room.action_tiles()[0].position, IVec2::new(40, 24));
            assert!(room.action_tiles()[0].triggers.handles_event("touched"));
            assert!(w.triggers.handles_event("start_game"));
        }
    }

    #[test]
    fn version_specific_script_info() {
        let catalog = catalog();
        let world = sample_world(&catalog);

        let v2 = WorldFile::save(&world, &catalog, SaveOptions::version(2)).unwrap();
        let gate = WorldFile::load(&v2, &catalog).unwrap().world.scripts.get("open_gate").cloned();
        assert_eq!(gate.unwrap().description, "");

        let v3 = WorldFile::save(&world, &catalog, SaveOptions::version(3)).unwrap();
        let loaded = WorldFile::load(&v3, &catalog).unwrap().world;
        let gate = loaded.scripts.get("open_gate").unwrap();
        assert_eq!(gate.description, "Opens the gate");
        assert_eq!(gate.parameters.len(), 1);
    }

    #[test]
    fn v4_keeps_trigger_flags() {
        let catalog = catalog();
        let mut world = sample_world(&catalog);
        let mut trigger = Trigger::new("once");
        trigger.event = Some("start_game".into());
        trigger.fire_once = true;
        trigger.enabled = false;
        trigger.description = "first visit".into();
        world.triggers.push(trigger.clone());

        let bytes = WorldFile::save(&world, &catalog, SaveOptions::default()).unwrap();
        let loaded = WorldFile::load(&bytes, &catalog).unwrap().world;
        assert_eq!(loaded.triggers.iter().nth(1), Some(&trigger));
    }

    #[test]
    fn legacy_opened_property_becomes_one_trigger() {
        let catalog = catalog();
        let mut world = World::new("legacy");
        world.scripts.insert(Script::new("give_key", "give(key);"));
        let mut level = Level::new("l", IVec2::ONE, IVec2::new(4, 4), 1).unwrap();
        let room = level.room_at_mut(IVec2::ZERO).unwrap();
        let id = room
            .create_tile(catalog.tile_data("chest").unwrap().clone(), IVec2::ONE, 0)
            .unwrap();
        room.tile_mut(id).unwrap().properties.set("opened", "give_key");
        world.add_level(level);

        let bytes = WorldFile::save(&world, &catalog, SaveOptions::version(2)).unwrap();
        let loaded = WorldFile::load(&bytes, &catalog).unwrap();
        let room = loaded.world.level(0).unwrap().room_at(IVec2::ZERO).unwrap();
        let chest = room.get_tile(IVec2::ONE, 0).unwrap();
        let triggers: Vec<&Trigger> = chest.triggers.iter().collect();
        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0].event.as_deref(), Some("opened"));
        assert_eq!(triggers[0].script.as_deref(), Some("give_key"));
        assert!(!chest.properties.contains_own("opened"));
        assert_eq!(loaded.report.migrated_triggers, 1);
    }

    #[test]
    fn bad_magic_and_version_rejected() {
        let catalog = catalog();
        assert!(matches!(
            WorldFile::load(b"NOPE\x04\0\0\0", &catalog),
            Err(WorldFileError::Format(FormatError::BadMagic(_)))
        ));
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&9i32.to_le_bytes());
        assert!(matches!(
            WorldFile::load(&bytes, &catalog),
            Err(WorldFileError::Format(FormatError::UnsupportedVersion(9)))
        ));
        assert!(matches!(
            WorldFile::save(&World::new("x"), &catalog, SaveOptions::version(1)),
            Err(WorldFileError::Format(FormatError::UnsupportedVersion(1)))
        ));
    }

    #[test]
    fn truncated_file_fails_without_partial_world() {
        let catalog = catalog();
        let bytes = WorldFile::save(&sample_world(&catalog), &catalog, SaveOptions::default())
            .unwrap();
        for cut in [3, 12, bytes.len() / 2, bytes.len() - 1] {
            assert!(matches!(
                WorldFile::load(&bytes[..cut], &catalog),
                Err(WorldFileError::Format(FormatError::Truncated { .. }))
            ));
        }
    }

    /// Minimal v4 file: no strings needed beyond `names`, no resources, one
    /// world object whose property block is `props`.
    fn handmade(names: &[&str], props: &[u8]) -> Vec<u8> {
        let mut out = MAGIC.to_vec();
        for v in [4i32, 0, 0, 0, 0, 0] {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out.extend_from_slice(&(names.len() as i32).to_le_bytes());
        for name in names {
            out.extend_from_slice(&(name.len() as i32).to_le_bytes());
            out.extend_from_slice(name.as_bytes());
        }
        out.extend_from_slice(&[0u8; 32]);
        // Scripts, world id.
        out.extend_from_slice(&0i32.to_le_bytes());
        out.extend_from_slice(&(-1i32).to_le_bytes());
        out.extend_from_slice(props);
        // Triggers, areas, levels.
        out.extend_from_slice(&[0u8; 12]);
        out
    }

    #[test]
    fn unknown_property_type_is_dropped() {
        let mut props = Vec::new();
        props.extend_from_slice(&2i32.to_le_bytes());
        // "mystery": tag 9 with a 3-byte payload.
        props.extend_from_slice(&0i32.to_le_bytes());
        props.push(9);
        props.extend_from_slice(&3i32.to_le_bytes());
        props.extend_from_slice(&[1, 2, 3]);
        // "speed": integer 7.
        props.extend_from_slice(&1i32.to_le_bytes());
        props.push(0);
        props.extend_from_slice(&4i32.to_le_bytes());
        props.extend_from_slice(&7i32.to_le_bytes());

        let catalog = catalog();
        let loaded = WorldFile::load(&handmade(&["mystery", "speed"], &props), &catalog).unwrap();
        assert_eq!(loaded.report.dropped_properties, 1);
        assert!(!loaded.world.properties.contains("mystery"));
        assert_eq!(loaded.world.properties.get_int("speed", 0), 7);
        assert_eq!(
            loaded.world.properties.get_value("speed"),
            Some(&PropertyValue::Integer(7))
        );
    }

    #[test]
    fn missing_template_is_substituted() {
        let full = catalog();
        let world = sample_world(&full);
        let bytes = WorldFile::save(&world, &full, SaveOptions::default()).unwrap();

        let mut b = CatalogBuilder::new();
        b.add_tile_type("solid").unwrap();
        b.add_tile_data(TileData::new("crate")).unwrap();
        b.add_tile_data(TileData::new("statue").with_size(IVec2::new(2, 2)))
            .unwrap();
        b.add_tile_data(TileData::new("bush")).unwrap();
        b.add_tile_data(TileData::new("rock")).unwrap();
        b.add_action_tile_data(ActionTileData::new("warp")).unwrap();
        b.add_tileset(
            "overworld",
            IVec2::new(2, 1),
            vec![Some("bush".into()), Some("rock".into())],
        )
        .unwrap();
        let partial = b.build().unwrap();

        let mut asked = Vec::new();
        let mut locator = |kind: ResourceKind, name: &str| {
            asked.push((kind, name.to_string()));
            match (kind, name) {
                (ResourceKind::TileData, "chest") => Located::substitute("crate"),
                _ => Located::default(),
            }
        };
        let loaded = WorldFile::load_with(&bytes, &partial, &mut locator).unwrap();
        let room = loaded.world.level(0).unwrap().room_at(IVec2::new(1, 0)).unwrap();
        assert_eq!(room.get_tile(IVec2::new(2, 2), 0).unwrap().template().name, "crate");
        assert_eq!(loaded.report.substitutions.len(), 1);
        // Both zones are missing and stay unresolved; the rooms simply lose them.
        assert_eq!(loaded.report.unresolved.len(), 2);
        assert!(loaded.world.level(0).unwrap().zone().is_none());
        assert!(asked.contains(&(ResourceKind::Zone, "forest".to_string())));
    }

    #[test]
    fn skip_remaining_stops_prompting() {
        let full = catalog();
        let bytes = WorldFile::save(&sample_world(&full), &full, SaveOptions::default()).unwrap();
        let empty = CatalogBuilder::new().build().unwrap();

        let mut prompts = 0;
        let mut locator = |_: ResourceKind, _: &str| {
            prompts += 1;
            Located::skip_remaining()
        };
        let loaded = WorldFile::load_with(&bytes, &empty, &mut locator).unwrap();
        assert_eq!(prompts, 1);
        assert!(loaded.report.unresolved.len() > 1);
        assert_eq!(loaded.world.tile_count(), 0);
        assert_eq!(loaded.report.dropped_tiles, 3);
        assert_eq!(loaded.report.dropped_action_tiles, 1);
        assert_eq!(loaded.world.room_count(), 4);
    }

    #[test]
    fn substitution_cycle_ends_unresolved() {
        let full = catalog();
        let bytes = WorldFile::save(&sample_world(&full), &full, SaveOptions::default()).unwrap();
        let empty = CatalogBuilder::new().build().unwrap();
        let mut locator = |_: ResourceKind, name: &str| {
            Located::substitute(if name == "a" { "b" } else { "a" })
        };
        let loaded = WorldFile::load_with(&bytes, &empty, &mut locator).unwrap();
        assert!(loaded.report.substitutions.is_empty());
        assert!(!loaded.report.unresolved.is_empty());
    }

    #[test]
    fn file_store_round_trip() {
        let catalog = catalog();
        let world = sample_world(&catalog);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.world");
        WorldFile::save_to_path(&path, &world, &catalog, SaveOptions::default()).unwrap();
        assert!(!dir.path().join("demo.world.tmp").exists());
        let loaded = WorldFile::load_from_path(&path, &catalog, &mut NoLocator).unwrap();
        assert_eq!(loaded.world.tile_count(), world.tile_count());
        assert!(matches!(
            WorldFile::load_from_path(dir.path().join("missing"), &catalog, &mut NoLocator),
            Err(WorldFileError::Io(_))
        ));
    }

    #[test]
    fn layer_count_bounds_round_trip() {
        let catalog = catalog();
        let rock = catalog.tile_data("rock").unwrap().clone();
        for layer_count in [1, tileworld_kernel::MAX_LAYER_COUNT] {
            let mut world = World::new("layers");
            let mut level = Level::new("l0", IVec2::ONE, IVec2::new(4, 4), layer_count).unwrap();
            level
                .create_tile_at(Arc::clone(&rock), IVec2::new(1, 1), layer_count - 1)
                .unwrap();
            world.add_level(level);

            let bytes = WorldFile::save(&world, &catalog, SaveOptions::default()).unwrap();
            let loaded = WorldFile::load(&bytes, &catalog).unwrap().world;
            let level = loaded.level(0).unwrap();
            assert_eq!(level.layer_count(), layer_count);
            let tile = level.get_tile_at(IVec2::new(1, 1), layer_count - 1).unwrap();
            assert_eq!(tile.template().name, "rock");
        }
    }

    #[test]
    fn tables_are_deduplicated() {
        let catalog = catalog();
        let mut world = sample_world(&catalog);
        let level = world.level_mut(0).unwrap();
        let rock = catalog.tile_data("rock").unwrap().clone();
        for x in 0..10 {
            level
                .room_at_mut(IVec2::ZERO)
                .unwrap()
                .create_tile(Arc::clone(&rock), IVec2::new(x, 7), 0)
                .unwrap();
        }
        let bytes = WorldFile::save(&world, &catalog, SaveOptions::default()).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert_eq!(text.matches("overworld").count(), 1);
    }
}
