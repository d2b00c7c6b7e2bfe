use std::sync::Arc;

use glam::IVec2;
use tileworld_assets::{ActionTileData, ResourceKind, TemplateCatalog, TileData, Zone};
use tileworld_kernel::{Level, Room, ScriptManager, Triggers, World};
use tileworld_properties::{Property, PropertyValue, Properties};

use crate::bytes::ByteWriter;
use crate::format::{
    FormatError, MAGIC, SaveOptions, SUPPORTED_VERSIONS, TILE_LOOSE, TILE_NONE,
    VERSION_LEGACY_SCRIPTS, VERSION_SCRIPT_INFO, VERSION_TRIGGERS,
};
use crate::tables::{ResourceTables, StringTable};

/// Serializes a [`World`] into the binary world format.
///
/// The tree is written into a buffer first; strings and resources are
/// registered in their tables as they are met, and the tables are emitted
/// ahead of the buffered tree once it is complete.
pub(crate) struct WorldWriter<'a> {
    catalog: &'a TemplateCatalog,
    version: i32,
    strings: StringTable,
    resources: ResourceTables,
    tree: ByteWriter,
}

impl<'a> WorldWriter<'a> {
    pub fn new(catalog: &'a TemplateCatalog, options: SaveOptions) -> Result<Self, FormatError> {
        if !SUPPORTED_VERSIONS.contains(&options.version) {
            return Err(FormatError::UnsupportedVersion(options.version));
        }
        Ok(Self {
            catalog,
            version: options.version,
            strings: StringTable::default(),
            resources: ResourceTables::default(),
            tree: ByteWriter::new(),
        })
    }

    pub fn write(mut self, world: &World) -> Vec<u8> {
        self.write_tree(world);

        let mut out = ByteWriter::new();
        out.bytes(&MAGIC);
        out.i32(self.version);
        out.i32(world.start_level_index() as i32);
        out.ivec2(world.start_room());
        out.ivec2(world.start_tile());
        self.strings.write(&mut out);
        self.resources.write(&mut out);
        tracing::debug!(
            version = self.version,
            strings = self.strings.len(),
            tile_data = self.resources.count(ResourceKind::TileData),
            tree_bytes = self.tree.len(),
            "world file tables written"
        );
        out.bytes(self.tree.as_slice());
        out.into_inner()
    }

    fn write_tree(&mut self, world: &World) {
        if self.version >= VERSION_SCRIPT_INFO {
            self.write_scripts(&world.scripts);
        }
        self.string(Some(world.id()));
        self.write_object(&world.properties, &world.triggers);

        self.tree.len_prefix(world.areas().len());
        for area in world.areas() {
            self.string(Some(area.id()));
            self.write_object(&area.properties, &area.triggers);
        }

        self.tree.len_prefix(world.levels().len());
        for level in world.levels() {
            self.write_level(level);
        }

        if self.version == VERSION_LEGACY_SCRIPTS {
            self.write_scripts(&world.scripts);
        }
    }

    fn string(&mut self, value: Option<&str>) {
        let index = self.strings.intern_opt(value);
        self.tree.i32(index);
    }

    fn resource(&mut self, kind: ResourceKind, name: Option<&str>) -> i32 {
        self.resources.reference_opt(&mut self.strings, kind, name)
    }

    fn write_scripts(&mut self, scripts: &ScriptManager) {
        self.tree.len_prefix(scripts.len());
        for script in scripts.iter() {
            self.string(Some(&script.id));
            self.string(Some(&script.code));
            if self.version >= VERSION_SCRIPT_INFO {
                self.string(Some(&script.description));
                self.tree.len_prefix(script.parameters.len());
                for parameter in &script.parameters {
                    self.string(Some(&parameter.type_name));
                    self.string(Some(&parameter.name));
                }
            }
            self.tree.bool(script.hidden);
        }
    }

    fn write_object(&mut self, properties: &Properties, triggers: &Triggers) {
        let block = self.encode_properties(properties.own());
        self.tree.bytes(block.as_slice());
        self.write_triggers(triggers);
    }

    /// Encode a property block into its own buffer so list payloads can be
    /// length-prefixed.
    fn encode_properties<'p>(
        &mut self,
        properties: impl IntoIterator<Item = &'p Property>,
    ) -> ByteWriter {
        let properties: Vec<&Property> = properties.into_iter().collect();
        let mut block = ByteWriter::new();
        block.len_prefix(properties.len());
        for property in properties {
            block.i32(self.strings.intern(&property.name));
            block.u8(property.value.property_type().tag());
            let payload = self.encode_value(&property.value);
            block.len_prefix(payload.len());
            block.bytes(payload.as_slice());
        }
        block
    }

    fn encode_value(&mut self, value: &PropertyValue) -> ByteWriter {
        let mut payload = ByteWriter::new();
        match value {
            PropertyValue::Integer(i) => payload.i32(*i),
            PropertyValue::Float(f) => payload.f32(*f),
            PropertyValue::Boolean(b) => payload.bool(*b),
            PropertyValue::String(s) => payload.i32(self.strings.intern(s)),
            PropertyValue::Point(p) => payload.ivec2(*p),
            PropertyValue::List(children) => return self.encode_properties(children),
        }
        payload
    }

    fn write_triggers(&mut self, triggers: &Triggers) {
        if self.version >= VERSION_TRIGGERS {
            self.tree.len_prefix(triggers.len());
            for trigger in triggers.iter() {
                self.string(Some(&trigger.name));
                self.string(trigger.event.as_deref());
                self.string(trigger.script.as_deref());
                self.tree.bool(trigger.enabled);
                self.tree.bool(trigger.fire_once);
                self.string(Some(&trigger.description));
            }
            return;
        }

        // Older formats hold one script per event and nothing else.
        let mut map: Vec<(&str, &str)> = Vec::new();
        for trigger in triggers.iter().filter(|t| t.enabled) {
            let (Some(event), Some(script)) = (trigger.event.as_deref(), trigger.script.as_deref())
            else {
                continue;
            };
            if !map.iter().any(|(e, _)| *e == event) {
                map.push((event, script));
            }
        }
        if map.len() != triggers.len() {
            tracing::debug!(
                triggers = triggers.len(),
                kept = map.len(),
                version = self.version,
                "triggers flattened to event map"
            );
        }
        self.tree.len_prefix(map.len());
        for (event, script) in map {
            self.string(Some(event));
            self.string(Some(script));
        }
    }

    fn zone(&mut self, zone: Option<&Arc<Zone>>) {
        let index = self.resource(ResourceKind::Zone, zone.map(|z| z.id.as_str()));
        self.tree.i32(index);
    }

    fn write_level(&mut self, level: &Level) {
        self.string(Some(level.id()));
        self.write_object(&level.properties, &level.triggers);
        self.tree.ivec2(level.dimensions());
        self.tree.ivec2(level.room_size());
        self.tree.i32(level.layer_count() as i32);
        self.zone(level.zone());
        for room in level.rooms() {
            self.write_room(room);
        }
    }

    fn write_room(&mut self, room: &Room) {
        self.write_object(&room.properties, &room.triggers);
        self.zone(room.zone());

        let size = room.size();
        for y in 0..size.y {
            for x in 0..size.x {
                let location = IVec2::new(x, y);
                match room.get_tile(location, 0).filter(|t| t.is_anchor(location)) {
                    Some(tile) => {
                        self.write_template(tile.template());
                        self.write_object(&tile.properties, &tile.triggers);
                    }
                    None => self.tree.i32(TILE_NONE),
                }
            }
        }

        let upper: Vec<_> = room.placed_tiles().filter(|t| t.layer() > 0).collect();
        self.tree.len_prefix(upper.len());
        for tile in upper {
            self.tree.i32(tile.layer() as i32);
            self.tree.ivec2(tile.location());
            self.write_template(tile.template());
            self.write_object(&tile.properties, &tile.triggers);
        }

        self.tree.len_prefix(room.action_tile_count());
        for action in room.action_tiles() {
            let index = self.action_template(action.template());
            self.tree.i32(index);
            self.tree.ivec2(action.position);
            self.write_object(&action.properties, &action.triggers);
        }
    }

    /// Tile entry head: tileset cell when the catalog places the template in
    /// a tileset, otherwise a loose tile-data reference.
    fn write_template(&mut self, template: &Arc<TileData>) {
        self.template_dependencies(template);
        match self.catalog.tileset_location(&template.name) {
            Some((tileset, cell)) => {
                let name = tileset.name.clone();
                let index = self.resource(ResourceKind::Tileset, Some(&name));
                self.tree.i32(index);
                self.tree.ivec2(cell);
            }
            None => {
                let index = self.resource(ResourceKind::TileData, Some(&template.name));
                self.tree.i32(TILE_LOOSE);
                self.tree.i32(index);
            }
        }
    }

    fn template_dependencies(&mut self, template: &TileData) {
        self.resource(ResourceKind::TileType, template.tile_type.as_deref());
        self.resource(ResourceKind::Sprite, template.sprite.as_deref());
        self.resource(ResourceKind::Animation, template.animation.as_deref());
        self.resource(ResourceKind::CollisionModel, template.collision_model.as_deref());
    }

    fn action_template(&mut self, template: &ActionTileData) -> i32 {
        self.resource(ResourceKind::TileType, template.tile_type.as_deref());
        self.resource(ResourceKind::Sprite, template.sprite.as_deref());
        self.resource(ResourceKind::Animation, template.animation.as_deref());
        self.resource(ResourceKind::ActionTileData, Some(&template.name))
    }
}
