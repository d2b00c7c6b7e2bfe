use std::sync::Arc;

use glam::IVec2;
use tileworld_assets::{ActionTileData, ResourceKind, TemplateCatalog, TileData, Tileset, Zone};
use tileworld_common::{ActionTileId, TileId};
use tileworld_kernel::{
    ActionTileDataInstance, Area, Level, Room, Script, ScriptManager, TileDataInstance, Trigger,
    Triggers, World,
};
use tileworld_properties::{Properties, Property, PropertyType, PropertyValue};

use crate::bytes::ByteReader;
use crate::format::{
    FormatError, MAGIC, MAX_LAYER_COUNT, NONE_INDEX, SUPPORTED_VERSIONS, TILE_LOOSE, TILE_NONE,
    VERSION_LEGACY_SCRIPTS, VERSION_SCRIPT_INFO, VERSION_TRIGGERS,
};
use crate::migrate::migrate_events;

/// Answer to a missing-resource prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Located {
    /// Name to try instead of the missing one.
    pub substitute: Option<String>,
    /// Stop prompting for the rest of this load.
    pub skip_remaining: bool,
}

impl Located {
    pub fn substitute(name: impl Into<String>) -> Self {
        Self {
            substitute: Some(name.into()),
            skip_remaining: false,
        }
    }

    pub fn skip_remaining() -> Self {
        Self {
            substitute: None,
            skip_remaining: true,
        }
    }
}

/// Called when a world file names a resource the catalog does not have.
pub trait ResourceLocator {
    fn locate(&mut self, kind: ResourceKind, name: &str) -> Located;
}

/// Never offers a substitute; every miss is recorded as unresolved.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocator;

impl ResourceLocator for NoLocator {
    fn locate(&mut self, _kind: ResourceKind, _name: &str) -> Located {
        Located::default()
    }
}

impl<F> ResourceLocator for F
where
    F: FnMut(ResourceKind, &str) -> Located,
{
    fn locate(&mut self, kind: ResourceKind, name: &str) -> Located {
        self(kind, name)
    }
}

/// A missing resource replaced through the locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub kind: ResourceKind,
    pub original: String,
    pub substitute: String,
}

/// A resource reference that could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingResource {
    pub kind: ResourceKind,
    pub name: String,
}

/// What a load had to repair or leave out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub substitutions: Vec<Substitution>,
    pub unresolved: Vec<MissingResource>,
    /// Tiles whose template could not be resolved.
    pub dropped_tiles: usize,
    pub dropped_action_tiles: usize,
    /// Properties of an unknown type.
    pub dropped_properties: usize,
    /// Triggers created from pre-trigger event data.
    pub migrated_triggers: usize,
    /// Whether the stored start position had to be clamped.
    pub start_repaired: bool,
}

impl LoadReport {
    /// Whether the world loaded exactly as stored.
    pub fn is_clean(&self) -> bool {
        self.substitutions.is_empty()
            && self.unresolved.is_empty()
            && self.dropped_tiles == 0
            && self.dropped_action_tiles == 0
            && self.dropped_properties == 0
            && !self.start_repaired
    }
}

/// A decoded world together with the file version it came from.
#[derive(Debug)]
pub struct LoadedWorld {
    pub world: World,
    pub version: i32,
    pub report: LoadReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Closed,
    Header,
    Tables,
    Tree,
}

/// Event data as stored for one object.
enum EventData {
    Triggers(Triggers),
    Legacy(Vec<(String, String)>),
}

/// Object whose legacy event data is migrated once scripts are known.
#[derive(Debug, Clone, Copy)]
enum ObjectPath {
    World,
    Area(usize),
    Level(usize),
    Room(usize, IVec2),
    Tile(usize, IVec2, TileId),
    ActionTile(usize, IVec2, ActionTileId),
}

struct StartPosition {
    level: i32,
    room: IVec2,
    tile: IVec2,
}

struct LoadedTile {
    template: Option<Arc<TileData>>,
    properties: Properties,
    events: EventData,
}

/// Decodes the binary world format.
pub(crate) struct WorldReader<'a> {
    input: ByteReader<'a>,
    catalog: &'a TemplateCatalog,
    locator: &'a mut dyn ResourceLocator,
    phase: Phase,
    version: i32,
    strings: Vec<String>,
    /// Resolved name per resource table entry; `None` when unresolved.
    tables: [Vec<Option<String>>; 8],
    skip_prompts: bool,
    pending: Vec<(ObjectPath, Vec<(String, String)>)>,
    report: LoadReport,
}

impl<'a> WorldReader<'a> {
    pub fn new(
        data: &'a [u8],
        catalog: &'a TemplateCatalog,
        locator: &'a mut dyn ResourceLocator,
    ) -> Self {
        Self {
            input: ByteReader::new(data),
            catalog,
            locator,
            phase: Phase::Closed,
            version: 0,
            strings: Vec::new(),
            tables: Default::default(),
            skip_prompts: false,
            pending: Vec::new(),
            report: LoadReport::default(),
        }
    }

    fn enter(&mut self, phase: Phase) {
        tracing::debug!(
            from = ?self.phase,
            to = ?phase,
            offset = self.input.position(),
            "world file phase"
        );
        self.phase = phase;
    }

    pub fn read(mut self) -> Result<LoadedWorld, FormatError> {
        self.enter(Phase::Header);
        let start = self.read_header()?;

        self.enter(Phase::Tables);
        self.read_strings()?;
        self.read_resource_tables()?;

        self.enter(Phase::Tree);
        let mut world = self.read_tree()?;

        let level = usize::try_from(start.level).unwrap_or(0);
        self.report.start_repaired = world.restore_start(level, start.room, start.tile)
            || start.level < 0;
        if self.input.remaining() > 0 {
            tracing::warn!(bytes = self.input.remaining(), "trailing data after world tree");
        }

        self.enter(Phase::Closed);
        Ok(LoadedWorld {
            world,
            version: self.version,
            report: self.report,
        })
    }

    // --- header and tables ---

    fn read_header(&mut self) -> Result<StartPosition, FormatError> {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(self.input.bytes(4)?);
        if magic != MAGIC {
            return Err(FormatError::BadMagic(magic));
        }
        self.version = self.input.i32()?;
        if !SUPPORTED_VERSIONS.contains(&self.version) {
            return Err(FormatError::UnsupportedVersion(self.version));
        }
        Ok(StartPosition {
            level: self.input.i32()?,
            room: self.input.ivec2()?,
            tile: self.input.ivec2()?,
        })
    }

    fn read_strings(&mut self) -> Result<(), FormatError> {
        let count = self.input.count()?;
        for i in 0..count {
            let len = self.input.count()?;
            let bytes = self.input.bytes(len)?;
            let s = std::str::from_utf8(bytes).map_err(|_| FormatError::InvalidString(i))?;
            self.strings.push(s.to_string());
        }
        Ok(())
    }

    fn read_resource_tables(&mut self) -> Result<(), FormatError> {
        for kind in ResourceKind::ALL {
            let count = self.input.count()?;
            let mut names = Vec::new();
            for _ in 0..count {
                let index = self.input.i32()?;
                let name = required(&self.strings, index)?.to_string();
                names.push(self.resolve(kind, &name));
            }
            tracing::debug!(kind = %kind, count, "resource table read");
            self.tables[kind.index()] = names;
        }
        Ok(())
    }

    /// Resolve a name against the catalog, asking the locator on a miss.
    fn resolve(&mut self, kind: ResourceKind, original: &str) -> Option<String> {
        if self.catalog.contains(kind, original) {
            return Some(original.to_string());
        }
        let mut tried = vec![original.to_string()];
        while !self.skip_prompts {
            let answer = self.locator.locate(kind, &tried[tried.len() - 1]);
            if answer.skip_remaining {
                self.skip_prompts = true;
            }
            let Some(substitute) = answer.substitute else {
                break;
            };
            if tried.contains(&substitute) {
                break;
            }
            if self.catalog.contains(kind, &substitute) {
                tracing::info!(%kind, original, %substitute, "resource substituted");
                self.report.substitutions.push(Substitution {
                    kind,
                    original: original.to_string(),
                    substitute: substitute.clone(),
                });
                return Some(substitute);
            }
            tried.push(substitute);
        }
        tracing::warn!(%kind, name = original, "unresolved resource");
        self.report.unresolved.push(MissingResource {
            kind,
            name: original.to_string(),
        });
        None
    }

    /// Resolved name of a table entry. `-1` and unresolved entries give `None`.
    fn table_entry(&self, kind: ResourceKind, index: i32) -> Result<Option<&str>, FormatError> {
        if index == NONE_INDEX {
            return Ok(None);
        }
        let table = &self.tables[kind.index()];
        usize::try_from(index)
            .ok()
            .and_then(|i| table.get(i))
            .map(Option::as_deref)
            .ok_or(FormatError::InvalidResourceIndex {
                table: kind.as_str(),
                index,
                count: table.len(),
            })
    }

    fn zone(&mut self) -> Result<Option<Arc<Zone>>, FormatError> {
        let index = self.input.i32()?;
        Ok(self
            .table_entry(ResourceKind::Zone, index)?
            .and_then(|name| self.catalog.zone(name))
            .cloned())
    }

    fn tileset(&self, index: i32) -> Result<Option<&'a Arc<Tileset>>, FormatError> {
        let catalog = self.catalog;
        Ok(self
            .table_entry(ResourceKind::Tileset, index)?
            .and_then(|name| catalog.tileset(name)))
    }

    fn tile_data(&self, index: i32) -> Result<Option<Arc<TileData>>, FormatError> {
        Ok(self
            .table_entry(ResourceKind::TileData, index)?
            .and_then(|name| self.catalog.tile_data(name))
            .cloned())
    }

    fn action_tile_data(&self, index: i32) -> Result<Option<Arc<ActionTileData>>, FormatError> {
        Ok(self
            .table_entry(ResourceKind::ActionTileData, index)?
            .and_then(|name| self.catalog.action_tile_data(name))
            .cloned())
    }

    // --- tree ---

    fn string(&mut self) -> Result<Option<String>, FormatError> {
        let index = self.input.i32()?;
        Ok(optional(&self.strings, index)?.map(str::to_string))
    }

    fn required_string(&mut self) -> Result<String, FormatError> {
        let index = self.input.i32()?;
        required(&self.strings, index).map(str::to_string)
    }

    fn read_tree(&mut self) -> Result<World, FormatError> {
        let mut scripts = ScriptManager::new();
        if self.version >= VERSION_SCRIPT_INFO {
            self.read_scripts(&mut scripts)?;
        }

        let mut world = World::new(self.string()?.unwrap_or_default());
        let (properties, events) = self.read_object()?;
        world.properties = properties;
        world.triggers = self.take_events(ObjectPath::World, events);

        let area_count = self.input.count()?;
        for _ in 0..area_count {
            let index = world.areas().len();
            let mut area = Area::new(self.string()?.unwrap_or_default());
            let (properties, events) = self.read_object()?;
            area.properties = properties;
            area.triggers = self.take_events(ObjectPath::Area(index), events);
            if let Err(err) = world.add_area(area) {
                tracing::warn!(%err, "area skipped");
                self.pending
                    .retain(|(path, _)| !matches!(path, ObjectPath::Area(i) if *i == index));
            }
        }

        let level_count = self.input.count()?;
        for index in 0..level_count {
            let level = self.read_level(index)?;
            world.add_level(level);
        }

        if self.version == VERSION_LEGACY_SCRIPTS {
            self.read_scripts(&mut scripts)?;
        }

        self.migrate_pending(&mut world, &scripts);
        world.scripts = scripts;
        tracing::debug!(
            levels = world.level_count(),
            areas = world.areas().len(),
            scripts = world.scripts.len(),
            "world tree read"
        );
        Ok(world)
    }

    fn read_scripts(&mut self, scripts: &mut ScriptManager) -> Result<(), FormatError> {
        let count = self.input.count()?;
        for _ in 0..count {
            let mut script = Script::new(self.required_string()?, self.string()?.unwrap_or_default());
            if self.version >= VERSION_SCRIPT_INFO {
                script.description = self.string()?.unwrap_or_default();
                let parameters = self.input.count()?;
                for _ in 0..parameters {
                    let type_name = self.required_string()?;
                    let name = self.required_string()?;
                    script
                        .parameters
                        .push(tileworld_assets::ScriptParameter::new(type_name, name));
                }
            }
            script.hidden = self.input.bool()?;
            scripts.insert(script);
        }
        Ok(())
    }

    fn read_object(&mut self) -> Result<(Properties, EventData), FormatError> {
        let properties =
            decode_properties(&mut self.input, &self.strings, &mut self.report.dropped_properties)?;
        let events = self.read_events()?;
        Ok((Properties::from_properties(properties), events))
    }

    fn read_events(&mut self) -> Result<EventData, FormatError> {
        let count = self.input.count()?;
        if self.version >= VERSION_TRIGGERS {
            let mut triggers = Triggers::new();
            for _ in 0..count {
                let mut trigger = Trigger::new(self.string()?.unwrap_or_default());
                trigger.event = self.string()?;
                trigger.script = self.string()?;
                trigger.enabled = self.input.bool()?;
                trigger.fire_once = self.input.bool()?;
                trigger.description = self.string()?.unwrap_or_default();
                triggers.push(trigger);
            }
            return Ok(EventData::Triggers(triggers));
        }
        let mut map = Vec::new();
        for _ in 0..count {
            map.push((self.required_string()?, self.required_string()?));
        }
        Ok(EventData::Legacy(map))
    }

    /// Triggers stored inline, or an empty set with the legacy data queued.
    fn take_events(&mut self, path: ObjectPath, events: EventData) -> Triggers {
        match events {
            EventData::Triggers(triggers) => triggers,
            EventData::Legacy(map) => {
                if self.version <= VERSION_LEGACY_SCRIPTS || !map.is_empty() {
                    self.pending.push((path, map));
                }
                Triggers::new()
            }
        }
    }

    fn read_level(&mut self, index: usize) -> Result<Level, FormatError> {
        let id = self.string()?.unwrap_or_default();
        let (properties, events) = self.read_object()?;
        let dimensions = self.input.ivec2()?;
        let room_size = self.input.ivec2()?;
        let layer_count = self.input.i32()?;

        let invalid = FormatError::InvalidDimensions {
            dimensions,
            room_size,
            layer_count,
        };
        if dimensions.cmple(IVec2::ZERO).any()
            || room_size.cmple(IVec2::ZERO).any()
            || !(1..=MAX_LAYER_COUNT).contains(&layer_count)
        {
            return Err(invalid);
        }
        // Every layer-0 cell takes at least four bytes.
        let cells = [dimensions.x, dimensions.y, room_size.x, room_size.y]
            .iter()
            .fold(1i64, |acc, v| acc.saturating_mul(*v as i64));
        let needed = cells.saturating_mul(4);
        if needed > self.input.remaining() as i64 {
            return Err(FormatError::Truncated {
                offset: self.input.position(),
                needed: (needed - self.input.remaining() as i64) as usize,
            });
        }

        let mut level = Level::new(id, dimensions, room_size, layer_count as usize)
            .map_err(|_| invalid)?;
        level.properties = properties;
        level.triggers = self.take_events(ObjectPath::Level(index), events);
        level.set_zone(self.zone()?);

        for i in 0..dimensions.x * dimensions.y {
            let location = IVec2::new(i % dimensions.x, i / dimensions.x);
            let Some(room) = level.room_at_mut(location) else {
                continue;
            };
            self.read_room(room, index)?;
        }
        tracing::debug!(
            level = %level.id(),
            rooms = level.room_count(),
            tiles = level.tile_count(),
            "level read"
        );
        Ok(level)
    }

    fn read_room(&mut self, room: &mut Room, level: usize) -> Result<(), FormatError> {
        let location = room.location();
        let (properties, events) = self.read_object()?;
        room.properties = properties;
        room.triggers = self.take_events(ObjectPath::Room(level, location), events);
        room.set_zone(self.zone()?);

        let size = room.size();
        for y in 0..size.y {
            for x in 0..size.x {
                if let Some(tile) = self.read_tile()? {
                    self.place(room, level, tile, IVec2::new(x, y), 0)?;
                }
            }
        }

        let upper = self.input.count()?;
        for _ in 0..upper {
            let layer = self.input.i32()?;
            let cell = self.input.ivec2()?;
            let Some(tile) = self.read_tile()? else {
                continue;
            };
            if layer < 1 || layer as usize >= room.layer_count() {
                return Err(FormatError::InvalidTileLocation {
                    location: cell,
                    layer,
                });
            }
            self.place(room, level, tile, cell, layer as usize)?;
        }

        let actions = self.input.count()?;
        for _ in 0..actions {
            let index = self.input.i32()?;
            let template = self.action_tile_data(index)?;
            let position = self.input.ivec2()?;
            let (mut properties, events) = self.read_object()?;
            let Some(template) = template else {
                self.report.dropped_action_tiles += 1;
                continue;
            };
            let mut action = ActionTileDataInstance::new(template, position);
            properties.set_base(action.properties.base().cloned());
            action.properties = properties;
            let id = action.id();
            action.triggers = self.take_events(ObjectPath::ActionTile(level, location, id), events);
            room.add_action_tile(action);
        }
        Ok(())
    }

    fn read_tile(&mut self) -> Result<Option<LoadedTile>, FormatError> {
        let head = self.input.i32()?;
        let template = match head {
            TILE_NONE => return Ok(None),
            TILE_LOOSE => {
                let index = self.input.i32()?;
                self.tile_data(index)?
            }
            index => {
                let cell = self.input.ivec2()?;
                let tileset = self.tileset(index)?;
                let template = tileset.and_then(|t| t.get_tile(cell)).cloned();
                if template.is_none() && tileset.is_some() {
                    tracing::warn!(?cell, "tileset cell holds no tile");
                }
                template
            }
        };
        let (properties, events) = self.read_object()?;
        Ok(Some(LoadedTile {
            template,
            properties,
            events,
        }))
    }

    fn place(
        &mut self,
        room: &mut Room,
        level: usize,
        tile: LoadedTile,
        cell: IVec2,
        layer: usize,
    ) -> Result<(), FormatError> {
        let Some(template) = tile.template else {
            self.report.dropped_tiles += 1;
            return Ok(());
        };
        let mut instance = TileDataInstance::new(template);
        let mut properties = tile.properties;
        properties.set_base(instance.properties.base().cloned());
        instance.properties = properties;
        let path = ObjectPath::Tile(level, room.location(), instance.id());
        instance.triggers = self.take_events(path, tile.events);
        room.place_tile(instance, cell, layer)
            .map(|_| ())
            .map_err(|_| FormatError::InvalidTileLocation {
                location: cell,
                layer: layer as i32,
            })
    }

    // --- legacy events ---

    fn migrate_pending(&mut self, world: &mut World, scripts: &ScriptManager) {
        for (path, map) in std::mem::take(&mut self.pending) {
            let events = defined_events(world, path);
            let events: Vec<&str> = events.iter().map(String::as_str).collect();
            let Some((properties, triggers)) = object_mut(world, path) else {
                continue;
            };
            let migrated = migrate_events(self.version, properties, &map, &events, scripts);
            self.report.migrated_triggers += migrated.len();
            triggers.extend(migrated);
        }
    }
}

fn optional(strings: &[String], index: i32) -> Result<Option<&str>, FormatError> {
    if index == NONE_INDEX {
        return Ok(None);
    }
    required(strings, index).map(Some)
}

fn required(strings: &[String], index: i32) -> Result<&str, FormatError> {
    usize::try_from(index)
        .ok()
        .and_then(|i| strings.get(i))
        .map(String::as_str)
        .ok_or(FormatError::InvalidStringIndex {
            index,
            count: strings.len(),
        })
}

/// Decode a property block. Properties of an unknown type are skipped using
/// their payload length.
fn decode_properties(
    input: &mut ByteReader<'_>,
    strings: &[String],
    dropped: &mut usize,
) -> Result<Vec<Property>, FormatError> {
    let count = input.count()?;
    let mut properties = Vec::new();
    for _ in 0..count {
        let name = required(strings, input.i32()?)?.to_string();
        let tag = input.u8()?;
        let len = input.count()?;
        let mut payload = input.sub(len)?;
        let Some(kind) = PropertyType::from_tag(tag) else {
            tracing::warn!(property = %name, tag, "unknown property type skipped");
            *dropped += 1;
            continue;
        };
        let value = match kind {
            PropertyType::Integer => PropertyValue::Integer(payload.i32()?),
            PropertyType::Float => PropertyValue::Float(payload.f32()?),
            PropertyType::Boolean => PropertyValue::Boolean(payload.bool()?),
            PropertyType::String => {
                PropertyValue::String(required(strings, payload.i32()?)?.to_string())
            }
            PropertyType::Point => PropertyValue::Point(payload.ivec2()?),
            PropertyType::List => {
                PropertyValue::List(decode_properties(&mut payload, strings, dropped)?)
            }
        };
        properties.push(Property::new(name, value));
    }
    Ok(properties)
}

fn owned(events: Vec<&str>) -> Vec<String> {
    events.into_iter().map(str::to_string).collect()
}

fn defined_events(world: &World, path: ObjectPath) -> Vec<String> {
    match path {
        ObjectPath::World => owned(world.defined_events()),
        ObjectPath::Area(i) => world
            .areas()
            .get(i)
            .map_or_else(Vec::new, |a| owned(a.defined_events())),
        ObjectPath::Level(i) => world
            .level(i)
            .map_or_else(Vec::new, |l| owned(l.defined_events())),
        ObjectPath::Room(l, r) => world
            .level(l)
            .and_then(|l| l.room_at(r))
            .map_or_else(Vec::new, |r| owned(r.defined_events())),
        ObjectPath::Tile(l, r, id) => world
            .level(l)
            .and_then(|l| l.room_at(r))
            .and_then(|r| r.tile(id))
            .map_or_else(Vec::new, |t| owned(t.defined_events())),
        ObjectPath::ActionTile(l, r, id) => world
            .level(l)
            .and_then(|l| l.room_at(r))
            .and_then(|r| r.action_tile(id))
            .map_or_else(Vec::new, |t| owned(t.defined_events())),
    }
}

fn object_mut(world: &mut World, path: ObjectPath) -> Option<(&mut Properties, &mut Triggers)> {
    match path {
        ObjectPath::World => Some((&mut world.properties, &mut world.triggers)),
        ObjectPath::Area(i) => world
            .areas_mut()
            .nth(i)
            .map(|a| (&mut a.properties, &mut a.triggers)),
        ObjectPath::Level(i) => world
            .level_mut(i)
            .map(|l| (&mut l.properties, &mut l.triggers)),
        ObjectPath::Room(l, r) => world
            .level_mut(l)?
            .room_at_mut(r)
            .map(|r| (&mut r.properties, &mut r.triggers)),
        ObjectPath::Tile(l, r, id) => world
            .level_mut(l)?
            .room_at_mut(r)?
            .tile_mut(id)
            .map(|t| (&mut t.properties, &mut t.triggers)),
        ObjectPath::ActionTile(l, r, id) => world
            .level_mut(l)?
            .room_at_mut(r)?
            .action_tile_mut(id)
            .map(|t| (&mut t.properties, &mut t.triggers)),
    }
}
