use glam::IVec2;

/// First four bytes of every world file.
pub const MAGIC: [u8; 4] = *b"TWLD";

/// Oldest version the reader accepts: flat event maps, scripts after the tree.
pub const VERSION_LEGACY_SCRIPTS: i32 = 2;
/// Script descriptions and parameters; events still a flat map.
pub const VERSION_SCRIPT_INFO: i32 = 3;
/// Per-object triggers.
pub const VERSION_TRIGGERS: i32 = 4;

pub const CURRENT_VERSION: i32 = VERSION_TRIGGERS;
pub const SUPPORTED_VERSIONS: [i32; 3] = [
    VERSION_LEGACY_SCRIPTS,
    VERSION_SCRIPT_INFO,
    VERSION_TRIGGERS,
];

/// Upper bound on a level's layer count accepted from a file. Matches the
/// bound levels enforce, so anything that can be built can be saved and
/// loaded again.
pub const MAX_LAYER_COUNT: i32 = tileworld_kernel::MAX_LAYER_COUNT as i32;

/// Index value meaning "no string" or "no resource".
pub const NONE_INDEX: i32 = -1;

/// Tile entry marker: empty cell.
pub const TILE_NONE: i32 = -1;
/// Tile entry marker: template taken straight from the tile-data table.
pub const TILE_LOOSE: i32 = -2;

/// Options for writing a world file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
    /// Format version to emit; one of [`SUPPORTED_VERSIONS`].
    pub version: i32,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
        }
    }
}

impl SaveOptions {
    pub fn version(version: i32) -> Self {
        Self { version }
    }
}

/// Structural problems in a world file. Any of these aborts the load.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("bad magic {0:02x?}, not a world file")]
    BadMagic([u8; 4]),
    #[error("unsupported world file version {0}")]
    UnsupportedVersion(i32),
    #[error("unexpected end of data at offset {offset} ({needed} more bytes needed)")]
    Truncated { offset: usize, needed: usize },
    #[error("negative length {value} at offset {offset}")]
    NegativeLength { value: i32, offset: usize },
    #[error("string {0} is not valid UTF-8")]
    InvalidString(usize),
    #[error("string index {index} out of range ({count} strings)")]
    InvalidStringIndex { index: i32, count: usize },
    #[error("{table} table index {index} out of range ({count} entries)")]
    InvalidResourceIndex {
        table: &'static str,
        index: i32,
        count: usize,
    },
    #[error("invalid level shape: {dimensions} rooms of {room_size} tiles, {layer_count} layers")]
    InvalidDimensions {
        dimensions: IVec2,
        room_size: IVec2,
        layer_count: i32,
    },
    #[error("tile at {location} on layer {layer} lies outside its room")]
    InvalidTileLocation { location: IVec2, layer: i32 },
}

/// Errors from reading or writing world files.
#[derive(Debug, thiserror::Error)]
pub enum WorldFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("format error: {0}")]
    Format(#[from] FormatError),
}
