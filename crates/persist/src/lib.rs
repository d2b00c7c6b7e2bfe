//! World file codec: the versioned binary format a [`World`] is saved in.
//!
//! Layout: magic, version, start position, string table, eight resource
//! tables in [`ResourceKind::ALL`] order, then the object tree. Versions 2
//! and 3 store a flat event map per object that is migrated to triggers on
//! load; version 4 stores triggers directly.
//!
//! # Invariants
//! - Every string and every resource name is stored once; the tree refers to
//!   them by index.
//! - A structural error aborts the load and no world is returned.
//! - A missing resource never fails a load; it goes to the
//!   [`ResourceLocator`] and ends up in the [`LoadReport`].
//!
//! [`World`]: tileworld_kernel::World
//! [`ResourceKind::ALL`]: tileworld_assets::ResourceKind::ALL

mod bytes;
pub mod format;
pub mod migrate;
mod reader;
mod store;
mod tables;
mod writer;

pub use format::{CURRENT_VERSION, FormatError, SUPPORTED_VERSIONS, SaveOptions, WorldFileError};
pub use migrate::migrate_events;
pub use reader::{
    LoadReport, LoadedWorld, Located, MissingResource, NoLocator, ResourceLocator, Substitution,
};
pub use store::WorldFile;
