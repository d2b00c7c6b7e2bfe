//! Property inheritance used by every placed object in a world.
//!
//! # Invariants
//! - A name appears at most once in the own collection.
//! - Reads never fail; the caller-supplied default is the last resort.
//! - List children keep their order through every operation.

mod properties;
mod property;

pub use properties::Properties;
pub use property::{FromPropertyValue, Property, PropertyType, PropertyValue};
