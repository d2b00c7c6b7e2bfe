use glam::IVec2;
use serde::{Deserialize, Serialize};

/// Wire tag of a property value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    Integer,
    Float,
    Boolean,
    String,
    Point,
    List,
}

impl PropertyType {
    pub fn tag(self) -> u8 {
        match self {
            Self::Integer => 0,
            Self::Float => 1,
            Self::Boolean => 2,
            Self::String => 3,
            Self::Point => 4,
            Self::List => 5,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            0 => Self::Integer,
            1 => Self::Float,
            2 => Self::Boolean,
            3 => Self::String,
            4 => Self::Point,
            5 => Self::List,
            _ => return None,
        })
    }
}

/// Typed payload of a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Integer(i32),
    Float(f32),
    Boolean(bool),
    String(String),
    Point(IVec2),
    /// Ordered child properties. Order is significant and preserved everywhere.
    List(Vec<Property>),
}

impl PropertyValue {
    pub fn property_type(&self) -> PropertyType {
        match self {
            Self::Integer(_) => PropertyType::Integer,
            Self::Float(_) => PropertyType::Float,
            Self::Boolean(_) => PropertyType::Boolean,
            Self::String(_) => PropertyType::String,
            Self::Point(_) => PropertyType::Point,
            Self::List(_) => PropertyType::List,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Integer(i) => Some(*i as f32),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<IVec2> {
        match self {
            Self::Point(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Property]> {
        match self {
            Self::List(children) => Some(children),
            _ => None,
        }
    }
}

impl From<i32> for PropertyValue {
    fn from(i: i32) -> Self {
        Self::Integer(i)
    }
}

impl From<f32> for PropertyValue {
    fn from(f: f32) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<IVec2> for PropertyValue {
    fn from(p: IVec2) -> Self {
        Self::Point(p)
    }
}

impl From<Vec<Property>> for PropertyValue {
    fn from(children: Vec<Property>) -> Self {
        Self::List(children)
    }
}

/// Extraction of a concrete Rust type from a property value.
///
/// Returns `None` on a type mismatch so that readers fall back to their default.
pub trait FromPropertyValue: Sized {
    fn from_property_value(value: &PropertyValue) -> Option<Self>;
}

impl FromPropertyValue for i32 {
    fn from_property_value(value: &PropertyValue) -> Option<Self> {
        value.as_int()
    }
}

impl FromPropertyValue for f32 {
    fn from_property_value(value: &PropertyValue) -> Option<Self> {
        value.as_float()
    }
}

impl FromPropertyValue for bool {
    fn from_property_value(value: &PropertyValue) -> Option<Self> {
        value.as_bool()
    }
}

impl FromPropertyValue for String {
    fn from_property_value(value: &PropertyValue) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromPropertyValue for IVec2 {
    fn from_property_value(value: &PropertyValue) -> Option<Self> {
        value.as_point()
    }
}

impl FromPropertyValue for Vec<Property> {
    fn from_property_value(value: &PropertyValue) -> Option<Self> {
        value.as_list().map(<[Property]>::to_vec)
    }
}

/// A named, typed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub value: PropertyValue,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn list(name: impl Into<String>, children: Vec<Property>) -> Self {
        Self::new(name, PropertyValue::List(children))
    }

    pub fn property_type(&self) -> PropertyType {
        self.value.property_type()
    }
}
