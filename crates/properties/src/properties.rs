use std::sync::Arc;

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::property::{FromPropertyValue, Property, PropertyValue};

/// Ordered property collection with an optional inherited base.
///
/// Reads fall through to the base chain when a name is not set locally;
/// writes always land in the own collection. The base is shared and never
/// mutated through this collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Properties {
    own: Vec<Property>,
    #[serde(skip)]
    base: Option<Arc<Properties>>,
}

impl PartialEq for Properties {
    /// Compares own values only. Two instances of the same template are equal
    /// when they carry the same overrides.
    fn eq(&self, other: &Self) -> bool {
        self.own == other.own
    }
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty collection inheriting from `base`.
    pub fn with_base(base: Arc<Properties>) -> Self {
        Self {
            own: Vec::new(),
            base: Some(base),
        }
    }

    pub fn from_properties(properties: impl IntoIterator<Item = Property>) -> Self {
        let mut p = Self::new();
        for property in properties {
            p.set_property(property);
        }
        p
    }

    pub fn base(&self) -> Option<&Arc<Properties>> {
        self.base.as_ref()
    }

    pub fn set_base(&mut self, base: Option<Arc<Properties>>) {
        self.base = base;
    }

    /// Own property if present, otherwise the nearest one up the base chain.
    pub fn get_property(&self, name: &str) -> Option<&Property> {
        self.own_property(name)
            .or_else(|| self.base.as_deref().and_then(|b| b.get_property(name)))
    }

    pub fn own_property(&self, name: &str) -> Option<&Property> {
        self.own.iter().find(|p| p.name == name)
    }

    pub fn get_value(&self, name: &str) -> Option<&PropertyValue> {
        self.get_property(name).map(|p| &p.value)
    }

    /// Typed read with fallback. Never fails: a missing name or a type
    /// mismatch yields `default`.
    pub fn get<T: FromPropertyValue>(&self, name: &str, default: T) -> T {
        self.get_value(name)
            .and_then(T::from_property_value)
            .unwrap_or(default)
    }

    pub fn get_int(&self, name: &str, default: i32) -> i32 {
        self.get(name, default)
    }

    pub fn get_float(&self, name: &str, default: f32) -> f32 {
        self.get(name, default)
    }

    pub fn get_bool(&self, name: &str, default: bool) -> bool {
        self.get(name, default)
    }

    pub fn get_string(&self, name: &str, default: &str) -> String {
        match self.get_value(name) {
            Some(PropertyValue::String(s)) => s.clone(),
            _ => default.to_string(),
        }
    }

    pub fn get_point(&self, name: &str, default: IVec2) -> IVec2 {
        self.get(name, default)
    }

    pub fn get_list(&self, name: &str) -> &[Property] {
        self.get_value(name)
            .and_then(PropertyValue::as_list)
            .unwrap_or(&[])
    }

    /// Create or overwrite an own property. Position is kept on overwrite.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<PropertyValue>) {
        self.set_property(Property::new(name, value));
    }

    pub fn set_property(&mut self, property: Property) {
        match self.own.iter_mut().find(|p| p.name == property.name) {
            Some(existing) => existing.value = property.value,
            None => self.own.push(property),
        }
    }

    /// Remove an own property; the inherited value (if any) becomes visible again.
    pub fn remove(&mut self, name: &str) -> Option<Property> {
        let index = self.own.iter().position(|p| p.name == name)?;
        Some(self.own.remove(index))
    }

    /// Whether `name` resolves anywhere on the chain.
    pub fn contains(&self, name: &str) -> bool {
        self.get_property(name).is_some()
    }

    pub fn contains_own(&self, name: &str) -> bool {
        self.own_property(name).is_some()
    }

    /// Whether an own value shadows an inherited one.
    pub fn is_overridden(&self, name: &str) -> bool {
        self.contains_own(name)
            && self
                .base
                .as_deref()
                .is_some_and(|b| b.contains(name))
    }

    /// Own properties in insertion order.
    pub fn own(&self) -> impl Iterator<Item = &Property> {
        self.own.iter()
    }

    pub fn len(&self) -> usize {
        self.own.len()
    }

    pub fn is_empty(&self) -> bool {
        self.own.is_empty()
    }

    pub fn clear(&mut self) {
        self.own.clear();
    }

    /// Every name visible through this collection, own names first.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.own.iter().map(|p| p.name.as_str()).collect();
        if let Some(base) = self.base.as_deref() {
            for name in base.names() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Copy every own property of `other` over this collection.
    pub fn merge(&mut self, other: &Properties) {
        for property in other.own() {
            self.set_property(property.clone());
        }
    }

    /// Drop own values equal to the value they would inherit.
    ///
    /// Editors call this before saving to keep override lists small; the
    /// collection never prunes on its own. Returns the number removed.
    pub fn prune_matching_base(&mut self) -> usize {
        let Some(base) = self.base.clone() else {
            return 0;
        };
        let before = self.own.len();
        self.own
            .retain(|p| base.get_value(&p.name) != Some(&p.value));
        let removed = before - self.own.len();
        if removed > 0 {
            tracing::trace!(removed, "pruned properties matching base");
        }
        removed
    }
}
