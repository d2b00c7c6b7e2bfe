//! Deduplicated string and resource tables filled while the tree is written.

use std::collections::HashMap;

use tileworld_assets::ResourceKind;

use crate::bytes::ByteWriter;
use crate::format::NONE_INDEX;

/// Every distinct string in a file, stored once.
#[derive(Debug, Default)]
pub(crate) struct StringTable {
    strings: Vec<String>,
    index: HashMap<String, i32>,
}

impl StringTable {
    /// Index of `value`, appending it on first use.
    pub fn intern(&mut self, value: &str) -> i32 {
        if let Some(&i) = self.index.get(value) {
            return i;
        }
        let i = self.strings.len() as i32;
        self.strings.push(value.to_string());
        self.index.insert(value.to_string(), i);
        i
    }

    pub fn intern_opt(&mut self, value: Option<&str>) -> i32 {
        value.map_or(NONE_INDEX, |v| self.intern(v))
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn write(&self, out: &mut ByteWriter) {
        out.len_prefix(self.strings.len());
        for s in &self.strings {
            out.len_prefix(s.len());
            out.bytes(s.as_bytes());
        }
    }
}

/// One table per [`ResourceKind`]; entries are string table indices.
#[derive(Debug, Default)]
pub(crate) struct ResourceTables {
    entries: [Vec<i32>; 8],
    index: HashMap<(ResourceKind, String), i32>,
}

impl ResourceTables {
    /// Table index for a named resource, appending it on first use.
    pub fn reference(&mut self, strings: &mut StringTable, kind: ResourceKind, name: &str) -> i32 {
        if let Some(&i) = self.index.get(&(kind, name.to_string())) {
            return i;
        }
        let table = &mut self.entries[kind.index()];
        let i = table.len() as i32;
        table.push(strings.intern(name));
        self.index.insert((kind, name.to_string()), i);
        i
    }

    pub fn reference_opt(
        &mut self,
        strings: &mut StringTable,
        kind: ResourceKind,
        name: Option<&str>,
    ) -> i32 {
        name.map_or(NONE_INDEX, |n| self.reference(strings, kind, n))
    }

    pub fn count(&self, kind: ResourceKind) -> usize {
        self.entries[kind.index()].len()
    }

    pub fn write(&self, out: &mut ByteWriter) {
        for kind in ResourceKind::ALL {
            let table = &self.entries[kind.index()];
            out.len_prefix(table.len());
            for &string in table {
                out.i32(string);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_are_deduplicated() {
        let mut t = StringTable::default();
        assert_eq!(t.intern("grass"), 0);
        assert_eq!(t.intern("rock"), 1);
        assert_eq!(t.intern("grass"), 0);
        assert_eq!(t.intern_opt(None), NONE_INDEX);
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn resources_share_the_string_table() {
        let mut strings = StringTable::default();
        let mut tables = ResourceTables::default();
        strings.intern("forest");
        let zone = tables.reference(&mut strings, ResourceKind::Zone, "forest");
        let tile = tables.reference(&mut strings, ResourceKind::TileData, "forest");
        assert_eq!((zone, tile), (0, 0));
        assert_eq!(tables.reference(&mut strings, ResourceKind::Zone, "forest"), 0);
        assert_eq!(strings.len(), 1);
        assert_eq!(tables.count(ResourceKind::Zone), 1);
        assert_eq!(tables.count(ResourceKind::Tileset), 0);
    }
}
