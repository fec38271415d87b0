//! Descriptor Store: function descriptors and mapping tables.
//!
//! Everything here is plain data. Loaders in `crate::parser` fill a `Store`,
//! later stages only borrow it.

use indexmap::IndexMap;
use serde::Deserialize;

/// One API function to be bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub name: String,
    /// Binding-style classifier; looked up in the active mapping table.
    pub category: String,
    /// Output directory tag. Functions without one are never generated.
    pub directory: Option<String>,
    pub not_implemented: bool,
    pub signature: Signature,
}

impl Descriptor {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            directory: None,
            not_implemented: false,
            signature: Signature::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    /// One-line summary used in the generated doc block.
    pub desc: Option<String>,
    pub parameters: Vec<Parameter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Parameter {
    pub name: String,
    /// Opaque key resolved to a C type through the mapping table.
    pub kind: String,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub constant: bool,
    /// Out-parameters flagged optional may be NULL.
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub desc: Option<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            direction: Direction::In,
            constant: false,
            optional: false,
            desc: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    In,
    Out,
    InOut,
}

/// Named set of `key -> value` rules.
///
/// A key is either a function category (value: strategy identifier) or a
/// parameter kind (value: C type).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingTable {
    pub name: String,
    pub rules: IndexMap<String, String>,
}

impl MappingTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: IndexMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.rules.get(key).map(String::as_str)
    }
}

/// Registry of everything loaded for one run.
///
/// Descriptors keep their first insertion position even when a later load
/// replaces them, so iteration order is load order.
#[derive(Debug, Clone, Default)]
pub struct Store {
    descriptors: IndexMap<String, Descriptor>,
    mappings: IndexMap<String, MappingTable>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `descriptor`, replacing any earlier one with the same name
    /// wholesale. Returns the replaced descriptor.
    pub fn insert(&mut self, descriptor: Descriptor) -> Option<Descriptor> {
        self.descriptors.insert(descriptor.name.clone(), descriptor)
    }

    pub fn get(&self, name: &str) -> Option<&Descriptor> {
        self.descriptors.get(name)
    }

    /// All descriptors in load order.
    pub fn descriptors(&self) -> impl Iterator<Item = &Descriptor> {
        self.descriptors.values()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Adds or overrides one rule; other rules of the table are kept.
    pub fn set_rule(&mut self, table: &str, key: impl Into<String>, value: impl Into<String>) {
        self.mappings
            .entry(table.to_string())
            .or_insert_with(|| MappingTable::new(table))
            .rules
            .insert(key.into(), value.into());
    }

    pub fn mapping(&self, name: &str) -> Option<&MappingTable> {
        self.mappings.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_whole_descriptor_in_place() {
        let mut store = Store::new();
        assert!(store.is_empty());

        let mut send = Descriptor::new("MPI_Send", "pt2pt");
        send.directory = Some("pt2pt".into());
        send.signature.parameters.push(Parameter::new("buf", "BUFFER"));
        store.insert(send);
        store.insert(Descriptor::new("MPI_Recv", "pt2pt"));

        let replaced = store.insert(Descriptor::new("MPI_Send", "coll"));
        assert!(replaced.is_some());

        let send = store.get("MPI_Send").unwrap();
        assert_eq!(send.category, "coll");
        assert_eq!(send.directory, None, "no attribute merging");
        assert!(send.signature.parameters.is_empty());

        let names: Vec<_> = store.descriptors().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["MPI_Send", "MPI_Recv"]);
    }

    #[test]
    fn test_set_rule_merges_by_key() {
        let mut store = Store::new();
        store.set_rule("SMALL_C_KIND_MAP", "pt2pt", "wrapper");
        store.set_rule("SMALL_C_KIND_MAP", "BUFFER", "void *");
        store.set_rule("SMALL_C_KIND_MAP", "pt2pt", "local");

        let table = store.mapping("SMALL_C_KIND_MAP").unwrap();
        assert_eq!(table.get("pt2pt"), Some("local"));
        assert_eq!(table.get("BUFFER"), Some("void *"));
        assert_eq!(table.rules.len(), 2);
        assert!(store.mapping("OTHER").is_none());
    }
}
