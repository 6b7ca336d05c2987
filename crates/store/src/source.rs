//! The narrow read interface consumers depend on, and an in-memory store.

use std::collections::BTreeMap;

use crate::error::StoreError;
use crate::reader::StoreReader;

/// One `(key, raw value)` pair of a map.
pub type Entry = (String, Vec<u8>);

/// Boxed iterator returned by [`MapSource::entries`].
pub type EntryIter<'a> = Box<dyn Iterator<Item = Result<Entry, StoreError>> + 'a>;

/// Anything that can list named maps and iterate their entries in key order.
///
/// The converter only talks to stores through this trait, so a different
/// storage backend can be plugged in without touching it.
pub trait MapSource {
    /// Map names in the backend's reported order.
    fn map_names(&self) -> Result<Vec<String>, StoreError>;

    /// Entries of `map` in ascending key order.
    ///
    /// Fails with [`StoreError::MapNotFound`] for an unknown map.
    fn entries<'a>(&'a self, map: &str) -> Result<EntryIter<'a>, StoreError>;
}

impl MapSource for StoreReader {
    fn map_names(&self) -> Result<Vec<String>, StoreError> {
        Ok(StoreReader::map_names(self))
    }

    fn entries<'a>(&'a self, map: &str) -> Result<EntryIter<'a>, StoreError> {
        Ok(Box::new(StoreReader::entries(self, map)?))
    }
}

/// Ordered collection of named maps held in memory.
///
/// Maps keep their creation order; entries inside a map are sorted by key.
/// This is what [`StoreWriter`](crate::StoreWriter) persists.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryStore {
    maps: Vec<(String, BTreeMap<String, Vec<u8>>)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the map called `name`, creating it (at the end of the map
    /// order) if it does not exist yet.
    pub fn map_mut(&mut self, name: &str) -> &mut BTreeMap<String, Vec<u8>> {
        let idx = match self.maps.iter().position(|(n, _)| n == name) {
            Some(idx) => idx,
            None => {
                self.maps.push((name.to_string(), BTreeMap::new()));
                self.maps.len() - 1
            }
        };
        &mut self.maps[idx].1
    }

    /// Inserts `value` under `key` in `map`, creating the map if needed.
    /// Returns the previous value for that key, if any.
    pub fn insert(&mut self, map: &str, key: impl Into<String>, value: Vec<u8>) -> Option<Vec<u8>> {
        self.map_mut(map).insert(key.into(), value)
    }

    #[must_use]
    pub fn map(&self, name: &str) -> Option<&BTreeMap<String, Vec<u8>>> {
        self.maps.iter().find(|(n, _)| n == name).map(|(_, m)| m)
    }

    /// Maps in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, Vec<u8>>)> {
        self.maps.iter().map(|(n, m)| (n.as_str(), m))
    }

    /// Number of maps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

impl MapSource for MemoryStore {
    fn map_names(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.maps.iter().map(|(n, _)| n.clone()).collect())
    }

    fn entries<'a>(&'a self, map: &str) -> Result<EntryIter<'a>, StoreError> {
        let entries = self
            .map(map)
            .ok_or_else(|| StoreError::MapNotFound(map.to_string()))?;
        Ok(Box::new(
            entries
                .iter()
                .map(|(k, v)| Ok::<Entry, StoreError>((k.clone(), v.clone()))),
        ))
    }
}
