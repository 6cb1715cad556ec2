//! Highlight registries
//!
//! A registry maps a highlight name to the ranges currently painted under
//! it. `set` replaces the whole entry; there is no merging. Entries under
//! different names are independent and may overlap.

use std::collections::HashMap;

use super::error::HighlightError;
use super::range::StaticRange;

pub trait HighlightRegistry<N> {
    /// Replace the entry for `name` with `ranges`
    fn set(&mut self, name: &str, ranges: &[StaticRange<N>]) -> Result<(), HighlightError>;

    /// Remove the entry for `name` (no-op if absent)
    fn delete(&mut self, name: &str) -> Result<(), HighlightError>;

    fn has(&self, name: &str) -> bool;
}

/// In-process registry
#[derive(Clone, Debug)]
pub struct MemoryRegistry<N> {
    entries: HashMap<String, Vec<StaticRange<N>>>,
}

impl<N> Default for MemoryRegistry<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> MemoryRegistry<N> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&[StaticRange<N>]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Clone> HighlightRegistry<N> for MemoryRegistry<N> {
    fn set(&mut self, name: &str, ranges: &[StaticRange<N>]) -> Result<(), HighlightError> {
        self.entries.insert(name.to_string(), ranges.to_vec());
        Ok(())
    }

    fn delete(&mut self, name: &str) -> Result<(), HighlightError> {
        self.entries.remove(name);
        Ok(())
    }

    fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::locator::TextChunk;

    fn ranges(spans: &[(u32, u32)]) -> Vec<StaticRange<u32>> {
        spans
            .iter()
            .map(|(start, end)| StaticRange::new(1, TextChunk::new(*start, *end)))
            .collect()
    }

    #[test]
    fn test_set_replaces_entry() {
        let mut registry = MemoryRegistry::new();
        registry.set("hit", &ranges(&[(0, 1), (2, 3)])).unwrap();
        registry.set("hit", &ranges(&[(5, 6)])).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("hit").unwrap(), ranges(&[(5, 6)]).as_slice());
    }

    #[test]
    fn test_delete_removes_entry() {
        let mut registry = MemoryRegistry::new();
        registry.set("hit", &ranges(&[(0, 1)])).unwrap();
        registry.delete("hit").unwrap();
        registry.delete("missing").unwrap();

        assert!(!registry.has("hit"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_names_independent() {
        let mut registry = MemoryRegistry::new();
        registry.set("b", &ranges(&[(0, 4)])).unwrap();
        registry.set("a", &ranges(&[(0, 4)])).unwrap();
        registry.delete("b").unwrap();

        assert_eq!(registry.names(), vec!["a"]);
    }
}
