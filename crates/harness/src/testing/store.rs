//! In-memory named map store

use std::collections::HashMap;
use std::sync::Arc;

use convergent_core::{EngineError, MapStore, Value};
use parking_lot::RwLock;

/// Named maps shared between a [`MemoryEngine`](super::MemoryEngine) and the
/// harness. Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    maps: Arc<RwLock<HashMap<String, HashMap<Value, Value>>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the map `name` if it does not exist
    pub fn create(&self, name: &str) {
        self.maps.write().entry(name.to_string()).or_default();
    }

    /// Insert or overwrite one entry, creating the map if needed
    pub fn put(&self, name: &str, key: impl Into<Value>, value: impl Into<Value>) {
        self.maps
            .write()
            .entry(name.to_string())
            .or_default()
            .insert(key.into(), value.into());
    }

    /// Remove every map
    pub fn clear(&self) {
        self.maps.write().clear();
    }
}

impl MapStore for MemoryStore {
    fn get_all(&self, name: &str) -> Result<HashMap<Value, Value>, EngineError> {
        self.maps
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::store(format!("no map named '{}'", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_get_all() {
        let store = MemoryStore::new();
        store.put("m", 1, "a");
        store.put("m", 1, "b");
        store.put("m", 2, "c");

        let all = store.get_all("m").unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all.get(&Value::Int(1)), Some(&Value::from("b")));
    }

    #[test]
    fn test_unknown_map_is_error() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.get_all("nope"),
            Err(EngineError::Store { .. })
        ));
    }

    #[test]
    fn test_created_map_is_empty() {
        let store = MemoryStore::new();
        store.create("m");
        assert!(store.get_all("m").unwrap().is_empty());
    }

    #[test]
    fn test_clones_share_contents() {
        let store = MemoryStore::new();
        let other = store.clone();
        other.put("m", "k", 1);
        assert_eq!(store.get_all("m").unwrap().len(), 1);

        store.clear();
        assert!(other.get_all("m").is_err());
    }
}
