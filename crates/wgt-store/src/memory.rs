use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{StoreError, StoreResult};
use crate::traits::KeyValueStore;

/// In-memory, HashMap-based key-value store.
///
/// Intended for tests and embedding. Values are held behind a `RwLock` and
/// cloned on read. Data is lost when the store is dropped.
pub struct InMemoryStore {
    values: RwLock<HashMap<String, Value>>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
        }
    }

    /// Create a store pre-populated with the given entries.
    pub fn with_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let values = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v))
            .collect();
        Self {
            values: RwLock::new(values),
        }
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.values.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Synchronous peek, for tests and diagnostics.
    pub fn snapshot(&self, key: &str) -> Option<Value> {
        self.values.read().ok()?.get(key).cloned()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Unavailable(format!("lock poisoned: {e}"))
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        let map = self.values.read().map_err(poisoned)?;
        Ok(map.get(key).filter(|v| !v.is_null()).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> StoreResult<()> {
        let mut map = self.values.write().map_err(poisoned)?;
        map.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<bool> {
        let mut map = self.values.write().map_err(poisoned)?;
        Ok(map.remove(key).is_some())
    }

    async fn keys(&self) -> StoreResult<Vec<String>> {
        let map = self.values.read().map_err(poisoned)?;
        let mut keys: Vec<String> = map.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("key_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn set_then_get() {
        let store = InMemoryStore::new();
        store.set("currencies", json!(["USD"])).await.unwrap();
        assert_eq!(store.get("currencies").await.unwrap(), Some(json!(["USD"])));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn absent_key_is_none() {
        let store = InMemoryStore::new();
        assert!(store.get("clock").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn null_reads_as_absent() {
        let store = InMemoryStore::with_entries([("wallpaper", Value::Null)]);
        assert!(store.get("wallpaper").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn falsy_values_are_present() {
        let store = InMemoryStore::with_entries([("showWelcomeModal", json!(false))]);
        assert_eq!(
            store.get("showWelcomeModal").await.unwrap(),
            Some(json!(false))
        );
    }

    #[tokio::test]
    async fn overwrite_replaces() {
        let store = InMemoryStore::new();
        store.set("k", json!(1)).await.unwrap();
        store.set("k", json!(2)).await.unwrap();
        assert_eq!(store.snapshot("k"), Some(json!(2)));
    }

    #[tokio::test]
    async fn remove_and_keys() {
        let store = InMemoryStore::with_entries([("b", json!(1)), ("a", json!(2))]);
        assert_eq!(store.keys().await.unwrap(), vec!["a", "b"]);
        assert!(store.remove("a").await.unwrap());
        assert!(!store.remove("a").await.unwrap());
        assert_eq!(store.keys().await.unwrap(), vec!["b"]);
    }

    #[test]
    fn debug_shows_count() {
        let store = InMemoryStore::with_entries([("a", json!(1))]);
        assert_eq!(format!("{store:?}"), "InMemoryStore { key_count: 1 }");
    }
}
