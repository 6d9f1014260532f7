//! Typed access on top of [`KeyValueStore`].
//!
//! Reads decode the stored JSON into `T`. A value that fails to decode is
//! logged and reported as absent, so callers fall back to their defaults
//! instead of failing to start.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::{StoreError, StoreResult};
use crate::traits::KeyValueStore;

/// Read and decode `key`. Absent and malformed values both yield `Ok(None)`.
pub async fn get<T, S>(store: &S, key: &str) -> StoreResult<Option<T>>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let Some(raw) = store.get(key).await? else {
        return Ok(None);
    };
    match serde_json::from_value(raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(key, error = %e, "ignoring malformed stored value");
            Ok(None)
        }
    }
}

/// Encode `value` and store it under `key`.
pub async fn set<T, S>(store: &S, key: &str, value: &T) -> StoreResult<()>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let encoded = encode(value)?;
    store.set(key, encoded).await
}

/// Encode a value to JSON, mapping failures to [`StoreError::Serialization`].
pub fn encode<T: Serialize + ?Sized>(value: &T) -> StoreResult<Value> {
    serde_json::to_value(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use serde_json::json;
    use wgt_types::{keys, ClockSettings, ClockType, CurrencyCode, CurrencyColorMode};

    #[tokio::test]
    async fn typed_roundtrip() {
        let store = InMemoryStore::new();
        let settings = ClockSettings {
            clock_type: ClockType::Analog,
            ..ClockSettings::default()
        };
        set(&store, keys::CLOCK, &settings).await.unwrap();
        let back: Option<ClockSettings> = get(&store, keys::CLOCK).await.unwrap();
        assert_eq!(back, Some(settings));
    }

    #[tokio::test]
    async fn absent_is_none() {
        let store = InMemoryStore::new();
        let value: Option<Vec<CurrencyCode>> = get(&store, keys::CURRENCIES).await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn malformed_is_none() {
        let store = InMemoryStore::with_entries([(keys::CURRENCY_COLOR_MODE, json!("PURPLE"))]);
        let mode: Option<CurrencyColorMode> =
            get(&store, keys::CURRENCY_COLOR_MODE).await.unwrap();
        assert!(mode.is_none());
        // The raw value is left untouched.
        assert_eq!(store.snapshot(keys::CURRENCY_COLOR_MODE), Some(json!("PURPLE")));
    }

    #[tokio::test]
    async fn works_through_trait_object() {
        let store: Box<dyn KeyValueStore> = Box::new(InMemoryStore::new());
        set(store.as_ref(), keys::SHOW_WELCOME_MODAL, &false).await.unwrap();
        let value: Option<bool> = get(store.as_ref(), keys::SHOW_WELCOME_MODAL).await.unwrap();
        assert_eq!(value, Some(false));
    }
}
