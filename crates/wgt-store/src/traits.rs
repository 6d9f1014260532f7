use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreResult;

/// Asynchronous key-value store backing the dashboard domains.
///
/// Implementations must be thread-safe (`Send + Sync`). Each call is
/// independent: there is no transaction spanning several keys, and a write
/// that fails leaves the previous value in place.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key is absent or holds JSON `null`.
    async fn get(&self, key: &str) -> StoreResult<Option<Value>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: Value) -> StoreResult<()>;

    /// Remove `key`. Returns `true` if it existed.
    async fn remove(&self, key: &str) -> StoreResult<bool>;

    /// All keys currently present, sorted.
    async fn keys(&self) -> StoreResult<Vec<String>>;
}
