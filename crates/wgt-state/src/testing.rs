//! Store wrappers used by the provider tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Semaphore;

use wgt_store::{KeyValueStore, StoreError, StoreResult};

/// Store whose reads and writes block until the test opens them.
pub struct GatedStore<S> {
    inner: S,
    reads: Semaphore,
    writes: Semaphore,
    fail_writes: AtomicBool,
    reads_completed: AtomicUsize,
    written: Mutex<Vec<String>>,
}

impl<S: KeyValueStore> GatedStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            reads: Semaphore::new(0),
            writes: Semaphore::new(0),
            fail_writes: AtomicBool::new(false),
            reads_completed: AtomicUsize::new(0),
            written: Mutex::new(Vec::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn open_reads(&self) {
        self.reads.add_permits(1);
    }

    pub fn open_writes(&self) {
        self.writes.add_permits(1);
    }

    /// Every later `set` fails immediately.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn reads_completed(&self) -> usize {
        self.reads_completed.load(Ordering::SeqCst)
    }

    /// Keys written so far, in order.
    pub fn writes(&self) -> Vec<String> {
        self.written.lock().unwrap().clone()
    }
}

#[async_trait]
impl<S: KeyValueStore> KeyValueStore for GatedStore<S> {
    async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        let _permit = self.reads.acquire().await.unwrap();
        let value = self.inner.get(key).await;
        self.reads_completed.fetch_add(1, Ordering::SeqCst);
        value
    }

    async fn set(&self, key: &str, value: Value) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".into()));
        }
        let _permit = self.writes.acquire().await.unwrap();
        self.inner.set(key, value).await?;
        self.written.lock().unwrap().push(key.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<bool> {
        self.inner.remove(key).await
    }

    async fn keys(&self) -> StoreResult<Vec<String>> {
        self.inner.keys().await
    }
}

/// Store that fails every operation.
pub struct FailingStore;

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> StoreResult<Option<Value>> {
        Err(StoreError::Unavailable("storage offline".into()))
    }

    async fn set(&self, _key: &str, _value: Value) -> StoreResult<()> {
        Err(StoreError::Unavailable("storage offline".into()))
    }

    async fn remove(&self, _key: &str) -> StoreResult<bool> {
        Err(StoreError::Unavailable("storage offline".into()))
    }

    async fn keys(&self) -> StoreResult<Vec<String>> {
        Err(StoreError::Unavailable("storage offline".into()))
    }
}
