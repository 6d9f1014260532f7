//! The [`Domain`] trait describing one independently persisted slice of
//! dashboard state.
//!
//! A domain knows how to load itself from storage (applying defaults for
//! absent keys), how to encode itself back into storage entries, and how to
//! react to messages on its bus topic. The generic
//! [`Provider`](crate::provider::Provider) supplies everything else:
//! lifecycle, change notification and ordered persistence.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use wgt_bus::{BusEvent, Topic};
use wgt_store::{typed, KeyValueStore, StoreResult};

/// One storage key with its encoded value.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub key: &'static str,
    pub value: Value,
}

impl Entry {
    /// Encode `value` for storage under `key`.
    pub fn encode<T: Serialize + ?Sized>(key: &'static str, value: &T) -> StoreResult<Self> {
        Ok(Self {
            key,
            value: typed::encode(value)?,
        })
    }
}

/// Result of hydrating a domain from storage.
#[derive(Clone, Debug, PartialEq)]
pub struct Hydrated<S> {
    pub snapshot: S,
    /// Whether the snapshot should be written back (a generated fallback
    /// that is not in storage yet).
    pub write_back: bool,
}

impl<S> Hydrated<S> {
    /// Snapshot built from storage and static defaults.
    pub fn loaded(snapshot: S) -> Self {
        Self {
            snapshot,
            write_back: false,
        }
    }

    /// Snapshot chosen at load time that storage should remember.
    pub fn generated(snapshot: S) -> Self {
        Self {
            snapshot,
            write_back: true,
        }
    }
}

/// A slice of dashboard state owned by a provider.
#[async_trait]
pub trait Domain: Send + Sync + 'static {
    /// In-memory representation of the domain.
    type Snapshot: Clone + PartialEq + fmt::Debug + Send + Sync + 'static;

    /// Short name used in logs and errors.
    const NAME: &'static str;

    /// Topic whose messages overwrite this domain, if any.
    fn topic(&self) -> Option<Topic> {
        None
    }

    /// Value exposed to consumers before the domain is ready.
    fn neutral(&self) -> Self::Snapshot;

    /// Fetch every key of the domain, defaulting the absent ones.
    async fn load(&self, store: &dyn KeyValueStore) -> StoreResult<Hydrated<Self::Snapshot>>;

    /// Storage entries representing `snapshot`.
    fn entries(&self, snapshot: &Self::Snapshot) -> StoreResult<Vec<Entry>>;

    /// New snapshot for a bus message, or `None` to ignore it.
    fn on_event(
        &self,
        current: Option<&Self::Snapshot>,
        event: &BusEvent,
    ) -> Option<Self::Snapshot> {
        let _ = (current, event);
        None
    }

    /// Whether values delivered over the bus are written to storage.
    ///
    /// Publishers of most topics store the value themselves before
    /// announcing it, so the default is `false`.
    fn persists_bus_updates(&self) -> bool {
        false
    }
}
