//! A set of mounted providers looked up by domain type.
//!
//! The scope plays the role of a provider tree: consumers ask it for the
//! accessor of a domain and get [`StateError::MissingProvider`] when no
//! provider for that domain was mounted.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use wgt_bus::EventBus;
use wgt_store::KeyValueStore;

use crate::domain::Domain;
use crate::error::{StateError, StateResult};
use crate::provider::{Accessor, PendingLoad, Provider};

#[async_trait]
trait Mounted: Send + Sync {
    fn name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    async fn ready(&self) -> StateResult<()>;
    async fn flush(&self) -> StateResult<()>;
    fn unmount(self: Box<Self>) -> PendingLoad;
}

#[async_trait]
impl<D: Domain> Mounted for Provider<D> {
    fn name(&self) -> &'static str {
        D::NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    async fn ready(&self) -> StateResult<()> {
        self.accessor().ready().await
    }

    async fn flush(&self) -> StateResult<()> {
        self.accessor().flush().await
    }

    fn unmount(self: Box<Self>) -> PendingLoad {
        Provider::unmount(*self)
    }
}

/// Providers keyed by domain type, kept in mount order.
#[derive(Default)]
pub struct ProviderScope {
    providers: Vec<(TypeId, Box<dyn Mounted>)>,
}

impl ProviderScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount `domain` and add its provider to the scope.
    pub fn mount<D: Domain>(
        &mut self,
        domain: D,
        store: Arc<dyn KeyValueStore>,
        bus: &EventBus,
    ) -> StateResult<Accessor<D>> {
        let provider = Provider::mount(domain, store, bus)?;
        let accessor = provider.accessor();
        self.insert(provider);
        Ok(accessor)
    }

    /// Add an already mounted provider. A provider previously registered
    /// for the same domain is unmounted and its pending load returned.
    pub fn insert<D: Domain>(&mut self, provider: Provider<D>) -> Option<PendingLoad> {
        let previous = self.unmount::<D>();
        self.providers.push((TypeId::of::<D>(), Box::new(provider)));
        previous
    }

    /// Accessor for `D`, or [`StateError::MissingProvider`].
    pub fn accessor<D: Domain>(&self) -> StateResult<Accessor<D>> {
        self.providers
            .iter()
            .find(|(id, _)| *id == TypeId::of::<D>())
            .and_then(|(_, p)| p.as_any().downcast_ref::<Provider<D>>())
            .map(Provider::accessor)
            .ok_or(StateError::MissingProvider { domain: D::NAME })
    }

    pub fn contains<D: Domain>(&self) -> bool {
        self.providers.iter().any(|(id, _)| *id == TypeId::of::<D>())
    }

    /// Names of the mounted domains, in mount order.
    pub fn names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|(_, p)| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn unmount<D: Domain>(&mut self) -> Option<PendingLoad> {
        let pos = self
            .providers
            .iter()
            .position(|(id, _)| *id == TypeId::of::<D>())?;
        let (_, provider) = self.providers.remove(pos);
        Some(provider.unmount())
    }

    /// Unmount every provider, most recently mounted first.
    pub fn unmount_all(&mut self) -> Vec<PendingLoad> {
        let mut pending = Vec::with_capacity(self.providers.len());
        while let Some((_, provider)) = self.providers.pop() {
            pending.push(provider.unmount());
        }
        pending
    }

    /// Wait for every domain to load. All domains are awaited even if one
    /// fails; the first failure is returned.
    pub async fn ready_all(&self) -> StateResult<()> {
        let mut first_error = None;
        for (_, provider) in &self.providers {
            if let Err(e) = provider.ready().await {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Wait for background writes of every domain.
    pub async fn flush_all(&self) -> StateResult<()> {
        let mut first_error = None;
        for (_, provider) in &self.providers {
            if let Err(e) = provider.flush().await {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl fmt::Debug for ProviderScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderScope")
            .field("domains", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use wgt_bus::Topic;
    use wgt_store::InMemoryStore;

    use crate::domains::{ClockDomain, CurrencyDomain, WallpaperDomain};
    use crate::testing::FailingStore;

    #[tokio::test]
    async fn lookup_by_domain_type() {
        let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
        let bus = EventBus::new();
        let mut scope = ProviderScope::new();
        scope.mount(CurrencyDomain, store.clone(), &bus).unwrap();
        scope.mount(ClockDomain, store, &bus).unwrap();
        scope.ready_all().await.unwrap();

        assert_eq!(scope.names(), vec!["currency", "clock"]);
        assert!(scope.accessor::<ClockDomain>().unwrap().is_ready());
        let err = scope.accessor::<WallpaperDomain>().unwrap_err();
        assert!(matches!(err, StateError::MissingProvider { domain: "wallpaper" }));
    }

    #[tokio::test]
    async fn remounting_replaces_previous_provider() {
        let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
        let bus = EventBus::new();
        let mut scope = ProviderScope::new();
        let old = scope.mount(ClockDomain, store.clone(), &bus).unwrap();
        let new = scope.mount(ClockDomain, store, &bus).unwrap();

        assert_eq!(scope.len(), 1);
        assert!(!old.is_mounted());
        assert!(new.is_mounted());
        assert_eq!(bus.subscriber_count(Topic::ClockSettingsChanged), 1);
    }

    #[tokio::test]
    async fn unmount_all_releases_subscriptions() {
        let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
        let bus = EventBus::new();
        let mut scope = ProviderScope::new();
        scope.mount(CurrencyDomain, store.clone(), &bus).unwrap();
        scope.mount(ClockDomain, store, &bus).unwrap();

        for pending in scope.unmount_all() {
            pending.drain().await;
        }
        assert!(scope.is_empty());
        assert_eq!(bus.subscriber_count(Topic::CurrenciesUpdated), 0);
        assert_eq!(bus.subscriber_count(Topic::ClockSettingsChanged), 0);
    }

    #[tokio::test]
    async fn one_failing_domain_does_not_block_others() {
        let bus = EventBus::new();
        let mut scope = ProviderScope::new();
        scope.mount(CurrencyDomain, Arc::new(FailingStore), &bus).unwrap();
        let clock = scope
            .mount(ClockDomain, Arc::new(InMemoryStore::new()), &bus)
            .unwrap();

        let err = scope.ready_all().await.unwrap_err();
        assert!(matches!(err, StateError::LoadFailed { domain: "currency", .. }));
        assert!(clock.is_ready());
    }
}
