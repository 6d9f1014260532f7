use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use wgt_bus::{BusEvent, Topic};
use wgt_store::{typed, KeyValueStore, StoreResult};
use wgt_types::{keys, StoredWallpaper};

use crate::catalog::WallpaperCatalog;
use crate::domain::{Domain, Entry, Hydrated};
use crate::error::StateResult;
use crate::provider::{Accessor, PendingWrite};

/// Domain persisted under `wallpaper`.
///
/// When storage is empty a random catalog entry is chosen (with retouch
/// off), falling back to the built-in gradient. Either choice is written
/// back so the next mount shows the same wallpaper.
#[derive(Clone, Default)]
pub struct WallpaperDomain {
    catalog: Option<Arc<dyn WallpaperCatalog>>,
}

impl WallpaperDomain {
    pub fn new(catalog: Option<Arc<dyn WallpaperCatalog>>) -> Self {
        Self { catalog }
    }

    async fn fallback(&self) -> StoredWallpaper {
        let Some(catalog) = &self.catalog else {
            return StoredWallpaper::default_gradient();
        };
        match catalog.random().await {
            Ok(Some(wallpaper)) => StoredWallpaper {
                is_retouch_enabled: false,
                ..wallpaper
            },
            Ok(None) => StoredWallpaper::default_gradient(),
            Err(e) => {
                warn!(error = %e, "wallpaper catalog unavailable, using default gradient");
                StoredWallpaper::default_gradient()
            }
        }
    }
}

impl fmt::Debug for WallpaperDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WallpaperDomain")
            .field("catalog", &self.catalog.is_some())
            .finish()
    }
}

#[async_trait]
impl Domain for WallpaperDomain {
    type Snapshot = StoredWallpaper;
    const NAME: &'static str = "wallpaper";

    fn topic(&self) -> Option<Topic> {
        Some(Topic::WallpaperChanged)
    }

    fn neutral(&self) -> StoredWallpaper {
        StoredWallpaper::default_gradient()
    }

    async fn load(&self, store: &dyn KeyValueStore) -> StoreResult<Hydrated<StoredWallpaper>> {
        match typed::get::<StoredWallpaper, _>(store, keys::WALLPAPER).await? {
            Some(stored) => Ok(Hydrated::loaded(stored)),
            None => Ok(Hydrated::generated(self.fallback().await)),
        }
    }

    fn entries(&self, snapshot: &StoredWallpaper) -> StoreResult<Vec<Entry>> {
        Ok(vec![Entry::encode(keys::WALLPAPER, snapshot)?])
    }

    fn on_event(&self, _current: Option<&StoredWallpaper>, event: &BusEvent) -> Option<StoredWallpaper> {
        match event {
            BusEvent::WallpaperChanged(wallpaper) => Some(wallpaper.clone()),
            _ => None,
        }
    }

    fn persists_bus_updates(&self) -> bool {
        true
    }
}

impl Accessor<WallpaperDomain> {
    /// Active wallpaper, or `None` until the domain is ready.
    pub fn wallpaper(&self) -> Option<StoredWallpaper> {
        self.snapshot()
    }

    /// Store `wallpaper` and announce it on `wallpaperChanged`.
    ///
    /// Other listeners see the message after the local snapshot changed;
    /// this provider's own handler then finds nothing to do.
    pub fn set_wallpaper(&self, wallpaper: StoredWallpaper) -> StateResult<PendingWrite> {
        let pending = self.update(|s| *s = wallpaper.clone())?;
        self.bus().publish(BusEvent::WallpaperChanged(wallpaper));
        Ok(pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use wgt_bus::EventBus;
    use wgt_store::InMemoryStore;
    use wgt_types::{GradientDirection, WallpaperKind};

    use crate::catalog::StaticCatalog;
    use crate::provider::Provider;

    fn image(id: &str) -> StoredWallpaper {
        StoredWallpaper {
            id: id.to_string(),
            kind: WallpaperKind::Image,
            src: format!("https://cdn.example/{id}.jpg"),
            is_retouch_enabled: true,
            gradient: None,
        }
    }

    #[tokio::test]
    async fn empty_storage_without_catalog_uses_default_gradient() {
        let store = Arc::new(InMemoryStore::new());
        let bus = EventBus::new();
        let provider = Provider::mount(WallpaperDomain::default(), store.clone(), &bus).unwrap();
        let wallpaper = provider.accessor();
        wallpaper.ready().await.unwrap();

        let current = wallpaper.wallpaper().unwrap();
        assert_eq!(current.id, "gradient-a1c4fd-c2e9fb");
        assert_eq!(current.kind, WallpaperKind::Gradient);
        let gradient = current.gradient.clone().unwrap();
        assert_eq!(gradient.from, "#a1c4fd");
        assert_eq!(gradient.to, "#c2e9fb");
        assert_eq!(gradient.direction, GradientDirection::ToRight);

        wallpaper.flush().await.unwrap();
        assert_eq!(
            store.snapshot(keys::WALLPAPER),
            Some(serde_json::to_value(&current).unwrap())
        );
    }

    #[tokio::test]
    async fn empty_storage_picks_catalog_entry_without_retouch() {
        let store = Arc::new(InMemoryStore::new());
        let catalog: Arc<dyn WallpaperCatalog> = Arc::new(StaticCatalog::new(vec![image("sea")]));
        let bus = EventBus::new();
        let provider = Provider::mount(WallpaperDomain::new(Some(catalog)), store.clone(), &bus).unwrap();
        let wallpaper = provider.accessor();
        wallpaper.ready().await.unwrap();

        let current = wallpaper.wallpaper().unwrap();
        assert_eq!(current.id, "sea");
        assert!(!current.is_retouch_enabled);
        wallpaper.flush().await.unwrap();
        assert!(store.snapshot(keys::WALLPAPER).is_some());
    }

    #[tokio::test]
    async fn stored_wallpaper_is_not_rewritten() {
        let stored = image("forest");
        let store = Arc::new(InMemoryStore::with_entries([(
            keys::WALLPAPER,
            serde_json::to_value(&stored).unwrap(),
        )]));
        let catalog: Arc<dyn WallpaperCatalog> = Arc::new(StaticCatalog::new(vec![image("sea")]));
        let bus = EventBus::new();
        let provider = Provider::mount(WallpaperDomain::new(Some(catalog)), store.clone(), &bus).unwrap();
        let wallpaper = provider.accessor();
        wallpaper.ready().await.unwrap();

        assert_eq!(wallpaper.wallpaper(), Some(stored));
    }

    #[tokio::test]
    async fn set_wallpaper_persists_and_publishes() {
        let store = Arc::new(InMemoryStore::new());
        let bus = EventBus::new();
        let provider = Provider::mount(WallpaperDomain::default(), store.clone(), &bus).unwrap();
        let wallpaper = provider.accessor();
        wallpaper.ready().await.unwrap();
        wallpaper.flush().await.unwrap();

        let seen = Arc::new(std::sync::Mutex::new(None));
        let sink = seen.clone();
        let _sub = bus.subscribe(Topic::WallpaperChanged, move |event| {
            *sink.lock().unwrap() = Some(event.clone());
        });

        let next = image("dunes");
        wallpaper
            .set_wallpaper(next.clone())
            .unwrap()
            .finished()
            .await
            .unwrap();
        wallpaper.flush().await.unwrap();

        assert_eq!(wallpaper.wallpaper(), Some(next.clone()));
        assert_eq!(
            store.snapshot(keys::WALLPAPER),
            Some(serde_json::to_value(&next).unwrap())
        );
        assert_eq!(*seen.lock().unwrap(), Some(BusEvent::WallpaperChanged(next)));
    }
}
