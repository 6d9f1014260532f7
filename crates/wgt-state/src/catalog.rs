//! Source of wallpapers offered when storage holds none.

use async_trait::async_trait;
use rand::seq::SliceRandom;

use wgt_types::StoredWallpaper;

use crate::error::StateResult;

/// Remote wallpaper catalog.
#[async_trait]
pub trait WallpaperCatalog: Send + Sync {
    /// A random catalog entry, or `None` if the catalog is empty.
    async fn random(&self) -> StateResult<Option<StoredWallpaper>>;
}

/// Catalog backed by a fixed list.
#[derive(Clone, Debug, Default)]
pub struct StaticCatalog {
    entries: Vec<StoredWallpaper>,
}

impl StaticCatalog {
    pub fn new(entries: Vec<StoredWallpaper>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl WallpaperCatalog for StaticCatalog {
    async fn random(&self) -> StateResult<Option<StoredWallpaper>> {
        Ok(self.entries.choose(&mut rand::thread_rng()).cloned())
    }
}
