use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use wgt_state::{StaticCatalog, WallpaperCatalog};
use wgt_store::{FileStore, InMemoryStore, KeyValueStore};
use wgt_types::StoredWallpaper;

use crate::error::{DashboardError, DashboardResult};

/// Dashboard settings, usually read from a TOML file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Release whose notes count as current.
    pub version_name: String,
    pub storage: StorageConfig,
    pub domains: DomainSet,
    /// Catalog a fresh install picks its first wallpaper from.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub wallpapers: Vec<StoredWallpaper>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            version_name: env!("CARGO_PKG_VERSION").to_string(),
            storage: StorageConfig::default(),
            domains: DomainSet::default(),
            wallpapers: Vec::new(),
        }
    }
}

impl DashboardConfig {
    pub fn from_toml_str(text: &str) -> DashboardResult<Self> {
        toml::from_str(text).map_err(|e| DashboardError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> DashboardResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> DashboardResult<String> {
        toml::to_string_pretty(self).map_err(|e| DashboardError::Config(e.to_string()))
    }

    /// Open the configured storage backend.
    pub fn open_store(&self) -> Arc<dyn KeyValueStore> {
        match &self.storage {
            StorageConfig::Memory => Arc::new(InMemoryStore::new()),
            StorageConfig::File { path } => Arc::new(FileStore::new(path.clone())),
        }
    }

    /// Catalog over the configured wallpapers, if any are listed.
    pub fn catalog(&self) -> Option<Arc<dyn WallpaperCatalog>> {
        if self.wallpapers.is_empty() {
            return None;
        }
        Some(Arc::new(StaticCatalog::new(self.wallpapers.clone())))
    }
}

/// Where persisted values live.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Nothing survives the process.
    #[default]
    Memory,
    /// A JSON document on disk.
    File { path: PathBuf },
}

/// Which domains get a provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainSet {
    pub currency: bool,
    pub clock: bool,
    pub wallpaper: bool,
    pub widgets: bool,
    pub onboarding: bool,
    pub settings_panel: bool,
}

impl Default for DomainSet {
    fn default() -> Self {
        Self {
            currency: true,
            clock: true,
            wallpaper: true,
            widgets: true,
            onboarding: true,
            settings_panel: true,
        }
    }
}
