use std::fmt;
use std::sync::Arc;

use tracing::info;

use wgt_bus::EventBus;
use wgt_state::{
    Accessor, ClockDomain, CurrencyConverter, CurrencyDomain, Domain, Notice, OnboardingDomain,
    PendingWrite, ProviderScope, RateProvider, SettingsPanelDomain, WallpaperCatalog,
    WallpaperDomain, WidgetVisibilityDomain,
};
use wgt_store::KeyValueStore;

use crate::config::DashboardConfig;
use crate::error::DashboardResult;

/// Every configured domain mounted over one store and one bus.
pub struct Dashboard {
    config: DashboardConfig,
    store: Arc<dyn KeyValueStore>,
    bus: EventBus,
    scope: ProviderScope,
}

impl Dashboard {
    /// Open the configured store and mount the enabled domains.
    pub fn mount(config: DashboardConfig) -> DashboardResult<Self> {
        let store = config.open_store();
        let catalog = config.catalog();
        Self::mount_with(config, store, catalog)
    }

    /// Mount over an existing store, optionally with a wallpaper catalog.
    pub fn mount_with(
        config: DashboardConfig,
        store: Arc<dyn KeyValueStore>,
        catalog: Option<Arc<dyn WallpaperCatalog>>,
    ) -> DashboardResult<Self> {
        let bus = EventBus::new();
        let mut scope = ProviderScope::new();
        let domains = config.domains;

        if domains.currency {
            scope.mount(CurrencyDomain, store.clone(), &bus)?;
        }
        if domains.clock {
            scope.mount(ClockDomain, store.clone(), &bus)?;
        }
        if domains.wallpaper {
            scope.mount(WallpaperDomain::new(catalog), store.clone(), &bus)?;
        }
        if domains.widgets {
            scope.mount(WidgetVisibilityDomain, store.clone(), &bus)?;
        }
        if domains.onboarding {
            scope.mount(OnboardingDomain, store.clone(), &bus)?;
        }
        if domains.settings_panel {
            scope.mount(SettingsPanelDomain, store.clone(), &bus)?;
        }

        info!(domains = ?scope.names(), "dashboard mounted");
        Ok(Self {
            config,
            store,
            bus,
            scope,
        })
    }

    /// Wait for every mounted domain to finish loading.
    pub async fn ready(&self) -> DashboardResult<()> {
        self.scope.ready_all().await?;
        Ok(())
    }

    pub fn accessor<D: Domain>(&self) -> DashboardResult<Accessor<D>> {
        Ok(self.scope.accessor::<D>()?)
    }

    pub fn currency(&self) -> DashboardResult<Accessor<CurrencyDomain>> {
        self.accessor()
    }

    pub fn clock(&self) -> DashboardResult<Accessor<ClockDomain>> {
        self.accessor()
    }

    pub fn wallpaper(&self) -> DashboardResult<Accessor<WallpaperDomain>> {
        self.accessor()
    }

    pub fn widgets(&self) -> DashboardResult<Accessor<WidgetVisibilityDomain>> {
        self.accessor()
    }

    pub fn onboarding(&self) -> DashboardResult<Accessor<OnboardingDomain>> {
        self.accessor()
    }

    pub fn settings_panel(&self) -> DashboardResult<Accessor<SettingsPanelDomain>> {
        self.accessor()
    }

    /// Converter that prices currencies with `rates`.
    pub fn converter(&self, rates: Arc<dyn RateProvider>) -> CurrencyConverter {
        CurrencyConverter::new(rates)
    }

    /// Notice due for the configured version.
    pub fn pending_notice(&self) -> DashboardResult<Option<Notice>> {
        Ok(self.onboarding()?.pending_notice(&self.config.version_name))
    }

    /// Mark the configured version's release notes as seen.
    pub fn acknowledge_release(&self) -> DashboardResult<PendingWrite> {
        Ok(self
            .onboarding()?
            .acknowledge_release(&self.config.version_name)?)
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Names of the mounted domains.
    pub fn domains(&self) -> Vec<&'static str> {
        self.scope.names()
    }

    /// Wait for every outstanding storage write, including writes whose
    /// [`PendingWrite`] was dropped.
    pub async fn flush(&self) -> DashboardResult<()> {
        self.scope.flush_all().await?;
        Ok(())
    }

    /// Unmount every domain and wait for outstanding loads to settle.
    pub async fn unmount(mut self) {
        for pending in self.scope.unmount_all() {
            pending.drain().await;
        }
        info!("dashboard unmounted");
    }
}

impl fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dashboard")
            .field("version_name", &self.config.version_name)
            .field("domains", &self.scope.names())
            .finish()
    }
}
