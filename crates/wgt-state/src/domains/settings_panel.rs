use async_trait::async_trait;

use wgt_bus::{BusEvent, OpenWidgetsSettings, Topic};
use wgt_store::{KeyValueStore, StoreResult};
use wgt_types::WidgetTab;

use crate::domain::{Domain, Entry, Hydrated};
use crate::error::StateResult;
use crate::provider::{Accessor, PendingWrite};

/// Open state of the widget settings panel. Never persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SettingsPanelSnapshot {
    pub open: bool,
    pub tab: Option<WidgetTab>,
}

/// Transient domain driven by `openWidgetsSettings`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SettingsPanelDomain;

#[async_trait]
impl Domain for SettingsPanelDomain {
    type Snapshot = SettingsPanelSnapshot;
    const NAME: &'static str = "settings-panel";

    fn topic(&self) -> Option<Topic> {
        Some(Topic::OpenWidgetsSettings)
    }

    fn neutral(&self) -> SettingsPanelSnapshot {
        SettingsPanelSnapshot::default()
    }

    async fn load(&self, _store: &dyn KeyValueStore) -> StoreResult<Hydrated<SettingsPanelSnapshot>> {
        Ok(Hydrated::loaded(SettingsPanelSnapshot::default()))
    }

    fn entries(&self, _snapshot: &SettingsPanelSnapshot) -> StoreResult<Vec<Entry>> {
        Ok(Vec::new())
    }

    fn on_event(
        &self,
        current: Option<&SettingsPanelSnapshot>,
        event: &BusEvent,
    ) -> Option<SettingsPanelSnapshot> {
        let BusEvent::OpenWidgetsSettings(OpenWidgetsSettings { tab }) = event else {
            return None;
        };
        // A request without a tab keeps the previously selected one.
        Some(SettingsPanelSnapshot {
            open: true,
            tab: tab.or_else(|| current.and_then(|s| s.tab)),
        })
    }
}

impl Accessor<SettingsPanelDomain> {
    pub fn is_open(&self) -> bool {
        self.read(|s| s.open).unwrap_or(false)
    }

    pub fn tab(&self) -> Option<WidgetTab> {
        self.read(|s| s.tab).flatten()
    }

    /// Publish an open request so every listener sees it.
    pub fn open(&self, tab: Option<WidgetTab>) -> usize {
        self.bus()
            .publish(BusEvent::OpenWidgetsSettings(OpenWidgetsSettings { tab }))
    }

    pub fn close(&self) -> StateResult<PendingWrite> {
        self.update(|s| {
            s.open = false;
            s.tab = None;
        })
    }
}
