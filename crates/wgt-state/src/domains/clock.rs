use async_trait::async_trait;

use wgt_bus::{BusEvent, OpenWidgetsSettings, Topic};
use wgt_store::{typed, KeyValueStore, StoreResult};
use wgt_types::{keys, ClockSettings, WidgetTab};

use crate::domain::{Domain, Entry, Hydrated};
use crate::error::StateResult;
use crate::provider::{Accessor, PendingWrite};

/// Domain persisted under `clock`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClockDomain;

#[async_trait]
impl Domain for ClockDomain {
    type Snapshot = ClockSettings;
    const NAME: &'static str = "clock";

    fn topic(&self) -> Option<Topic> {
        Some(Topic::ClockSettingsChanged)
    }

    fn neutral(&self) -> ClockSettings {
        ClockSettings::default()
    }

    async fn load(&self, store: &dyn KeyValueStore) -> StoreResult<Hydrated<ClockSettings>> {
        let stored = typed::get::<ClockSettings, _>(store, keys::CLOCK).await?;
        Ok(Hydrated::loaded(stored.unwrap_or_default()))
    }

    fn entries(&self, snapshot: &ClockSettings) -> StoreResult<Vec<Entry>> {
        Ok(vec![Entry::encode(keys::CLOCK, snapshot)?])
    }

    fn on_event(&self, _current: Option<&ClockSettings>, event: &BusEvent) -> Option<ClockSettings> {
        match event {
            BusEvent::ClockSettingsChanged(settings) => Some(settings.clone()),
            _ => None,
        }
    }
}

impl Accessor<ClockDomain> {
    /// Clock settings, or `None` until the domain is ready.
    pub fn settings(&self) -> Option<ClockSettings> {
        self.snapshot()
    }

    pub fn set_settings(&self, settings: ClockSettings) -> StateResult<PendingWrite> {
        self.update(|s| *s = settings)
    }

    /// Ask the widget settings panel to open on the WigiPad tab. Returns the
    /// number of listeners reached.
    pub fn request_settings_panel(&self) -> usize {
        self.bus().publish(BusEvent::OpenWidgetsSettings(OpenWidgetsSettings {
            tab: Some(WidgetTab::WigiPad),
        }))
    }
}
