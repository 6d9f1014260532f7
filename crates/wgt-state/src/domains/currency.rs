use async_trait::async_trait;

use wgt_bus::{BusEvent, Topic};
use wgt_store::{typed, KeyValueStore, StoreResult};
use wgt_types::{keys, CurrencyCode, CurrencyColorMode};

use crate::domain::{Domain, Entry, Hydrated};
use crate::error::StateResult;
use crate::provider::{Accessor, PendingWrite};

/// Currencies shown when storage has no selection.
pub const DEFAULT_CURRENCIES: [&str; 3] = ["USD", "EUR", "GRAM"];

/// Selected currencies and colour mode of the currency widget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrencySnapshot {
    /// Ordered selection; order is the display order.
    pub selected: Vec<CurrencyCode>,
    pub color_mode: CurrencyColorMode,
}

impl Default for CurrencySnapshot {
    fn default() -> Self {
        Self {
            selected: DEFAULT_CURRENCIES
                .into_iter()
                .map(CurrencyCode::from_static)
                .collect(),
            color_mode: CurrencyColorMode::Normal,
        }
    }
}

/// Domain persisted under `currencies` and `currencyColorMode`.
#[derive(Clone, Copy, Debug, Default)]
pub struct CurrencyDomain;

#[async_trait]
impl Domain for CurrencyDomain {
    type Snapshot = CurrencySnapshot;
    const NAME: &'static str = "currency";

    fn topic(&self) -> Option<Topic> {
        Some(Topic::CurrenciesUpdated)
    }

    fn neutral(&self) -> CurrencySnapshot {
        CurrencySnapshot {
            selected: Vec::new(),
            color_mode: CurrencyColorMode::Normal,
        }
    }

    async fn load(&self, store: &dyn KeyValueStore) -> StoreResult<Hydrated<CurrencySnapshot>> {
        let (selected, color_mode) = tokio::join!(
            typed::get::<Vec<CurrencyCode>, _>(store, keys::CURRENCIES),
            typed::get::<CurrencyColorMode, _>(store, keys::CURRENCY_COLOR_MODE),
        );
        let defaults = CurrencySnapshot::default();
        Ok(Hydrated::loaded(CurrencySnapshot {
            selected: selected?.unwrap_or(defaults.selected),
            color_mode: color_mode?.unwrap_or(defaults.color_mode),
        }))
    }

    fn entries(&self, snapshot: &CurrencySnapshot) -> StoreResult<Vec<Entry>> {
        Ok(vec![
            Entry::encode(keys::CURRENCIES, &snapshot.selected)?,
            Entry::encode(keys::CURRENCY_COLOR_MODE, &snapshot.color_mode)?,
        ])
    }

    fn on_event(&self, _current: Option<&CurrencySnapshot>, event: &BusEvent) -> Option<CurrencySnapshot> {
        match event {
            BusEvent::CurrenciesUpdated(update) => Some(CurrencySnapshot {
                selected: update.currencies.clone(),
                color_mode: update.color_mode,
            }),
            _ => None,
        }
    }
}

pub type CurrencyStore = Accessor<CurrencyDomain>;

impl Accessor<CurrencyDomain> {
    /// Selected currencies; empty until the domain is ready.
    pub fn selected_currencies(&self) -> Vec<CurrencyCode> {
        self.read(|s| s.selected.clone()).unwrap_or_default()
    }

    /// Colour mode, or `None` until the domain is ready.
    pub fn color_mode(&self) -> Option<CurrencyColorMode> {
        self.read(|s| s.color_mode)
    }

    pub fn set_selected_currencies(&self, currencies: Vec<CurrencyCode>) -> StateResult<PendingWrite> {
        self.update(|s| s.selected = currencies)
    }

    /// Replace the selection with a reordered list. Same semantics as
    /// [`set_selected_currencies`](Self::set_selected_currencies).
    pub fn reorder_currencies(&self, currencies: Vec<CurrencyCode>) -> StateResult<PendingWrite> {
        self.set_selected_currencies(currencies)
    }

    pub fn set_color_mode(&self, mode: CurrencyColorMode) -> StateResult<PendingWrite> {
        self.update(|s| s.color_mode = mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use proptest::prelude::*;
    use serde_json::json;
    use wgt_bus::EventBus;
    use wgt_store::InMemoryStore;

    use crate::provider::Provider;

    fn codes(list: &[&str]) -> Vec<CurrencyCode> {
        list.iter().map(|c| CurrencyCode::new(c).unwrap()).collect()
    }

    #[tokio::test]
    async fn empty_storage_yields_defaults() {
        let bus = EventBus::new();
        let provider = Provider::mount(CurrencyDomain, Arc::new(InMemoryStore::new()), &bus).unwrap();
        let currency = provider.accessor();
        currency.ready().await.unwrap();

        assert_eq!(currency.selected_currencies(), codes(&["USD", "EUR", "GRAM"]));
        assert_eq!(currency.color_mode(), Some(CurrencyColorMode::Normal));
    }

    #[tokio::test]
    async fn empty_list_is_not_replaced_by_default() {
        let store = InMemoryStore::with_entries([(keys::CURRENCIES, json!([]))]);
        let bus = EventBus::new();
        let provider = Provider::mount(CurrencyDomain, Arc::new(store), &bus).unwrap();
        let currency = provider.accessor();
        currency.ready().await.unwrap();

        assert!(currency.selected_currencies().is_empty());
        assert_eq!(currency.color_mode(), Some(CurrencyColorMode::Normal));
    }

    #[tokio::test]
    async fn malformed_values_fall_back_to_defaults() {
        let store = InMemoryStore::with_entries([
            (keys::CURRENCIES, json!("USD")),
            (keys::CURRENCY_COLOR_MODE, json!("NEON")),
        ]);
        let bus = EventBus::new();
        let provider = Provider::mount(CurrencyDomain, Arc::new(store), &bus).unwrap();
        let currency = provider.accessor();
        currency.ready().await.unwrap();

        assert_eq!(currency.current(), CurrencySnapshot::default());
    }

    #[tokio::test]
    async fn reorder_is_persisted_in_order() {
        let store = Arc::new(InMemoryStore::new());
        let bus = EventBus::new();
        let provider = Provider::mount(CurrencyDomain, store.clone(), &bus).unwrap();
        let currency = provider.accessor();
        currency.ready().await.unwrap();

        currency
            .reorder_currencies(codes(&["GRAM", "USD", "EUR"]))
            .unwrap()
            .finished()
            .await
            .unwrap();
        assert_eq!(store.snapshot(keys::CURRENCIES), Some(json!(["GRAM", "USD", "EUR"])));
    }

    #[tokio::test]
    async fn bus_update_replaces_both_fields() {
        let store = Arc::new(InMemoryStore::new());
        let bus = EventBus::new();
        let provider = Provider::mount(CurrencyDomain, store.clone(), &bus).unwrap();
        let currency = provider.accessor();
        currency.ready().await.unwrap();

        let event = BusEvent::decode(
            "currencies_updated",
            json!({"currencies": ["BTC", "IRT"], "colorMode": "X"}),
        )
        .unwrap();
        assert_eq!(bus.publish(event), 1);

        assert_eq!(currency.selected_currencies(), codes(&["BTC", "IRT"]));
        assert_eq!(currency.color_mode(), Some(CurrencyColorMode::X));
        currency.flush().await.unwrap();
        assert!(store.is_empty());
    }

    fn code_strategy() -> impl Strategy<Value = CurrencyCode> {
        "[A-Z]{3,5}".prop_map(|s| CurrencyCode::new(&s).unwrap())
    }

    proptest! {
        #[test]
        fn persisted_selection_survives_remount(
            selected in prop::collection::vec(code_strategy(), 0..8),
            x_mode in any::<bool>(),
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let mode = if x_mode { CurrencyColorMode::X } else { CurrencyColorMode::Normal };
            let expected = CurrencySnapshot { selected: selected.clone(), color_mode: mode };

            let reloaded = runtime.block_on(async {
                let store = Arc::new(InMemoryStore::new());
                let bus = EventBus::new();

                let first = Provider::mount(CurrencyDomain, store.clone(), &bus).unwrap();
                let currency = first.accessor();
                currency.ready().await.unwrap();
                let a = currency.set_selected_currencies(selected).unwrap();
                let b = currency.set_color_mode(mode).unwrap();
                a.finished().await.unwrap();
                b.finished().await.unwrap();
                first.unmount().drain().await;

                let second = Provider::mount(CurrencyDomain, store, &bus).unwrap();
                let currency = second.accessor();
                currency.ready().await.unwrap();
                currency.current()
            });
            prop_assert_eq!(reloaded, expected);
        }
    }
}
