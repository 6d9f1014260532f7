use async_trait::async_trait;

use wgt_store::{typed, KeyValueStore, StoreResult};
use wgt_types::{keys, WidgetKey};

use crate::domain::{Domain, Entry, Hydrated};
use crate::error::StateResult;
use crate::provider::{Accessor, PendingWrite};

/// Widgets visible on a fresh install, in display order.
pub const DEFAULT_WIDGETS: [WidgetKey; 4] = [
    WidgetKey::Calendar,
    WidgetKey::Tools,
    WidgetKey::Weather,
    WidgetKey::Todos,
];

/// Number of widgets the home grid has room for.
pub const HOME_SLOTS: usize = 4;

/// Domain persisted under `activeWidgets`: the ordered list of visible
/// widgets.
#[derive(Clone, Copy, Debug, Default)]
pub struct WidgetVisibilityDomain;

fn dedup(widgets: Vec<WidgetKey>) -> Vec<WidgetKey> {
    let mut out: Vec<WidgetKey> = Vec::with_capacity(widgets.len());
    for widget in widgets {
        if !out.contains(&widget) {
            out.push(widget);
        }
    }
    out
}

#[async_trait]
impl Domain for WidgetVisibilityDomain {
    type Snapshot = Vec<WidgetKey>;
    const NAME: &'static str = "widgets";

    fn neutral(&self) -> Vec<WidgetKey> {
        Vec::new()
    }

    async fn load(&self, store: &dyn KeyValueStore) -> StoreResult<Hydrated<Vec<WidgetKey>>> {
        let stored = typed::get::<Vec<WidgetKey>, _>(store, keys::ACTIVE_WIDGETS).await?;
        let visible = stored.map_or_else(|| DEFAULT_WIDGETS.to_vec(), dedup);
        Ok(Hydrated::loaded(visible))
    }

    fn entries(&self, snapshot: &Vec<WidgetKey>) -> StoreResult<Vec<Entry>> {
        Ok(vec![Entry::encode(keys::ACTIVE_WIDGETS, snapshot)?])
    }
}

impl Accessor<WidgetVisibilityDomain> {
    pub fn is_visible(&self, widget: WidgetKey) -> bool {
        self.read(|s| s.contains(&widget)).unwrap_or(false)
    }

    /// Show a hidden widget (appended last) or hide a visible one.
    pub fn toggle(&self, widget: WidgetKey) -> StateResult<PendingWrite> {
        self.update(|s| {
            if let Some(pos) = s.iter().position(|w| *w == widget) {
                s.remove(pos);
            } else {
                s.push(widget);
            }
        })
    }

    /// Reorder visible widgets. Keys in `order` that are not visible are
    /// ignored; visible keys missing from `order` keep their relative order
    /// after the listed ones.
    pub fn reorder(&self, order: Vec<WidgetKey>) -> StateResult<PendingWrite> {
        self.update(|s| {
            let mut next: Vec<WidgetKey> = dedup(order)
                .into_iter()
                .filter(|w| s.contains(w))
                .collect();
            let rest: Vec<WidgetKey> = s.iter().filter(|w| !next.contains(w)).copied().collect();
            next.extend(rest);
            *s = next;
        })
    }

    /// Visible widgets in display order.
    pub fn sorted_widgets(&self) -> Vec<WidgetKey> {
        self.snapshot().unwrap_or_default()
    }

    /// Widgets that fit on the home grid.
    pub fn home_widgets(&self) -> Vec<WidgetKey> {
        self.read(|s| s.iter().take(HOME_SLOTS).copied().collect())
            .unwrap_or_default()
    }
}
