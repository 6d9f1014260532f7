//! Generic provider lifecycle shared by every domain.
//!
//! A [`Provider`] owns one domain's state. Mounting it subscribes to the
//! domain's bus topic and spawns the hydration task; the state moves from
//! [`Phase::Uninitialized`] through [`Phase::Loading`] to [`Phase::Ready`].
//! Consumers interact through cloneable [`Accessor`] handles.
//!
//! State lives in a `tokio::sync::watch` channel, so every transition is
//! applied under one lock and announced to watchers exactly once. The
//! unmount flag is part of that state: a hydration result that arrives
//! after unmount is dropped under the same lock that would have applied it.
//!
//! Writes for a domain are stamped with a sequence number taken while the
//! snapshot is updated and are applied in order behind an async mutex. A
//! write older than the last one stored for its key is skipped, so the
//! newest mutation is always the one left in storage.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::{oneshot, watch, Mutex as AsyncMutex};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, warn};

use wgt_bus::{BusEvent, EventBus, Subscription};
use wgt_store::{KeyValueStore, StoreError, StoreResult};

use crate::domain::{Domain, Entry};
use crate::error::{StateError, StateResult};

/// Lifecycle phase of a domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Created, not yet mounted.
    Uninitialized,
    /// Hydration from storage is in flight (or failed).
    Loading,
    /// The snapshot is populated.
    Ready,
}

/// Everything a watcher can observe about a domain.
#[derive(Clone, Debug, PartialEq)]
pub struct ProviderState<S> {
    pub phase: Phase,
    /// Populated exactly when `phase` is [`Phase::Ready`].
    pub snapshot: Option<S>,
    /// Message of the failed initial load, if any.
    pub load_error: Option<String>,
    pub mounted: bool,
}

impl<S> ProviderState<S> {
    fn new() -> Self {
        Self {
            phase: Phase::Uninitialized,
            snapshot: None,
            load_error: None,
            mounted: true,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.phase == Phase::Ready
    }
}

type WriteTask = JoinHandle<()>;

enum Hydration {
    Discarded,
    Superseded,
    Ready,
    Failed(String),
}

struct Shared<D: Domain> {
    domain: D,
    store: Arc<dyn KeyValueStore>,
    bus: EventBus,
    runtime: Handle,
    state: watch::Sender<ProviderState<D::Snapshot>>,
    next_seq: AtomicU64,
    last_written: AsyncMutex<HashMap<&'static str, u64>>,
    background: Mutex<Vec<WriteTask>>,
    /// First failure of a write nobody awaited, reported by the next flush.
    unclaimed: Mutex<Option<StoreError>>,
}

impl<D: Domain> Shared<D> {
    fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Entries of `after` whose encoded value differs from `before`.
    fn changed_entries(
        &self,
        before: Option<&D::Snapshot>,
        after: &D::Snapshot,
    ) -> StoreResult<Vec<Entry>> {
        let next = self.domain.entries(after)?;
        let Some(before) = before else {
            return Ok(next);
        };
        let prev = self.domain.entries(before)?;
        Ok(next
            .into_iter()
            .filter(|e| !prev.iter().any(|p| p.key == e.key && p.value == e.value))
            .collect())
    }

    async fn hydrate(self: Arc<Self>) {
        let loaded = self.domain.load(self.store.as_ref()).await;
        let mut outcome = Hydration::Discarded;
        let mut write_back = None;
        self.state.send_if_modified(|s| {
            if !s.mounted {
                return false;
            }
            match loaded {
                Ok(_) if s.phase == Phase::Ready => {
                    outcome = Hydration::Superseded;
                    false
                }
                Ok(hydrated) => {
                    if hydrated.write_back {
                        write_back = Some((
                            self.next_seq(),
                            self.domain.entries(&hydrated.snapshot),
                        ));
                    }
                    s.snapshot = Some(hydrated.snapshot);
                    s.phase = Phase::Ready;
                    s.load_error = None;
                    outcome = Hydration::Ready;
                    true
                }
                Err(e) => {
                    let reason = e.to_string();
                    s.load_error = Some(reason.clone());
                    outcome = Hydration::Failed(reason);
                    true
                }
            }
        });

        match outcome {
            Hydration::Discarded => debug!(domain = D::NAME, "late load discarded after unmount"),
            Hydration::Superseded => {
                debug!(domain = D::NAME, "load superseded by bus update")
            }
            Hydration::Ready => debug!(domain = D::NAME, "domain ready"),
            Hydration::Failed(reason) => {
                warn!(domain = D::NAME, error = %reason, "loading domain failed")
            }
        }

        match write_back {
            Some((seq, Ok(entries))) => self.persist_in_background(seq, entries),
            Some((_, Err(e))) => {
                warn!(domain = D::NAME, error = %e, "could not encode generated default")
            }
            None => {}
        }
    }

    fn apply_event(self: &Arc<Self>, event: &BusEvent) {
        let mut write = None;
        let modified = self.state.send_if_modified(|s| {
            if !s.mounted {
                return false;
            }
            let Some(next) = self.domain.on_event(s.snapshot.as_ref(), event) else {
                return false;
            };
            if s.phase == Phase::Ready && s.snapshot.as_ref() == Some(&next) {
                return false;
            }
            if self.domain.persists_bus_updates() {
                write = Some((
                    self.next_seq(),
                    self.changed_entries(s.snapshot.as_ref(), &next),
                ));
            }
            s.snapshot = Some(next);
            s.phase = Phase::Ready;
            true
        });
        if modified {
            debug!(domain = D::NAME, topic = %event.topic(), "snapshot replaced from bus");
        }
        match write {
            Some((seq, Ok(entries))) => self.persist_in_background(seq, entries),
            Some((_, Err(e))) => {
                warn!(domain = D::NAME, error = %e, "could not encode bus update")
            }
            None => {}
        }
    }

    /// Spawn the write for `seq`. With a `reply` channel the outcome goes
    /// to the caller holding the receiver. A failure nobody receives is
    /// kept for the next flush.
    fn spawn_write(
        self: &Arc<Self>,
        seq: u64,
        entries: Vec<Entry>,
        reply: Option<oneshot::Sender<StoreResult<()>>>,
    ) -> WriteTask {
        let shared = Arc::clone(self);
        self.runtime.spawn(async move {
            let result = shared.write(seq, entries).await;
            if let Err(e) = &result {
                warn!(domain = D::NAME, seq, error = %e, "persisting snapshot failed");
            }
            let unclaimed = match reply {
                Some(tx) => tx.send(result).err().and_then(Result::err),
                None => result.err(),
            };
            if let Some(e) = unclaimed {
                shared
                    .unclaimed
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .get_or_insert(e);
            }
        })
    }

    /// Keep `task` until the next [`flush`](Self::flush).
    fn track(&self, task: WriteTask) {
        let mut tasks = self
            .background
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        tasks.retain(|t| !t.is_finished());
        tasks.push(task);
    }

    fn persist_in_background(self: &Arc<Self>, seq: u64, entries: Vec<Entry>) {
        if entries.is_empty() {
            return;
        }
        let task = self.spawn_write(seq, entries, None);
        self.track(task);
    }

    async fn write(&self, seq: u64, entries: Vec<Entry>) -> StoreResult<()> {
        let mut last_written = self.last_written.lock().await;
        for entry in entries {
            if last_written.get(entry.key).is_some_and(|&last| last > seq) {
                debug!(domain = D::NAME, key = entry.key, seq, "skipping superseded write");
                continue;
            }
            self.store.set(entry.key, entry.value).await?;
            last_written.insert(entry.key, seq);
        }
        Ok(())
    }

    async fn flush(&self) -> StateResult<()> {
        let tasks = std::mem::take(
            &mut *self
                .background
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        let mut first_error = None;
        for task in tasks {
            if let Err(e) = task.await {
                first_error.get_or_insert(StateError::TaskAborted {
                    domain: D::NAME,
                    reason: e.to_string(),
                });
            }
        }
        let unclaimed = self
            .unclaimed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(source) = unclaimed {
            return Err(StateError::Persist {
                domain: D::NAME,
                source,
            });
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Storage write started by a mutator.
///
/// The snapshot change is already visible when this handle is returned.
/// Await [`finished`](Self::finished) to learn whether storage accepted it.
/// Dropping the handle leaves the write running; [`Accessor::flush`] still
/// waits for it and reports its failure.
#[derive(Debug)]
pub struct PendingWrite {
    domain: &'static str,
    outcome: Option<(oneshot::Receiver<StoreResult<()>>, AbortHandle)>,
}

impl PendingWrite {
    fn settled(domain: &'static str) -> Self {
        Self {
            domain,
            outcome: None,
        }
    }

    /// `true` if nothing needed writing or the write already completed.
    pub fn is_settled(&self) -> bool {
        self.outcome
            .as_ref()
            .map_or(true, |(_, task)| task.is_finished())
    }

    /// Wait for the write and report its outcome.
    pub async fn finished(self) -> StateResult<()> {
        let Some((rx, _)) = self.outcome else {
            return Ok(());
        };
        match rx.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(source)) => Err(StateError::Persist {
                domain: self.domain,
                source,
            }),
            Err(_) => Err(StateError::TaskAborted {
                domain: self.domain,
                reason: "write task ended without a result".into(),
            }),
        }
    }
}

/// Hydration task left behind by [`Provider::unmount`].
#[derive(Debug)]
pub struct PendingLoad {
    domain: &'static str,
    task: Option<JoinHandle<()>>,
}

impl PendingLoad {
    /// Wait until the hydration task has run to completion. Its result has
    /// no effect on the unmounted domain.
    pub async fn drain(self) {
        if let Some(task) = self.task {
            if let Err(e) = task.await {
                warn!(domain = self.domain, error = %e, "load task aborted");
            }
        }
    }
}

/// Read/write capability for one domain.
///
/// Accessors are cheap to clone and never own the state. They stay valid
/// after the provider unmounts: reads return the last snapshot and
/// mutators fail with [`StateError::Unmounted`].
pub struct Accessor<D: Domain> {
    shared: Arc<Shared<D>>,
}

impl<D: Domain> Clone for Accessor<D> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<D: Domain> Accessor<D> {
    pub fn phase(&self) -> Phase {
        self.shared.state.borrow().phase
    }

    pub fn is_ready(&self) -> bool {
        self.phase() == Phase::Ready
    }

    pub fn is_mounted(&self) -> bool {
        self.shared.state.borrow().mounted
    }

    /// The snapshot, or `None` while the domain is not ready.
    pub fn snapshot(&self) -> Option<D::Snapshot> {
        self.shared.state.borrow().snapshot.clone()
    }

    /// The snapshot, or the domain's neutral value while not ready.
    pub fn current(&self) -> D::Snapshot {
        self.snapshot()
            .unwrap_or_else(|| self.shared.domain.neutral())
    }

    pub fn load_error(&self) -> Option<String> {
        self.shared.state.borrow().load_error.clone()
    }

    /// Receiver notified on every state transition.
    pub fn watch(&self) -> watch::Receiver<ProviderState<D::Snapshot>> {
        self.shared.state.subscribe()
    }

    pub fn domain(&self) -> &D {
        &self.shared.domain
    }

    pub fn bus(&self) -> &EventBus {
        &self.shared.bus
    }

    /// Wait until the domain is ready.
    ///
    /// Fails with [`StateError::LoadFailed`] if hydration failed, or
    /// [`StateError::Unmounted`] if the provider went away first.
    pub async fn ready(&self) -> StateResult<()> {
        let mut rx = self.shared.state.subscribe();
        let state = rx
            .wait_for(|s| s.phase == Phase::Ready || s.load_error.is_some() || !s.mounted)
            .await
            .map_err(|_| StateError::Unmounted { domain: D::NAME })?;
        if !state.mounted {
            return Err(StateError::Unmounted { domain: D::NAME });
        }
        if state.phase == Phase::Ready {
            return Ok(());
        }
        Err(StateError::LoadFailed {
            domain: D::NAME,
            reason: state.load_error.clone().unwrap_or_default(),
        })
    }

    /// Apply `mutate` to the snapshot and persist whatever keys changed.
    ///
    /// The new snapshot is visible to readers before this returns. A
    /// mutation that leaves the snapshot unchanged writes nothing.
    pub fn update<F>(&self, mutate: F) -> StateResult<PendingWrite>
    where
        F: FnOnce(&mut D::Snapshot),
    {
        let shared = &self.shared;
        let mut result = Err(StateError::NotReady { domain: D::NAME });
        shared.state.send_if_modified(|s| {
            if !s.mounted {
                result = Err(StateError::Unmounted { domain: D::NAME });
                return false;
            }
            if s.phase != Phase::Ready {
                return false;
            }
            let Some(current) = s.snapshot.as_mut() else {
                return false;
            };
            let before = current.clone();
            mutate(current);
            if *current == before {
                result = Ok(None);
                return false;
            }
            match shared.changed_entries(Some(&before), current) {
                Ok(entries) => {
                    result = Ok(Some((shared.next_seq(), entries)));
                    true
                }
                Err(e) => {
                    *current = before;
                    result = Err(StateError::Store(e));
                    false
                }
            }
        });

        match result? {
            Some((seq, entries)) if !entries.is_empty() => {
                let (tx, rx) = oneshot::channel();
                let task = shared.spawn_write(seq, entries, Some(tx));
                let abort = task.abort_handle();
                shared.track(task);
                Ok(PendingWrite {
                    domain: D::NAME,
                    outcome: Some((rx, abort)),
                })
            }
            _ => Ok(PendingWrite::settled(D::NAME)),
        }
    }

    /// Wait for every outstanding write of this domain.
    ///
    /// A failure is reported here only if its [`PendingWrite`] was dropped
    /// before the write finished; otherwise it went to that handle.
    pub async fn flush(&self) -> StateResult<()> {
        self.shared.flush().await
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&D::Snapshot) -> R) -> Option<R> {
        self.shared.state.borrow().snapshot.as_ref().map(f)
    }
}

impl<D: Domain> fmt::Debug for Accessor<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("Accessor")
            .field("domain", &D::NAME)
            .field("phase", &state.phase)
            .field("mounted", &state.mounted)
            .finish()
    }
}

/// Owner of one domain's state.
///
/// Dropping the provider unmounts it.
pub struct Provider<D: Domain> {
    shared: Arc<Shared<D>>,
    subscription: Option<Subscription>,
    load: Option<JoinHandle<()>>,
}

impl<D: Domain> Provider<D> {
    /// Mount `domain`: subscribe to its topic and start hydrating it from
    /// `store`. Must be called from within a Tokio runtime.
    pub fn mount(domain: D, store: Arc<dyn KeyValueStore>, bus: &EventBus) -> StateResult<Self> {
        let runtime = Handle::try_current().map_err(|_| StateError::NoRuntime)?;
        let (state, _) = watch::channel(ProviderState::new());
        let shared = Arc::new(Shared {
            domain,
            store,
            bus: bus.clone(),
            runtime,
            state,
            next_seq: AtomicU64::new(1),
            last_written: AsyncMutex::new(HashMap::new()),
            background: Mutex::new(Vec::new()),
            unclaimed: Mutex::new(None),
        });

        let subscription = shared.domain.topic().map(|topic| {
            let weak = Arc::downgrade(&shared);
            bus.subscribe(topic, move |event| {
                if let Some(shared) = weak.upgrade() {
                    shared.apply_event(event);
                }
            })
        });

        shared.state.send_if_modified(|s| {
            if s.phase != Phase::Uninitialized {
                return false;
            }
            s.phase = Phase::Loading;
            true
        });
        let load = shared.runtime.spawn(Arc::clone(&shared).hydrate());
        debug!(domain = D::NAME, "provider mounted");

        Ok(Self {
            shared,
            subscription,
            load: Some(load),
        })
    }

    pub fn accessor(&self) -> Accessor<D> {
        Accessor {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Unsubscribe and mark the domain unmounted.
    ///
    /// Hydration is not cancelled; the returned [`PendingLoad`] can be
    /// drained to wait for it, and its result is discarded.
    pub fn unmount(mut self) -> PendingLoad {
        self.teardown();
        PendingLoad {
            domain: D::NAME,
            task: self.load.take(),
        }
    }

    fn teardown(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        let was_mounted = self
            .shared
            .state
            .send_if_modified(|s| std::mem::replace(&mut s.mounted, false));
        if was_mounted {
            debug!(domain = D::NAME, "provider unmounted");
        }
    }
}

impl<D: Domain> Drop for Provider<D> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<D: Domain> fmt::Debug for Provider<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("domain", &D::NAME)
            .field("subscribed", &self.subscription.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::{ClockDomain, CurrencyDomain, WallpaperDomain};
    use crate::testing::{FailingStore, GatedStore};
    use serde_json::json;
    use wgt_bus::{CurrenciesUpdated, Topic};
    use wgt_store::InMemoryStore;
    use wgt_types::{keys, ClockSettings, ClockType, CurrencyCode, CurrencyColorMode, StoredWallpaper};

    fn codes(list: &[&str]) -> Vec<CurrencyCode> {
        list.iter().map(|c| CurrencyCode::new(c).unwrap()).collect()
    }

    fn analog() -> ClockSettings {
        ClockSettings {
            clock_type: ClockType::Analog,
            ..ClockSettings::default()
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn mount_enters_loading_then_ready() {
        let bus = EventBus::new();
        let provider = Provider::mount(ClockDomain, Arc::new(InMemoryStore::new()), &bus).unwrap();
        let clock = provider.accessor();
        assert_eq!(clock.phase(), Phase::Loading);
        assert!(clock.snapshot().is_none());

        clock.ready().await.unwrap();
        assert_eq!(clock.phase(), Phase::Ready);
        assert_eq!(clock.snapshot(), Some(ClockSettings::default()));
    }

    #[test]
    fn mount_outside_runtime_fails() {
        let bus = EventBus::new();
        let err = Provider::mount(ClockDomain, Arc::new(InMemoryStore::new()), &bus).unwrap_err();
        assert!(matches!(err, StateError::NoRuntime));
    }

    #[tokio::test]
    async fn mount_subscribes_once_and_drop_unsubscribes() {
        let bus = EventBus::new();
        let provider = Provider::mount(ClockDomain, Arc::new(InMemoryStore::new()), &bus).unwrap();
        assert_eq!(bus.subscriber_count(Topic::ClockSettingsChanged), 1);
        drop(provider);
        assert_eq!(bus.subscriber_count(Topic::ClockSettingsChanged), 0);
    }

    #[tokio::test]
    async fn mutator_before_ready_is_rejected() {
        let store = Arc::new(GatedStore::new(InMemoryStore::new()));
        let bus = EventBus::new();
        let provider = Provider::mount(ClockDomain, store.clone(), &bus).unwrap();
        let clock = provider.accessor();

        let err = clock.set_settings(analog()).unwrap_err();
        assert!(matches!(err, StateError::NotReady { domain: "clock" }));
        assert_eq!(clock.current(), ClockSettings::default());
    }

    #[tokio::test]
    async fn failed_load_is_reported_and_domain_stays_loading() {
        let bus = EventBus::new();
        let provider = Provider::mount(CurrencyDomain, Arc::new(FailingStore), &bus).unwrap();
        let currency = provider.accessor();

        let err = currency.ready().await.unwrap_err();
        assert!(matches!(err, StateError::LoadFailed { domain: "currency", .. }));
        assert_eq!(currency.phase(), Phase::Loading);
        assert!(currency.load_error().is_some());
        assert!(currency.selected_currencies().is_empty());
    }

    // -----------------------------------------------------------------------
    // Unmount safety
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn late_load_after_unmount_has_no_effect() {
        let store = Arc::new(GatedStore::new(InMemoryStore::with_entries([(
            keys::CLOCK,
            serde_json::to_value(analog()).unwrap(),
        )])));
        let bus = EventBus::new();
        let provider = Provider::mount(ClockDomain, store.clone(), &bus).unwrap();
        let clock = provider.accessor();
        let mut changes = clock.watch();
        changes.borrow_and_update();

        let pending = provider.unmount();
        assert!(changes.has_changed().unwrap());
        changes.borrow_and_update();

        store.open_reads();
        pending.drain().await;

        assert!(!changes.has_changed().unwrap());
        assert_eq!(clock.phase(), Phase::Loading);
        assert!(clock.snapshot().is_none());
        assert!(!clock.is_mounted());
        assert_eq!(bus.subscriber_count(Topic::ClockSettingsChanged), 0);
        assert!(matches!(
            clock.set_settings(analog()),
            Err(StateError::Unmounted { .. })
        ));
        assert!(matches!(clock.ready().await, Err(StateError::Unmounted { .. })));
    }

    #[tokio::test]
    async fn bus_message_during_load_wins_over_late_load() {
        let store = Arc::new(GatedStore::new(InMemoryStore::with_entries([(
            keys::CURRENCIES,
            json!(["BTC"]),
        )])));
        let bus = EventBus::new();
        let provider = Provider::mount(CurrencyDomain, store.clone(), &bus).unwrap();
        let currency = provider.accessor();

        bus.publish(BusEvent::CurrenciesUpdated(CurrenciesUpdated {
            currencies: codes(&["USD", "IRT"]),
            color_mode: CurrencyColorMode::X,
        }));
        assert!(currency.is_ready());

        store.open_reads();
        while store.reads_completed() < 2 {
            tokio::task::yield_now().await;
        }
        assert!(currency.is_ready());
        assert_eq!(currency.selected_currencies(), codes(&["USD", "IRT"]));
        assert_eq!(currency.color_mode(), Some(CurrencyColorMode::X));
    }

    // -----------------------------------------------------------------------
    // Mutation and persistence
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn snapshot_updates_before_write_resolves() {
        let store = Arc::new(GatedStore::new(InMemoryStore::new()));
        store.open_reads();
        let bus = EventBus::new();
        let provider = Provider::mount(ClockDomain, store.clone(), &bus).unwrap();
        let clock = provider.accessor();
        clock.ready().await.unwrap();

        let pending = clock.set_settings(analog()).unwrap();
        assert_eq!(clock.settings(), Some(analog()));
        tokio::task::yield_now().await;
        assert!(!pending.is_settled());
        assert!(store.inner().snapshot(keys::CLOCK).is_none());

        store.open_writes();
        pending.finished().await.unwrap();
        assert_eq!(
            store.inner().snapshot(keys::CLOCK),
            Some(serde_json::to_value(analog()).unwrap())
        );
    }

    #[tokio::test]
    async fn only_changed_keys_are_written() {
        let store = Arc::new(GatedStore::new(InMemoryStore::new()));
        store.open_reads();
        store.open_writes();
        let bus = EventBus::new();
        let provider = Provider::mount(CurrencyDomain, store.clone(), &bus).unwrap();
        let currency = provider.accessor();
        currency.ready().await.unwrap();

        currency
            .set_color_mode(CurrencyColorMode::X)
            .unwrap()
            .finished()
            .await
            .unwrap();
        assert_eq!(store.writes(), vec![keys::CURRENCY_COLOR_MODE.to_string()]);
        assert!(store.inner().snapshot(keys::CURRENCIES).is_none());
    }

    #[tokio::test]
    async fn unchanged_mutation_writes_nothing() {
        let store = Arc::new(GatedStore::new(InMemoryStore::new()));
        store.open_reads();
        let bus = EventBus::new();
        let provider = Provider::mount(ClockDomain, store.clone(), &bus).unwrap();
        let clock = provider.accessor();
        clock.ready().await.unwrap();

        let pending = clock.set_settings(ClockSettings::default()).unwrap();
        assert!(pending.is_settled());
        pending.finished().await.unwrap();
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn rapid_mutations_leave_the_last_value() {
        let store = Arc::new(GatedStore::new(InMemoryStore::new()));
        store.open_reads();
        let bus = EventBus::new();
        let provider = Provider::mount(CurrencyDomain, store.clone(), &bus).unwrap();
        let currency = provider.accessor();
        currency.ready().await.unwrap();

        let first = currency.set_selected_currencies(codes(&["BTC"])).unwrap();
        let second = currency.set_selected_currencies(codes(&["ETH", "USD"])).unwrap();
        let third = currency.set_selected_currencies(codes(&["GRAM"])).unwrap();
        store.open_writes();
        first.finished().await.unwrap();
        second.finished().await.unwrap();
        third.finished().await.unwrap();

        assert_eq!(store.inner().snapshot(keys::CURRENCIES), Some(json!(["GRAM"])));
        assert_eq!(currency.selected_currencies(), codes(&["GRAM"]));
    }

    #[tokio::test]
    async fn failed_write_is_observable_but_snapshot_kept() {
        let store = Arc::new(GatedStore::new(InMemoryStore::new()));
        store.open_reads();
        store.fail_writes();
        let bus = EventBus::new();
        let provider = Provider::mount(ClockDomain, store.clone(), &bus).unwrap();
        let clock = provider.accessor();
        clock.ready().await.unwrap();

        let err = clock.set_settings(analog()).unwrap().finished().await.unwrap_err();
        assert!(matches!(err, StateError::Persist { domain: "clock", .. }));
        assert_eq!(clock.settings(), Some(analog()));
    }

    #[tokio::test]
    async fn flush_waits_for_dropped_write_handles() {
        let store = Arc::new(GatedStore::new(InMemoryStore::new()));
        store.open_reads();
        let bus = EventBus::new();
        let provider = Provider::mount(CurrencyDomain, store.clone(), &bus).unwrap();
        let currency = provider.accessor();
        currency.ready().await.unwrap();

        drop(currency.set_color_mode(CurrencyColorMode::X).unwrap());
        assert!(store.inner().snapshot(keys::CURRENCY_COLOR_MODE).is_none());

        store.open_writes();
        currency.flush().await.unwrap();
        assert_eq!(store.inner().snapshot(keys::CURRENCY_COLOR_MODE), Some(json!("X")));
    }

    #[tokio::test]
    async fn flush_reports_only_unclaimed_write_failures() {
        let store = Arc::new(GatedStore::new(InMemoryStore::new()));
        store.open_reads();
        store.fail_writes();
        let bus = EventBus::new();
        let provider = Provider::mount(ClockDomain, store.clone(), &bus).unwrap();
        let clock = provider.accessor();
        clock.ready().await.unwrap();

        let err = clock.set_settings(analog()).unwrap().finished().await.unwrap_err();
        assert!(matches!(err, StateError::Persist { .. }));
        clock.flush().await.unwrap();

        drop(clock.set_settings(ClockSettings::default()).unwrap());
        let err = clock.flush().await.unwrap_err();
        assert!(matches!(err, StateError::Persist { domain: "clock", .. }));
    }

    #[tokio::test]
    async fn watchers_see_each_mutation_once() {
        let bus = EventBus::new();
        let provider = Provider::mount(ClockDomain, Arc::new(InMemoryStore::new()), &bus).unwrap();
        let clock = provider.accessor();
        clock.ready().await.unwrap();
        let mut rx = clock.watch();
        rx.borrow_and_update();

        let _ = clock.set_settings(analog()).unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().snapshot, Some(analog()));
        assert!(!rx.has_changed().unwrap());
    }

    // -----------------------------------------------------------------------
    // Bus updates
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn bus_update_is_not_persisted_for_clock() {
        let store = Arc::new(GatedStore::new(InMemoryStore::new()));
        store.open_reads();
        store.open_writes();
        let bus = EventBus::new();
        let provider = Provider::mount(ClockDomain, store.clone(), &bus).unwrap();
        let clock = provider.accessor();
        clock.ready().await.unwrap();

        assert_eq!(bus.publish(BusEvent::ClockSettingsChanged(analog())), 1);
        assert_eq!(clock.settings(), Some(analog()));
        clock.flush().await.unwrap();
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn bus_update_is_persisted_for_wallpaper() {
        let store = Arc::new(GatedStore::new(InMemoryStore::with_entries([(
            keys::WALLPAPER,
            serde_json::to_value(StoredWallpaper::default_gradient()).unwrap(),
        )])));
        store.open_reads();
        store.open_writes();
        let bus = EventBus::new();
        let provider = Provider::mount(WallpaperDomain::new(None), store.clone(), &bus).unwrap();
        let wallpaper = provider.accessor();
        wallpaper.ready().await.unwrap();

        let next = StoredWallpaper::gradient("#000000", "#ffffff", Default::default());
        bus.publish(BusEvent::WallpaperChanged(next.clone()));
        wallpaper.flush().await.unwrap();
        assert_eq!(
            store.inner().snapshot(keys::WALLPAPER),
            Some(serde_json::to_value(&next).unwrap())
        );

        // Re-publishing the same value is a no-op.
        bus.publish(BusEvent::WallpaperChanged(next));
        wallpaper.flush().await.unwrap();
        assert_eq!(store.writes().len(), 1);
    }
}
