use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use tracing::{debug, warn};

use crate::event::{BusEvent, Topic};

/// Identifier of one live subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub:{}", self.0)
    }
}

type Handler = Arc<dyn Fn(&BusEvent) + Send + Sync>;

/// Internal registration: a topic paired with its handler.
struct Registration {
    id: SubscriptionId,
    topic: Topic,
    handler: Handler,
}

/// Fan-out router holding registrations in subscription order.
struct Router {
    next_id: AtomicU64,
    registrations: RwLock<Vec<Registration>>,
}

impl Router {
    fn register(&self, topic: Topic, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.registrations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Registration { id, topic, handler });
        id
    }

    fn remove(&self, id: SubscriptionId) -> bool {
        let mut regs = self
            .registrations
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = regs.len();
        regs.retain(|r| r.id != id);
        regs.len() != before
    }

    /// Handlers registered for `topic` at this instant, in order.
    fn handlers_for(&self, topic: Topic) -> Vec<(SubscriptionId, Handler)> {
        self.registrations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| r.topic == topic)
            .map(|r| (r.id, Arc::clone(&r.handler)))
            .collect()
    }

    fn count(&self, topic: Topic) -> usize {
        self.registrations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| r.topic == topic)
            .count()
    }
}

/// Typed, synchronous publish/subscribe service.
///
/// Cloning an `EventBus` yields another handle to the same router, so one
/// instance can be passed by reference or by clone to every provider that
/// needs it.
///
/// Handlers run on the publisher's thread and must not block. The set of
/// recipients is fixed when `publish` starts: handlers may publish or
/// (un)subscribe re-entrantly, and such changes apply to later messages. A
/// handler that panics is logged and skipped; its siblings still receive
/// the message.
#[derive(Clone)]
pub struct EventBus {
    router: Arc<Router>,
}

impl EventBus {
    /// Create a bus with no subscribers.
    pub fn new() -> Self {
        Self {
            router: Arc::new(Router {
                next_id: AtomicU64::new(1),
                registrations: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Register `handler` for `topic`.
    ///
    /// The handler stays registered until the returned [`Subscription`] is
    /// dropped or explicitly unsubscribed.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, topic: Topic, handler: F) -> Subscription
    where
        F: Fn(&BusEvent) + Send + Sync + 'static,
    {
        let id = self.router.register(topic, Arc::new(handler));
        debug!(%topic, %id, "subscribed");
        Subscription {
            id,
            topic,
            router: Arc::downgrade(&self.router),
        }
    }

    /// Deliver `event` to every subscriber of its topic.
    ///
    /// Returns the number of handlers invoked. Publishing to a topic with
    /// no subscribers is a no-op returning zero.
    pub fn publish(&self, event: BusEvent) -> usize {
        let topic = event.topic();
        let handlers = self.router.handlers_for(topic);
        for (id, handler) in &handlers {
            let outcome = catch_unwind(AssertUnwindSafe(|| handler(&event)));
            if outcome.is_err() {
                warn!(%topic, %id, "subscriber panicked while handling event");
            }
        }
        debug!(%topic, delivered = handlers.len(), "event published");
        handlers.len()
    }

    /// Number of live subscriptions for `topic`.
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.router.count(topic)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total: usize = Topic::ALL.iter().map(|t| self.router.count(*t)).sum();
        f.debug_struct("EventBus")
            .field("subscriptions", &total)
            .finish()
    }
}

/// Handle to a live subscription. Dropping it unsubscribes.
///
/// The handle only holds a weak reference to the bus, so an outstanding
/// subscription never keeps a discarded bus alive.
pub struct Subscription {
    id: SubscriptionId,
    topic: Topic,
    router: Weak<Router>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// Remove the handler now. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(router) = self.router.upgrade() {
            if router.remove(self.id) {
                debug!(topic = %self.topic, id = %self.id, "unsubscribed");
            }
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .finish()
    }
}
