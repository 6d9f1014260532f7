//! Typed in-process event bus for the Widgetify dashboard.
//!
//! Providers and widgets notify each other through an [`EventBus`] instance
//! instead of a process-wide global. Every message is a [`BusEvent`], a
//! tagged variant whose [`Topic`] determines its payload shape.
//!
//! Delivery is synchronous: [`EventBus::publish`] invokes every handler
//! registered for the topic, in registration order, before returning.
//! Messages published with no subscriber are dropped.

pub mod bus;
pub mod error;
pub mod event;

pub use bus::{EventBus, Subscription, SubscriptionId};
pub use error::{BusError, BusResult};
pub use event::{BusEvent, CurrenciesUpdated, OpenWidgetsSettings, Topic};
