//! Composition root for the Widgetify dashboard.
//!
//! [`Dashboard`] opens the configured store, creates one event bus and
//! mounts a provider for every enabled domain. It is the entry point for
//! applications embedding the dashboard state.

pub mod config;
pub mod dashboard;
pub mod error;

pub use config::{DashboardConfig, DomainSet, StorageConfig};
pub use dashboard::Dashboard;
pub use error::{DashboardError, DashboardResult};

// Re-export key types
pub use wgt_bus::{BusEvent, EventBus, Topic};
pub use wgt_state::{Accessor, Notice, Phase, StateError};
pub use wgt_store::{FileStore, InMemoryStore, KeyValueStore};
