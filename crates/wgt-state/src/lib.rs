//! Storage-backed domain state for the Widgetify dashboard.
//!
//! Each slice of dashboard state (currency selection, clock settings,
//! wallpaper, widget visibility, onboarding flags, settings panel) is a
//! [`Domain`]. A [`Provider`] hydrates a domain from a
//! [`KeyValueStore`](wgt_store::KeyValueStore), listens on its bus topic
//! and writes consumer changes back. Consumers hold [`Accessor`]s.
//!
//! # Key Types
//!
//! - [`Provider`] — Owns one domain; unmounts on drop
//! - [`Accessor`] — Cloneable read/write handle with domain operations
//! - [`PendingWrite`] — Outcome of the storage write behind a mutation
//! - [`ProviderScope`] — Providers looked up by domain type
//! - [`CurrencyConverter`] — Converter widget state over a [`RateProvider`]

pub mod catalog;
pub mod converter;
pub mod domain;
pub mod domains;
pub mod error;
pub mod provider;
pub mod rates;
pub mod scope;

#[cfg(test)]
mod testing;

pub use catalog::{StaticCatalog, WallpaperCatalog};
pub use converter::{convert, display_decimals, format_amount, ConverterState, CurrencyConverter};
pub use domain::{Domain, Entry, Hydrated};
pub use domains::{
    ClockDomain, CurrencyDomain, CurrencySnapshot, Notice, OnboardingDomain, OnboardingSnapshot,
    SettingsPanelDomain, SettingsPanelSnapshot, WallpaperDomain, WidgetVisibilityDomain,
};
pub use error::{StateError, StateResult};
pub use provider::{Accessor, PendingLoad, PendingWrite, Phase, Provider, ProviderState};
pub use rates::{CurrencyQuote, RateProvider, StaticRates};
pub use scope::ProviderScope;
