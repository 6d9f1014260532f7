//! Foundation types for the Widgetify dashboard.
//!
//! This crate provides the value types persisted in extension storage and
//! carried on the event bus. Every other dashboard crate depends on
//! `wgt-types`.
//!
//! # Key Types
//!
//! - [`CurrencyCode`] — Validated, upper-case currency identifier
//! - [`CurrencyColorMode`] — Colour scheme of the currency widget
//! - [`ClockSettings`] — WigiPad clock preferences
//! - [`StoredWallpaper`] — Persisted wallpaper record (image, video or gradient)
//! - [`WidgetKey`] / [`WidgetTab`] — Widget identifiers and settings tabs
//!
//! Storage key names live in [`keys`]. All persisted records keep the
//! camelCase field names and upper-case enum strings of the browser
//! extension so existing storage stays readable.

pub mod clock;
pub mod currency;
pub mod error;
pub mod keys;
pub mod wallpaper;
pub mod widget;

pub use clock::{ClockSettings, ClockType};
pub use currency::{CurrencyCode, CurrencyColorMode};
pub use error::TypeError;
pub use wallpaper::{Gradient, GradientDirection, StoredWallpaper, WallpaperKind};
pub use widget::{WidgetKey, WidgetTab};
