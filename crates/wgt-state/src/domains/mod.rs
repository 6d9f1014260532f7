//! Concrete dashboard domains and their accessor operations.

pub mod clock;
pub mod currency;
pub mod onboarding;
pub mod settings_panel;
pub mod wallpaper;
pub mod widgets;

pub use clock::ClockDomain;
pub use currency::{CurrencyDomain, CurrencySnapshot, CurrencyStore, DEFAULT_CURRENCIES};
pub use onboarding::{Notice, OnboardingDomain, OnboardingSnapshot};
pub use settings_panel::{SettingsPanelDomain, SettingsPanelSnapshot};
pub use wallpaper::WallpaperDomain;
pub use widgets::{WidgetVisibilityDomain, DEFAULT_WIDGETS, HOME_SLOTS};
