//! Storage keys used by the dashboard domains.
//!
//! Keys are shared with the browser extension, so they keep its spelling.

/// Ordered list of selected currency codes.
pub const CURRENCIES: &str = "currencies";

/// Colour mode of the currency widget (`NORMAL` | `X`).
pub const CURRENCY_COLOR_MODE: &str = "currencyColorMode";

/// WigiPad clock settings record.
pub const CLOCK: &str = "clock";

/// Current wallpaper record.
pub const WALLPAPER: &str = "wallpaper";

/// Ordered list of visible widgets.
pub const ACTIVE_WIDGETS: &str = "activeWidgets";

/// Whether the welcome modal still has to be shown.
pub const SHOW_WELCOME_MODAL: &str = "showWelcomeModal";

/// Last release whose notes the user has acknowledged.
pub const LAST_VERSION: &str = "lastVersion";
