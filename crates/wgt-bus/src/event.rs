use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use wgt_types::{ClockSettings, CurrencyCode, CurrencyColorMode, StoredWallpaper, WidgetTab};

use crate::error::{BusError, BusResult};

/// Named channel on the bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Topic {
    /// The currency selection or colour mode was changed in settings.
    CurrenciesUpdated,
    /// WigiPad clock settings were changed.
    ClockSettingsChanged,
    /// A new wallpaper was picked.
    WallpaperChanged,
    /// Some widget asked for the settings panel to open.
    OpenWidgetsSettings,
}

impl Topic {
    pub const ALL: [Self; 4] = [
        Self::CurrenciesUpdated,
        Self::ClockSettingsChanged,
        Self::WallpaperChanged,
        Self::OpenWidgetsSettings,
    ];

    /// Wire name shared with the browser extension.
    pub fn name(self) -> &'static str {
        match self {
            Self::CurrenciesUpdated => "currencies_updated",
            Self::ClockSettingsChanged => "wigiPadClockSettingsChanged",
            Self::WallpaperChanged => "wallpaperChanged",
            Self::OpenWidgetsSettings => "openWidgetsSettings",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Topic {
    type Err = BusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| BusError::UnknownTopic(s.to_string()))
    }
}

/// Payload of `currencies_updated`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrenciesUpdated {
    pub currencies: Vec<CurrencyCode>,
    pub color_mode: CurrencyColorMode,
}

/// Payload of `openWidgetsSettings`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenWidgetsSettings {
    #[serde(default)]
    pub tab: Option<WidgetTab>,
}

/// A message on the bus: topic plus its typed payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "topic", content = "payload")]
pub enum BusEvent {
    #[serde(rename = "currencies_updated")]
    CurrenciesUpdated(CurrenciesUpdated),
    #[serde(rename = "wigiPadClockSettingsChanged")]
    ClockSettingsChanged(ClockSettings),
    #[serde(rename = "wallpaperChanged")]
    WallpaperChanged(StoredWallpaper),
    #[serde(rename = "openWidgetsSettings")]
    OpenWidgetsSettings(OpenWidgetsSettings),
}

impl BusEvent {
    /// The topic this event is delivered on.
    pub fn topic(&self) -> Topic {
        match self {
            Self::CurrenciesUpdated(_) => Topic::CurrenciesUpdated,
            Self::ClockSettingsChanged(_) => Topic::ClockSettingsChanged,
            Self::WallpaperChanged(_) => Topic::WallpaperChanged,
            Self::OpenWidgetsSettings(_) => Topic::OpenWidgetsSettings,
        }
    }

    /// Decode an untyped `(topic, payload)` message, e.g. one received from
    /// an extension message port.
    pub fn decode(topic: &str, payload: Value) -> BusResult<Self> {
        let topic: Topic = topic.parse()?;
        let malformed = |e: serde_json::Error| BusError::MalformedPayload {
            topic: topic.name().to_string(),
            reason: e.to_string(),
        };
        let event = match topic {
            Topic::CurrenciesUpdated => {
                Self::CurrenciesUpdated(serde_json::from_value(payload).map_err(malformed)?)
            }
            Topic::ClockSettingsChanged => {
                Self::ClockSettingsChanged(serde_json::from_value(payload).map_err(malformed)?)
            }
            Topic::WallpaperChanged => {
                Self::WallpaperChanged(serde_json::from_value(payload).map_err(malformed)?)
            }
            Topic::OpenWidgetsSettings => {
                // The extension sends `null` when no tab is requested.
                let payload = if payload.is_null() {
                    Value::Object(Default::default())
                } else {
                    payload
                };
                Self::OpenWidgetsSettings(serde_json::from_value(payload).map_err(malformed)?)
            }
        };
        Ok(event)
    }

    /// Split into the wire `(topic, payload)` pair.
    pub fn encode(&self) -> (&'static str, Value) {
        let payload = match self {
            Self::CurrenciesUpdated(p) => serde_json::to_value(p),
            Self::ClockSettingsChanged(p) => serde_json::to_value(p),
            Self::WallpaperChanged(p) => serde_json::to_value(p),
            Self::OpenWidgetsSettings(p) => serde_json::to_value(p),
        };
        // Payload types are plain records with string keys; encoding cannot fail.
        (self.topic().name(), payload.unwrap_or(Value::Null))
    }
}
