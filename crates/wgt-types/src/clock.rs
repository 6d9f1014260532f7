use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Clock face shown on the WigiPad.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockType {
    #[default]
    Digital,
    Analog,
}

impl fmt::Display for ClockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Digital => f.write_str("digital"),
            Self::Analog => f.write_str("analog"),
        }
    }
}

impl FromStr for ClockType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "digital" => Ok(Self::Digital),
            "analog" => Ok(Self::Analog),
            _ => Err(TypeError::UnknownVariant {
                kind: "clock type",
                value: s.to_string(),
            }),
        }
    }
}

/// WigiPad clock preferences, stored under the `clock` key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockSettings {
    pub clock_type: ClockType,
    pub show_seconds: bool,
    pub show_time_zone: bool,
    pub use_selected_font: bool,
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            clock_type: ClockType::Digital,
            show_seconds: true,
            show_time_zone: true,
            use_selected_font: true,
        }
    }
}
