use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Widgets that can be placed on the dashboard grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WidgetKey {
    Calendar,
    Tools,
    Weather,
    Todos,
    Notes,
    Network,
    Currency,
    News,
}

impl WidgetKey {
    /// Every widget, in catalog order.
    pub const ALL: [Self; 8] = [
        Self::Calendar,
        Self::Tools,
        Self::Weather,
        Self::Todos,
        Self::Notes,
        Self::Network,
        Self::Currency,
        Self::News,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Calendar => "calendar",
            Self::Tools => "tools",
            Self::Weather => "weather",
            Self::Todos => "todos",
            Self::Notes => "notes",
            Self::Network => "network",
            Self::Currency => "currency",
            Self::News => "news",
        }
    }
}

impl fmt::Display for WidgetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WidgetKey {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| TypeError::UnknownVariant {
                kind: "widget",
                value: s.to_string(),
            })
    }
}

/// Tabs of the widget settings panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WidgetTab {
    WigiPad,
    Currency,
    Weather,
    Network,
    Todos,
}

impl fmt::Display for WidgetTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::WigiPad => "wigiPad",
            Self::Currency => "currency",
            Self::Weather => "weather",
            Self::Network => "network",
            Self::Todos => "todos",
        };
        f.write_str(s)
    }
}
