use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Media kind of a wallpaper.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WallpaperKind {
    Image,
    Gradient,
    Video,
}

impl fmt::Display for WallpaperKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Image => "IMAGE",
            Self::Gradient => "GRADIENT",
            Self::Video => "VIDEO",
        };
        f.write_str(s)
    }
}

/// Direction of a two-stop gradient, in the extension's short notation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GradientDirection {
    #[default]
    #[serde(rename = "to-r")]
    ToRight,
    #[serde(rename = "to-l")]
    ToLeft,
    #[serde(rename = "to-t")]
    ToTop,
    #[serde(rename = "to-b")]
    ToBottom,
    #[serde(rename = "to-tr")]
    ToTopRight,
    #[serde(rename = "to-tl")]
    ToTopLeft,
    #[serde(rename = "to-br")]
    ToBottomRight,
    #[serde(rename = "to-bl")]
    ToBottomLeft,
}

impl GradientDirection {
    const ALL: [(Self, &'static str); 8] = [
        (Self::ToRight, "to-r"),
        (Self::ToLeft, "to-l"),
        (Self::ToTop, "to-t"),
        (Self::ToBottom, "to-b"),
        (Self::ToTopRight, "to-tr"),
        (Self::ToTopLeft, "to-tl"),
        (Self::ToBottomRight, "to-br"),
        (Self::ToBottomLeft, "to-bl"),
    ];

    /// Short notation (`to-r`, `to-bl`, ...).
    pub fn as_str(self) -> &'static str {
        Self::ALL
            .iter()
            .find(|(d, _)| *d == self)
            .map_or("to-r", |(_, s)| s)
    }
}

impl fmt::Display for GradientDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GradientDirection {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|(_, name)| *name == s.trim())
            .map(|(d, _)| *d)
            .ok_or_else(|| TypeError::UnknownVariant {
                kind: "gradient direction",
                value: s.to_string(),
            })
    }
}

/// Two-stop gradient definition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gradient {
    pub from: String,
    pub to: String,
    pub direction: GradientDirection,
}

/// Wallpaper record stored under the `wallpaper` key and carried by the
/// `wallpaperChanged` topic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredWallpaper {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: WallpaperKind,
    pub src: String,
    pub is_retouch_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient: Option<Gradient>,
}

impl StoredWallpaper {
    /// Build a gradient wallpaper whose id is derived from its colours.
    pub fn gradient(from: &str, to: &str, direction: GradientDirection) -> Self {
        let id = format!(
            "gradient-{}-{}",
            from.trim_start_matches('#'),
            to.trim_start_matches('#')
        );
        Self {
            id,
            kind: WallpaperKind::Gradient,
            src: String::new(),
            is_retouch_enabled: false,
            gradient: Some(Gradient {
                from: from.to_string(),
                to: to.to_string(),
                direction,
            }),
        }
    }

    /// Fallback used when storage is empty and no catalog entry is available.
    pub fn default_gradient() -> Self {
        Self::gradient("#a1c4fd", "#c2e9fb", GradientDirection::ToRight)
    }
}
