use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Maximum length of a currency code (`BTC`, `USDT`, `GRAM`, `SEKKEH_EMAMI`...).
const MAX_CODE_LEN: usize = 16;

/// An upper-case currency identifier such as `USD` or `GRAM`.
///
/// Codes are normalized to upper case on construction and must be made of
/// ASCII letters, digits or underscores. Deserialization applies the same
/// validation, so a malformed stored list fails to decode as a whole.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Validate and normalize a currency code.
    pub fn new(code: impl AsRef<str>) -> Result<Self, TypeError> {
        let raw = code.as_ref().trim();
        let valid = !raw.is_empty()
            && raw.len() <= MAX_CODE_LEN
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(TypeError::InvalidCurrencyCode(raw.to_string()));
        }
        Ok(Self(raw.to_ascii_uppercase()))
    }

    /// Code from a literal known to be valid, such as a built-in default.
    pub fn from_static(code: &'static str) -> Self {
        debug_assert!(Self::new(code).is_ok(), "invalid currency literal {code}");
        Self(code.to_ascii_uppercase())
    }

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether amounts in this currency are shown without decimals
    /// (Iranian rial and toman).
    pub fn is_rial_denominated(&self) -> bool {
        matches!(self.0.as_str(), "IRR" | "IRT")
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl FromStr for CurrencyCode {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Colour scheme used by the currency widget.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CurrencyColorMode {
    /// Green for rising prices, red for falling.
    #[default]
    #[serde(rename = "NORMAL")]
    Normal,
    /// Inverted scheme.
    #[serde(rename = "X")]
    X,
}

impl CurrencyColorMode {
    /// Wire/storage spelling of the mode.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::X => "X",
        }
    }
}

impl fmt::Display for CurrencyColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurrencyColorMode {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NORMAL" => Ok(Self::Normal),
            "X" => Ok(Self::X),
            _ => Err(TypeError::UnknownVariant {
                kind: "currency color mode",
                value: s.to_string(),
            }),
        }
    }
}
