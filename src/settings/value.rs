//! Scalar setting values
//!
//! Every setting is a scalar: a color string, a number, an enumerated string,
//! free text, or a toggle. The declared kind lives in the schema; the value
//! itself only carries the representation.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Toggle(bool),
    Number(f64),
    Text(String),
}

impl SettingValue {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Toggle(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Canonical string form used for CSS emission and cache hashing
    pub fn canonical(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Toggle(b) => write!(f, "{b}"),
            // Whole numbers print without a decimal point so generated CSS
            // stays byte-stable across regenerations
            Self::Number(n) if n.fract() == 0.0 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Validate a CSS color literal.
///
/// Accepts `#RGB`, `#RRGGBB`, `#AARRGGBB` hex forms and `rgb(...)`/`rgba(...)`
/// functional notation. Anything else is rejected at the state-manager
/// boundary before it can reach the server or the stylesheet.
pub fn is_valid_color(s: &str) -> bool {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        return matches!(hex.len(), 3 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    let inner = s
        .strip_prefix("rgba(")
        .or_else(|| s.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'));
    if let Some(inner) = inner {
        let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        return matches!(parts.len(), 3 | 4)
            && parts.iter().all(|p| p.parse::<f64>().is_ok());
    }
    false
}
