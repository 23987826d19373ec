//! Length values and their parsing.
//!
//! [CSS Values and Units Level 4](https://www.w3.org/TR/css-values-4/)

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::StyleParseError;

/// User agent default font size in pixels.
/// [§ 3.5 font-size](https://www.w3.org/TR/css-fonts-4/#font-size-prop)
pub const DEFAULT_FONT_SIZE_PX: f32 = 16.0;

/// [§ 4.1 Lengths](https://www.w3.org/TR/css-values-4/#lengths)
///
/// A computed length. Relative units have already been resolved by the
/// style system; only percentages remain, and those need a containing block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum LengthValue {
    /// [§ 6.1 Absolute lengths](https://www.w3.org/TR/css-values-4/#absolute-lengths)
    Px(f32),
    /// [§ 4.3 Percentages](https://www.w3.org/TR/css-values-4/#percentages)
    ///
    /// "Percentages are always relative to another quantity, for example a length."
    Percent(f32),
}

impl LengthValue {
    /// Resolve to pixels against `basis` (the relevant containing block
    /// dimension).
    ///
    /// NOTE: Margin AND padding percentages both resolve against the containing
    /// block's **width**, even for top/bottom (CSS 2.1 § 8.3/8.4).
    #[must_use]
    pub fn resolve(self, basis: f32) -> f32 {
        match self {
            Self::Px(px) => px,
            Self::Percent(pct) => pct * basis / 100.0,
        }
    }

    /// Resolve against a basis that may be unbounded. Percentages of an
    /// unbounded basis have no used value.
    #[must_use]
    pub fn resolve_definite(self, basis: f32) -> Option<f32> {
        match self {
            Self::Px(px) => Some(px),
            Self::Percent(_) if !basis.is_finite() => None,
            Self::Percent(pct) => Some(pct * basis / 100.0),
        }
    }

    /// `true` for percentage values.
    #[must_use]
    pub const fn is_percent(self) -> bool {
        matches!(self, Self::Percent(_))
    }
}

impl Default for LengthValue {
    fn default() -> Self {
        Self::Px(0.0)
    }
}

impl FromStr for LengthValue {
    type Err = StyleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (number, percent) = if let Some(n) = s.strip_suffix('%') {
            (n, true)
        } else if let Some(n) = s.strip_suffix("px") {
            (n, false)
        } else {
            (s, false)
        };
        let value: f32 = number
            .trim()
            .parse()
            .map_err(|_| StyleParseError::InvalidLength(s.to_string()))?;
        // [§ 4.2 Lengths] "unitless zero" is the only bare number we accept.
        if !percent && number.len() == s.len() && value != 0.0 {
            return Err(StyleParseError::InvalidLength(s.to_string()));
        }
        if !value.is_finite() {
            return Err(StyleParseError::InvalidLength(s.to_string()));
        }
        Ok(if percent {
            Self::Percent(value)
        } else {
            Self::Px(value)
        })
    }
}

impl fmt::Display for LengthValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Px(px) => write!(f, "{px}px"),
            Self::Percent(pct) => write!(f, "{pct}%"),
        }
    }
}

/// [§ 4.4 Automatic values](https://www.w3.org/TR/CSS2/cascade.html#value-def-auto)
///
/// "Some properties can take the keyword 'auto' as a value. This keyword
/// allows the user agent to compute the value based on other properties."
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub enum AutoLength {
    /// The value is 'auto' and will be resolved during layout.
    #[default]
    Auto,
    /// A specific length value.
    Length(LengthValue),
}

impl AutoLength {
    /// Shorthand for a pixel length.
    #[must_use]
    pub const fn px(px: f32) -> Self {
        Self::Length(LengthValue::Px(px))
    }

    /// Shorthand for a percentage length.
    #[must_use]
    pub const fn percent(pct: f32) -> Self {
        Self::Length(LengthValue::Percent(pct))
    }

    /// Check if the value is 'auto'.
    #[must_use]
    pub const fn is_auto(self) -> bool {
        matches!(self, Self::Auto)
    }

    /// The length, if any.
    #[must_use]
    pub const fn length(self) -> Option<LengthValue> {
        match self {
            Self::Auto => None,
            Self::Length(len) => Some(len),
        }
    }
}

impl FromStr for AutoLength {
    type Err = StyleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            Ok(Self::Auto)
        } else {
            s.parse().map(Self::Length)
        }
    }
}

impl fmt::Display for AutoLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Length(len) => len.fmt(f),
        }
    }
}

/// [§ 10.7 'max-height'](https://www.w3.org/TR/CSS2/visudet.html#min-max-heights)
///
/// "none: No limit on the height of the box."
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub enum MaxLength {
    /// No limit.
    #[default]
    None,
    /// A specific limit.
    Length(LengthValue),
}

impl FromStr for MaxLength {
    type Err = StyleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("none") {
            Ok(Self::None)
        } else {
            s.parse().map(Self::Length)
        }
    }
}

impl fmt::Display for MaxLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Length(len) => len.fmt(f),
        }
    }
}
