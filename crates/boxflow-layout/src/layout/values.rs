//! Used-value helpers shared by the box builder and formatting contexts.

use serde::Serialize;

/// The "infinite" sentinel used for block dimensions that have no bound,
/// e.g. the height of the synthetic root containing block.
pub const UNBOUNDED: f32 = f32::INFINITY;

/// [§ 4.4 Automatic values](https://www.w3.org/TR/CSS2/cascade.html#value-def-auto)
///
/// "Some properties can take the keyword 'auto' as a value. This keyword
/// allows the user agent to compute the value based on other properties."
///
/// A used value that is either still 'auto' or a length in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub enum AutoOr {
    /// The value is 'auto' and must be resolved during layout.
    #[default]
    Auto,
    /// The value is a specific length in pixels.
    Length(f32),
}

impl AutoOr {
    /// Check if the value is 'auto'.
    #[must_use]
    pub const fn is_auto(self) -> bool {
        matches!(self, Self::Auto)
    }

    /// Get the length value, or a default if 'auto'.
    #[must_use]
    pub const fn to_px_or(self, default: f32) -> f32 {
        match self {
            Self::Length(v) => v,
            Self::Auto => default,
        }
    }

    /// The length, if any.
    #[must_use]
    pub const fn length(self) -> Option<f32> {
        match self {
            Self::Length(v) => Some(v),
            Self::Auto => None,
        }
    }
}

/// Clamp `value` into `[min, max]`. `max` wins over `min` only when `min`
/// is not larger, matching [§ 10.7](https://www.w3.org/TR/CSS2/visudet.html#min-max-heights):
/// "If the resulting height is smaller than 'min-height', the rules above
/// are applied again, but this time using the value of 'min-height'".
#[must_use]
pub fn clamp_height(value: f32, min: f32, max: f32) -> f32 {
    value.min(max).max(min)
}
