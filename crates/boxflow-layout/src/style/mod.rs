//! Computed style values read by layout.
//!
//! - [`values`] - lengths, `auto` and `none`
//! - [`keywords`] - display, position, float, clear and overflow keywords
//! - [`computed`] - the per-element [`ComputedStyle`]

pub mod computed;
pub mod keywords;
pub mod values;

pub use computed::{ComputedStyle, Sides};
pub use keywords::{ClearValue, DisplayValue, FloatValue, OverflowValue, PositionType};
pub use values::{AutoLength, DEFAULT_FONT_SIZE_PX, LengthValue, MaxLength};

/// A declaration that could not be turned into a computed value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StyleParseError {
    /// The text is not a `px`, `%` or unitless zero length.
    #[error("invalid length '{0}'")]
    InvalidLength(String),
    /// The value is not allowed for this property.
    #[error("invalid value '{value}' for property '{property}'")]
    InvalidKeyword {
        /// Property name as written.
        property: String,
        /// Offending value.
        value: String,
    },
    /// A declaration without a `:`.
    #[error("malformed declaration '{0}'")]
    MalformedDeclaration(String),
}
