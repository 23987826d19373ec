//! Box layout for styled element trees.
//!
//! # Scope
//!
//! This crate implements:
//! - **Box Builder** ([§ 10 Visual formatting model details](https://www.w3.org/TR/CSS2/visudet.html))
//!   - Percentages against the containing block
//!   - Auto margins for block-level and inline-level boxes
//!   - `min-height`/`max-height` clamping
//!
//! - **Formatting contexts** ([§ 9.4 Normal flow](https://www.w3.org/TR/CSS2/visuren.html#normal-flow))
//!   - Block: vertical stacking, margin collapsing, clearance, scrollbars
//!   - Inline: line boxes, text wrapping, inline boxes, inline-blocks
//!   - Floats and the space they take from line boxes
//!   - Absolutely and fixed positioned boxes, laid out when their block closes
//!   - Tables, through a pluggable formatter
//!
//! - **Orchestration**
//!   - Display-based dispatch with special-case formatters
//!   - Restart protocol and the bounded two-pass reflow
//!   - Pooled block contexts
//!
//! # Not Implemented
//!
//! - Painting, hit testing, scrolling
//! - Font loading and shaping (see [`layout::InlineContentProducer`])
//! - Style cascade; styles arrive computed
//! - Flex and grid layout

/// Engine configuration.
pub mod config;
/// Element tree, computed styles and layout results.
pub mod document;
/// Error types at the public boundary.
pub mod error;
/// The layout core.
pub mod layout;
/// Computed style values.
pub mod style;

// Re-exports for convenience
pub use config::LayoutConfig;
pub use document::{LayoutHook, StyledDocument};
pub use error::{ConfigError, DocumentError, LayoutError};
pub use layout::{
    BlockBox, BoxDimensions, CloseResult, Geometry, LayoutEngine, Point, Rect, Size, UNBOUNDED,
};
pub use style::{ComputedStyle, DisplayValue};
