//! The layout core.
//!
//! # Relevant Specifications
//!
//! - [CSS 2.1 Visual Formatting Model](https://www.w3.org/TR/CSS2/visuren.html)
//! - [CSS 2.1 Visual Formatting Model Details](https://www.w3.org/TR/CSS2/visudet.html)
//! - [CSS 2.1 Tables](https://www.w3.org/TR/CSS2/tables.html)
//! - [CSS Text Module Level 3](https://www.w3.org/TR/css-text-3/)
//!
//! # Module Structure
//!
//! - [`box_model`] - Sizes, rectangles, edge sizes and the per-element [`Geometry`]
//! - [`values`] - `auto`-or-length values and the unbounded sentinel
//! - [`box_builder`] - Computed style + containing block -> box dimensions
//! - [`block`] - Block formatting contexts and the close protocol
//! - [`inline`] - Inline formatting contexts and line boxes
//! - [`float`] - Float placement and available width per band
//! - [`table`] - The table formatter contract and the default grid formatter
//! - [`special`] - Special-case formatters (`<br>`, text runs)
//! - [`pool`] - Generational arena of block contexts
//! - [`engine`] - The recursive dispatcher and reflow loop

pub mod block;
pub mod box_builder;
pub mod box_model;
pub mod engine;
pub mod float;
pub mod inline;
pub mod pool;
pub mod special;
pub mod table;
pub mod values;

// Re-exports for convenience
pub use block::{AbsoluteEntry, BlockContainer, CloseResult};
pub use box_builder::{BlockBox, block_box, build_box, min_max_height, standalone_box};
pub use box_model::{BoxDimensions, EdgeSizes, Geometry, Point, Rect, Size};
pub use engine::{LayoutEngine, MAX_ROOT_ATTEMPTS};
pub use float::{FloatSide, FloatSpace, PlacedFloat};
pub use inline::{ApproximateFontMetrics, InlineContainer, InlineContentProducer, LineBox, TextStyle};
pub use pool::{BlockId, LayoutArena};
pub use special::{LineBreakFormatter, SpecialFormatter, TextRunFormatter};
pub use table::{GridTableFormatter, TableFormatter};
pub use values::{AutoOr, UNBOUNDED};
