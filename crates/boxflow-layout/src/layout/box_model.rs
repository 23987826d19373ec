//! CSS Box Model types.
//!
//! [CSS Box Model Module Level 3](https://www.w3.org/TR/css-box-3/)

use boxflow_dom::NodeId;
use serde::Serialize;

use super::values::AutoOr;

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Size {
    /// Horizontal extent.
    pub width: f32,
    /// Vertical extent.
    pub height: f32,
}

impl Size {
    /// Create a size.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Component-wise maximum.
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        Self {
            width: self.width.max(other.width),
            height: self.height.max(other.height),
        }
    }
}

/// A point in some element's coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl Point {
    /// Create a point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Translate by another point.
    #[must_use]
    pub fn offset(self, by: Self) -> Self {
        Self {
            x: self.x + by.x,
            y: self.y + by.y,
        }
    }
}

/// A rectangle positioned in 2D space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    /// Horizontal position of the top-left corner.
    pub x: f32,
    /// Vertical position of the top-left corner.
    pub y: f32,
    /// Width of the rectangle.
    pub width: f32,
    /// Height of the rectangle.
    pub height: f32,
}

impl Rect {
    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

/// Edge sizes for padding, border, or margin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct EdgeSizes {
    /// Top edge size.
    pub top: f32,
    /// Right edge size.
    pub right: f32,
    /// Bottom edge size.
    pub bottom: f32,
    /// Left edge size.
    pub left: f32,
}

impl EdgeSizes {
    /// Left + right.
    #[must_use]
    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    /// Top + bottom.
    #[must_use]
    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

/// [§ 3. The CSS Box Model](https://www.w3.org/TR/css-box-3/#box-model)
///
/// "Each box has a content area and optional surrounding padding, border,
/// and margin areas."
///
/// The output of the box builder for one element against one containing
/// block. It is a value: rebuilt from scratch each pass, never patched.
/// The content height stays `Auto` until the owning formatting context
/// closes; the content width stays `Auto` only for inline-level boxes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct BoxDimensions {
    /// Content width, 'auto' only for inline-level boxes.
    pub content_width: AutoOr,
    /// Content height, 'auto' when it depends on the content.
    pub content_height: AutoOr,
    /// Padding edge sizes.
    pub padding: EdgeSizes,
    /// Border edge sizes.
    pub border: EdgeSizes,
    /// Margin edge sizes.
    pub margin: EdgeSizes,
}

impl BoxDimensions {
    /// A box with a fixed content size and no edges.
    #[must_use]
    pub const fn from_content(size: Size) -> Self {
        Self {
            content_width: AutoOr::Length(size.width),
            content_height: AutoOr::Length(size.height),
            padding: EdgeSizes {
                top: 0.0,
                right: 0.0,
                bottom: 0.0,
                left: 0.0,
            },
            border: EdgeSizes {
                top: 0.0,
                right: 0.0,
                bottom: 0.0,
                left: 0.0,
            },
            margin: EdgeSizes {
                top: 0.0,
                right: 0.0,
                bottom: 0.0,
                left: 0.0,
            },
        }
    }

    /// Left margin + border + padding.
    #[must_use]
    pub fn leading_edge(&self) -> f32 {
        self.margin.left + self.border.left + self.padding.left
    }

    /// Right padding + border + margin.
    #[must_use]
    pub fn trailing_edge(&self) -> f32 {
        self.padding.right + self.border.right + self.margin.right
    }

    /// Top margin + border + padding.
    #[must_use]
    pub fn top_edge(&self) -> f32 {
        self.margin.top + self.border.top + self.padding.top
    }

    /// Bottom padding + border + margin.
    #[must_use]
    pub fn bottom_edge(&self) -> f32 {
        self.padding.bottom + self.border.bottom + self.margin.bottom
    }

    /// Horizontal border + padding (no margin).
    #[must_use]
    pub fn horizontal_frame(&self) -> f32 {
        self.border.horizontal() + self.padding.horizontal()
    }

    /// Vertical border + padding (no margin).
    #[must_use]
    pub fn vertical_frame(&self) -> f32 {
        self.border.vertical() + self.padding.vertical()
    }
}

/// The per-element layout result.
///
/// Offsets are the element's border-box top-left relative to the content
/// box of its containing block element, so a subtree laid out standalone
/// (floats, inline-blocks) never needs to be shifted after it is placed.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Geometry {
    /// The element whose content box `offset` is measured from, `None`
    /// for the viewport.
    #[serde(skip)]
    pub containing_block: Option<NodeId>,
    /// Border-box offset from the containing block's content box.
    pub offset: Point,
    /// Used content size.
    pub content: Size,
    /// Used padding.
    pub padding: EdgeSizes,
    /// Used border widths.
    pub border: EdgeSizes,
    /// Used margins.
    pub margin: EdgeSizes,
    /// Extent of everything painted by this box and its descendants,
    /// measured from the content-box origin.
    pub visible_overflow: Size,
    /// Width taken by a vertical scrollbar, 0 if none.
    pub scrollbar_width: f32,
}

impl Geometry {
    /// Resolve a builder box whose width and height are now known.
    #[must_use]
    pub fn from_box(dims: &BoxDimensions, content: Size, offset: Point) -> Self {
        Self {
            containing_block: None,
            offset,
            content,
            padding: dims.padding,
            border: dims.border,
            margin: dims.margin,
            visible_overflow: content,
            scrollbar_width: 0.0,
        }
    }

    // ┌─────────────────────────────────────────┐
    // │              margin-top                 │
    // │   ┌─────────────────────────────────┐   │
    // │   │          border-top             │   │
    // │   │   ┌─────────────────────────┐   │   │
    // │   │   │      padding-top        │   │   │
    // │   │   │   ┌─────────────────┐   │   │   │
    // │ m │ b │ p │     CONTENT     │ p │ b │ m │
    // │   │   │   └─────────────────┘   │   │   │
    // │   │   │      padding-bottom     │   │   │
    // │   │   └─────────────────────────┘   │   │
    // │   │          border-bottom          │   │
    // │   └─────────────────────────────────┘   │
    // │              margin-bottom              │
    // └─────────────────────────────────────────┘

    /// The border box, in the containing block's content coordinates.
    ///
    /// [§ 11.1.1 Overflow](https://www.w3.org/TR/CSS2/visufx.html#overflow)
    ///
    /// "UAs must assume a scrollbar ... The space taken up by the scrollbars
    /// should be taken out of (subtracted from the dimensions of) the
    /// containing block formed by the element with the scrollbars."
    #[must_use]
    pub fn border_box(&self) -> Rect {
        Rect {
            x: self.offset.x,
            y: self.offset.y,
            width: self.content.width
                + self.scrollbar_width
                + self.padding.horizontal()
                + self.border.horizontal(),
            height: self.content.height + self.padding.vertical() + self.border.vertical(),
        }
    }

    /// The padding box, in the containing block's content coordinates.
    #[must_use]
    pub fn padding_box(&self) -> Rect {
        Rect {
            x: self.offset.x + self.border.left,
            y: self.offset.y + self.border.top,
            width: self.content.width + self.scrollbar_width + self.padding.horizontal(),
            height: self.content.height + self.padding.vertical(),
        }
    }

    /// [§ 3.1 Margins](https://www.w3.org/TR/css-box-3/#margins)
    ///
    /// "The margin box is the outermost box, and contains all four areas."
    #[must_use]
    pub fn margin_box(&self) -> Rect {
        let border = self.border_box();
        Rect {
            x: border.x - self.margin.left,
            y: border.y - self.margin.top,
            width: border.width + self.margin.horizontal(),
            height: border.height + self.margin.vertical(),
        }
    }

    /// The content box, in the containing block's content coordinates.
    #[must_use]
    pub fn content_box(&self) -> Rect {
        Rect {
            x: self.offset.x + self.border.left + self.padding.left,
            y: self.offset.y + self.border.top + self.padding.top,
            width: self.content.width,
            height: self.content.height,
        }
    }
}
