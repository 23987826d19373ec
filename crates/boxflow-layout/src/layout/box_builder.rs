//! Box Builder: computed style + containing block -> box dimensions.
//!
//! [§ 10 Visual formatting model details](https://www.w3.org/TR/CSS2/visudet.html)
//!
//! Everything here is a pure function of its inputs, so building the same
//! element against the same containing block always gives the same box.

use super::box_model::{BoxDimensions, EdgeSizes, Size};
use super::values::{AutoOr, UNBOUNDED, clamp_height};
use crate::style::{AutoLength, ComputedStyle, LengthValue, MaxLength, Sides};

/// A block-level box plus the height constraints it was admitted with.
///
/// `min_height` and `max_height` are resolved once, when the box is built,
/// and are not re-derived if the block is reformatted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockBox {
    /// Box dimensions; `content_width` is always a length.
    pub dims: BoxDimensions,
    /// Resolved `min-height`.
    pub min_height: f32,
    /// Resolved `max-height`, [`UNBOUNDED`] for `none`.
    pub max_height: f32,
}

/// Derive an element's box against `containing_block`.
///
/// [§ 8.3 Margin properties](https://www.w3.org/TR/CSS2/box.html#margin-properties)
///
/// "The percentage is calculated with respect to the width of the
/// generated box's containing block. Note that this is true for
/// 'margin-top' and 'margin-bottom' as well."
///
/// Inline-level boxes keep an `auto` content width and height: "The 'width'
/// property does not apply" and their auto margins are 0.
#[must_use]
pub fn build_box(containing_block: Size, style: &ComputedStyle, inline_level: bool) -> BoxDimensions {
    let cb_width = definite_or_zero(containing_block.width);

    // STEP 1: Padding and border.
    // [§ 8.4 Padding properties](https://www.w3.org/TR/CSS2/box.html#padding-properties)
    let padding = resolve_sides(&style.padding, cb_width);
    let border = EdgeSizes {
        top: style.border.top,
        right: style.border.right,
        bottom: style.border.bottom,
        left: style.border.left,
    };

    // STEP 2: Margins, with 'auto' provisionally 0.
    let mut margin = EdgeSizes {
        top: margin_or_zero(style.margin.top, cb_width),
        right: margin_or_zero(style.margin.right, cb_width),
        bottom: margin_or_zero(style.margin.bottom, cb_width),
        left: margin_or_zero(style.margin.left, cb_width),
    };

    if inline_level {
        return BoxDimensions {
            content_width: AutoOr::Auto,
            content_height: AutoOr::Auto,
            padding,
            border,
            margin,
        };
    }

    let frame = padding.horizontal() + border.horizontal();

    // STEP 3: Width.
    // [§ 10.3.3 Block-level, non-replaced elements in normal flow](https://www.w3.org/TR/CSS2/visudet.html#blockwidth)
    //
    // "'margin-left' + 'border-left-width' + 'padding-left' + 'width' +
    // 'padding-right' + 'border-right-width' + 'margin-right' = width of
    // containing block"
    let content_width = match style.width {
        AutoLength::Length(length) => {
            let width = length.resolve(cb_width).max(0.0);

            // "If both 'margin-left' and 'margin-right' are 'auto', their
            // used values are equal. This horizontally centers the element
            // with respect to the edges of the containing block."
            //
            // "If there is exactly one value specified as 'auto', its used
            // value follows from the equality."
            let remaining = cb_width - width - frame - margin.horizontal();
            match (style.margin.left.is_auto(), style.margin.right.is_auto()) {
                (true, true) if remaining > 0.0 => {
                    margin.left = remaining / 2.0;
                    margin.right = remaining / 2.0;
                }
                (true, false) => margin.left = remaining.max(0.0),
                (false, true) => margin.right = remaining.max(0.0),
                _ => {}
            }
            width
        }
        // "If 'width' is set to 'auto', any other 'auto' values become '0'
        // and 'width' follows from the resulting equality."
        AutoLength::Auto => (cb_width - margin.horizontal() - frame).max(0.0),
    };

    // STEP 4: Height.
    // [§ 10.5 Content height](https://www.w3.org/TR/CSS2/visudet.html#the-height-property)
    //
    // "If the height of the containing block is not specified explicitly
    // (i.e., it depends on content height), and this element is not
    // absolutely positioned, the value computes to 'auto'."
    let (min_height, max_height) = min_max_height(style, containing_block.height);
    let content_height = match style.height {
        AutoLength::Length(length) => length
            .resolve_definite(containing_block.height)
            .map_or(AutoOr::Auto, |h| {
                AutoOr::Length(clamp_height(h.max(0.0), min_height, max_height))
            }),
        AutoLength::Auto => AutoOr::Auto,
    };

    BoxDimensions {
        content_width: AutoOr::Length(content_width),
        content_height,
        padding,
        border,
        margin,
    }
}

/// Resolve `min-height`/`max-height` against the containing block height.
///
/// [§ 10.7 Minimum and maximum heights](https://www.w3.org/TR/CSS2/visudet.html#min-max-heights)
///
/// "If the height of the containing block is not specified explicitly ...
/// the percentage value is treated as '0' (for 'min-height') or 'none'
/// (for 'max-height')."
#[must_use]
pub fn min_max_height(style: &ComputedStyle, containing_height: f32) -> (f32, f32) {
    let min = style
        .min_height
        .resolve_definite(containing_height)
        .unwrap_or(0.0)
        .max(0.0);
    let max = match style.max_height {
        MaxLength::None => UNBOUNDED,
        MaxLength::Length(length) => length
            .resolve_definite(containing_height)
            .unwrap_or(UNBOUNDED)
            .max(0.0),
    };
    (min, max)
}

/// [`build_box`] for a block-level box, with its height constraints.
#[must_use]
pub fn block_box(containing_block: Size, style: &ComputedStyle) -> BlockBox {
    let dims = build_box(containing_block, style, false);
    let (min_height, max_height) = min_max_height(style, containing_block.height);
    BlockBox {
        dims,
        min_height,
        max_height,
    }
}

/// [`block_box`] for a box laid out on its own (floats, inline-blocks,
/// absolutely positioned boxes, table cells).
///
/// [§ 10.3.5 Floating, non-replaced elements](https://www.w3.org/TR/CSS2/visudet.html#float-width)
///
/// "If 'margin-left', or 'margin-right' are computed as 'auto', their used
/// value is '0'." With `width: auto` the content width starts at the full
/// available width; the engine narrows it to the shrink-to-fit width.
#[must_use]
pub fn standalone_box(containing_block: Size, style: &ComputedStyle) -> BlockBox {
    let mut block = block_box(containing_block, style);
    let cb_width = definite_or_zero(containing_block.width);
    let dims = &mut block.dims;
    if style.margin.left.is_auto() {
        dims.margin.left = 0.0;
    }
    if style.margin.right.is_auto() {
        dims.margin.right = 0.0;
    }
    if style.width.is_auto() {
        dims.content_width =
            AutoOr::Length((cb_width - dims.margin.horizontal() - dims.horizontal_frame()).max(0.0));
    }
    block
}

fn resolve_sides(sides: &Sides<LengthValue>, basis: f32) -> EdgeSizes {
    EdgeSizes {
        top: sides.top.resolve(basis),
        right: sides.right.resolve(basis),
        bottom: sides.bottom.resolve(basis),
        left: sides.left.resolve(basis),
    }
}

fn margin_or_zero(value: AutoLength, basis: f32) -> f32 {
    value.length().map_or(0.0, |length| length.resolve(basis))
}

fn definite_or_zero(value: f32) -> f32 {
    if value.is_finite() { value } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(decls: &str) -> ComputedStyle {
        ComputedStyle::parse(decls).unwrap()
    }

    const CB: Size = Size::new(800.0, 600.0);

    #[test]
    fn test_auto_width_fills_containing_block() {
        let dims = build_box(CB, &style("display: block; margin: 10px; padding: 5px; border-width: 1px"), false);
        assert_eq!(dims.content_width, AutoOr::Length(800.0 - 20.0 - 10.0 - 2.0));
        assert_eq!(dims.content_height, AutoOr::Auto);
    }

    #[test]
    fn test_auto_margins_center_fixed_width() {
        let dims = build_box(CB, &style("display: block; width: 200px; margin: 0 auto"), false);
        assert!((dims.margin.left - 300.0).abs() < f32::EPSILON);
        assert!((dims.margin.right - 300.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_single_auto_margin_absorbs_remainder() {
        let dims = build_box(
            CB,
            &style("display: block; width: 200px; margin-left: auto; margin-right: 50px"),
            false,
        );
        assert!((dims.margin.left - 550.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_percentages_resolve_against_width() {
        let dims = build_box(CB, &style("display: block; width: 50%; padding-top: 10%"), false);
        assert_eq!(dims.content_width, AutoOr::Length(400.0));
        assert!((dims.padding.top - 80.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_percent_height_needs_definite_containing_block() {
        let s = style("display: block; height: 50%");
        assert_eq!(build_box(CB, &s, false).content_height, AutoOr::Length(300.0));
        let unbounded = Size::new(800.0, UNBOUNDED);
        assert_eq!(build_box(unbounded, &s, false).content_height, AutoOr::Auto);
    }

    #[test]
    fn test_definite_height_is_clamped() {
        let s = style("display: block; height: 50px; min-height: 80px");
        assert_eq!(build_box(CB, &s, false).content_height, AutoOr::Length(80.0));
        let s = style("display: block; height: 500px; max-height: 25%");
        assert_eq!(build_box(CB, &s, false).content_height, AutoOr::Length(150.0));
    }

    #[test]
    fn test_inline_level_ignores_width_and_auto_margins() {
        let dims = build_box(CB, &style("width: 100px; margin: auto; padding: 2px"), true);
        assert_eq!(dims.content_width, AutoOr::Auto);
        assert!(dims.margin.left.abs() < f32::EPSILON);
        assert!((dims.padding.left - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_min_max_percent_without_basis() {
        let s = style("min-height: 10%; max-height: 20%");
        assert_eq!(min_max_height(&s, UNBOUNDED), (0.0, UNBOUNDED));
        assert_eq!(min_max_height(&s, 1000.0), (100.0, 200.0));
    }

    #[test]
    fn test_standalone_box_zeroes_auto_margins() {
        let b = standalone_box(CB, &style("float: left; margin: auto; padding: 10px"));
        assert!(b.dims.margin.left.abs() < f32::EPSILON);
        assert_eq!(b.dims.content_width, AutoOr::Length(780.0));
    }
}
