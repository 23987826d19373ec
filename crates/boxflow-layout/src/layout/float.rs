//! Float/space manager.
//!
//! [§ 9.5 Floats](https://www.w3.org/TR/CSS2/visuren.html#floats)
//!
//! "A floated box is shifted to the left or right until its outer edge
//! touches the containing block edge or the outer edge of another float."
//!
//! One [`FloatSpace`] lives inside each block formatting context. It only
//! knows about margin boxes; the float's own subtree has already been laid
//! out by the time it is registered here.

use boxflow_dom::NodeId;
use serde::Serialize;

use super::box_model::Rect;
use crate::style::{ClearValue, FloatValue};

/// Which edge a float hugs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FloatSide {
    /// "The element generates a block box that is floated to the left."
    Left,
    /// "The element generates a block box that is floated to the right."
    Right,
}

impl FloatSide {
    /// `None` for `float: none`.
    #[must_use]
    pub const fn from_style(value: FloatValue) -> Option<Self> {
        match value {
            FloatValue::None => None,
            FloatValue::Left => Some(Self::Left),
            FloatValue::Right => Some(Self::Right),
        }
    }
}

/// A float record: the element, its margin box and the band it occupies.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedFloat {
    /// The floated element.
    pub node: NodeId,
    /// Which side the float is on.
    pub side: FloatSide,
    /// Margin box in the owning block's content coordinates.
    pub margin_box: Rect,
}

impl PlacedFloat {
    fn overlaps_band(&self, top: f32, bottom: f32) -> bool {
        self.margin_box.y < bottom && self.margin_box.bottom() > top
    }
}

/// Horizontal space consumed by floats, per vertical band.
///
/// "The current and subsequent line boxes created next to the float are
/// shortened as necessary to make room for the margin box of the float."
#[derive(Debug, Clone, Default)]
pub struct FloatSpace {
    floats: Vec<PlacedFloat>,
    containing_width: f32,
}

impl FloatSpace {
    /// An empty space for a containing block of the given width.
    #[must_use]
    pub const fn new(containing_width: f32) -> Self {
        Self {
            floats: Vec::new(),
            containing_width,
        }
    }

    /// A space for a nested block that sees the floats of its formatting
    /// context. Floats are translated so `origin` (the nested content box
    /// in this space's coordinates) becomes (0, 0).
    #[must_use]
    pub fn inherit(&self, origin_x: f32, origin_y: f32, containing_width: f32) -> Self {
        let floats = self
            .floats
            .iter()
            .map(|f| PlacedFloat {
                margin_box: Rect {
                    x: f.margin_box.x - origin_x,
                    y: f.margin_box.y - origin_y,
                    ..f.margin_box
                },
                ..f.clone()
            })
            .collect();
        Self {
            floats,
            containing_width,
        }
    }

    /// Take over floats placed inside a nested block that does not establish
    /// its own formatting context. `origin` is the nested content box in
    /// this space's coordinates.
    pub fn adopt(&mut self, nested: &[PlacedFloat], origin_x: f32, origin_y: f32) {
        self.floats.extend(nested.iter().map(|f| PlacedFloat {
            margin_box: Rect {
                x: f.margin_box.x + origin_x,
                y: f.margin_box.y + origin_y,
                ..f.margin_box
            },
            ..f.clone()
        }));
    }

    /// Forget every float after the first `keep` and adopt a (possibly
    /// narrower) width.
    pub fn reset(&mut self, keep: usize, containing_width: f32) {
        self.floats.truncate(keep);
        self.containing_width = containing_width;
    }

    /// Number of placed floats, including inherited ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.floats.len()
    }

    /// The width floats are placed against.
    #[must_use]
    pub const fn containing_width(&self) -> f32 {
        self.containing_width
    }

    /// Placed floats in placement order.
    #[must_use]
    pub fn floats(&self) -> &[PlacedFloat] {
        &self.floats
    }

    /// `true` when no float has been placed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.floats.is_empty()
    }

    /// [§ 10.6.7](https://www.w3.org/TR/CSS2/visudet.html#root-height)
    ///
    /// "If the element has any floating descendants whose bottom margin edge
    /// is below the element's bottom content edge, then the height is
    /// increased to include those edges."
    #[must_use]
    pub fn max_float_bottom(&self) -> f32 {
        self.floats
            .iter()
            .map(|f| f.margin_box.bottom())
            .fold(0.0_f32, f32::max)
    }

    /// Rightmost float edge, used for visible overflow.
    #[must_use]
    pub fn max_float_right(&self) -> f32 {
        self.floats
            .iter()
            .map(|f| f.margin_box.right())
            .fold(0.0_f32, f32::max)
    }

    /// [§ 9.5.1 Positioning the float](https://www.w3.org/TR/CSS2/visuren.html#float-position)
    ///
    /// Place a margin box of `width` x `height` no higher than `current_y`.
    ///
    /// - Rule 1: the float stays inside the containing block edges.
    /// - Rules 2, 3, 7: floats do not overlap each other.
    /// - Rules 4, 5, 8: the float is placed as high as possible.
    /// - Rule 9: left floats go as far left as possible, right floats as far right.
    pub fn place_float(
        &mut self,
        node: NodeId,
        side: FloatSide,
        width: f32,
        height: f32,
        current_y: f32,
    ) -> Rect {
        let mut y = current_y.max(0.0);
        let (left, available) = loop {
            let (left, available) = self.available_width_at(y, height.max(f32::EPSILON));
            if available >= width || available >= self.containing_width {
                break (left, available);
            }
            // Does not fit at this y: drop to the next float bottom.
            match self.next_float_bottom_after(y) {
                Some(next) => y = next,
                None => break (left, available),
            }
        };

        let x = match side {
            FloatSide::Left => left,
            FloatSide::Right => (left + available - width).max(0.0),
        };
        let margin_box = Rect {
            x,
            y,
            width,
            height,
        };
        self.floats.push(PlacedFloat {
            node,
            side,
            margin_box,
        });
        margin_box
    }

    /// [§ 9.5.2 The 'clear' property](https://www.w3.org/TR/CSS2/visuren.html#flow-control)
    ///
    /// "Requires that the top border edge of the box be below the bottom
    /// outer edge of any [left|right]-floating boxes."
    ///
    /// Returns the y a box with `clear` must be moved down to.
    #[must_use]
    pub fn clear(&self, clear: ClearValue, current_y: f32) -> f32 {
        let clears = |side: FloatSide| match clear {
            ClearValue::None => false,
            ClearValue::Left => side == FloatSide::Left,
            ClearValue::Right => side == FloatSide::Right,
            ClearValue::Both => true,
        };
        self.floats
            .iter()
            .filter(|f| clears(f.side))
            .map(|f| f.margin_box.bottom())
            .fold(current_y, f32::max)
    }

    /// Returns `(left_offset, available_width)` for the band
    /// `[y, y + height)`. A float is active in the band if its margin box
    /// vertically intersects it.
    #[must_use]
    pub fn available_width_at(&self, y: f32, height: f32) -> (f32, f32) {
        let bottom = y + height;
        let mut left_edge = 0.0_f32;
        let mut right_edge = self.containing_width;
        for f in self.floats.iter().filter(|f| f.overlaps_band(y, bottom)) {
            match f.side {
                FloatSide::Left => left_edge = left_edge.max(f.margin_box.right()),
                FloatSide::Right => right_edge = right_edge.min(f.margin_box.x),
            }
        }
        (left_edge, (right_edge - left_edge).max(0.0))
    }

    /// Smallest float bottom strictly below `y`.
    #[must_use]
    pub fn next_float_bottom_after(&self, y: f32) -> Option<f32> {
        self.floats
            .iter()
            .map(|f| f.margin_box.bottom())
            .filter(|&b| b > y)
            .min_by(f32::total_cmp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: NodeId = NodeId(1);
    const B: NodeId = NodeId(2);

    #[test]
    fn test_right_float_narrows_band() {
        let mut space = FloatSpace::new(800.0);
        let rect = space.place_float(A, FloatSide::Right, 200.0, 100.0, 0.0);
        assert!((rect.x - 600.0).abs() < f32::EPSILON);

        assert_eq!(space.available_width_at(0.0, 20.0), (0.0, 600.0));
        // Below the float the full width is back.
        assert_eq!(space.available_width_at(100.0, 20.0), (0.0, 800.0));
    }

    #[test]
    fn test_left_floats_stack_horizontally() {
        let mut space = FloatSpace::new(300.0);
        let _ = space.place_float(A, FloatSide::Left, 100.0, 50.0, 0.0);
        let second = space.place_float(B, FloatSide::Left, 100.0, 50.0, 0.0);
        assert!((second.x - 100.0).abs() < f32::EPSILON);
        assert!(second.y.abs() < f32::EPSILON);
    }

    #[test]
    fn test_float_drops_below_when_no_room() {
        let mut space = FloatSpace::new(300.0);
        let _ = space.place_float(A, FloatSide::Left, 200.0, 50.0, 0.0);
        let second = space.place_float(B, FloatSide::Left, 200.0, 40.0, 0.0);
        assert!((second.y - 50.0).abs() < f32::EPSILON);
        assert!(second.x.abs() < f32::EPSILON);
        assert!((space.max_float_bottom() - 90.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_clear_only_considers_named_side() {
        let mut space = FloatSpace::new(500.0);
        let _ = space.place_float(A, FloatSide::Left, 100.0, 80.0, 0.0);
        let _ = space.place_float(B, FloatSide::Right, 100.0, 30.0, 0.0);
        assert!((space.clear(ClearValue::Right, 10.0) - 30.0).abs() < f32::EPSILON);
        assert!((space.clear(ClearValue::Left, 10.0) - 80.0).abs() < f32::EPSILON);
        assert!((space.clear(ClearValue::Both, 90.0) - 90.0).abs() < f32::EPSILON);
        assert!((space.clear(ClearValue::None, 5.0) - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_inherit_translates_into_nested_coordinates() {
        let mut space = FloatSpace::new(500.0);
        let _ = space.place_float(A, FloatSide::Left, 100.0, 80.0, 0.0);
        let nested = space.inherit(10.0, 20.0, 480.0);
        assert_eq!(nested.len(), 1);
        // The float covers nested x 0..90 for nested y -20..60.
        assert_eq!(nested.available_width_at(0.0, 10.0), (90.0, 390.0));
        assert_eq!(nested.available_width_at(60.0, 10.0), (0.0, 480.0));
    }

    #[test]
    fn test_reset_forgets_floats() {
        let mut space = FloatSpace::new(500.0);
        let _ = space.place_float(A, FloatSide::Left, 100.0, 80.0, 0.0);
        space.reset(0, 484.0);
        assert!(space.is_empty());
        assert!((space.containing_width() - 484.0).abs() < f32::EPSILON);
    }
}
