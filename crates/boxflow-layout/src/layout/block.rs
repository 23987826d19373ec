//! Block formatting context.
//!
//! [§ 9.4.1 Block formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#block-formatting)
//!
//! "In a block formatting context, boxes are laid out one after the other,
//! vertically, beginning at the top of a containing block. The vertical
//! distance between two sibling boxes is determined by the 'margin'
//! properties. Vertical margins between adjacent block-level boxes in a
//! block formatting context collapse."
//!
//! A [`BlockContainer`] is the layout state of one block box while its
//! children are being formatted: the vertical cursor, at most one open
//! [`InlineContainer`], the float space and the queue of absolutely
//! positioned descendants. It lives in the [`super::pool::LayoutArena`]
//! from admission until its element is finalized.

use std::mem;

use boxflow_dom::NodeId;

use super::box_builder::BlockBox;
use super::box_model::{BoxDimensions, Geometry, Point, Rect, Size};
use super::float::{FloatSide, FloatSpace};
use super::inline::{InlineContainer, InlineContentProducer, OpenInlineBox, TextStyle};
use super::pool::BlockId;
use super::values::{AutoOr, UNBOUNDED, clamp_height};
use crate::document::StyledDocument;
use crate::style::{ClearValue, ComputedStyle, OverflowValue};

/// Rounding slack when comparing content extents against height limits.
const OVERFLOW_EPSILON: f32 = 0.01;

/// Outcome of closing a formatting context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseResult {
    /// The context is final.
    Ok,
    /// Closing changed this context's own available width (a vertical
    /// scrollbar appeared); its children must be formatted again.
    RetrySelf,
    /// Closing made the parent context overflow; the parent must redo its
    /// own child pass.
    EscalateParent,
}

/// An absolutely or fixed positioned element waiting for its block to close.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AbsoluteEntry {
    /// The out-of-flow element.
    pub node: NodeId,
    /// [§ 10.3.7](https://www.w3.org/TR/CSS2/visudet.html#abs-non-replaced-width)
    ///
    /// "The static position for 'left' is the distance from the left edge
    /// of the containing block to the left margin edge of a hypothetical
    /// box that would have been the first box of the element if its
    /// 'position' property had been 'static'." In block content coordinates.
    pub static_position: Point,
}

/// Layout state of one block box.
#[derive(Debug, Clone)]
pub struct BlockContainer {
    pub(crate) parent: Option<BlockId>,
    element: Option<NodeId>,
    dims: BoxDimensions,
    offset: Point,
    min_height: f32,
    max_height: f32,
    height_basis: f32,
    definite_width: bool,
    overflow_y: OverflowValue,
    scrollbar: bool,
    scrollbar_width: f32,
    independent: bool,
    strut: f32,
    cursor_y: f32,
    pending_margin: f32,
    inline: Option<InlineContainer>,
    open_boxes: Vec<OpenInlineBox>,
    floats: FloatSpace,
    inherited_floats: usize,
    float_width: f32,
    absolutes: Vec<AbsoluteEntry>,
    overflow: Size,
    preferred_width: f32,
    used_height: Option<f32>,
}

impl BlockContainer {
    /// The synthetic root context: `containing_block.width` wide, with no
    /// height bound. `containing_block.height` is only used as the basis
    /// for percentage heights of the element laid out inside it.
    #[must_use]
    pub fn root(containing_block: Size, strut: f32, scrollbar_width: f32) -> Self {
        let width = if containing_block.width.is_finite() {
            containing_block.width.max(0.0)
        } else {
            0.0
        };
        Self {
            parent: None,
            element: None,
            dims: BoxDimensions {
                content_width: AutoOr::Length(width),
                ..BoxDimensions::default()
            },
            offset: Point::default(),
            min_height: 0.0,
            max_height: UNBOUNDED,
            height_basis: containing_block.height,
            definite_width: true,
            overflow_y: OverflowValue::Visible,
            scrollbar: false,
            scrollbar_width,
            independent: true,
            strut,
            cursor_y: 0.0,
            pending_margin: 0.0,
            inline: None,
            open_boxes: Vec::new(),
            floats: FloatSpace::new(width),
            inherited_floats: 0,
            float_width: 0.0,
            absolutes: Vec::new(),
            overflow: Size::default(),
            preferred_width: 0.0,
            used_height: None,
        }
    }

    // ── accessors ────────────────────────────────────────────────────────

    /// The element this context lays out, `None` for a synthetic root.
    #[must_use]
    pub const fn element(&self) -> Option<NodeId> {
        self.element
    }

    /// The parent context, if any.
    #[must_use]
    pub const fn parent(&self) -> Option<BlockId> {
        self.parent
    }

    /// The box the element was admitted with.
    #[must_use]
    pub const fn dims(&self) -> &BoxDimensions {
        &self.dims
    }

    /// Border-box position in the parent's content coordinates.
    #[must_use]
    pub const fn offset(&self) -> Point {
        self.offset
    }

    /// Full content width, including space a scrollbar may take.
    #[must_use]
    pub const fn content_width(&self) -> f32 {
        self.dims.content_width.to_px_or(0.0)
    }

    /// Content width left for children.
    #[must_use]
    pub fn available_width(&self) -> f32 {
        let scrollbar = if self.scrollbar {
            self.scrollbar_width
        } else {
            0.0
        };
        (self.content_width() - scrollbar).max(0.0)
    }

    /// The containing block this context offers its children: the
    /// available width, and the content height when it is definite.
    #[must_use]
    pub fn containing_block(&self) -> Size {
        Size::new(self.available_width(), self.height_basis)
    }

    /// `true` once a vertical scrollbar takes space from the content box.
    #[must_use]
    pub const fn has_scrollbar(&self) -> bool {
        self.scrollbar
    }

    /// `true` if floats inside do not leak out and count toward height.
    #[must_use]
    pub const fn is_independent(&self) -> bool {
        self.independent
    }

    /// Where the next in-flow block would start.
    #[must_use]
    pub fn cursor_y(&self) -> f32 {
        self.inline
            .as_ref()
            .map_or(self.cursor_y + self.pending_margin, InlineContainer::line_top)
    }

    /// The float space of this context.
    #[must_use]
    pub const fn floats(&self) -> &FloatSpace {
        &self.floats
    }

    /// The open inline context, if any.
    #[must_use]
    pub const fn inline(&self) -> Option<&InlineContainer> {
        self.inline.as_ref()
    }

    /// Out-of-flow elements waiting for this block to close.
    #[must_use]
    pub fn absolutes(&self) -> &[AbsoluteEntry] {
        &self.absolutes
    }

    /// Resolved min/max height, held fixed for the lifetime of the context.
    #[must_use]
    pub const fn height_constraints(&self) -> (f32, f32) {
        (self.min_height, self.max_height)
    }

    /// Content height fixed by the last close, if any.
    #[must_use]
    pub const fn used_height(&self) -> Option<f32> {
        self.used_height
    }

    /// Shrink-to-fit preferred content width.
    ///
    /// [§ 10.3.5](https://www.w3.org/TR/CSS2/visudet.html#float-width)
    ///
    /// "Calculate the preferred width by formatting the content without
    /// breaking lines other than where explicit line breaks occur."
    #[must_use]
    pub fn preferred_width(&self) -> f32 {
        self.preferred_width.max(self.float_width)
    }

    /// Extent of everything painted inside this block, from the content
    /// origin. At least the content box.
    #[must_use]
    pub fn visible_overflow(&self) -> Size {
        let height = self.used_height.unwrap_or_else(|| self.resolve_height());
        Size::new(self.available_width(), height).max(self.overflow)
    }

    /// The padding box absolutely positioned children are placed against.
    #[must_use]
    pub fn absolute_containing_block(&self) -> Size {
        let height = self.used_height.unwrap_or_else(|| self.resolve_height());
        Size::new(
            self.content_width() + self.dims.padding.horizontal(),
            height + self.dims.padding.vertical(),
        )
    }

    // ── block-level content ─────────────────────────────────────────────

    /// Admit `node` as a new child block.
    ///
    /// [§ 9.4.1](https://www.w3.org/TR/CSS2/visuren.html#block-formatting)
    ///
    /// Any open inline content is closed first. Returns `None` when that
    /// closing made this block overflow and turned on its scrollbar: the
    /// caller has to format this block's children again.
    pub fn add_block_element(
        &mut self,
        doc: &mut StyledDocument,
        node: NodeId,
        style: &ComputedStyle,
        block_box: &BlockBox,
        strut: f32,
    ) -> Option<Self> {
        // STEP 1: Close the anonymous block of inline content before us.
        self.close_inline_context(doc);
        if self.check_overflow() {
            return None;
        }

        // STEP 2: Vertical position.
        // [§ 8.3.1 Collapsing margins](https://www.w3.org/TR/CSS2/box.html#collapsing-margins)
        //
        // "Adjoining vertical margins collapse ... bottom margin of box and
        // top margin of its next in-flow following sibling"
        let dims = block_box.dims;
        let mut y = self.cursor_y + collapse_margins(self.pending_margin, dims.margin.top);

        // [§ 9.5.2](https://www.w3.org/TR/CSS2/visuren.html#flow-control)
        //
        // "Requires that the top border edge of the box be below the bottom
        // outer edge of any ... floating boxes that resulted from elements
        // earlier in the source document."
        if style.clear != ClearValue::None {
            y = self.floats.clear(style.clear, y);
        }
        let offset = Point::new(dims.margin.left, y);

        // STEP 3: The child's own state.
        let content_width = dims.content_width.to_px_or(0.0);
        let scrollbar = style.overflow_y == OverflowValue::Scroll;
        let available = if scrollbar {
            (content_width - self.scrollbar_width).max(0.0)
        } else {
            content_width
        };
        let independent = style.establishes_bfc();
        let floats = if independent {
            FloatSpace::new(available)
        } else {
            self.floats.inherit(
                offset.x + dims.border.left + dims.padding.left,
                offset.y + dims.border.top + dims.padding.top,
                available,
            )
        };

        log::trace!(
            target: "boxflow::layout",
            "admit {node:?} at ({}, {y}) width {content_width}",
            offset.x
        );

        Some(Self {
            parent: None,
            element: Some(node),
            dims,
            offset,
            min_height: block_box.min_height,
            max_height: block_box.max_height,
            height_basis: dims.content_height.length().unwrap_or(UNBOUNDED),
            definite_width: !style.width.is_auto(),
            overflow_y: style.overflow_y,
            scrollbar,
            scrollbar_width: self.scrollbar_width,
            independent,
            strut,
            cursor_y: 0.0,
            pending_margin: 0.0,
            inline: None,
            open_boxes: Vec::new(),
            inherited_floats: floats.len(),
            floats,
            float_width: 0.0,
            absolutes: Vec::new(),
            overflow: Size::default(),
            preferred_width: 0.0,
            used_height: None,
        })
    }

    /// Extend the in-flow content to `size`, for content laid out by an
    /// external algorithm (tables).
    pub fn reserve_content(&mut self, size: Size) {
        self.cursor_y = self.cursor_y.max(size.height);
        self.pending_margin = 0.0;
        self.preferred_width = self.preferred_width.max(size.width);
        self.overflow = self.overflow.max(size);
    }

    /// Queue an absolutely or fixed positioned element; it is laid out when
    /// this block has closed.
    pub fn add_absolute_element(&mut self, node: NodeId) {
        let static_position = self
            .inline
            .as_ref()
            .map_or_else(
                || Point::new(0.0, self.cursor_y + self.pending_margin),
                InlineContainer::cursor,
            );
        self.absolutes.push(AbsoluteEntry {
            node,
            static_position,
        });
    }

    /// Hand the queued out-of-flow elements to the caller.
    pub fn take_absolutes(&mut self) -> Vec<AbsoluteEntry> {
        mem::take(&mut self.absolutes)
    }

    /// [§ 9.5.1](https://www.w3.org/TR/CSS2/visuren.html#float-position)
    ///
    /// Register a float whose own layout is already done (its geometry
    /// holds the final size). Returns `false` if placing it made this
    /// block overflow and turned on its scrollbar.
    pub fn add_float_element(
        &mut self,
        doc: &mut StyledDocument,
        node: NodeId,
        side: FloatSide,
    ) -> bool {
        let Some(geometry) = doc.geometry(node).copied() else {
            return true;
        };
        let margin_box = geometry.margin_box();
        let size = Size::new(margin_box.width, margin_box.height);
        self.float_width += size.width;

        let rect = if let Some(inline) = self.inline.as_mut() {
            let placed = inline.add_float(node, side, size, &mut self.floats);
            self.drain_inline_floats(doc);
            match placed {
                Some(rect) => rect,
                None => return true,
            }
        } else {
            self.floats.place_float(
                node,
                side,
                size.width,
                size.height,
                self.cursor_y + self.pending_margin,
            )
        };
        self.position_float(doc, node, rect);

        if self.independent && self.would_overflow(rect.bottom()) {
            self.enable_scrollbar();
            return false;
        }
        true
    }

    // ── inline-level content ─────────────────────────────────────────────

    /// Open an inline box for `node` in the current inline context,
    /// starting one if needed.
    pub fn add_inline_element(&mut self, node: NodeId, dims: BoxDimensions, line_height: f32) {
        self.open_inline();
        if let Some(inline) = self.inline.as_mut() {
            inline.open_inline_box(node, dims, line_height);
        }
    }

    /// Close the inline box for `node`.
    pub fn close_inline_box(&mut self, doc: &mut StyledDocument, node: NodeId) {
        if let Some(inline) = self.inline.as_mut()
            && inline.close_inline_box(node)
        {
            return;
        }
        // Split by block-level content and nothing followed: the earlier
        // part is all there is.
        if let Some(depth) = self.open_boxes.iter().position(|b| b.node == node) {
            self.open_boxes.truncate(depth);
            doc.notify_layout(node);
        }
    }

    /// Add a text run to the current inline context.
    pub fn add_text(
        &mut self,
        doc: &mut StyledDocument,
        node: NodeId,
        text: &str,
        style: TextStyle,
        producer: &dyn InlineContentProducer,
    ) {
        self.open_inline();
        if let Some(inline) = self.inline.as_mut() {
            inline.add_text(node, text, style, producer, &mut self.floats);
        }
        self.drain_inline_floats(doc);
    }

    /// Insert an atomic inline whose geometry is already computed.
    pub fn add_atomic_inline(&mut self, doc: &mut StyledDocument, node: NodeId, geometry: Geometry) {
        self.open_inline();
        if let Some(inline) = self.inline.as_mut() {
            inline.add_atomic(node, geometry, &mut self.floats);
        }
        self.drain_inline_floats(doc);
    }

    /// Force a line break and give the breaking element a zero-width box
    /// where the break happened.
    pub fn add_break(&mut self, doc: &mut StyledDocument, node: NodeId, line_height: f32) -> Geometry {
        self.open_inline();
        let at = self
            .inline
            .as_mut()
            .map_or_else(Point::default, |inline| inline.add_break(&mut self.floats));
        self.drain_inline_floats(doc);

        let mut geometry = Geometry::from_box(
            &BoxDimensions::default(),
            Size::new(0.0, line_height),
            at,
        );
        geometry.containing_block = self.element;
        doc.set_geometry(node, geometry);
        geometry
    }

    /// Close the open inline context, writing geometry for everything in it.
    pub fn close_inline_context(&mut self, doc: &mut StyledDocument) {
        let Some(inline) = self.inline.take() else {
            return;
        };
        let closed = inline.close(&mut self.floats);

        self.cursor_y = closed.bottom;
        self.pending_margin = 0.0;
        self.preferred_width = self.preferred_width.max(closed.preferred_width);
        self.overflow = self
            .overflow
            .max(Size::new(closed.right_extent, closed.bottom));

        for placement in closed.placements {
            let mut geometry = placement.geometry;
            geometry.containing_block = self.element;
            self.include_geometry(&geometry, true);
            doc.set_geometry(placement.node, geometry);
            if placement.notify {
                doc.notify_layout(placement.node);
            }
        }
        for (node, rect) in closed.floats {
            self.position_float(doc, node, rect);
        }
        self.open_boxes = closed.open_boxes;
    }

    // ── closing ─────────────────────────────────────────────────────────

    /// Fix this block's height and report whether that is final.
    ///
    /// [§ 11.1.1 Overflow](https://www.w3.org/TR/CSS2/visufx.html#overflow)
    ///
    /// "auto: ... should cause a scrolling mechanism to be provided for
    /// overflowing boxes."
    ///
    /// With `overflow-y: auto` and a height limit, content taller than the
    /// limit turns on the scrollbar and gives [`CloseResult::RetrySelf`].
    /// If this block's margin box does not fit the parent's limit, the
    /// parent's scrollbar is turned on and the result is
    /// [`CloseResult::EscalateParent`].
    pub fn close(&mut self, doc: &mut StyledDocument, parent: Option<&mut Self>) -> CloseResult {
        self.close_inline_context(doc);
        if self.check_overflow() {
            return CloseResult::RetrySelf;
        }

        let height = self.resolve_height();
        self.used_height = Some(height);

        if let Some(parent) = parent {
            let bottom = self.offset.y
                + height
                + self.dims.vertical_frame()
                + self.dims.margin.bottom;
            if parent.would_overflow(bottom) {
                parent.enable_scrollbar();
                return CloseResult::EscalateParent;
            }
        }
        CloseResult::Ok
    }

    /// Fix this block's height with whatever content the last pass left.
    pub fn force_close(&mut self, doc: &mut StyledDocument) {
        self.close_inline_context(doc);
        self.used_height = Some(self.resolve_height());
    }

    /// Write this block's geometry and fold it into `parent`.
    pub fn finalize(&self, doc: &mut StyledDocument, parent: Option<&mut Self>) -> Geometry {
        let height = self.used_height.unwrap_or_else(|| self.resolve_height());
        let mut geometry = Geometry::from_box(
            &self.dims,
            Size::new(self.available_width(), height),
            self.offset,
        );
        if self.scrollbar {
            geometry.scrollbar_width = self.content_width() - self.available_width();
        }
        geometry.visible_overflow = self.visible_overflow();

        if let Some(parent) = parent {
            geometry.containing_block = parent.element;
            parent.accept_block(self, &geometry);
        }
        if let Some(element) = self.element {
            doc.set_geometry(element, geometry);
        }
        geometry
    }

    /// Discard the content of the last pass so children can be formatted
    /// again. Scrollbar state and height constraints are kept.
    pub fn reset_for_reflow(&mut self) {
        log::trace!(target: "boxflow::layout", "reflow {:?}", self.element);
        self.cursor_y = 0.0;
        self.pending_margin = 0.0;
        self.inline = None;
        self.open_boxes.clear();
        self.floats.reset(self.inherited_floats, self.available_width());
        self.float_width = 0.0;
        self.absolutes.clear();
        self.overflow = Size::default();
        self.preferred_width = 0.0;
        self.used_height = None;
    }

    /// Fold a positioned child's geometry into the visible overflow.
    pub fn include_geometry(&mut self, geometry: &Geometry, visible: bool) {
        let border_box = geometry.border_box();
        let mut extent = Size::new(border_box.right(), border_box.bottom());
        if visible {
            let content = geometry.content_box();
            extent = extent.max(Size::new(
                content.x + geometry.visible_overflow.width,
                content.y + geometry.visible_overflow.height,
            ));
        }
        self.overflow = self.overflow.max(extent);
    }

    // ── internals ───────────────────────────────────────────────────────

    fn open_inline(&mut self) {
        if self.inline.is_some() {
            return;
        }
        let top = self.cursor_y + self.pending_margin;
        self.cursor_y = top;
        self.pending_margin = 0.0;
        let mut inline = InlineContainer::new(top, self.strut, &self.floats);
        inline.resume(mem::take(&mut self.open_boxes));
        self.inline = Some(inline);
    }

    fn drain_inline_floats(&mut self, doc: &mut StyledDocument) {
        let placed = self
            .inline
            .as_mut()
            .map(InlineContainer::take_placed_floats)
            .unwrap_or_default();
        for (node, rect) in placed {
            self.position_float(doc, node, rect);
        }
    }

    fn position_float(&mut self, doc: &mut StyledDocument, node: NodeId, margin_box: Rect) {
        let Some(mut geometry) = doc.geometry(node).copied() else {
            return;
        };
        geometry.offset = Point::new(
            margin_box.x + geometry.margin.left,
            margin_box.y + geometry.margin.top,
        );
        geometry.containing_block = self.element;
        self.include_geometry(&geometry, true);
        doc.set_geometry(node, geometry);
        doc.notify_layout(node);
    }

    fn accept_block(&mut self, child: &Self, geometry: &Geometry) {
        let border_box = geometry.border_box();
        self.cursor_y = border_box.bottom();
        self.pending_margin = geometry.margin.bottom;
        self.include_geometry(geometry, child.overflow_y == OverflowValue::Visible);

        let frame = child.dims.margin.horizontal() + child.dims.horizontal_frame();
        let preferred = if child.definite_width {
            border_box.width + child.dims.margin.horizontal()
        } else {
            child.preferred_width() + frame
        };
        self.preferred_width = self.preferred_width.max(preferred);

        if !child.independent {
            let content = geometry.content_box();
            self.floats.adopt(
                &child.floats.floats()[child.inherited_floats..],
                content.x,
                content.y,
            );
        }
    }

    /// [§ 10.6.3](https://www.w3.org/TR/CSS2/visudet.html#normal-block)
    /// and [§ 10.6.7](https://www.w3.org/TR/CSS2/visudet.html#root-height)
    ///
    /// Auto height is the bottom of the last in-flow child; a block that
    /// establishes a formatting context also grows to contain its floats.
    fn resolve_height(&self) -> f32 {
        match self.dims.content_height {
            AutoOr::Length(height) => height,
            AutoOr::Auto => clamp_height(self.content_extent(), self.min_height, self.max_height),
        }
    }

    fn content_extent(&self) -> f32 {
        let flow = self.cursor_y();
        if self.independent {
            flow.max(self.floats.max_float_bottom())
        } else {
            flow
        }
    }

    fn height_limit(&self) -> f32 {
        self.dims.content_height.to_px_or(self.max_height)
    }

    fn would_overflow(&self, bottom: f32) -> bool {
        self.overflow_y == OverflowValue::Auto
            && !self.scrollbar
            && bottom > self.height_limit() + OVERFLOW_EPSILON
    }

    /// Turn on the scrollbar if the content already overflows.
    fn check_overflow(&mut self) -> bool {
        if self.would_overflow(self.content_extent()) {
            self.enable_scrollbar();
            return true;
        }
        false
    }

    fn enable_scrollbar(&mut self) {
        log::debug!(
            target: "boxflow::layout",
            "vertical scrollbar on {:?}, content width {} -> {}",
            self.element,
            self.content_width(),
            (self.content_width() - self.scrollbar_width).max(0.0)
        );
        self.scrollbar = true;
    }
}

/// [§ 8.3.1 Collapsing margins](https://www.w3.org/TR/CSS2/box.html#collapsing-margins)
///
/// "When two or more margins collapse, the resulting margin width is the
/// maximum of the collapsing margins' widths. In the case of negative
/// margins, the maximum of the absolute values of the negative adjoining
/// margins is deducted from the maximum of the positive adjoining margins."
fn collapse_margins(a: f32, b: f32) -> f32 {
    a.max(0.0).max(b.max(0.0)) + a.min(0.0).min(b.min(0.0))
}

#[cfg(test)]
mod tests {
    use boxflow_dom::DomTree;

    use super::*;
    use crate::layout::box_builder::block_box;
    use crate::layout::inline::ApproximateFontMetrics;
    use crate::style::DisplayValue;

    fn root() -> BlockContainer {
        BlockContainer::root(Size::new(800.0, 600.0), 19.2, 16.0)
    }

    fn document(styles: &[&str]) -> (StyledDocument, Vec<NodeId>) {
        let mut doc = StyledDocument::new(DomTree::new());
        let body = doc.append_element(
            NodeId::ROOT,
            "body",
            ComputedStyle::with_display(DisplayValue::Block),
        );
        let nodes = styles
            .iter()
            .map(|s| doc.append_element(body, "div", ComputedStyle::parse(s).unwrap()))
            .collect();
        (doc, nodes)
    }

    fn admit(
        parent: &mut BlockContainer,
        doc: &mut StyledDocument,
        node: NodeId,
    ) -> Option<BlockContainer> {
        let style = doc.style(node).clone();
        let block_box = block_box(parent.containing_block(), &style);
        parent.add_block_element(doc, node, &style, &block_box, 19.2)
    }

    fn close_into(child: &mut BlockContainer, parent: &mut BlockContainer, doc: &mut StyledDocument) {
        assert_eq!(child.close(doc, Some(parent)), CloseResult::Ok);
        let _ = child.finalize(doc, Some(parent));
    }

    #[test]
    fn test_collapse_margins() {
        assert!((collapse_margins(20.0, 30.0) - 30.0).abs() < f32::EPSILON);
        assert!((collapse_margins(20.0, -5.0) - 15.0).abs() < f32::EPSILON);
        assert!((collapse_margins(-4.0, -10.0) + 10.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_sibling_margins_collapse() {
        let (mut doc, nodes) = document(&[
            "display: block; height: 50px; margin-bottom: 20px",
            "display: block; height: 10px; margin-top: 30px",
        ]);
        let mut root = root();

        let mut first = admit(&mut root, &mut doc, nodes[0]).unwrap();
        close_into(&mut first, &mut root, &mut doc);
        let second = admit(&mut root, &mut doc, nodes[1]).unwrap();
        assert!((second.offset().y - 80.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_overflowing_content_retries_with_scrollbar() {
        let (mut doc, nodes) = document(&["display: block; height: 100px; overflow-y: auto"]);
        let mut root = root();
        let mut block = admit(&mut root, &mut doc, nodes[0]).unwrap();
        assert!((block.available_width() - 800.0).abs() < f32::EPSILON);

        block.reserve_content(Size::new(800.0, 150.0));
        assert_eq!(block.close(&mut doc, Some(&mut root)), CloseResult::RetrySelf);
        assert!(block.has_scrollbar());
        assert!((block.available_width() - 784.0).abs() < f32::EPSILON);

        block.reset_for_reflow();
        block.reserve_content(Size::new(784.0, 150.0));
        assert_eq!(block.close(&mut doc, Some(&mut root)), CloseResult::Ok);
        let geometry = block.finalize(&mut doc, Some(&mut root));
        assert!((geometry.content.height - 100.0).abs() < f32::EPSILON);
        assert!((geometry.scrollbar_width - 16.0).abs() < f32::EPSILON);
        assert!((geometry.visible_overflow.height - 150.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_child_overflowing_parent_escalates() {
        let (mut doc, nodes) = document(&[
            "display: block; height: 100px; overflow-y: auto",
            "display: block; height: 150px",
        ]);
        let mut root = root();
        let mut parent = admit(&mut root, &mut doc, nodes[0]).unwrap();
        let mut child = admit(&mut parent, &mut doc, nodes[1]).unwrap();

        assert_eq!(child.close(&mut doc, Some(&mut parent)), CloseResult::EscalateParent);
        assert!(parent.has_scrollbar());
        assert!(!child.has_scrollbar());
    }

    #[test]
    fn test_max_height_is_a_scroll_limit() {
        let (mut doc, nodes) = document(&["display: block; max-height: 50px; overflow-y: auto"]);
        let mut root = root();
        let mut block = admit(&mut root, &mut doc, nodes[0]).unwrap();
        block.reserve_content(Size::new(800.0, 40.0));
        assert_eq!(block.close(&mut doc, Some(&mut root)), CloseResult::Ok);

        block.reset_for_reflow();
        block.reserve_content(Size::new(800.0, 70.0));
        assert_eq!(block.close(&mut doc, Some(&mut root)), CloseResult::RetrySelf);
        assert_eq!(block.used_height(), None);
    }

    #[test]
    fn test_admission_refused_when_inline_content_overflows() {
        let (mut doc, nodes) = document(&[
            "display: block; height: 20px; overflow-y: auto",
            "display: block",
        ]);
        let text = doc.append_text(nodes[0], "word ".repeat(40).as_str());
        let mut root = root();
        let mut block = admit(&mut root, &mut doc, nodes[0]).unwrap();

        let metrics = ApproximateFontMetrics::default();
        let style = TextStyle {
            font_size: 16.0,
            line_height: 19.2,
        };
        block.add_text(&mut doc, text, &"word ".repeat(40), style, &metrics);
        assert!(admit(&mut block, &mut doc, nodes[1]).is_none());
        assert!(block.has_scrollbar());
    }

    #[test]
    fn test_reset_keeps_scrollbar_and_constraints() {
        let (mut doc, nodes) = document(&[
            "display: block; min-height: 30px; max-height: 60px; overflow-y: scroll",
        ]);
        let mut root = root();
        let mut block = admit(&mut root, &mut doc, nodes[0]).unwrap();
        assert!(block.has_scrollbar());
        block.reserve_content(Size::new(10.0, 10.0));
        block.reset_for_reflow();

        assert!(block.has_scrollbar());
        assert_eq!(block.height_constraints(), (30.0, 60.0));
        assert!(block.cursor_y().abs() < f32::EPSILON);
        assert_eq!(block.close(&mut doc, Some(&mut root)), CloseResult::Ok);
        assert_eq!(block.used_height(), Some(30.0));
    }

    #[test]
    fn test_clear_moves_block_below_float() {
        let (mut doc, nodes) = document(&["float: left", "display: block; clear: left"]);
        doc.set_geometry(
            nodes[0],
            Geometry {
                content: Size::new(100.0, 40.0),
                ..Geometry::default()
            },
        );
        let mut root = root();
        assert!(root.add_float_element(&mut doc, nodes[0], FloatSide::Left));
        assert_eq!(root.floats().len(), 1);

        let cleared = admit(&mut root, &mut doc, nodes[1]).unwrap();
        assert!((cleared.offset().y - 40.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_absolute_records_static_position() {
        let (mut doc, nodes) = document(&["display: block; height: 25px", "position: absolute"]);
        let mut root = root();
        let mut first = admit(&mut root, &mut doc, nodes[0]).unwrap();
        close_into(&mut first, &mut root, &mut doc);

        root.add_absolute_element(nodes[1]);
        let queued = root.take_absolutes();
        assert_eq!(queued.len(), 1);
        assert!((queued[0].static_position.y - 25.0).abs() < f32::EPSILON);
        assert!(root.absolutes().is_empty());
    }
}
