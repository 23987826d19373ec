//! Inline formatting context and line boxes.
//!
//! [§ 9.4.2 Inline formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#inline-formatting)
//!
//! "In an inline formatting context, boxes are laid out horizontally, one
//! after the other, beginning at the top of a containing block. Horizontal
//! margins, borders, and padding are respected between these boxes."
//!
//! An [`InlineContainer`] is owned by a block context while inline content
//! is being added. Fragment positions are line-relative until their line is
//! finished; everything leaving this module is in the owning block's
//! content coordinates.

use std::mem;

use boxflow_dom::NodeId;
use serde::Serialize;

use super::box_model::{BoxDimensions, Geometry, Point, Rect, Size};
use super::float::{FloatSide, FloatSpace};

/// Slack allowed when comparing advances against the line width.
const FIT_EPSILON: f32 = 0.01;

/// The black-box text collaborator: measurement and soft wrap opportunities.
///
/// [§ 10.8 Line height calculations](https://www.w3.org/TR/CSS2/visudet.html#line-height)
///
/// "CSS assumes that every font has font metrics that specify a
/// characteristic height above the baseline and a depth below it."
pub trait InlineContentProducer {
    /// Advance width of `text` at `font_size`.
    fn text_width(&self, text: &str, font_size: f32) -> f32;

    /// Used value of `line-height: normal` for `font_size`.
    fn line_height(&self, font_size: f32) -> f32;

    /// [§ 5.5 Line Breaking](https://www.w3.org/TR/css-text-3/#line-breaking)
    ///
    /// Byte index of the last soft wrap opportunity such that the text
    /// before it fits in `max_width`. White space before the opportunity
    /// hangs and is not measured.
    ///
    /// "A soft wrap opportunity exists at the boundary of whitespace."
    fn break_opportunity(&self, text: &str, max_width: f32, font_size: f32) -> Option<usize> {
        let fits = |end: usize| {
            self.text_width(text[..end].trim_end(), font_size) <= max_width + FIT_EPSILON
        };
        let mut last_fitting = None;
        let mut prev_was_space = false;
        for (idx, ch) in text.char_indices() {
            let is_space = ch == ' ' || ch == '\t';
            if !is_space && prev_was_space {
                if fits(idx) {
                    last_fitting = Some(idx);
                } else {
                    break;
                }
            }
            prev_was_space = is_space;
        }
        if prev_was_space && fits(text.len()) {
            last_fitting = Some(text.len());
        }
        last_fitting
    }
}

/// Fixed-ratio metrics for when no font data is available.
///
/// The average advance of Latin glyphs in a proportional face is roughly
/// 0.6 em; `line-height: normal` defaults to 1.2 em, the top of the range
/// CSS 2.1 recommends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApproximateFontMetrics {
    line_height_ratio: f32,
}

impl ApproximateFontMetrics {
    /// Average glyph advance as a fraction of the font size.
    pub const CHAR_WIDTH_RATIO: f32 = 0.6;

    /// Metrics with the given `line-height: normal` ratio.
    #[must_use]
    pub const fn new(line_height_ratio: f32) -> Self {
        Self { line_height_ratio }
    }
}

impl Default for ApproximateFontMetrics {
    fn default() -> Self {
        Self::new(1.2)
    }
}

impl InlineContentProducer for ApproximateFontMetrics {
    #[allow(clippy::cast_precision_loss)]
    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars().count() as f32 * font_size * Self::CHAR_WIDTH_RATIO
    }

    fn line_height(&self, font_size: f32) -> f32 {
        font_size * self.line_height_ratio
    }
}

/// Font values an inline item needs, resolved from its element's style.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Font size in pixels.
    pub font_size: f32,
    /// Used line height in pixels.
    pub line_height: f32,
}

/// [§ 9.4.2](https://www.w3.org/TR/CSS2/visuren.html#inline-formatting)
///
/// "The rectangular area that contains the boxes that form a line is called
/// a line box."
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LineBox {
    /// Top edge in block content coordinates.
    pub top: f32,
    /// "The height of the line box is the distance between the uppermost
    /// box top and the lowermost box bottom."
    pub height: f32,
    /// Left edge after floats.
    pub left: f32,
    /// Width actually used by content.
    pub width: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FragmentKind {
    Text,
    /// Horizontal margin + border + padding of an inline box.
    Edge,
    Atomic,
}

#[derive(Debug, Clone, Copy)]
struct Fragment {
    kind: FragmentKind,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

impl Fragment {
    fn rect(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum ItemKind {
    Span,
    Text,
    Atomic(Geometry),
}

/// A node that produced fragments: its fragments are `first..end`.
#[derive(Debug, Clone)]
struct InlineItem {
    node: NodeId,
    kind: ItemKind,
    dims: BoxDimensions,
    line_height: f32,
    first: usize,
    end: Option<usize>,
    /// Border box of the part of a split inline box laid out in an earlier
    /// inline context of the same block.
    earlier: Option<Rect>,
}

/// An inline box still open when its inline context closed.
#[derive(Debug, Clone, Copy)]
pub struct OpenInlineBox {
    /// The inline element.
    pub node: NodeId,
    dims: BoxDimensions,
    line_height: f32,
    border_box: Option<Rect>,
}

#[derive(Debug, Clone, Copy)]
struct QueuedFloat {
    node: NodeId,
    side: FloatSide,
    size: Size,
}

/// Geometry produced for one node of the inline context.
#[derive(Debug, Clone, Copy)]
pub struct InlinePlacement {
    /// The element or text node.
    pub node: NodeId,
    /// Its geometry; `containing_block` is left for the owner to fill.
    pub geometry: Geometry,
    /// Whether the post-layout hook is still owed for this node.
    pub notify: bool,
}

/// Everything an inline context reports back when it closes.
#[derive(Debug, Clone, Default)]
pub struct ClosedInline {
    /// Top of the first line.
    pub top: f32,
    /// Bottom of the last line.
    pub bottom: f32,
    /// Finished line boxes.
    pub lines: Vec<LineBox>,
    /// Geometry for inline boxes, text runs and atomic inlines.
    pub placements: Vec<InlinePlacement>,
    /// Floats that were queued behind a line and placed on close.
    pub floats: Vec<(NodeId, Rect)>,
    /// Inline boxes that continue after a block-level interruption.
    pub open_boxes: Vec<OpenInlineBox>,
    /// Widest unwrapped line, for shrink-to-fit.
    pub preferred_width: f32,
    /// Rightmost content edge.
    pub right_extent: f32,
}

/// Line-wrapping state for the inline content of one block.
///
/// [§ 9.4.2](https://www.w3.org/TR/CSS2/visuren.html#inline-formatting)
///
/// "When an inline box exceeds the width of a line box, it is split into
/// several boxes and these boxes are distributed across several line boxes."
#[derive(Debug, Clone)]
pub struct InlineContainer {
    top: f32,
    strut: f32,
    fragments: Vec<Fragment>,
    lines: Vec<LineBox>,
    line_start: usize,
    line_top: f32,
    line_left: f32,
    line_width: f32,
    cursor_x: f32,
    items: Vec<InlineItem>,
    open: Vec<usize>,
    queued_floats: Vec<QueuedFloat>,
    placed_floats: Vec<(NodeId, Rect)>,
    preferred_width: f32,
    preferred_line: f32,
}

impl InlineContainer {
    /// Start an inline context at `top`. `strut` is the block's own line
    /// height, used for empty forced lines and for float band queries.
    #[must_use]
    pub fn new(top: f32, strut: f32, floats: &FloatSpace) -> Self {
        let mut container = Self {
            top,
            strut,
            fragments: Vec::new(),
            lines: Vec::new(),
            line_start: 0,
            line_top: top,
            line_left: 0.0,
            line_width: floats.containing_width(),
            cursor_x: 0.0,
            items: Vec::new(),
            open: Vec::new(),
            queued_floats: Vec::new(),
            placed_floats: Vec::new(),
            preferred_width: 0.0,
            preferred_line: 0.0,
        };
        container.start_line(floats);
        container
    }

    /// Continue inline boxes interrupted by a block-level box, without
    /// repeating their leading edges.
    pub fn resume(&mut self, boxes: Vec<OpenInlineBox>) {
        for open in boxes {
            let index = self.items.len();
            self.items.push(InlineItem {
                node: open.node,
                kind: ItemKind::Span,
                dims: open.dims,
                line_height: open.line_height,
                first: self.fragments.len(),
                end: None,
                earlier: open.border_box,
            });
            self.open.push(index);
        }
    }

    /// `true` until something is added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.queued_floats.is_empty()
    }

    /// Position where the next content would go, in block coordinates.
    #[must_use]
    pub fn cursor(&self) -> Point {
        Point::new(self.line_left + self.cursor_x, self.line_top)
    }

    /// Bottom of the last finished line.
    #[must_use]
    pub const fn line_top(&self) -> f32 {
        self.line_top
    }

    /// [§ 10.3.1 Inline, non-replaced elements](https://www.w3.org/TR/CSS2/visudet.html#inline-width)
    ///
    /// "The 'width' property does not apply." The box only contributes its
    /// horizontal margins, borders and padding to the line.
    pub fn open_inline_box(&mut self, node: NodeId, dims: BoxDimensions, line_height: f32) {
        let index = self.items.len();
        self.items.push(InlineItem {
            node,
            kind: ItemKind::Span,
            dims,
            line_height,
            first: self.fragments.len(),
            end: None,
            earlier: None,
        });
        self.open.push(index);
        self.push_edge(dims.leading_edge());
    }

    /// Close the inline box for `node`. Returns `false` if it is not open
    /// in this context.
    pub fn close_inline_box(&mut self, node: NodeId) -> bool {
        let Some(depth) = self.open.iter().rposition(|&i| self.items[i].node == node) else {
            return false;
        };
        // Boxes opened inside `node` and never closed end with it.
        for index in self.open.split_off(depth) {
            let trailing = self.items[index].dims.trailing_edge();
            self.push_edge(trailing);
            self.items[index].end = Some(self.fragments.len());
        }
        true
    }

    /// Add a run of text, wrapping at soft wrap opportunities.
    ///
    /// [§ 4.1.1 Phase I: Collapsing](https://www.w3.org/TR/css-text-3/#white-space-phase-1)
    ///
    /// "Any collapsible space immediately following another collapsible
    /// space ... is collapsed." Spaces at the start of a line are removed.
    pub fn add_text(
        &mut self,
        node: NodeId,
        text: &str,
        style: TextStyle,
        producer: &dyn InlineContentProducer,
        floats: &mut FloatSpace,
    ) {
        let index = self.items.len();
        self.items.push(InlineItem {
            node,
            kind: ItemKind::Text,
            dims: BoxDimensions::default(),
            line_height: style.line_height,
            first: self.fragments.len(),
            end: None,
            earlier: None,
        });

        let collapsed = collapse_white_space(text);
        let natural = if self.preferred_line > 0.0 {
            collapsed.as_str()
        } else {
            collapsed.trim_start()
        };
        self.preferred_line += producer.text_width(natural, style.font_size);

        let mut rest = collapsed.as_str();
        loop {
            if self.cursor_x <= 0.0 {
                rest = rest.trim_start();
            }
            if rest.is_empty() {
                break;
            }

            // STEP 1: The whole run fits on the current line.
            let width = producer.text_width(rest, style.font_size);
            if self.cursor_x + width <= self.line_width + FIT_EPSILON {
                self.place_text(width, style);
                break;
            }

            // STEP 2: Break at the last opportunity that fits.
            let remaining = (self.line_width - self.cursor_x).max(0.0);
            if let Some(idx) = producer
                .break_opportunity(rest, remaining, style.font_size)
                .filter(|&idx| idx > 0)
            {
                let (head, tail) = rest.split_at(idx);
                let head = head.trim_end();
                if !head.is_empty() {
                    self.place_text(producer.text_width(head, style.font_size), style);
                }
                self.finish_line(floats, false);
                rest = tail;
                continue;
            }

            // STEP 3: Nothing fits after existing content; try a fresh line.
            if self.cursor_x > 0.0 {
                self.finish_line(floats, false);
                continue;
            }

            // STEP 4: An empty line shortened by floats moves below them.
            // [§ 9.5](https://www.w3.org/TR/CSS2/visuren.html#floats)
            //
            // "If a shortened line box is too small to contain any content,
            // then the line box is shifted downward ... until some content
            // fits or there are no more floats present."
            if self.line_width < floats.containing_width()
                && let Some(next) = floats.next_float_bottom_after(self.line_top)
            {
                self.line_top = next;
                self.start_line(floats);
                continue;
            }

            // STEP 5: The first word overflows an empty line on its own.
            let (head, tail) = rest.split_at(first_word_end(rest));
            self.place_text(
                producer.text_width(head.trim_end(), style.font_size),
                style,
            );
            rest = tail;
            if !rest.trim_start().is_empty() {
                self.finish_line(floats, false);
            }
        }

        self.items[index].end = Some(self.fragments.len());
    }

    /// [§ 9.2.2 Inline-level elements](https://www.w3.org/TR/CSS2/visuren.html#inline-boxes)
    ///
    /// Add an atomic inline (an inline-block laid out on its own). It wraps
    /// as a unit; `geometry` must already carry its final size.
    pub fn add_atomic(&mut self, node: NodeId, geometry: Geometry, floats: &mut FloatSpace) {
        let margin_box = geometry.margin_box();
        if self.cursor_x > 0.0 && self.cursor_x + margin_box.width > self.line_width + FIT_EPSILON {
            self.finish_line(floats, false);
        }
        while self.cursor_x <= 0.0
            && margin_box.width > self.line_width
            && self.line_width < floats.containing_width()
        {
            let Some(next) = floats.next_float_bottom_after(self.line_top) else {
                break;
            };
            self.line_top = next;
            self.start_line(floats);
        }

        let first = self.fragments.len();
        self.fragments.push(Fragment {
            kind: FragmentKind::Atomic,
            x: self.cursor_x,
            y: 0.0,
            width: margin_box.width,
            height: margin_box.height,
        });
        self.cursor_x += margin_box.width;
        self.preferred_line += margin_box.width;
        self.items.push(InlineItem {
            node,
            kind: ItemKind::Atomic(geometry),
            dims: BoxDimensions::default(),
            line_height: margin_box.height,
            first,
            end: Some(first + 1),
            earlier: None,
        });
    }

    /// [§ 5.1 Line breaking](https://www.w3.org/TR/css-text-3/#line-breaking)
    ///
    /// "A line break is forced at a preserved segment break." Returns where
    /// the break sits, in block coordinates.
    pub fn add_break(&mut self, floats: &mut FloatSpace) -> Point {
        let at = self.cursor();
        self.preferred_width = self.preferred_width.max(self.preferred_line);
        self.preferred_line = 0.0;
        self.finish_line(floats, true);
        at
    }

    /// [§ 9.5.1 Rule 6](https://www.w3.org/TR/CSS2/visuren.html#float-position)
    ///
    /// "The outer top of an element's floating box may not be higher than
    /// the top of any line-box containing a box generated by an element
    /// earlier in the source document."
    ///
    /// A float that fits beside the current line is placed at its top and
    /// the line is shortened. Otherwise it waits for the line to end and
    /// `None` is returned.
    pub fn add_float(
        &mut self,
        node: NodeId,
        side: FloatSide,
        size: Size,
        floats: &mut FloatSpace,
    ) -> Option<Rect> {
        self.preferred_line += size.width;
        if self.cursor_x <= 0.0 || self.cursor_x + size.width <= self.line_width + FIT_EPSILON {
            let rect = floats.place_float(node, side, size.width, size.height, self.line_top);
            self.start_line(floats);
            return Some(rect);
        }
        self.queued_floats.push(QueuedFloat { node, side, size });
        None
    }

    /// Floats placed since the last call (queued floats land when a line ends).
    pub fn take_placed_floats(&mut self) -> Vec<(NodeId, Rect)> {
        mem::take(&mut self.placed_floats)
    }

    /// Finish the last line and compute geometry for every item.
    #[must_use]
    pub fn close(mut self, floats: &mut FloatSpace) -> ClosedInline {
        if self.fragments.len() > self.line_start {
            self.finish_line(floats, false);
        }
        self.place_queued_floats(floats);
        self.preferred_width = self.preferred_width.max(self.preferred_line);

        let mut placements = Vec::with_capacity(self.items.len());
        let mut open_boxes = Vec::new();
        for item in &self.items {
            let end = item.end.unwrap_or(self.fragments.len());
            let fragments = &self.fragments[item.first..end];
            match item.kind {
                ItemKind::Atomic(mut geometry) => {
                    let Some(fragment) = fragments.first() else {
                        continue;
                    };
                    geometry.offset = Point::new(
                        fragment.x + geometry.margin.left,
                        fragment.y + geometry.margin.top,
                    );
                    placements.push(InlinePlacement {
                        node: item.node,
                        geometry,
                        notify: true,
                    });
                }
                ItemKind::Text => {
                    if let Some(border_box) = bounding_box(fragments, None) {
                        placements.push(InlinePlacement {
                            node: item.node,
                            geometry: geometry_from_border_box(&item.dims, border_box),
                            notify: false,
                        });
                    }
                }
                ItemKind::Span => {
                    let border_box = self.span_border_box(item, fragments);
                    if item.end.is_none() {
                        open_boxes.push(OpenInlineBox {
                            node: item.node,
                            dims: item.dims,
                            line_height: item.line_height,
                            border_box,
                        });
                    }
                    if let Some(border_box) = border_box {
                        placements.push(InlinePlacement {
                            node: item.node,
                            geometry: geometry_from_border_box(&item.dims, border_box),
                            notify: item.end.is_some(),
                        });
                    }
                }
            }
        }

        let right_extent = self
            .lines
            .iter()
            .map(|line| line.left + line.width)
            .fold(0.0_f32, f32::max);
        ClosedInline {
            top: self.top,
            bottom: self.line_top,
            lines: self.lines,
            placements,
            floats: self.placed_floats,
            open_boxes,
            preferred_width: self.preferred_width,
            right_extent,
        }
    }

    fn span_border_box(&self, item: &InlineItem, fragments: &[Fragment]) -> Option<Rect> {
        let dims = &item.dims;
        let outer = bounding_box(fragments, Some(item.line_height)).map(|outer| Rect {
            x: outer.x + dims.margin.left,
            y: outer.y - dims.padding.top - dims.border.top,
            width: (outer.width - dims.margin.horizontal()).max(0.0),
            height: outer.height + dims.padding.vertical() + dims.border.vertical(),
        });
        match (item.earlier, outer) {
            (Some(a), Some(b)) => Some(union(a, b)),
            (a, b) => a.or(b),
        }
    }

    fn push_edge(&mut self, width: f32) {
        self.fragments.push(Fragment {
            kind: FragmentKind::Edge,
            x: self.cursor_x,
            y: 0.0,
            width,
            height: 0.0,
        });
        self.cursor_x += width;
        self.preferred_line += width;
    }

    fn place_text(&mut self, width: f32, style: TextStyle) {
        self.fragments.push(Fragment {
            kind: FragmentKind::Text,
            x: self.cursor_x,
            y: 0.0,
            width,
            height: style.line_height,
        });
        self.cursor_x += width;
    }

    fn start_line(&mut self, floats: &FloatSpace) {
        let (left, width) = floats.available_width_at(self.line_top, self.strut);
        self.line_left = left;
        self.line_width = width;
    }

    /// [§ 10.8 Line height calculations](https://www.w3.org/TR/CSS2/visudet.html#line-height)
    ///
    /// Finalize the current line box and start a new one.
    fn finish_line(&mut self, floats: &mut FloatSpace, forced: bool) {
        if self.fragments.len() == self.line_start && !forced {
            return;
        }

        // STEP 1: Line box height from the fragments it holds.
        let mut height = self.fragments[self.line_start..]
            .iter()
            .filter(|f| f.kind != FragmentKind::Edge)
            .map(|f| f.height)
            .fold(0.0_f32, f32::max);
        if height <= 0.0 && forced {
            height = self.strut;
        }

        // STEP 2: Fragments move from line-relative to block coordinates.
        for fragment in &mut self.fragments[self.line_start..] {
            fragment.x += self.line_left;
            fragment.y = self.line_top;
        }
        self.lines.push(LineBox {
            top: self.line_top,
            height,
            left: self.line_left,
            width: self.cursor_x,
        });

        // STEP 3: Advance and let waiting floats in below the line.
        self.line_top += height;
        self.line_start = self.fragments.len();
        self.cursor_x = 0.0;
        self.place_queued_floats(floats);
        self.start_line(floats);
    }

    fn place_queued_floats(&mut self, floats: &mut FloatSpace) {
        for queued in mem::take(&mut self.queued_floats) {
            let rect = floats.place_float(
                queued.node,
                queued.side,
                queued.size.width,
                queued.size.height,
                self.line_top,
            );
            self.placed_floats.push((queued.node, rect));
        }
    }
}

/// Collapse every run of white space to a single space.
fn collapse_white_space(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
            }
            prev_space = true;
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out
}

/// Byte index just past the first word and the spaces after it.
fn first_word_end(text: &str) -> usize {
    let mut prev_space = false;
    for (idx, ch) in text.char_indices() {
        let is_space = ch == ' ';
        if !is_space && prev_space {
            return idx;
        }
        prev_space = is_space;
    }
    text.len()
}

/// Horizontal extent of all fragments, vertical extent of the non-edge
/// ones (or one `fallback_height` tall line when there are none).
fn bounding_box(fragments: &[Fragment], fallback_height: Option<f32>) -> Option<Rect> {
    let first = fragments.first()?;
    let left = fragments.iter().map(|f| f.x).fold(f32::INFINITY, f32::min);
    let right = fragments
        .iter()
        .map(|f| f.x + f.width)
        .fold(f32::NEG_INFINITY, f32::max);
    let mut vertical = fragments
        .iter()
        .filter(|f| f.kind != FragmentKind::Edge)
        .map(Fragment::rect);
    let (top, bottom) = match vertical.next() {
        Some(r) => vertical.fold((r.y, r.bottom()), |(t, b), r| (t.min(r.y), b.max(r.bottom()))),
        None => (first.y, first.y + fallback_height?),
    };
    Some(Rect {
        x: left,
        y: top,
        width: right - left,
        height: bottom - top,
    })
}

fn union(a: Rect, b: Rect) -> Rect {
    let x = a.x.min(b.x);
    let y = a.y.min(b.y);
    Rect {
        x,
        y,
        width: a.right().max(b.right()) - x,
        height: a.bottom().max(b.bottom()) - y,
    }
}

fn geometry_from_border_box(dims: &BoxDimensions, border_box: Rect) -> Geometry {
    let content = Size::new(
        (border_box.width - dims.horizontal_frame()).max(0.0),
        (border_box.height - dims.vertical_frame()).max(0.0),
    );
    Geometry::from_box(dims, content, Point::new(border_box.x, border_box.y))
}
