//! Layout engine: the recursive dispatcher.
//!
//! [§ 9 Visual formatting model](https://www.w3.org/TR/CSS2/visuren.html)
//!
//! "In the visual formatting model, each element in the document tree
//! generates zero or more boxes according to the box model. The layout of
//! these boxes is governed by: box dimensions and type, positioning scheme
//! (normal flow, float, and absolute positioning), relationships between
//! elements in the document tree, and external information."
//!
//! [`LayoutEngine::format_element`] classifies each node by its computed
//! `display`, `position` and `float` and routes it to a formatting context.
//! Placement conflicts are not errors: a `false` return asks the caller to
//! restart its child loop from the first child, and a block's close result
//! decides whether its own children are formatted again. Post-layout
//! notifications queued by a pass that is thrown away are discarded with
//! it; the rest are delivered when the top-level call returns.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use boxflow_common::{Diagnostic, DiagnosticKind, DiagnosticSink, LogSink};
use boxflow_dom::NodeId;

use super::block::{BlockContainer, CloseResult};
use super::box_builder::{BlockBox, block_box, build_box, standalone_box};
use super::box_model::{Geometry, Point, Size};
use super::float::FloatSide;
use super::inline::{ApproximateFontMetrics, InlineContentProducer, TextStyle};
use super::pool::{BlockId, LayoutArena};
use super::special::{LineBreakFormatter, SpecialFormatter, TextRunFormatter};
use super::table::{GridTableFormatter, TableFormatter};
use super::values::AutoOr;
use crate::config::LayoutConfig;
use crate::document::StyledDocument;
use crate::error::LayoutError;
use crate::style::{AutoLength, ComputedStyle, DisplayValue, PositionType};

/// Passes the top-level entry point makes over the root's children before
/// it force-closes.
///
/// A scrollbar is the only feedback that narrows the available width, and
/// it turns on at most once per block.
pub const MAX_ROOT_ATTEMPTS: usize = 2;

/// Lays out styled documents.
///
/// Owns the context pool, the special-case formatters, the table formatter,
/// the inline content producer and the diagnostic sink. One engine lays out
/// one document at a time.
pub struct LayoutEngine {
    config: LayoutConfig,
    arena: LayoutArena,
    producer: Box<dyn InlineContentProducer>,
    specials: Vec<Rc<dyn SpecialFormatter>>,
    table_formatter: Rc<dyn TableFormatter>,
    sink: Box<dyn DiagnosticSink>,
    viewport: Size,
    measuring: usize,
    reported: HashSet<(DiagnosticKind, NodeId)>,
    preferred_widths: HashMap<(NodeId, u32, u32), f32>,
    root_depth: usize,
}

impl fmt::Debug for LayoutEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutEngine")
            .field("config", &self.config)
            .field("live_blocks", &self.arena.live_blocks())
            .field(
                "specials",
                &self.specials.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

impl LayoutEngine {
    /// An engine with the default collaborators: `<br>` and text run
    /// special cases, the grid table formatter, approximate font metrics
    /// and a sink that logs.
    #[must_use]
    pub fn new(config: LayoutConfig) -> Self {
        let producer = ApproximateFontMetrics::new(config.line_height_ratio);
        Self {
            config,
            arena: LayoutArena::new(),
            producer: Box::new(producer),
            specials: vec![Rc::new(LineBreakFormatter), Rc::new(TextRunFormatter)],
            table_formatter: Rc::new(GridTableFormatter),
            sink: Box::new(LogSink),
            viewport: Size::default(),
            measuring: 0,
            reported: HashSet::new(),
            preferred_widths: HashMap::new(),
            root_depth: 0,
        }
    }

    /// Replace the diagnostic sink.
    #[must_use]
    pub fn with_diagnostic_sink(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.set_diagnostic_sink(sink);
        self
    }

    /// Replace the diagnostic sink.
    pub fn set_diagnostic_sink(&mut self, sink: impl DiagnosticSink + 'static) {
        self.sink = Box::new(sink);
    }

    /// Replace the inline content producer.
    pub fn set_producer(&mut self, producer: impl InlineContentProducer + 'static) {
        self.producer = Box::new(producer);
    }

    /// Replace the table algorithm.
    pub fn set_table_formatter(&mut self, formatter: impl TableFormatter + 'static) {
        self.table_formatter = Rc::new(formatter);
    }

    /// Add a special-case formatter, consulted after the ones already
    /// registered.
    pub fn register_special(&mut self, formatter: impl SpecialFormatter + 'static) {
        self.specials.push(Rc::new(formatter));
    }

    /// The engine configuration.
    #[must_use]
    pub const fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// The context pool.
    #[must_use]
    pub const fn arena(&self) -> &LayoutArena {
        &self.arena
    }

    /// A checked-out block context.
    ///
    /// # Panics
    /// If `block` has been released.
    #[must_use]
    pub fn block(&self, block: BlockId) -> &BlockContainer {
        self.arena.get(block)
    }

    /// A checked-out block context, mutably.
    ///
    /// # Panics
    /// If `block` has been released.
    pub fn block_mut(&mut self, block: BlockId) -> &mut BlockContainer {
        self.arena.get_mut(block)
    }

    /// Lay out `element` and its subtree inside `containing_block`.
    ///
    /// Geometry is written into `doc` and the post-layout hook is called
    /// for every element that gets a box. Returns the element's visible
    /// overflow size.
    ///
    /// # Errors
    /// The node is not an element of `doc`, or the containing block is not
    /// finite and non-negative.
    pub fn layout(
        &mut self,
        doc: &mut StyledDocument,
        element: NodeId,
        containing_block: Size,
    ) -> Result<Size, LayoutError> {
        if doc.tree().get(element).is_none() {
            return Err(LayoutError::UnknownNode(element));
        }
        if doc.tree().as_element(element).is_none() {
            return Err(LayoutError::NotAnElement(element));
        }
        let Size { width, height } = containing_block;
        if !width.is_finite() || !height.is_finite() || width < 0.0 || height < 0.0 {
            return Err(LayoutError::InvalidContainingBlock { width, height });
        }
        if doc.style(element).display == DisplayValue::None {
            log::trace!(target: "boxflow::layout", "{element:?} has display: none");
            return Ok(Size::default());
        }

        log::debug!(
            target: "boxflow::layout",
            "layout {} in {width}x{height}",
            doc.address(element)
        );
        self.viewport = containing_block;
        self.reported.clear();
        self.preferred_widths.clear();
        let overflow = self.format_root(doc, element, containing_block, None);
        debug_assert_eq!(self.arena.live_blocks(), 0, "layout context leaked");
        Ok(overflow)
    }

    /// Lay out `element` as the only child of a synthetic root context
    /// `containing_block.width` wide and unbounded in height.
    ///
    /// `override_box` replaces the box the element would otherwise be
    /// built with. The children are formatted at most
    /// [`MAX_ROOT_ATTEMPTS`] times; if the element still does not close
    /// cleanly it is force-closed with the last pass. Queued absolutely
    /// positioned descendants are then laid out. The post-layout hook is
    /// called for every element of the kept passes once the outermost
    /// call returns. Returns the element's visible overflow size.
    pub fn format_root(
        &mut self,
        doc: &mut StyledDocument,
        element: NodeId,
        containing_block: Size,
        override_box: Option<BlockBox>,
    ) -> Size {
        self.root_depth += 1;
        let (geometry, _) = self.format_root_inner(doc, element, containing_block, override_box);
        doc.notify_layout(element);
        self.root_depth -= 1;
        if self.root_depth == 0 {
            doc.flush_layout_notifications();
        }
        geometry.visible_overflow
    }

    /// Lay out a standalone subtree (table cells) with a caller-built box,
    /// without calling the post-layout hook for `element`: its position is
    /// not known yet.
    pub fn format_standalone_box(
        &mut self,
        doc: &mut StyledDocument,
        element: NodeId,
        containing_block: Size,
        block_box: BlockBox,
    ) -> Geometry {
        self.format_root_inner(doc, element, containing_block, Some(block_box))
            .0
    }

    /// Format one node inside `block`.
    ///
    /// Returns `false` when `block` must restart its child loop from the
    /// first child: placing this node changed the block's own state.
    ///
    /// # Panics
    /// If `display: none` reaches the display dispatch.
    pub fn format_element(
        &mut self,
        doc: &mut StyledDocument,
        block: BlockId,
        node: NodeId,
    ) -> bool {
        // STEP 1: Special cases bypass box generation.
        if let Some(handled) = self.format_element_special(doc, block, node) {
            return handled;
        }

        let style = doc.style(node).clone();

        // STEP 2: No box at all.
        // [§ 9.2.4](https://www.w3.org/TR/CSS2/visuren.html#display-prop)
        //
        // "none: This value causes an element to not appear in the
        // formatting structure."
        if style.display == DisplayValue::None {
            return true;
        }

        // STEP 3: Out-of-flow elements.
        // [§ 9.6 Absolute positioning](https://www.w3.org/TR/CSS2/visuren.html#absolute-positioning)
        //
        // "In the absolute positioning model, a box is explicitly offset with
        // respect to its containing block. It is removed from the normal flow
        // entirely (it has no impact on later siblings)."
        if style.position.is_out_of_flow() {
            log::trace!(target: "boxflow::layout", "{node:?}: deferred {}", style.position);
            self.arena.get_mut(block).add_absolute_element(node);
            return true;
        }

        // [§ 9.5 Floats](https://www.w3.org/TR/CSS2/visuren.html#floats)
        //
        // "A float is a box that is shifted to the left or right on the
        // current line."
        if let Some(side) = FloatSide::from_style(style.float) {
            let containing_block = self.arena.get(block).containing_block();
            let _ = self.format_standalone(doc, node, &style, containing_block);
            log::trace!(target: "boxflow::layout", "{node:?}: float {side:?}");
            return self.arena.get_mut(block).add_float_element(doc, node, side);
        }

        // STEP 4: Dispatch by display.
        log::trace!(target: "boxflow::layout", "{node:?}: {}", style.display);
        match style.display {
            DisplayValue::Block => self.format_element_block(doc, block, node, &style),
            DisplayValue::Inline => self.format_element_inline(doc, block, node, &style),
            DisplayValue::InlineBlock => self.format_element_inline_block(doc, block, node, &style),
            DisplayValue::Table => self.format_element_table(doc, block, node, &style),
            DisplayValue::TableRow
            | DisplayValue::TableRowGroup
            | DisplayValue::TableHeaderGroup
            | DisplayValue::TableFooterGroup
            | DisplayValue::TableColumn
            | DisplayValue::TableColumnGroup
            | DisplayValue::TableCell => {
                let display = doc
                    .property_text(node, "display")
                    .unwrap_or_else(|| style.display.to_string());
                let message = format!(
                    "display: {display} is only valid inside a table; {} gets no box",
                    doc.address(node)
                );
                self.report(DiagnosticKind::TableDisplayOutsideTable, node, message);
                true
            }
            DisplayValue::None => unreachable!("display: none is filtered before dispatch"),
        }
    }

    /// [§ 9.4.1 Block formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#block-formatting)
    ///
    /// Admit `node` as a child block of `block`, format its children into
    /// it and close it. A close that asks for a retry gets exactly one more
    /// children pass, without restarts; anything but a clean close after
    /// that returns `false`.
    pub fn format_element_block(
        &mut self,
        doc: &mut StyledDocument,
        block: BlockId,
        node: NodeId,
        style: &ComputedStyle,
    ) -> bool {
        let Some(child) = self.admit_block(doc, block, node, style) else {
            return false;
        };
        let mark = doc.notification_mark();

        self.format_children(doc, child, node);
        let mut result = self.close_block(doc, child);
        if result == CloseResult::RetrySelf {
            doc.discard_notifications(mark);
            self.arena.get_mut(child).reset_for_reflow();
            self.format_children_once(doc, child, node);
            result = self.close_block(doc, child);
        }

        self.finish_block(doc, block, child, node, result, mark)
    }

    /// [§ 9.2.2 Inline-level elements](https://www.w3.org/TR/CSS2/visuren.html#inline-boxes)
    ///
    /// Open an inline box for `node` in `block`'s inline context, format
    /// its children into the same context and close the box.
    ///
    /// Inline content never changes `block`'s width, but a block-level
    /// descendant splits the box and can still escalate. Every child is
    /// formatted and the box is closed either way; `false` if any child
    /// asked `block` to restart.
    pub fn format_element_inline(
        &mut self,
        doc: &mut StyledDocument,
        block: BlockId,
        node: NodeId,
        style: &ComputedStyle,
    ) -> bool {
        let containing_block = self.arena.get(block).containing_block();
        let dims = build_box(containing_block, style, true);
        let line_height = self.text_style(doc, node).line_height;
        self.arena
            .get_mut(block)
            .add_inline_element(node, dims, line_height);

        let mut placed = true;
        let count = doc.tree().child_count(node);
        for index in 0..count {
            if let Some(child) = doc.tree().child(node, index) {
                placed &= self.format_element(doc, block, child);
            }
        }

        self.arena.get_mut(block).close_inline_box(doc, node);
        if !placed {
            log::trace!(target: "boxflow::layout", "{node:?}: split by a block that escalated");
        }
        placed
    }

    /// [§ 10.3.9 'Inline-block', non-replaced elements](https://www.w3.org/TR/CSS2/visudet.html#inlineblock-width)
    ///
    /// Lay `node` out as an independent root, then add the finished box to
    /// the inline context as one unit. Always `true`.
    pub fn format_element_inline_block(
        &mut self,
        doc: &mut StyledDocument,
        block: BlockId,
        node: NodeId,
        style: &ComputedStyle,
    ) -> bool {
        let containing_block = self.arena.get(block).containing_block();
        let geometry = self.format_standalone(doc, node, style, containing_block);
        self.arena
            .get_mut(block)
            .add_atomic_inline(doc, node, geometry);
        true
    }

    /// [§ 17.4 Tables in the visual formatting model](https://www.w3.org/TR/CSS2/tables.html#model)
    ///
    /// Admit the table like a block and hand it to the table formatter. On
    /// a retry request the formatter runs once more from scratch.
    pub fn format_element_table(
        &mut self,
        doc: &mut StyledDocument,
        block: BlockId,
        node: NodeId,
        style: &ComputedStyle,
    ) -> bool {
        let Some(table) = self.admit_block(doc, block, node, style) else {
            return false;
        };
        let mark = doc.notification_mark();

        let formatter = Rc::clone(&self.table_formatter);
        let mut result = formatter.format_table(self, doc, table, node);
        if result == CloseResult::RetrySelf {
            doc.discard_notifications(mark);
            self.arena.get_mut(table).reset_for_reflow();
            result = formatter.format_table(self, doc, table, node);
        }

        self.finish_block(doc, block, table, node, result, mark)
    }

    /// Offer `node` to the registered special-case formatters in order.
    /// `None` if none of them takes it.
    pub fn format_element_special(
        &mut self,
        doc: &mut StyledDocument,
        block: BlockId,
        node: NodeId,
    ) -> Option<bool> {
        let special = self
            .specials
            .iter()
            .find(|s| s.applies_to(doc, node))
            .map(Rc::clone)?;
        log::trace!(target: "boxflow::layout", "{node:?}: special {}", special.name());
        Some(special.format(self, doc, block, node))
    }

    /// Build the box for a block-level child of `block`, with min/max
    /// height resolved against `block`'s content height.
    #[must_use]
    pub fn build_block_box(&self, block: BlockId, style: &ComputedStyle) -> BlockBox {
        block_box(self.arena.get(block).containing_block(), style)
    }

    /// Close `block` against its parent context.
    pub fn close_block(&mut self, doc: &mut StyledDocument, block: BlockId) -> CloseResult {
        match self.arena.get(block).parent() {
            Some(parent) => {
                let (child, parent) = self.arena.pair_mut(block, parent);
                child.close(doc, Some(parent))
            }
            None => self.arena.get_mut(block).close(doc, None),
        }
    }

    /// Add a text run to `block`'s inline context.
    pub fn add_text(&mut self, doc: &mut StyledDocument, block: BlockId, node: NodeId, text: &str) {
        let style = self.text_style(doc, node);
        self.arena
            .get_mut(block)
            .add_text(doc, node, text, style, self.producer.as_ref());
    }

    /// Force a line break in `block` on behalf of `node`.
    pub fn add_break(&mut self, doc: &mut StyledDocument, block: BlockId, node: NodeId) -> Geometry {
        let line_height = self.text_style(doc, node).line_height;
        self.arena.get_mut(block).add_break(doc, node, line_height)
    }

    /// Font size and used line height for inline content of `node`.
    #[must_use]
    pub fn text_style(&self, doc: &StyledDocument, node: NodeId) -> TextStyle {
        let style = doc.font_style(node);
        TextStyle {
            font_size: style.font_size,
            line_height: style
                .line_height
                .unwrap_or_else(|| self.producer.line_height(style.font_size)),
        }
    }

    /// Lay out every queued absolutely positioned descendant of `block`.
    ///
    /// [§ 10.1 Definition of "containing block"](https://www.w3.org/TR/CSS2/visudet.html#containing-block-details)
    ///
    /// "If the element has 'position: absolute', the containing block is
    /// established by the nearest ancestor with a 'position' of 'absolute',
    /// 'relative' or 'fixed' ... formed by the padding edge of the ancestor."
    ///
    /// "If the element has 'position: fixed', the containing block is
    /// established by the viewport."
    pub fn close_absolute_elements(&mut self, doc: &mut StyledDocument, block: BlockId) {
        let queued = self.arena.get_mut(block).take_absolutes();
        if queued.is_empty() {
            return;
        }
        let (padding_box, padding_origin, element) = {
            let context = self.arena.get(block);
            let padding = context.dims().padding;
            (
                context.absolute_containing_block(),
                Point::new(-padding.left, -padding.top),
                context.element(),
            )
        };

        for entry in queued {
            let style = doc.style(entry.node).clone();
            let fixed = style.position == PositionType::Fixed;
            let containing_block = if fixed { self.viewport } else { padding_box };
            let mut geometry = self.format_standalone(doc, entry.node, &style, containing_block);

            // [§ 10.3.7](https://www.w3.org/TR/CSS2/visudet.html#abs-non-replaced-width)
            // and [§ 10.6.4](https://www.w3.org/TR/CSS2/visudet.html#abs-non-replaced-height)
            let margin_box = geometry.margin_box();
            let resolve = |value: AutoLength, basis: f32| {
                value.length().map(|length| length.resolve(basis))
            };
            let offsets = &style.offsets;
            let x = resolve(offsets.left, containing_block.width).or_else(|| {
                resolve(offsets.right, containing_block.width)
                    .map(|right| containing_block.width - right - margin_box.width)
            });
            let y = resolve(offsets.top, containing_block.height).or_else(|| {
                resolve(offsets.bottom, containing_block.height)
                    .map(|bottom| containing_block.height - bottom - margin_box.height)
            });
            let (origin, relative_to) = if fixed && x.is_some() && y.is_some() {
                (Point::default(), None)
            } else {
                (padding_origin, element)
            };
            let left = x.map_or(entry.static_position.x, |x| origin.x + x);
            let top = y.map_or(entry.static_position.y, |y| origin.y + y);
            geometry.offset = Point::new(left + geometry.margin.left, top + geometry.margin.top);
            geometry.containing_block = relative_to;

            doc.set_geometry(entry.node, geometry);
            if relative_to == element {
                self.arena.get_mut(block).include_geometry(&geometry, true);
            }
            doc.notify_layout(entry.node);
        }
    }

    // ── internals ───────────────────────────────────────────────────────

    fn format_root_inner(
        &mut self,
        doc: &mut StyledDocument,
        element: NodeId,
        containing_block: Size,
        override_box: Option<BlockBox>,
    ) -> (Geometry, f32) {
        // STEP 1: Synthetic root and the element admitted into it.
        let strut = self.producer.line_height(self.config.default_font_size);
        let root = self.arena.checkout(BlockContainer::root(
            containing_block,
            strut,
            self.config.scrollbar_width,
        ));
        let style = doc.style(element).clone();
        let block_box = override_box.unwrap_or_else(|| self.build_block_box(root, &style));
        let strut = self.text_style(doc, element).line_height;
        let admitted = self
            .arena
            .get_mut(root)
            .add_block_element(doc, element, &style, &block_box, strut);
        // The synthetic root has no height limit, so admission cannot fail.
        let Some(mut context) = admitted else {
            let _ = self.arena.release(root);
            return (Geometry::default(), 0.0);
        };
        context.parent = Some(root);
        let id = self.arena.checkout(context);

        // STEP 2: Bounded reflow.
        let mark = doc.notification_mark();
        let mut attempt = 1;
        loop {
            self.format_children(doc, id, element);
            let result = self.close_block(doc, id);
            if result == CloseResult::Ok {
                break;
            }
            if attempt >= MAX_ROOT_ATTEMPTS {
                log::debug!(
                    target: "boxflow::layout",
                    "{element:?}: {result:?} after {attempt} attempts, force-closing"
                );
                self.arena.get_mut(id).force_close(doc);
                break;
            }
            attempt += 1;
            doc.discard_notifications(mark);
            self.arena.get_mut(id).reset_for_reflow();
        }

        // STEP 3: Deferred out-of-flow descendants, then the result.
        self.close_absolute_elements(doc, id);
        let (context, root_context) = self.arena.pair_mut(id, root);
        let scrollbar = context.content_width() - context.available_width();
        let preferred = context.preferred_width() + scrollbar;
        let geometry = context.finalize(doc, Some(root_context));
        let _ = self.arena.release(id);
        let _ = self.arena.release(root);
        (geometry, preferred)
    }

    /// Format the children of `node` into `block`, restarting from the
    /// first child whenever one returns `false`.
    fn format_children(&mut self, doc: &mut StyledDocument, block: BlockId, node: NodeId) {
        let count = doc.tree().child_count(node);
        let mark = doc.notification_mark();
        let mut restarts = 0;
        'restart: loop {
            for index in 0..count {
                let Some(child) = doc.tree().child(node, index) else {
                    break;
                };
                if self.format_element(doc, block, child) {
                    continue;
                }
                if restarts >= self.config.max_child_restarts {
                    let message = format!(
                        "{} restarted its children {restarts} times; keeping the current pass",
                        doc.address(node)
                    );
                    self.report(DiagnosticKind::RestartLimitReached, node, message);
                    continue;
                }
                restarts += 1;
                log::debug!(
                    target: "boxflow::layout",
                    "{node:?}: child {index} asked for a restart ({restarts})"
                );
                doc.discard_notifications(mark);
                self.arena.get_mut(block).reset_for_reflow();
                continue 'restart;
            }
            break;
        }
    }

    /// Format the children of `node` into `block` in a single pass. A
    /// child that asks for a restart keeps whatever it left behind.
    fn format_children_once(&mut self, doc: &mut StyledDocument, block: BlockId, node: NodeId) {
        let count = doc.tree().child_count(node);
        for index in 0..count {
            if let Some(child) = doc.tree().child(node, index)
                && !self.format_element(doc, block, child)
            {
                log::trace!(target: "boxflow::layout", "{node:?}: child {index} ignored on retry");
            }
        }
    }

    fn admit_block(
        &mut self,
        doc: &mut StyledDocument,
        block: BlockId,
        node: NodeId,
        style: &ComputedStyle,
    ) -> Option<BlockId> {
        let block_box = self.build_block_box(block, style);
        let strut = self.text_style(doc, node).line_height;
        let Some(mut context) = self
            .arena
            .get_mut(block)
            .add_block_element(doc, node, style, &block_box, strut)
        else {
            log::trace!(target: "boxflow::layout", "{node:?}: admission refused");
            return None;
        };
        context.parent = Some(block);
        Some(self.arena.checkout(context))
    }

    fn finish_block(
        &mut self,
        doc: &mut StyledDocument,
        parent: BlockId,
        child: BlockId,
        node: NodeId,
        result: CloseResult,
        mark: usize,
    ) -> bool {
        if result != CloseResult::Ok {
            log::trace!(target: "boxflow::layout", "{node:?}: {result:?}, parent restarts");
            doc.discard_notifications(mark);
            let _ = self.arena.release(child);
            return false;
        }
        self.close_absolute_elements(doc, child);
        let (context, parent_context) = self.arena.pair_mut(child, parent);
        let _ = context.finalize(doc, Some(parent_context));
        let _ = self.arena.release(child);
        doc.notify_layout(node);
        true
    }

    /// [§ 10.3.5 Floating, non-replaced elements](https://www.w3.org/TR/CSS2/visudet.html#float-width)
    ///
    /// "If 'width' is computed as 'auto', the used value is the
    /// 'shrink-to-fit' width ... min(max(preferred minimum width, available
    /// width), preferred width)."
    ///
    /// The preferred width comes from a measuring pass whose hook calls and
    /// diagnostics are suppressed. It is remembered per node and containing
    /// block for the rest of the top-level call.
    fn format_standalone(
        &mut self,
        doc: &mut StyledDocument,
        node: NodeId,
        style: &ComputedStyle,
        containing_block: Size,
    ) -> Geometry {
        let mut block_box = standalone_box(containing_block, style);
        if style.width.is_auto() {
            let key = (
                node,
                containing_block.width.to_bits(),
                containing_block.height.to_bits(),
            );
            let preferred = if let Some(&preferred) = self.preferred_widths.get(&key) {
                preferred
            } else {
                doc.suspend_hooks();
                self.measuring += 1;
                let (_, preferred) =
                    self.format_root_inner(doc, node, containing_block, Some(block_box));
                self.measuring -= 1;
                doc.resume_hooks();
                let _ = self.preferred_widths.insert(key, preferred);
                preferred
            };

            let available = block_box.dims.content_width.to_px_or(0.0);
            if preferred < available {
                block_box.dims.content_width = AutoOr::Length(preferred.max(0.0));
            }
        }
        self.format_root_inner(doc, node, containing_block, Some(block_box))
            .0
    }

    fn report(&mut self, kind: DiagnosticKind, node: NodeId, message: String) {
        if self.measuring > 0 || !self.reported.insert((kind, node)) {
            return;
        }
        self.sink.report(Diagnostic::new(kind, message));
    }
}
