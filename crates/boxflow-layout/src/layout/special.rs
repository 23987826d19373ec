//! Special-case formatting.
//!
//! Content that bypasses box generation is handled by an ordered list of
//! [`SpecialFormatter`]s consulted before the display-based dispatch. The
//! first formatter whose predicate accepts a node formats it; nodes nobody
//! claims go through the regular dispatcher.

use boxflow_dom::NodeId;

use super::engine::LayoutEngine;
use super::pool::BlockId;
use crate::document::StyledDocument;
use crate::style::DisplayValue;

/// A predicate plus handler pair for nodes that do not generate a box the
/// ordinary way.
pub trait SpecialFormatter {
    /// Short name used in trace output.
    fn name(&self) -> &'static str;

    /// Whether this formatter takes `node`.
    fn applies_to(&self, doc: &StyledDocument, node: NodeId) -> bool;

    /// Format `node` inside `block`. Same return contract as
    /// [`LayoutEngine::format_element`]: `false` asks the caller to restart
    /// its child loop.
    fn format(
        &self,
        engine: &mut LayoutEngine,
        doc: &mut StyledDocument,
        block: BlockId,
        node: NodeId,
    ) -> bool;
}

/// `<br>`: a forced line break in the current inline context.
///
/// [§ 5.1 Line breaking](https://www.w3.org/TR/css-text-3/#line-breaking)
#[derive(Debug, Default, Clone, Copy)]
pub struct LineBreakFormatter;

impl SpecialFormatter for LineBreakFormatter {
    fn name(&self) -> &'static str {
        "line-break"
    }

    fn applies_to(&self, doc: &StyledDocument, node: NodeId) -> bool {
        doc.tree()
            .tag_name(node)
            .is_some_and(|tag| tag.eq_ignore_ascii_case("br"))
            && doc.style(node).display != DisplayValue::None
    }

    fn format(
        &self,
        engine: &mut LayoutEngine,
        doc: &mut StyledDocument,
        block: BlockId,
        node: NodeId,
    ) -> bool {
        let _ = engine.add_break(doc, block, node);
        doc.notify_layout(node);
        true
    }
}

/// Text nodes: runs of text added to the current inline context.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextRunFormatter;

impl SpecialFormatter for TextRunFormatter {
    fn name(&self) -> &'static str {
        "text-run"
    }

    fn applies_to(&self, doc: &StyledDocument, node: NodeId) -> bool {
        doc.tree().as_text(node).is_some()
    }

    fn format(
        &self,
        engine: &mut LayoutEngine,
        doc: &mut StyledDocument,
        block: BlockId,
        node: NodeId,
    ) -> bool {
        let Some(text) = doc.tree().as_text(node).map(str::to_owned) else {
            return true;
        };
        engine.add_text(doc, block, node, &text);
        true
    }
}
