//! The styled element tree layout reads, and the geometry it writes back.
//!
//! A [`StyledDocument`] binds a [`DomTree`] to one [`ComputedStyle`] per
//! element and one [`Geometry`] slot per laid out node. Layout never adds or
//! removes nodes; it only overwrites geometry and queues post-layout
//! notifications, which are delivered once the pass that produced them is
//! kept.
//!
//! # JSON format
//!
//! ```json
//! { "tag": "body", "style": { "width": "800px" },
//!   "children": [ { "tag": "p", "children": ["Hello ", { "tag": "b", "children": ["world"] }] } ] }
//! ```
//!
//! Strings are text nodes. `style` is either a map of declarations or a
//! single `"name: value; ..."` string. Elements without a `display`
//! declaration get their tag's usual display value.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::mem;

use boxflow_common::warning::clear_warnings;
use boxflow_dom::{DomTree, ElementData, NodeId};
use serde::Deserialize;

use crate::error::DocumentError;
use crate::layout::box_model::{Point, Rect};
use crate::layout::Geometry;
use crate::style::{ComputedStyle, DisplayValue};

/// Post-layout notification: called with the element and its new geometry.
pub type LayoutHook = Box<dyn FnMut(NodeId, &Geometry)>;

/// Element tree + computed styles + layout results.
pub struct StyledDocument {
    tree: DomTree,
    styles: HashMap<NodeId, ComputedStyle>,
    geometry: HashMap<NodeId, Geometry>,
    initial_style: ComputedStyle,
    hook: Option<LayoutHook>,
    hooks_suspended: usize,
    pending: Vec<NodeId>,
}

impl fmt::Debug for StyledDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyledDocument")
            .field("nodes", &self.tree.len())
            .field("styled", &self.styles.len())
            .field("laid_out", &self.geometry.len())
            .field("hook", &self.hook.is_some())
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl StyledDocument {
    /// Wrap a tree; every element starts with initial style values.
    #[must_use]
    pub fn new(tree: DomTree) -> Self {
        Self {
            tree,
            styles: HashMap::new(),
            geometry: HashMap::new(),
            initial_style: ComputedStyle::default(),
            hook: None,
            hooks_suspended: 0,
            pending: Vec::new(),
        }
    }

    /// The element tree.
    #[must_use]
    pub const fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Append an element with a style, returning its id.
    pub fn append_element(
        &mut self,
        parent: NodeId,
        tag: &str,
        style: ComputedStyle,
    ) -> NodeId {
        let id = self.tree.append_element(parent, ElementData::new(tag));
        let _ = self.styles.insert(id, style);
        id
    }

    /// Append a text node, returning its id.
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.tree.append_text(parent, text)
    }

    /// Replace the computed style of `node`.
    pub fn set_style(&mut self, node: NodeId, style: ComputedStyle) {
        let _ = self.styles.insert(node, style);
    }

    /// The computed style of `node`. Text nodes and unstyled elements
    /// report initial values.
    #[must_use]
    pub fn style(&self, node: NodeId) -> &ComputedStyle {
        self.styles.get(&node).unwrap_or(&self.initial_style)
    }

    /// The style fonts are taken from: the node's own for elements, the
    /// parent element's for text.
    #[must_use]
    pub fn font_style(&self, node: NodeId) -> &ComputedStyle {
        if self.tree.as_text(node).is_some()
            && let Some(parent) = self.tree.parent(node)
        {
            return self.style(parent);
        }
        self.style(node)
    }

    /// Layout result for `node`, if it has been laid out.
    #[must_use]
    pub fn geometry(&self, node: NodeId) -> Option<&Geometry> {
        self.geometry.get(&node)
    }

    /// Overwrite the layout result for `node`.
    pub fn set_geometry(&mut self, node: NodeId, geometry: Geometry) {
        let _ = self.geometry.insert(node, geometry);
    }

    /// Drop every layout result.
    pub fn clear_geometry(&mut self) {
        self.geometry.clear();
    }

    /// Install the post-layout hook, replacing any previous one.
    pub fn set_layout_hook(&mut self, hook: impl FnMut(NodeId, &Geometry) + 'static) {
        self.hook = Some(Box::new(hook));
    }

    /// Queue a post-layout notification for `node`.
    ///
    /// Nothing is called until [`Self::flush_layout_notifications`]; a
    /// pass that is thrown away takes its queued notifications with it.
    pub fn notify_layout(&mut self, node: NodeId) {
        if self.hooks_suspended > 0 {
            return;
        }
        self.pending.push(node);
    }

    /// Call the post-layout hook for every queued node, in queue order,
    /// with its current geometry. Nodes without geometry are skipped.
    pub fn flush_layout_notifications(&mut self) {
        let pending = mem::take(&mut self.pending);
        let Some(hook) = self.hook.as_mut() else {
            return;
        };
        for node in pending {
            if let Some(geometry) = self.geometry.get(&node) {
                hook(node, geometry);
            }
        }
    }

    /// Number of queued notifications; a mark for
    /// [`Self::discard_notifications`].
    pub(crate) fn notification_mark(&self) -> usize {
        self.pending.len()
    }

    /// Drop the notifications queued since `mark`.
    pub(crate) fn discard_notifications(&mut self, mark: usize) {
        self.pending.truncate(mark);
    }

    /// Stop queuing notifications until the matching [`Self::resume_hooks`]. Nests.
    pub(crate) fn suspend_hooks(&mut self) {
        self.hooks_suspended += 1;
    }

    pub(crate) fn resume_hooks(&mut self) {
        self.hooks_suspended = self.hooks_suspended.saturating_sub(1);
    }

    /// Look up a property of `node` and print its computed value.
    #[must_use]
    pub fn property_text(&self, node: NodeId, name: &str) -> Option<String> {
        self.style(node).property_text(name)
    }

    /// Human readable path to `node`, for diagnostics.
    #[must_use]
    pub fn address(&self, node: NodeId) -> String {
        self.tree.address(node)
    }

    /// The border box of `node` in viewport coordinates, composing offsets
    /// up the chain of containing blocks.
    #[must_use]
    pub fn absolute_border_box(&self, node: NodeId) -> Option<Rect> {
        let geometry = self.geometry.get(&node)?;
        let mut origin = Point::default();
        let mut next = geometry.containing_block;
        let mut guard = self.tree.len();
        while let Some(container) = next {
            let outer = self.geometry.get(&container)?;
            let content = outer.content_box();
            origin = origin.offset(Point::new(content.x, content.y));
            next = outer.containing_block;
            guard = guard.checked_sub(1)?;
        }
        let border_box = geometry.border_box();
        Some(Rect {
            x: border_box.x + origin.x,
            y: border_box.y + origin.y,
            ..border_box
        })
    }

    /// The first element with the given `id` attribute.
    #[must_use]
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        (0..self.tree.len())
            .map(NodeId)
            .find(|&node| self.tree.as_element(node).and_then(ElementData::id) == Some(id))
    }

    /// The top-level element.
    #[must_use]
    pub fn root_element(&self) -> Option<NodeId> {
        self.tree.document_element()
    }

    /// Build a document from its JSON description.
    ///
    /// # Errors
    /// Malformed JSON, a text node at the top level, or a style declaration
    /// that does not parse.
    pub fn from_json(text: &str) -> Result<Self, DocumentError> {
        clear_warnings();
        let root: JsonNode = serde_json::from_str(text)?;
        let JsonNode::Element(root) = root else {
            return Err(DocumentError::TextRoot);
        };
        let mut doc = Self::new(DomTree::new());
        let _ = doc.load_element(NodeId::ROOT, root)?;
        log::debug!(target: "boxflow::document", "loaded {} nodes", doc.tree.len());
        Ok(doc)
    }

    fn load_element(&mut self, parent: NodeId, element: JsonElement) -> Result<NodeId, DocumentError> {
        let mut style = ComputedStyle::with_display(default_display(&element.tag));
        let declarations = match element.style {
            JsonStyle::Map(map) => map.into_iter().collect::<Vec<_>>(),
            JsonStyle::Text(text) => text
                .split(';')
                .filter(|d| !d.trim().is_empty())
                .map(|d| {
                    let (name, value) = d.split_once(':').unwrap_or((d, ""));
                    (name.trim().to_string(), value.trim().to_string())
                })
                .collect(),
        };
        for (name, value) in declarations {
            style
                .apply_declaration(&name, &value)
                .map_err(|source| DocumentError::Style {
                    tag: element.tag.clone(),
                    source,
                })?;
        }

        let mut data = ElementData::new(&element.tag);
        data.attrs.extend(element.attrs);
        let id = self.tree.append_element(parent, data);
        let _ = self.styles.insert(id, style);

        for child in element.children {
            match child {
                JsonNode::Text(text) => {
                    let _ = self.tree.append_text(id, text);
                }
                JsonNode::Element(child) => {
                    let _ = self.load_element(id, child)?;
                }
            }
        }
        Ok(id)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonNode {
    Text(String),
    Element(JsonElement),
}

#[derive(Deserialize)]
struct JsonElement {
    tag: String,
    #[serde(default)]
    attrs: BTreeMap<String, String>,
    #[serde(default)]
    style: JsonStyle,
    #[serde(default)]
    children: Vec<JsonNode>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonStyle {
    Map(BTreeMap<String, String>),
    Text(String),
}

impl Default for JsonStyle {
    fn default() -> Self {
        Self::Map(BTreeMap::new())
    }
}

/// The display value a tag has before any author style.
fn default_display(tag: &str) -> DisplayValue {
    match tag.to_ascii_lowercase().as_str() {
        "html" | "body" | "div" | "p" | "section" | "article" | "header" | "footer" | "nav"
        | "main" | "ul" | "ol" | "li" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "pre"
        | "blockquote" | "form" => DisplayValue::Block,
        "table" => DisplayValue::Table,
        "tr" => DisplayValue::TableRow,
        "td" | "th" => DisplayValue::TableCell,
        "thead" => DisplayValue::TableHeaderGroup,
        "tbody" => DisplayValue::TableRowGroup,
        "tfoot" => DisplayValue::TableFooterGroup,
        "col" => DisplayValue::TableColumn,
        "colgroup" => DisplayValue::TableColumnGroup,
        "head" | "style" | "script" | "title" | "meta" => DisplayValue::None,
        _ => DisplayValue::Inline,
    }
}
