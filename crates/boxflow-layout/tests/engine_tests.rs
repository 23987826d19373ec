//! Integration tests for the layout dispatcher.
//!
//! Documents are built from JSON and laid out against an 800x600 containing
//! block with the default approximate font metrics (0.6em advance, 1.2em
//! line height).

use std::cell::RefCell;
use std::rc::Rc;

use boxflow_common::{CollectingSink, DiagnosticKind};
use boxflow_dom::NodeId;
use boxflow_layout::{Geometry, LayoutEngine, LayoutError, Size, StyledDocument};

const VIEWPORT: Size = Size::new(800.0, 600.0);

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

fn load(json: &str) -> StyledDocument {
    StyledDocument::from_json(json).expect("valid document")
}

fn node(doc: &StyledDocument, id: &str) -> NodeId {
    doc.find_by_id(id).unwrap_or_else(|| panic!("no element #{id}"))
}

fn geometry(doc: &StyledDocument, id: &str) -> Geometry {
    *doc
        .geometry(node(doc, id))
        .unwrap_or_else(|| panic!("#{id} was not laid out"))
}

/// Record every post-layout hook call.
fn record_hooks(doc: &mut StyledDocument) -> Rc<RefCell<Vec<NodeId>>> {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&calls);
    doc.set_layout_hook(move |node, _| sink.borrow_mut().push(node));
    calls
}

fn layout(doc: &mut StyledDocument) -> LayoutEngine {
    let mut engine = LayoutEngine::default();
    let root = doc.root_element().expect("document has a root element");
    let _ = engine.layout(doc, root, VIEWPORT).expect("layout succeeds");
    engine
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

#[test]
fn test_display_none_produces_no_box_and_no_hook() {
    let mut doc = load(
        r#"{ "tag": "body", "children": [
            { "tag": "div", "attrs": { "id": "hidden" }, "style": "display: none",
              "children": [ { "tag": "div", "attrs": { "id": "inner" } } ] },
            { "tag": "div", "attrs": { "id": "shown" }, "style": "height: 10px" }
        ] }"#,
    );
    let hooks = record_hooks(&mut doc);
    let _ = layout(&mut doc);

    let hidden = node(&doc, "hidden");
    let inner = node(&doc, "inner");
    assert!(doc.geometry(hidden).is_none());
    assert!(doc.geometry(inner).is_none());
    assert!(!hooks.borrow().contains(&hidden));
    assert!(!hooks.borrow().contains(&inner));

    let shown = geometry(&doc, "shown");
    assert!(approx(shown.offset.y, 0.0));
    assert!(hooks.borrow().contains(&node(&doc, "shown")));
}

#[test]
fn test_display_none_root_is_a_no_op() {
    let mut doc = load(r#"{ "tag": "body", "style": "display: none" }"#);
    let hooks = record_hooks(&mut doc);
    let mut engine = LayoutEngine::default();
    let root = doc.root_element().unwrap();
    assert_eq!(engine.layout(&mut doc, root, VIEWPORT), Ok(Size::default()));
    assert!(doc.geometry(root).is_none());
    assert!(hooks.borrow().is_empty());
}

#[test]
fn test_absolute_element_is_out_of_flow() {
    let mut doc = load(
        r#"{ "tag": "body", "style": "padding: 4px", "children": [
            { "tag": "div", "style": "height: 30px" },
            { "tag": "div", "attrs": { "id": "abs" },
              "style": "position: absolute; left: 10px; top: 5px; width: 100px; height: 50px" },
            { "tag": "div", "attrs": { "id": "after" }, "style": "height: 20px" }
        ] }"#,
    );
    let hooks = record_hooks(&mut doc);
    let _ = layout(&mut doc);

    // The following sibling is placed as if the absolute box did not exist.
    assert!(approx(geometry(&doc, "after").offset.y, 30.0));

    // Offsets are from the padding edge of the containing block.
    let abs = geometry(&doc, "abs");
    assert_eq!(abs.containing_block, doc.root_element());
    assert!(approx(abs.offset.x, 10.0 - 4.0));
    assert!(approx(abs.offset.y, 5.0 - 4.0));
    let page = doc.absolute_border_box(node(&doc, "abs")).unwrap();
    assert!(approx(page.x, 10.0));
    assert!(approx(page.y, 5.0));
    assert!(approx(page.width, 100.0));

    let abs_node = node(&doc, "abs");
    assert_eq!(hooks.borrow().iter().filter(|&&n| n == abs_node).count(), 1);
}

#[test]
fn test_absolute_without_offsets_uses_static_position() {
    let mut doc = load(
        r#"{ "tag": "body", "children": [
            { "tag": "div", "style": "height: 30px; margin-bottom: 5px" },
            { "tag": "div", "attrs": { "id": "abs" }, "style": "position: absolute; width: 10px; height: 10px" }
        ] }"#,
    );
    let _ = layout(&mut doc);
    let abs = geometry(&doc, "abs");
    assert!(approx(abs.offset.x, 0.0));
    assert!(approx(abs.offset.y, 35.0));
}

#[test]
fn test_float_is_resolved_before_registration() {
    let mut doc = load(
        r#"{ "tag": "body", "children": [
            { "tag": "div", "attrs": { "id": "float" }, "style": "float: left", "children": ["abc"] }
        ] }"#,
    );
    let _ = layout(&mut doc);

    // Shrink-to-fit: three glyphs at 16px * 0.6.
    let float = geometry(&doc, "float");
    assert!(approx(float.content.width, 28.8));
    assert!(approx(float.content.height, 19.2));
    assert!(approx(float.offset.x, 0.0));
}

#[test]
fn test_right_float_leaves_600_for_inline_content() {
    let fits = r#"{ "tag": "body", "children": [
        { "tag": "div", "attrs": { "id": "float" }, "style": "float: right; width: 200px; height: 100px" },
        { "tag": "span", "attrs": { "id": "box" }, "style": "display: inline-block; width: 600px; height: 10px" }
    ] }"#;
    let mut doc = load(fits);
    let _ = layout(&mut doc);

    let float = geometry(&doc, "float");
    assert!(approx(float.offset.x, 600.0));
    assert!(approx(float.offset.y, 0.0));
    let beside = geometry(&doc, "box");
    assert!(approx(beside.offset.x, 0.0));
    assert!(approx(beside.offset.y, 0.0));

    // One pixel more no longer fits beside the float.
    let mut doc = load(&fits.replace("width: 600px", "width: 601px"));
    let _ = layout(&mut doc);
    let below = geometry(&doc, "box");
    assert!(approx(below.offset.x, 0.0));
    assert!(approx(below.offset.y, 100.0));
}

#[test]
fn test_line_break_element_starts_new_line() {
    let mut doc = load(
        r#"{ "tag": "body", "children": [
            { "tag": "p", "attrs": { "id": "p" }, "children": [
                "abc", { "tag": "br", "attrs": { "id": "br" } },
                { "tag": "span", "attrs": { "id": "after" }, "children": ["def"] }
            ] }
        ] }"#,
    );
    let hooks = record_hooks(&mut doc);
    let _ = layout(&mut doc);

    let br = geometry(&doc, "br");
    assert!(approx(br.offset.x, 28.8));
    assert!(approx(br.offset.y, 0.0));
    assert!(hooks.borrow().contains(&node(&doc, "br")));

    let after = geometry(&doc, "after");
    assert!(approx(after.offset.x, 0.0));
    assert!(approx(after.offset.y, 19.2));
    assert!(approx(geometry(&doc, "p").content.height, 38.4));
}

#[test]
fn test_table_display_outside_table_reports_once() {
    let mut doc = load(
        r#"{ "tag": "body", "children": [
            { "tag": "div", "attrs": { "id": "before" }, "style": "height: 10px" },
            { "tag": "td", "attrs": { "id": "cell" }, "children": [ { "tag": "div", "attrs": { "id": "inside" } } ] },
            { "tag": "div", "attrs": { "id": "after" }, "style": "height: 10px" }
        ] }"#,
    );
    let sink = Rc::new(RefCell::new(CollectingSink::new()));
    let mut engine = LayoutEngine::default().with_diagnostic_sink(Rc::clone(&sink));
    let root = doc.root_element().unwrap();
    let _ = engine.layout(&mut doc, root, VIEWPORT).unwrap();

    let sink = sink.borrow();
    assert_eq!(sink.diagnostics.len(), 1);
    assert_eq!(sink.count(DiagnosticKind::TableDisplayOutsideTable), 1);
    let message = &sink.diagnostics[0].message;
    assert!(message.contains("table-cell"), "{message}");
    assert!(message.contains("body > td#cell"), "{message}");

    assert!(doc.geometry(node(&doc, "cell")).is_none());
    assert!(doc.geometry(node(&doc, "inside")).is_none());
    assert!(approx(geometry(&doc, "after").offset.y, 10.0));
}

// ---------------------------------------------------------------------------
// End-to-end
// ---------------------------------------------------------------------------

#[test]
fn test_inline_children_wrap_to_minimum_lines() {
    // 800 - 2 * 8 margin - 2 * 10 padding - 2 * 2 border = 760 for content:
    // two 300px boxes fit on the first line, the third wraps.
    let mut doc = load(
        r#"{ "tag": "body", "children": [
            { "tag": "div", "attrs": { "id": "block" },
              "style": "margin: 8px; padding: 10px; border-width: 2px", "children": [
                { "tag": "span", "attrs": { "id": "a" }, "style": "display: inline-block; width: 300px; height: 20px" },
                { "tag": "span", "attrs": { "id": "b" }, "style": "display: inline-block; width: 300px; height: 20px" },
                { "tag": "span", "attrs": { "id": "c" }, "style": "display: inline-block; width: 300px; height: 20px" }
            ] }
        ] }"#,
    );
    let _ = layout(&mut doc);

    let block = geometry(&doc, "block");
    assert!(approx(block.content.width, 760.0));
    assert!(approx(block.content.height, 40.0));
    assert!(approx(block.border_box().height, 40.0 + 20.0 + 4.0));

    let (a, b, c) = (geometry(&doc, "a"), geometry(&doc, "b"), geometry(&doc, "c"));
    assert!(approx(a.offset.x, 0.0) && approx(a.offset.y, 0.0));
    assert!(approx(b.offset.x, 300.0) && approx(b.offset.y, 0.0));
    assert!(approx(c.offset.x, 0.0) && approx(c.offset.y, 20.0));
    assert_eq!(c.containing_block, Some(node(&doc, "block")));
}

#[test]
fn test_text_wraps_inside_block() {
    // Ten 9.6px glyphs per word and space: eight words per 800px line.
    let words = "abcdefghi ".repeat(12);
    let json = format!(
        r#"{{ "tag": "body", "children": [ {{ "tag": "p", "attrs": {{ "id": "p" }}, "children": ["{words}"] }} ] }}"#
    );
    let mut doc = load(&json);
    let _ = layout(&mut doc);
    let p = geometry(&doc, "p");
    assert!(approx(p.content.height, 2.0 * 19.2));
}

#[test]
fn test_text_that_exactly_fills_a_line_stays_on_it() {
    // 6px glyphs: "aaaa bbbb" is 54px, so "aaaa bbbb cccc" cannot share a
    // 60px line but "cccc dddd" fills the second one.
    let mut doc = load(
        r#"{ "tag": "body", "children": [
            { "tag": "p", "attrs": { "id": "p" }, "style": "width: 60px; font-size: 10px; line-height: 12px",
              "children": ["aaaa bbbb cccc dddd"] },
            { "tag": "p", "attrs": { "id": "exact" }, "style": "width: 60px; font-size: 10px; line-height: 12px",
              "children": ["aaaa bbbbb cccc"] }
        ] }"#,
    );
    let _ = layout(&mut doc);
    assert!(approx(geometry(&doc, "p").content.height, 24.0));
    assert!(approx(geometry(&doc, "exact").content.height, 24.0));
}

#[test]
fn test_block_inside_inline_escalates_through_it() {
    let mut doc = load(
        r#"{ "tag": "body", "attrs": { "id": "body" }, "style": "height: 100px; overflow-y: auto", "children": [
            { "tag": "span", "attrs": { "id": "span" }, "children": [
                "before",
                { "tag": "div", "attrs": { "id": "tall" }, "style": "height: 150px" },
                "after"
            ] }
        ] }"#,
    );
    let hooks = record_hooks(&mut doc);
    let engine = layout(&mut doc);
    assert_eq!(engine.arena().live_blocks(), 0);

    let body = geometry(&doc, "body");
    assert!(approx(body.scrollbar_width, 16.0));
    assert!(approx(body.content.width, 784.0));

    // The block sits between the two halves of the split span.
    let tall = geometry(&doc, "tall");
    assert!(approx(tall.content.width, 784.0));
    assert!(approx(tall.content.height, 150.0));
    assert!(approx(tall.offset.y, 19.2));
    assert!(approx(body.visible_overflow.height, 19.2 + 150.0 + 19.2));

    let tall = node(&doc, "tall");
    assert_eq!(hooks.borrow().iter().filter(|&&n| n == tall).count(), 1);
}

#[test]
fn test_hooks_only_see_the_kept_pass() {
    let mut doc = load(
        r#"{ "tag": "body", "style": "height: 100px; overflow-y: auto", "children": [
            { "tag": "div", "attrs": { "id": "a" }, "style": "height: 10px" },
            { "tag": "div", "attrs": { "id": "b" }, "style": "height: 150px" }
        ] }"#,
    );
    let widths = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&widths);
    doc.set_layout_hook(move |node, geometry| sink.borrow_mut().push((node, geometry.content.width)));
    let _ = layout(&mut doc);

    let a = node(&doc, "a");
    let seen: Vec<f32> = widths
        .borrow()
        .iter()
        .filter(|&&(n, _)| n == a)
        .map(|&(_, width)| width)
        .collect();
    assert_eq!(seen.len(), 1);
    assert!(approx(seen[0], 784.0));
}

#[test]
fn test_percent_height_resolves_against_containing_block() {
    let mut doc = load(
        r#"{ "tag": "body", "attrs": { "id": "body" }, "style": "height: 50%", "children": [
            { "tag": "div", "attrs": { "id": "half" }, "style": "height: 50%" }
        ] }"#,
    );
    let _ = layout(&mut doc);
    assert!(approx(geometry(&doc, "body").content.height, 300.0));
    assert!(approx(geometry(&doc, "half").content.height, 150.0));
}

#[test]
fn test_percent_height_without_definite_basis_is_auto() {
    let mut doc = load(
        r#"{ "tag": "body", "children": [
            { "tag": "div", "attrs": { "id": "half" }, "style": "height: 50%", "children": ["x"] }
        ] }"#,
    );
    let _ = layout(&mut doc);
    assert!(approx(geometry(&doc, "half").content.height, 19.2));
}

#[test]
fn test_visible_overflow_covers_overflowing_child() {
    let mut doc = load(
        r#"{ "tag": "body", "attrs": { "id": "body" }, "style": "height: 100px", "children": [
            { "tag": "div", "style": "height: 250px" }
        ] }"#,
    );
    let mut engine = LayoutEngine::default();
    let root = doc.root_element().unwrap();
    let overflow = engine.layout(&mut doc, root, VIEWPORT).unwrap();
    assert!(approx(overflow.height, 250.0));
    assert!(approx(geometry(&doc, "body").content.height, 100.0));
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[test]
fn test_layout_rejects_bad_input() {
    let mut doc = load(r#"{ "tag": "body", "children": ["text"] }"#);
    let mut engine = LayoutEngine::default();
    let root = doc.root_element().unwrap();
    let text = doc.tree().child(root, 0).unwrap();

    assert_eq!(
        engine.layout(&mut doc, NodeId(999), VIEWPORT),
        Err(LayoutError::UnknownNode(NodeId(999)))
    );
    assert_eq!(
        engine.layout(&mut doc, text, VIEWPORT),
        Err(LayoutError::NotAnElement(text))
    );
    assert!(matches!(
        engine.layout(&mut doc, root, Size::new(-1.0, 600.0)),
        Err(LayoutError::InvalidContainingBlock { .. })
    ));
    assert!(matches!(
        engine.layout(&mut doc, root, Size::new(800.0, f32::INFINITY)),
        Err(LayoutError::InvalidContainingBlock { .. })
    ));
}

#[test]
fn test_every_context_is_released() {
    let mut doc = load(
        r#"{ "tag": "body", "style": "height: 40px; overflow-y: auto", "children": [
            { "tag": "div", "style": "float: left", "children": ["float"] },
            { "tag": "div", "children": [ "text ", { "tag": "span", "style": "display: inline-block", "children": ["ib"] } ] },
            { "tag": "div", "style": "position: absolute", "children": [ { "tag": "div", "children": ["abs"] } ] },
            { "tag": "table", "children": [ { "tag": "tr", "children": [ { "tag": "td", "children": ["cell"] } ] } ] }
        ] }"#,
    );
    let mut engine = LayoutEngine::default();
    let root = doc.root_element().unwrap();
    let _ = engine.layout(&mut doc, root, VIEWPORT).unwrap();
    assert_eq!(engine.arena().live_blocks(), 0);

    let capacity = engine.arena().capacity();
    let _ = engine.layout(&mut doc, root, VIEWPORT).unwrap();
    assert_eq!(engine.arena().live_blocks(), 0);
    assert_eq!(engine.arena().capacity(), capacity);
}

#[test]
fn test_inline_block_shrinks_to_fit_its_text() {
    let mut doc = load(
        r#"{ "tag": "body", "children": [
            "ab ",
            { "tag": "span", "attrs": { "id": "ib" }, "style": "display: inline-block; padding: 2px", "children": ["abcd"] }
        ] }"#,
    );
    let hooks = record_hooks(&mut doc);
    let _ = layout(&mut doc);

    let ib = geometry(&doc, "ib");
    assert!(approx(ib.content.width, 4.0 * 9.6));
    assert!(approx(ib.content.height, 19.2));
    assert!(approx(ib.offset.x, 3.0 * 9.6));
    assert!(approx(ib.border_box().width, 4.0 * 9.6 + 4.0));
    let ib_node = node(&doc, "ib");
    assert_eq!(hooks.borrow().iter().filter(|&&n| n == ib_node).count(), 1);
}
