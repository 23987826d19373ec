//! Integration tests for the restart protocol and the bounded reflow.
//!
//! A `probe` special formatter records every visit of a `<probe>` element,
//! which makes restarts from the first child observable.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use boxflow_common::{CollectingSink, DiagnosticKind};
use boxflow_dom::NodeId;
use boxflow_layout::layout::{BlockId, MAX_ROOT_ATTEMPTS, SpecialFormatter, TableFormatter};
use boxflow_layout::{CloseResult, Geometry, LayoutConfig, LayoutEngine, Size, StyledDocument};
use quickcheck_macros::quickcheck;

const VIEWPORT: Size = Size::new(800.0, 600.0);

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

fn load(json: &str) -> StyledDocument {
    StyledDocument::from_json(json).expect("valid document")
}

fn geometry(doc: &StyledDocument, id: &str) -> Geometry {
    let node = doc.find_by_id(id).unwrap_or_else(|| panic!("no element #{id}"));
    *doc
        .geometry(node)
        .unwrap_or_else(|| panic!("#{id} was not laid out"))
}

fn run(engine: &mut LayoutEngine, doc: &mut StyledDocument) -> Size {
    let root = doc.root_element().expect("document has a root element");
    engine.layout(doc, root, VIEWPORT).expect("layout succeeds")
}

/// Records visits to `<probe>` and optionally pushes its block's content
/// down to `grow`.
struct Probe {
    visits: Rc<RefCell<Vec<NodeId>>>,
    grow: f32,
}

impl Probe {
    fn new(grow: f32) -> (Self, Rc<RefCell<Vec<NodeId>>>) {
        let visits = Rc::new(RefCell::new(Vec::new()));
        let probe = Self {
            visits: Rc::clone(&visits),
            grow,
        };
        (probe, visits)
    }
}

impl SpecialFormatter for Probe {
    fn name(&self) -> &'static str {
        "probe"
    }

    fn applies_to(&self, doc: &StyledDocument, node: NodeId) -> bool {
        doc.tree().tag_name(node) == Some("probe")
    }

    fn format(
        &self,
        engine: &mut LayoutEngine,
        _doc: &mut StyledDocument,
        block: BlockId,
        node: NodeId,
    ) -> bool {
        self.visits.borrow_mut().push(node);
        if self.grow > 0.0 {
            engine
                .block_mut(block)
                .reserve_content(Size::new(0.0, self.grow));
        }
        true
    }
}

/// A table formatter that never closes its table.
struct AlwaysRetry {
    calls: Rc<Cell<usize>>,
}

impl TableFormatter for AlwaysRetry {
    fn format_table(
        &self,
        _engine: &mut LayoutEngine,
        _doc: &mut StyledDocument,
        _table: BlockId,
        _element: NodeId,
    ) -> CloseResult {
        self.calls.set(self.calls.get() + 1);
        CloseResult::RetrySelf
    }
}

/// Grows its block past any small height limit, and refuses to be placed
/// once the block has turned on its scrollbar.
struct RefusesNarrowing {
    visits: Rc<Cell<usize>>,
}

impl SpecialFormatter for RefusesNarrowing {
    fn name(&self) -> &'static str {
        "refuses-narrowing"
    }

    fn applies_to(&self, doc: &StyledDocument, node: NodeId) -> bool {
        doc.tree().tag_name(node) == Some("stubborn")
    }

    fn format(
        &self,
        engine: &mut LayoutEngine,
        _doc: &mut StyledDocument,
        block: BlockId,
        _node: NodeId,
    ) -> bool {
        self.visits.set(self.visits.get() + 1);
        let block = engine.block_mut(block);
        block.reserve_content(Size::new(0.0, 50.0));
        !block.has_scrollbar()
    }
}

/// Reserves `height` of content and closes the table like a block.
struct ReservingTable {
    height: f32,
    results: Rc<RefCell<Vec<CloseResult>>>,
}

impl TableFormatter for ReservingTable {
    fn format_table(
        &self,
        engine: &mut LayoutEngine,
        doc: &mut StyledDocument,
        table: BlockId,
        _element: NodeId,
    ) -> CloseResult {
        engine
            .block_mut(table)
            .reserve_content(Size::new(0.0, self.height));
        let result = engine.close_block(doc, table);
        self.results.borrow_mut().push(result);
        result
    }
}

fn probes_then_overflow(probes: usize) -> String {
    let mut children: Vec<String> = (0..probes)
        .map(|i| format!(r#"{{ "tag": "probe", "attrs": {{ "id": "p{i}" }} }}"#))
        .collect();
    children.push(r#"{ "tag": "div", "attrs": { "id": "tall" }, "style": "height: 150px" }"#.to_string());
    format!(
        r#"{{ "tag": "body", "attrs": {{ "id": "body" }}, "style": "height: 100px; overflow-y: auto", "children": [{}] }}"#,
        children.join(", ")
    )
}

// ---------------------------------------------------------------------------
// Restart protocol
// ---------------------------------------------------------------------------

#[test]
fn test_escalation_restarts_from_first_child() {
    let mut doc = load(&probes_then_overflow(2));
    let calls = Rc::new(RefCell::new(Vec::new()));
    let hooks = Rc::clone(&calls);
    doc.set_layout_hook(move |node, _| hooks.borrow_mut().push(node));

    let (probe, visits) = Probe::new(0.0);
    let mut engine = LayoutEngine::default();
    engine.register_special(probe);
    let _ = run(&mut engine, &mut doc);

    let p0 = doc.find_by_id("p0").unwrap();
    let p1 = doc.find_by_id("p1").unwrap();
    assert_eq!(*visits.borrow(), vec![p0, p1, p0, p1]);

    // The scrollbar stays on after the restart.
    let body = geometry(&doc, "body");
    assert!(approx(body.scrollbar_width, 16.0));
    assert!(approx(body.content.height, 100.0));
    assert!(approx(geometry(&doc, "tall").content.width, 784.0));

    // Every child is reported once, after the pass that kept it.
    let calls = calls.borrow();
    for id in ["tall", "body"] {
        let node = doc.find_by_id(id).unwrap();
        assert_eq!(calls.iter().filter(|&&n| n == node).count(), 1, "#{id}");
    }
}

#[quickcheck]
fn test_restart_revisits_every_earlier_child(probes: u8) -> bool {
    let probes = usize::from(probes % 6);
    let mut doc = load(&probes_then_overflow(probes));
    let (probe, visits) = Probe::new(0.0);
    let mut engine = LayoutEngine::default();
    engine.register_special(probe);
    let _ = run(&mut engine, &mut doc);

    let visits = visits.borrow();
    visits.len() == 2 * probes
        && (0..probes).all(|i| {
            let node = doc.find_by_id(&format!("p{i}"));
            visits.iter().filter(|&&v| Some(v) == node).count() == 2
        })
}

#[test]
fn test_restart_limit_reports_and_moves_on() {
    let mut doc = load(
        r#"{ "tag": "body", "children": [
            { "tag": "table", "attrs": { "id": "stuck" } },
            { "tag": "div", "attrs": { "id": "after" }, "style": "height: 10px" }
        ] }"#,
    );
    let calls = Rc::new(Cell::new(0));
    let sink = Rc::new(RefCell::new(CollectingSink::new()));
    let mut engine = LayoutEngine::default().with_diagnostic_sink(Rc::clone(&sink));
    engine.set_table_formatter(AlwaysRetry {
        calls: Rc::clone(&calls),
    });
    let _ = run(&mut engine, &mut doc);

    // Each visit formats the table twice; the first visit plus one per restart.
    let restarts = engine.config().max_child_restarts;
    assert_eq!(calls.get(), 2 * (restarts + 1));
    assert_eq!(sink.borrow().count(DiagnosticKind::RestartLimitReached), 1);

    assert!(doc.geometry(doc.find_by_id("stuck").unwrap()).is_none());
    assert!(approx(geometry(&doc, "after").offset.y, 0.0));
    assert_eq!(engine.arena().live_blocks(), 0);
}

#[test]
fn test_retry_pass_ignores_restart_requests() {
    let mut doc = load(
        r#"{ "tag": "body", "children": [
            { "tag": "div", "attrs": { "id": "box" }, "style": "height: 20px; overflow-y: auto",
              "children": [ { "tag": "stubborn" } ] }
        ] }"#,
    );
    let visits = Rc::new(Cell::new(0));
    let sink = Rc::new(RefCell::new(CollectingSink::new()));
    let mut engine = LayoutEngine::default().with_diagnostic_sink(Rc::clone(&sink));
    engine.register_special(RefusesNarrowing {
        visits: Rc::clone(&visits),
    });
    let _ = run(&mut engine, &mut doc);

    // One pass without the scrollbar, then exactly one retry pass.
    assert_eq!(visits.get(), 2);
    assert_eq!(sink.borrow().count(DiagnosticKind::RestartLimitReached), 0);
    let geometry = geometry(&doc, "box");
    assert!(approx(geometry.scrollbar_width, 16.0));
    assert!(approx(geometry.content.height, 20.0));
    assert!(approx(geometry.visible_overflow.height, 50.0));
}

#[test]
fn test_table_that_escalates_restarts_its_parent() {
    let mut doc = load(
        r#"{ "tag": "body", "attrs": { "id": "body" }, "style": "height: 100px; overflow-y: auto", "children": [
            { "tag": "div", "attrs": { "id": "before" }, "style": "height: 10px" },
            { "tag": "table", "attrs": { "id": "table" } }
        ] }"#,
    );
    let calls = Rc::new(RefCell::new(Vec::new()));
    let hooks = Rc::clone(&calls);
    doc.set_layout_hook(move |node, _| hooks.borrow_mut().push(node));

    let results = Rc::new(RefCell::new(Vec::new()));
    let mut engine = LayoutEngine::default();
    engine.set_table_formatter(ReservingTable {
        height: 150.0,
        results: Rc::clone(&results),
    });
    let _ = run(&mut engine, &mut doc);

    assert_eq!(
        *results.borrow(),
        vec![CloseResult::EscalateParent, CloseResult::Ok]
    );
    assert!(approx(geometry(&doc, "body").scrollbar_width, 16.0));
    let table = geometry(&doc, "table");
    assert!(approx(table.content.width, 784.0));
    assert!(approx(table.offset.y, 10.0));
    assert_eq!(engine.arena().live_blocks(), 0);

    let calls = calls.borrow();
    for id in ["before", "table"] {
        let node = doc.find_by_id(id).unwrap();
        assert_eq!(calls.iter().filter(|&&n| n == node).count(), 1, "#{id}");
    }
}

#[test]
fn test_restart_reuses_measured_float_width() {
    // The 300px box keeps its width when the body turns on its scrollbar,
    // so the float inside it is measured only on the first pass.
    let mut doc = load(
        r#"{ "tag": "body", "style": "height: 100px; overflow-y: auto", "children": [
            { "tag": "div", "style": "width: 300px", "children": [
                { "tag": "span", "attrs": { "id": "float" }, "style": "float: left", "children": [ { "tag": "probe" } ] }
            ] },
            { "tag": "div", "style": "height: 150px" }
        ] }"#,
    );
    let (probe, visits) = Probe::new(0.0);
    let mut engine = LayoutEngine::default();
    engine.register_special(probe);
    let _ = run(&mut engine, &mut doc);

    // Measure and place, then place again after the restart.
    assert_eq!(visits.borrow().len(), 3);
    assert!(doc.geometry(doc.find_by_id("float").unwrap()).is_some());
}

#[test]
fn test_restart_limit_is_configurable() {
    let mut doc = load(r#"{ "tag": "body", "children": [ { "tag": "table" } ] }"#);
    let calls = Rc::new(Cell::new(0));
    let config = LayoutConfig {
        max_child_restarts: 1,
        ..LayoutConfig::default()
    };
    let mut engine = LayoutEngine::new(config);
    engine.set_table_formatter(AlwaysRetry {
        calls: Rc::clone(&calls),
    });
    let _ = run(&mut engine, &mut doc);
    assert_eq!(calls.get(), 4);
}

#[test]
fn test_restarts_do_not_repeat_diagnostics() {
    let mut doc = load(
        r#"{ "tag": "body", "style": "height: 100px; overflow-y: auto", "children": [
            { "tag": "td" },
            { "tag": "div", "style": "height: 150px" }
        ] }"#,
    );
    let sink = Rc::new(RefCell::new(CollectingSink::new()));
    let mut engine = LayoutEngine::default().with_diagnostic_sink(Rc::clone(&sink));
    let _ = run(&mut engine, &mut doc);
    assert_eq!(sink.borrow().diagnostics.len(), 1);
    assert_eq!(sink.borrow().count(DiagnosticKind::TableDisplayOutsideTable), 1);
}

// ---------------------------------------------------------------------------
// Root reflow
// ---------------------------------------------------------------------------

#[test]
fn test_root_reflows_at_most_twice() {
    let mut doc = load(
        r#"{ "tag": "body", "attrs": { "id": "body" }, "style": "height: 50px; overflow-y: auto",
             "children": [ { "tag": "probe" } ] }"#,
    );
    let hooks = Rc::new(Cell::new(0));
    let counter = Rc::clone(&hooks);
    let body = doc.find_by_id("body").unwrap();
    doc.set_layout_hook(move |node, _| {
        if node == body {
            counter.set(counter.get() + 1);
        }
    });

    let (probe, visits) = Probe::new(1000.0);
    let mut engine = LayoutEngine::default();
    engine.register_special(probe);
    let overflow = run(&mut engine, &mut doc);

    assert_eq!(visits.borrow().len(), MAX_ROOT_ATTEMPTS);
    assert_eq!(hooks.get(), 1);
    let geometry = geometry(&doc, "body");
    assert!(approx(geometry.scrollbar_width, 16.0));
    assert!(approx(geometry.content.height, 50.0));
    assert!(approx(overflow.height, 1000.0));
}

#[test]
fn test_root_without_overflow_is_laid_out_once() {
    let mut doc = load(r#"{ "tag": "body", "children": [ { "tag": "probe" } ] }"#);
    let (probe, visits) = Probe::new(1000.0);
    let mut engine = LayoutEngine::default();
    engine.register_special(probe);
    let _ = run(&mut engine, &mut doc);
    assert_eq!(visits.borrow().len(), 1);
}

#[test]
fn test_inline_overflow_rewraps_in_narrower_box() {
    // Two lines overflow the 20px box, which retries with a scrollbar.
    let words = "abcde ".repeat(10);
    let json = format!(
        r#"{{ "tag": "body", "children": [
            {{ "tag": "div", "attrs": {{ "id": "box" }}, "style": "height: 20px; overflow-y: auto", "children": ["{words}", {{ "tag": "br" }}, "more"] }}
        ] }}"#
    );
    let mut doc = load(&json);
    let mut engine = LayoutEngine::default();
    let _ = run(&mut engine, &mut doc);

    let geometry = geometry(&doc, "box");
    assert!(approx(geometry.scrollbar_width, 16.0));
    assert!(approx(geometry.content.width, 784.0));
    assert!(approx(geometry.content.height, 20.0));
    assert!(approx(geometry.visible_overflow.height, 2.0 * 19.2));
}

// ---------------------------------------------------------------------------
// min-height / max-height across a retry
// ---------------------------------------------------------------------------

fn clamped(child_height: &str) -> Geometry {
    let json = format!(
        r#"{{ "tag": "body", "children": [
            {{ "tag": "div", "attrs": {{ "id": "box" }}, "style": "min-height: 40px; max-height: 60px; overflow-y: auto",
               "children": [ {{ "tag": "div", "style": "height: {child_height}" }} ] }}
        ] }}"#
    );
    let mut doc = load(&json);
    let mut engine = LayoutEngine::default();
    let _ = run(&mut engine, &mut doc);
    geometry(&doc, "box")
}

#[test]
fn test_min_height_applies_to_short_content() {
    let geometry = clamped("10px");
    assert!(approx(geometry.content.height, 40.0));
    assert!(approx(geometry.scrollbar_width, 0.0));
}

#[test]
fn test_content_at_max_height_does_not_scroll() {
    let geometry = clamped("60px");
    assert!(approx(geometry.content.height, 60.0));
    assert!(approx(geometry.scrollbar_width, 0.0));
    assert!(approx(geometry.content.width, 800.0));
}

#[test]
fn test_max_height_holds_after_scrollbar_retry() {
    let geometry = clamped("61px");
    assert!(approx(geometry.content.height, 60.0));
    assert!(approx(geometry.scrollbar_width, 16.0));
    assert!(approx(geometry.content.width, 784.0));
    assert!(approx(geometry.visible_overflow.height, 61.0));
}

// ---------------------------------------------------------------------------
// Idempotence
// ---------------------------------------------------------------------------

fn snapshot(doc: &StyledDocument) -> String {
    let all: Vec<Option<Geometry>> = (0..doc.tree().len())
        .map(|i| doc.geometry(NodeId(i)).copied())
        .collect();
    format!("{all:?}")
}

#[quickcheck]
fn test_layout_is_idempotent(width: u16, words: u8, float_width: u8, scroll: bool) -> bool {
    let width = f32::from(width % 1200 + 50);
    let text = "lorem ipsum ".repeat(usize::from(words % 40));
    let overflow = if scroll { "auto" } else { "visible" };
    let json = format!(
        r#"{{ "tag": "body", "style": "height: 80px; overflow-y: {overflow}", "children": [
            {{ "tag": "div", "style": "float: left; width: {float_width}px; height: 30px" }},
            {{ "tag": "p", "children": ["{text}", {{ "tag": "span", "style": "display: inline-block", "children": ["ib"] }}] }},
            {{ "tag": "div", "style": "position: absolute; right: 0px; bottom: 0px", "children": ["abs"] }},
            {{ "tag": "table", "children": [ {{ "tag": "tr", "children": [ {{ "tag": "td", "children": ["a"] }}, {{ "tag": "td" }} ] }} ] }}
        ] }}"#
    );
    let mut doc = load(&json);
    let root = doc.root_element().unwrap();
    let mut engine = LayoutEngine::default();

    let first_overflow = engine.layout(&mut doc, root, Size::new(width, 600.0)).unwrap();
    let first = snapshot(&doc);
    let second_overflow = engine.layout(&mut doc, root, Size::new(width, 600.0)).unwrap();
    let second = snapshot(&doc);

    let mut fresh = LayoutEngine::default();
    doc.clear_geometry();
    let _ = fresh.layout(&mut doc, root, Size::new(width, 600.0)).unwrap();
    let third = snapshot(&doc);

    first == second && second == third && first_overflow == second_overflow
}
