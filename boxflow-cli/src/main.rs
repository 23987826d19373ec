//! Boxflow CLI
//!
//! Lays out a JSON element tree and prints every box it produced.
//!
//! - `boxflow page.json`               # Box tree, viewport coordinates
//! - `boxflow --format json page.json` # Same, as JSON
//! - `RUST_LOG=boxflow=trace boxflow page.json` # Follow the layout passes

use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use boxflow_common::CollectingSink;
use boxflow_dom::{NodeId, NodeType};
use boxflow_layout::{LayoutConfig, LayoutEngine, Size, StyledDocument};
use clap::{Parser, ValueEnum};
use owo_colors::OwoColorize;
use serde_json::json;

/// Boxflow: block, inline, float and table layout for JSON element trees
#[derive(Parser, Debug)]
#[command(name = "boxflow")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Lay out a document in the default 800x600 viewport
    boxflow page.json

    # Inline document, wider viewport
    boxflow --width 1280 --json '{"tag": "body", "children": ["Hello"]}'

    # Machine-readable output with custom tunables
    boxflow --config layout.json --format json page.json
"#)]
struct Cli {
    /// Path to a JSON document
    #[arg(value_name = "FILE")]
    path: Option<PathBuf>,

    /// Parse the JSON document given on the command line instead
    #[arg(long, value_name = "JSON")]
    json: Option<String>,

    /// Viewport width
    #[arg(long, default_value = "800")]
    width: f32,

    /// Viewport height
    #[arg(long, default_value = "600")]
    height: f32,

    /// JSON file with engine tunables (scrollbar width, restart limit, ...)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Tree)]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Indented, colored box tree
    Tree,
    /// One JSON object per laid out node
    Json,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let text = load_source(&cli)?;
    let mut doc = StyledDocument::from_json(&text).context("invalid document")?;
    let config = match cli.config {
        Some(ref path) => LayoutConfig::load(path)?,
        None => LayoutConfig::default(),
    };

    let sink = Rc::new(RefCell::new(CollectingSink::new()));
    let mut engine = LayoutEngine::new(config).with_diagnostic_sink(Rc::clone(&sink));
    let root = doc
        .root_element()
        .context("document has no root element")?;
    let overflow = engine.layout(&mut doc, root, Size::new(cli.width, cli.height))?;
    log::info!(target: "boxflow::cli", "overflow {}x{}", overflow.width, overflow.height);

    let sink = sink.borrow();
    match cli.format {
        OutputFormat::Tree => {
            println!(
                "{}",
                format!("=== Layout ({}x{}) ===", cli.width, cli.height).bold()
            );
            print_node(&doc, root, 0);
            if !sink.diagnostics.is_empty() {
                println!("\n{}", "=== Diagnostics ===".bold());
                for diagnostic in &sink.diagnostics {
                    println!("  - {}", diagnostic.yellow());
                }
            }
        }
        OutputFormat::Json => {
            let boxes: Vec<_> = (0..doc.tree().len())
                .map(NodeId)
                .filter_map(|node| box_json(&doc, node))
                .collect();
            let diagnostics: Vec<_> = sink
                .diagnostics
                .iter()
                .map(|d| json!({ "code": d.kind.code(), "message": d.message }))
                .collect();
            let out = json!({
                "viewport": { "width": cli.width, "height": cli.height },
                "overflow": overflow,
                "boxes": boxes,
                "diagnostics": diagnostics,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }
    Ok(())
}

/// Document text from `--json` or the input file.
fn load_source(cli: &Cli) -> Result<String> {
    if let Some(ref json) = cli.json {
        Ok(json.clone())
    } else if let Some(ref path) = cli.path {
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
    } else {
        anyhow::bail!("expected a document path or --json")
    }
}

fn box_json(doc: &StyledDocument, node: NodeId) -> Option<serde_json::Value> {
    let geometry = doc.geometry(node)?;
    let border_box = doc.absolute_border_box(node)?;
    Some(json!({
        "node": node.0,
        "address": doc.address(node),
        "border_box": border_box,
        "content": geometry.content,
        "scrollbar_width": geometry.scrollbar_width,
        "visible_overflow": geometry.visible_overflow,
    }))
}

/// Print `node` and its descendants; nodes without a box are skipped
/// together with their subtree.
fn print_node(doc: &StyledDocument, node: NodeId, depth: usize) {
    let indent = "  ".repeat(depth);
    let Some(geometry) = doc.geometry(node) else {
        if doc.tree().as_element(node).is_some() {
            println!("{indent}{} {}", label(doc, node), "(no box)".dimmed());
        }
        return;
    };

    let rect = doc.absolute_border_box(node).unwrap_or_default();
    println!(
        "{indent}{} {}",
        label(doc, node),
        format!(
            "x={:.1} y={:.1} w={:.1} h={:.1}",
            rect.x, rect.y, rect.width, rect.height
        )
        .cyan()
    );
    if geometry.scrollbar_width > 0.0 {
        println!(
            "{indent}  {}",
            format!(
                "scrollbar {:.1}, overflow {:.1}x{:.1}",
                geometry.scrollbar_width,
                geometry.visible_overflow.width,
                geometry.visible_overflow.height
            )
            .dimmed()
        );
    }

    for &child in doc.tree().children(node) {
        print_node(doc, child, depth + 1);
    }
}

fn label(doc: &StyledDocument, node: NodeId) -> String {
    match doc.tree().get(node).map(|n| &n.node_type) {
        Some(NodeType::Element(data)) => {
            let id = data.id().map(|id| format!("#{id}")).unwrap_or_default();
            format!("<{}{id}>", data.tag_name).green().to_string()
        }
        Some(NodeType::Text(text)) => {
            let preview: String = text.chars().take(30).collect();
            let suffix = if text.chars().count() > 30 { "..." } else { "" };
            format!("Text(\"{}{}\")", preview.replace('\n', "\\n"), suffix)
        }
        Some(NodeType::Document) | None => format!("{node:?}"),
    }
}
