//! Table formatting.
//!
//! [§ 17 Tables](https://www.w3.org/TR/CSS2/tables.html)
//!
//! The table algorithm sits behind [`TableFormatter`]: the engine admits the
//! table element as a block child, then hands the admitted context over and
//! expects the same close result a block would give.
//!
//! [`GridTableFormatter`] is the default:
//! - `table-row` children, directly or inside row groups
//! - consecutive `table-cell` children of the table form an anonymous row
//! - header groups first, footer groups last
//! - fixed cell widths fix their column, the rest is shared equally
//! - a fixed border spacing from [`crate::LayoutConfig`]
//!
//! Not implemented: `colspan`/`rowspan`, `border-collapse`, captions,
//! `vertical-align` in cells.

use boxflow_dom::NodeId;

use super::block::CloseResult;
use super::box_builder::{BlockBox, standalone_box};
use super::box_model::{Geometry, Point, Size};
use super::engine::LayoutEngine;
use super::pool::BlockId;
use super::values::UNBOUNDED;
use crate::document::StyledDocument;
use crate::style::DisplayValue;

/// The black-box table algorithm.
pub trait TableFormatter {
    /// Lay out the contents of `element`, whose block context `table` has
    /// already been admitted, and close that context.
    ///
    /// On [`CloseResult::RetrySelf`] the engine resets `table` and calls this
    /// again from scratch, once.
    fn format_table(
        &self,
        engine: &mut LayoutEngine,
        doc: &mut StyledDocument,
        table: BlockId,
        element: NodeId,
    ) -> CloseResult;
}

/// Equal-width column grid with separated borders.
#[derive(Debug, Default, Clone, Copy)]
pub struct GridTableFormatter;

#[derive(Debug, Default)]
struct TableRow {
    element: Option<NodeId>,
    cells: Vec<NodeId>,
}

#[derive(Debug)]
struct RowGroup {
    element: Option<NodeId>,
    rows: Vec<TableRow>,
}

impl TableFormatter for GridTableFormatter {
    fn format_table(
        &self,
        engine: &mut LayoutEngine,
        doc: &mut StyledDocument,
        table: BlockId,
        element: NodeId,
    ) -> CloseResult {
        let spacing = engine.config().table_border_spacing;
        let table_width = engine.block(table).available_width();

        // STEP 1: Table structure.
        // [§ 17.2.1 Anonymous table objects](https://www.w3.org/TR/CSS2/tables.html#anonymous-boxes)
        let groups = collect_row_groups(engine, doc, table, element);
        let rows: Vec<&TableRow> = groups.iter().flat_map(|g| &g.rows).collect();
        let columns = rows.iter().map(|r| r.cells.len()).max().unwrap_or(0);

        // STEP 2: Column widths.
        let widths = column_widths(doc, &rows, columns, table_width, spacing);

        // STEP 3: Lay out each cell in its column and find the row heights.
        let mut laid_out: Vec<Vec<Geometry>> = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut cells = Vec::with_capacity(row.cells.len());
            for (&cell, &width) in row.cells.iter().zip(&widths) {
                let containing_block = Size::new(width, UNBOUNDED);
                let style = doc.style(cell).clone();
                let block_box: BlockBox = standalone_box(containing_block, &style);
                cells.push(engine.format_standalone_box(doc, cell, containing_block, block_box));
            }
            laid_out.push(cells);
        }

        // STEP 4: Place cells, stretched to their row.
        // [§ 17.5.3 Table height algorithms](https://www.w3.org/TR/CSS2/tables.html#height-layout)
        //
        // "The height of a 'table-row' element's box is calculated once the
        // user agent has all the cells in the row available: it is the
        // maximum of the row's computed 'height', the computed 'height' of
        // each cell in the row, and the minimum height (MIN) required by
        // the cells."
        let mut y = spacing;
        let mut row_tops = Vec::with_capacity(rows.len());
        for (row, cells) in rows.iter().zip(&mut laid_out) {
            let height = cells
                .iter()
                .map(|g| g.margin_box().height)
                .fold(0.0_f32, f32::max);
            let mut x = spacing;
            for ((&cell, geometry), &width) in row.cells.iter().zip(cells.iter_mut()).zip(&widths) {
                let frame = geometry.margin.vertical()
                    + geometry.padding.vertical()
                    + geometry.border.vertical();
                geometry.content.height = geometry.content.height.max(height - frame);
                geometry.visible_overflow = geometry.visible_overflow.max(geometry.content);
                geometry.offset = Point::new(x + geometry.margin.left, y + geometry.margin.top);
                geometry.containing_block = Some(element);
                engine.block_mut(table).include_geometry(geometry, true);
                doc.set_geometry(cell, *geometry);
                doc.notify_layout(cell);
                x += width + spacing;
            }
            row_tops.push((y, height));
            y += height + spacing;
        }
        let content_height = if rows.is_empty() { 0.0 } else { y };

        // STEP 5: Rows and row groups get boxes spanning their cells.
        let inner = Size::new((table_width - 2.0 * spacing).max(0.0), 0.0);
        let mut index = 0;
        for group in &groups {
            let first = row_tops.get(index).copied().filter(|_| !group.rows.is_empty());
            for row in &group.rows {
                let (top, height) = row_tops[index];
                index += 1;
                if let Some(node) = row.element {
                    set_band(doc, node, element, Point::new(spacing, top), Size::new(inner.width, height));
                }
            }
            if let (Some(node), Some((top, _))) = (group.element, first) {
                let (last_top, last_height) = row_tops[index - 1];
                let band = Size::new(inner.width, last_top + last_height - top);
                set_band(doc, node, element, Point::new(spacing, top), band);
            }
        }

        // STEP 6: Close like any block.
        log::trace!(
            target: "boxflow::layout",
            "table {element:?}: {} rows x {columns} columns, height {content_height}",
            rows.len()
        );
        engine
            .block_mut(table)
            .reserve_content(Size::new(table_width, content_height));
        engine.close_block(doc, table)
    }
}

fn collect_row_groups(
    engine: &mut LayoutEngine,
    doc: &mut StyledDocument,
    table: BlockId,
    element: NodeId,
) -> Vec<RowGroup> {
    let mut head = Vec::new();
    let mut body = Vec::new();
    let mut foot = Vec::new();
    let mut anonymous: Option<TableRow> = None;

    let count = doc.tree().child_count(element);
    for index in 0..count {
        let Some(child) = doc.tree().child(element, index) else {
            break;
        };
        let style = doc.style(child);
        let display = style.display;
        let out_of_flow = style.position.is_out_of_flow();

        if display == DisplayValue::TableCell && !out_of_flow {
            anonymous.get_or_insert_with(TableRow::default).cells.push(child);
            continue;
        }
        if let Some(row) = anonymous.take() {
            body.push(RowGroup {
                element: None,
                rows: vec![row],
            });
        }

        match display {
            DisplayValue::None => {}
            _ if out_of_flow => {
                let _ = engine.format_element(doc, table, child);
            }
            DisplayValue::TableRow => body.push(RowGroup {
                element: None,
                rows: vec![collect_row(doc, child)],
            }),
            DisplayValue::TableHeaderGroup => head.push(collect_group(doc, child)),
            DisplayValue::TableFooterGroup => foot.push(collect_group(doc, child)),
            DisplayValue::TableRowGroup => body.push(collect_group(doc, child)),
            _ => log::trace!(target: "boxflow::layout", "skipping {child:?}: not a table part"),
        }
    }
    if let Some(row) = anonymous {
        body.push(RowGroup {
            element: None,
            rows: vec![row],
        });
    }

    head.extend(body);
    head.extend(foot);
    head
}

fn collect_group(doc: &StyledDocument, group: NodeId) -> RowGroup {
    let rows = doc
        .tree()
        .children(group)
        .iter()
        .filter(|&&child| doc.style(child).display == DisplayValue::TableRow)
        .map(|&row| collect_row(doc, row))
        .collect();
    RowGroup {
        element: Some(group),
        rows,
    }
}

fn collect_row(doc: &StyledDocument, row: NodeId) -> TableRow {
    let cells = doc
        .tree()
        .children(row)
        .iter()
        .copied()
        .filter(|&child| doc.style(child).display == DisplayValue::TableCell)
        .collect();
    TableRow {
        element: Some(row),
        cells,
    }
}

/// [§ 17.5.2 Table width algorithms](https://www.w3.org/TR/CSS2/tables.html#width-layout)
///
/// A column with a fixed-width cell is as wide as its widest such cell;
/// the other columns share what is left equally.
#[allow(clippy::cast_precision_loss)]
fn column_widths(
    doc: &StyledDocument,
    rows: &[&TableRow],
    columns: usize,
    table_width: f32,
    spacing: f32,
) -> Vec<f32> {
    let available = (table_width - spacing * (columns as f32 + 1.0)).max(0.0);
    let basis = Size::new(available, UNBOUNDED);

    let mut fixed: Vec<Option<f32>> = vec![None; columns];
    for row in rows {
        for (column, &cell) in row.cells.iter().enumerate() {
            let style = doc.style(cell);
            if style.width.is_auto() {
                continue;
            }
            let dims = standalone_box(basis, style).dims;
            let width = dims.content_width.to_px_or(0.0)
                + dims.horizontal_frame()
                + dims.margin.horizontal();
            let slot = &mut fixed[column];
            *slot = Some(slot.map_or(width, |w| w.max(width)));
        }
    }

    let fixed_total: f32 = fixed.iter().flatten().sum();
    let auto_columns = fixed.iter().filter(|w| w.is_none()).count();
    let share = if auto_columns == 0 {
        0.0
    } else {
        (available - fixed_total).max(0.0) / auto_columns as f32
    };
    fixed.into_iter().map(|w| w.unwrap_or(share)).collect()
}

fn set_band(doc: &mut StyledDocument, node: NodeId, table: NodeId, offset: Point, size: Size) {
    let geometry = Geometry {
        containing_block: Some(table),
        offset,
        content: size,
        visible_overflow: size,
        ..Geometry::default()
    };
    doc.set_geometry(node, geometry);
    doc.notify_layout(node);
}
