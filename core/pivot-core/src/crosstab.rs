//! FILENAME: core/pivot-core/src/crosstab.rs
//! Cross Table - the displayable grid.
//!
//! Turns the row and column drill trees plus the matrix into:
//! - columns: one per terminal column entry and indicator
//! - body rows: one per terminal row entry, with subtotal rows when
//!   summaries are on
//! - a pinned grand-total row (summaries only)
//!
//! Column sorting only reorders sibling group rows; subtotal rows and the
//! grand total keep their place.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::aggregate::AggregateValue;
use crate::comparator::{sort_ordering, stable_sort_by};
use crate::drill::{total_label_for, DrillNode};
use crate::matrix::PivotMatrix;
use crate::resolver::Indicator;
use crate::value::CellValue;

// ============================================================================
// GRID TYPES
// ============================================================================

/// What an axis entry (a row or a column group) stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    /// A group of the axis dimension.
    Group,
    /// Summary of an expanded group, placed after its children.
    Subtotal,
    /// Summary of the whole axis.
    GrandTotal,
}

/// A grid cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GridValue {
    /// No record falls into this row/column intersection.
    Absent,
    Value(AggregateValue),
}

impl GridValue {
    /// Comparator operand: a missing record and an absent value are null.
    pub fn to_cell_value(&self) -> CellValue {
        match self {
            GridValue::Absent => CellValue::Null,
            GridValue::Value(value) => value.to_cell_value(),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, GridValue::Absent)
    }
}

/// Orders grid cells with the cell comparator; two null-like cells tie.
pub fn compare_grid_values(a: &GridValue, b: &GridValue) -> Ordering {
    sort_ordering(&a.to_cell_value(), &b.to_cell_value())
}

/// One row or column group position on an axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisEntry {
    /// Key of the drill node whose matrix cells this entry reads.
    pub node_key: String,
    pub path: Vec<String>,
    /// Canonical group label, or the totals/subtotals label.
    pub label: String,
    pub depth: usize,
    pub kind: EntryKind,
}

/// A value column: a column entry crossed with an indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridColumn {
    pub entry: AxisEntry,
    /// Indicator (measure) code.
    pub code: String,
    /// Indicator display name.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridRow {
    pub entry: AxisEntry,
    /// Position in tree order, used to restore the unsorted layout.
    pub seq: usize,
    /// One value per table column.
    pub values: Vec<GridValue>,
}

impl GridRow {
    pub fn kind(&self) -> EntryKind {
        self.entry.kind
    }

    /// Path of the parent group; rows sharing it are siblings.
    fn parent_path(&self) -> &[String] {
        let path = &self.entry.path;
        &path[..path.len().saturating_sub(1)]
    }
}

/// Sort direction for [`CrossTable::sort_by_column`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
    /// Back to tree order.
    None,
}

/// Why a table shows no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmptyState {
    /// Nothing configured or no records at all.
    NoData,
    /// Columns exist but no row survived upstream filtering.
    FilterResultEmpty,
}

/// A body or total row with its 1-based serial number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayRow<'a> {
    pub serial: usize,
    pub row: &'a GridRow,
}

// ============================================================================
// CROSS TABLE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CrossTableOptions {
    /// Add subtotal entries and pin the grand-total row.
    pub is_summary: bool,
    /// When off, axes without groups contribute no total entry.
    pub render_enable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossTable {
    /// Field ids of the row header columns.
    pub row_codes: Vec<String>,
    pub columns: Vec<GridColumn>,
    pub body: Vec<GridRow>,
    /// Grand-total row pinned below the body.
    pub total_row: Option<GridRow>,
}

/// The table has something to show: there are flattened rows and at least
/// one axis produced groups.
pub fn render_enable(has_rows: bool, row_root: &DrillNode, column_root: &DrillNode) -> bool {
    has_rows && (!row_root.children().is_empty() || !column_root.children().is_empty())
}

/// Assembles the grid for wrapped row and column trees.
pub fn build_cross_table(
    row_root: &DrillNode,
    column_root: &DrillNode,
    matrix: &PivotMatrix,
    indicators: &[Indicator],
    row_codes: &[String],
    options: &CrossTableOptions,
) -> CrossTable {
    let row_entries = axis_entries(row_root, options);
    let column_entries = axis_entries(column_root, options);

    let columns: Vec<GridColumn> = column_entries
        .iter()
        .flat_map(|entry| {
            indicators.iter().map(move |indicator| GridColumn {
                entry: entry.clone(),
                code: indicator.code.clone(),
                name: indicator.name.clone(),
            })
        })
        .collect();

    let mut body: Vec<GridRow> = row_entries
        .into_iter()
        .enumerate()
        .map(|(seq, entry)| {
            let values = columns
                .iter()
                .map(|column| match matrix.get(&entry.node_key, &column.entry.node_key) {
                    Some(cell) => GridValue::Value(cell.value(&column.code)),
                    None => GridValue::Absent,
                })
                .collect();
            GridRow { entry, seq, values }
        })
        .collect();

    let total_row = if options.is_summary { body.pop() } else { None };

    CrossTable {
        row_codes: if options.render_enable {
            row_codes.to_vec()
        } else {
            Vec::new()
        },
        columns,
        body,
        total_row,
    }
}

/// Terminal entries of an axis in tree order. Expanded groups are followed
/// by a subtotal entry when summaries are on, the root by a grand total.
fn axis_entries(root: &DrillNode, options: &CrossTableOptions) -> Vec<AxisEntry> {
    let mut entries = Vec::new();
    for child in root.children() {
        push_entries(child, options.is_summary, &mut entries);
    }

    if entries.is_empty() {
        if options.render_enable {
            entries.push(entry_for(root, root.value.clone(), EntryKind::GrandTotal));
        }
    } else if options.is_summary {
        entries.push(entry_for(
            root,
            total_label_for(&root.path).to_string(),
            EntryKind::GrandTotal,
        ));
    }
    entries
}

fn push_entries(node: &DrillNode, is_summary: bool, out: &mut Vec<AxisEntry>) {
    if node.is_terminal() {
        out.push(entry_for(node, node.value.clone(), EntryKind::Group));
        return;
    }
    for child in node.children() {
        push_entries(child, is_summary, out);
    }
    if is_summary {
        out.push(entry_for(
            node,
            total_label_for(&node.path).to_string(),
            EntryKind::Subtotal,
        ));
    }
}

fn entry_for(node: &DrillNode, label: String, kind: EntryKind) -> AxisEntry {
    AxisEntry {
        node_key: node.key.clone(),
        path: node.path.to_vec(),
        label,
        depth: node.depth(),
        kind,
    }
}

impl CrossTable {
    /// Index of the first column for a column entry key and indicator code.
    pub fn column_index(&self, node_key: &str, code: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.entry.node_key == node_key && c.code == code)
    }

    /// Sorts sibling group rows by one column. Subtotal rows and the pinned
    /// grand total stay where they are; ties keep their current order.
    pub fn sort_by_column(&mut self, column: usize, order: SortOrder) {
        if column >= self.columns.len() && order != SortOrder::None {
            return;
        }

        let mut start = 0;
        while start < self.body.len() {
            if self.body[start].kind() != EntryKind::Group {
                start += 1;
                continue;
            }
            let mut end = start + 1;
            while end < self.body.len()
                && self.body[end].kind() == EntryKind::Group
                && self.body[end].parent_path() == self.body[start].parent_path()
            {
                end += 1;
            }

            let tail = self.body.split_off(end);
            let mut run = self.body.split_off(start);
            match order {
                SortOrder::Asc => stable_sort_by(&mut run, |a, b| {
                    compare_grid_values(&a.values[column], &b.values[column])
                }),
                SortOrder::Desc => stable_sort_by(&mut run, |a, b| {
                    compare_grid_values(&b.values[column], &a.values[column])
                }),
                SortOrder::None => stable_sort_by(&mut run, |a, b| a.seq.cmp(&b.seq)),
            }
            self.body.extend(run);
            self.body.extend(tail);
            start = end;
        }
    }

    /// Body rows followed by the grand total, numbered from 1.
    pub fn display_rows(&self) -> Vec<DisplayRow<'_>> {
        self.body
            .iter()
            .chain(self.total_row.iter())
            .enumerate()
            .map(|(i, row)| DisplayRow { serial: i + 1, row })
            .collect()
    }

    pub fn row_count(&self) -> usize {
        self.body.len() + usize::from(self.total_row.is_some())
    }

    /// Which placeholder to show, if any.
    pub fn empty_state(&self) -> Option<EmptyState> {
        if self.row_count() > 0 {
            return None;
        }
        if self.columns.is_empty() && self.row_codes.is_empty() {
            Some(EmptyState::NoData)
        } else {
            Some(EmptyState::FilterResultEmpty)
        }
    }
}
