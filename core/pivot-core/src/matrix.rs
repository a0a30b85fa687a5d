//! FILENAME: core/pivot-core/src/matrix.rs
//! Record Matrix - aggregated cells keyed by (row path, column path).
//!
//! Cells at a pair of terminal nodes aggregate the raw rows that fall into
//! both groups. Every other cell combines the partials of the cells one
//! level below it, so each record is folded exactly once.

use rustc_hash::FxHashMap;

use crate::aggregate::{AggregateFunction, AggregateValue, MeasureResult};
use crate::drill::{encode_path, DrillNode};
use crate::{log_debug, log_warn};
use crate::logging::CAT_PIVOT;
use crate::resolver::{FlattenedRow, NULL_LABEL};

/// Aggregated cells: row key -> column key -> measures.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PivotMatrix {
    cells: FxHashMap<String, FxHashMap<String, MeasureResult>>,
}

impl PivotMatrix {
    pub fn new() -> Self {
        PivotMatrix::default()
    }

    /// The cell for a (row key, column key) pair. `None` when no record
    /// falls into both groups.
    pub fn get(&self, row_key: &str, column_key: &str) -> Option<&MeasureResult> {
        self.cells.get(row_key)?.get(column_key)
    }

    /// Finished value of one measure in one cell; `None` when the cell
    /// does not exist.
    pub fn value(&self, row_key: &str, column_key: &str, measure_id: &str) -> Option<AggregateValue> {
        self.get(row_key, column_key).map(|cell| cell.value(measure_id))
    }

    pub fn insert(&mut self, row_key: &str, column_key: &str, cell: MeasureResult) {
        self.cells
            .entry(row_key.to_string())
            .or_default()
            .insert(column_key.to_string(), cell);
    }

    /// Number of populated cells.
    pub fn len(&self) -> usize {
        self.cells.values().map(FxHashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Builds the matrix for prebuilt row and column drill trees.
pub fn build_record_matrix(
    rows: &[FlattenedRow],
    row_tree: &[DrillNode],
    row_codes: &[String],
    column_tree: &[DrillNode],
    column_codes: &[String],
    aggregate: &AggregateFunction,
) -> PivotMatrix {
    let row_index = index_nodes(row_tree);
    let column_index = index_nodes(column_tree);

    // Phase 1: raw rows into terminal cells.
    let mut buckets: FxHashMap<(&str, &str), Vec<&FlattenedRow>> = FxHashMap::default();
    let mut order: Vec<(&str, &str)> = Vec::new();
    for row in rows {
        let located = (
            locate_terminal(row, row_codes, &row_index),
            locate_terminal(row, column_codes, &column_index),
        );
        let (Some(row_key), Some(column_key)) = located else {
            log_warn!(CAT_PIVOT, "row does not map to a drill node, skipped");
            continue;
        };
        buckets
            .entry((row_key, column_key))
            .or_insert_with(|| {
                order.push((row_key, column_key));
                Vec::new()
            })
            .push(row);
    }

    let mut matrix = PivotMatrix::new();
    for key in &order {
        if let Some(slice) = buckets.get(key) {
            matrix.insert(key.0, key.1, aggregate.aggregate_leaves(slice));
        }
    }

    // Phase 2: combine upwards, children before parents on both axes.
    let row_nodes = post_order(row_tree);
    let column_nodes = post_order(column_tree);
    for row_node in &row_nodes {
        for column_node in &column_nodes {
            if row_node.is_terminal() && column_node.is_terminal() {
                continue;
            }
            let cell = if !row_node.is_terminal() {
                let partials: Vec<&MeasureResult> = row_node
                    .children()
                    .iter()
                    .filter_map(|child| matrix.get(&child.key, &column_node.key))
                    .collect();
                combine(aggregate, &partials)
            } else {
                let partials: Vec<&MeasureResult> = column_node
                    .children()
                    .iter()
                    .filter_map(|child| matrix.get(&row_node.key, &child.key))
                    .collect();
                combine(aggregate, &partials)
            };
            if let Some(cell) = cell {
                matrix.insert(&row_node.key, &column_node.key, cell);
            }
        }
    }

    log_debug!(
        CAT_PIVOT,
        "matrix: {} rows into {} leaf cells, {} cells total",
        rows.len(),
        order.len(),
        matrix.len()
    );
    matrix
}

fn combine(aggregate: &AggregateFunction, partials: &[&MeasureResult]) -> Option<MeasureResult> {
    if partials.is_empty() {
        None
    } else {
        Some(aggregate.combine_partials(partials))
    }
}

fn index_nodes(forest: &[DrillNode]) -> FxHashMap<&str, &DrillNode> {
    post_order(forest)
        .into_iter()
        .map(|node| (node.key.as_str(), node))
        .collect()
}

fn post_order(forest: &[DrillNode]) -> Vec<&DrillNode> {
    fn visit<'a>(node: &'a DrillNode, out: &mut Vec<&'a DrillNode>) {
        for child in node.children() {
            visit(child, out);
        }
        out.push(node);
    }
    let mut out = Vec::new();
    for node in forest {
        visit(node, &mut out);
    }
    out
}

/// Key of the shallowest terminal node on the row's label path.
fn locate_terminal<'a>(
    row: &FlattenedRow,
    codes: &[String],
    index: &FxHashMap<&'a str, &'a DrillNode>,
) -> Option<&'a str> {
    let mut prefix: Vec<String> = Vec::with_capacity(codes.len());
    for depth in 0..=codes.len() {
        if let Some(&node) = index.get(encode_path(&prefix).as_str()) {
            if node.is_terminal() {
                return Some(node.key.as_str());
            }
        }
        if let Some(code) = codes.get(depth) {
            prefix.push(row.label(code).unwrap_or(NULL_LABEL).to_string());
        }
    }
    None
}
