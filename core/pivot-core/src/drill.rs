//! FILENAME: core/pivot-core/src/drill.rs
//! Drill Tree Builder - hierarchical grouping of flattened rows.
//!
//! Rows are grouped level by level on the axis codes. Siblings keep the
//! order in which their label was first seen, then are sorted with the
//! comparator on the parsed label. Every node carries its full path and a
//! key that encodes that path, so matrix lookups can go straight from a
//! node to its cells.

use rustc_hash::FxHashMap;
use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;

use crate::comparator::{compare, stable_sort_by};
use crate::definition::SortType;
use crate::error::{PivotError, PivotResult};
use crate::logging::CAT_DRILL;
use crate::resolver::{FlattenedRow, NULL_LABEL};
use crate::value::CellValue;
use crate::{log_debug, log_warn};

/// Label of the grand-total node.
pub const TOTALS_LABEL: &str = "Totals";

/// Label of subtotal rows and columns.
pub const SUBTOTALS_LABEL: &str = "Subtotals";

/// Labels from the root down to a node.
pub type DrillPath = SmallVec<[String; 4]>;

// ============================================================================
// NODES
// ============================================================================

/// Children of a drill node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DrillChildren {
    Materialized(Vec<DrillNode>),
    /// Not expanded. `has_child` tells whether expanding would yield groups;
    /// leaves of the deepest level are `Collapsed { has_child: false }`.
    Collapsed { has_child: bool },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrillNode {
    /// `encode_path(&path)`.
    pub key: String,
    /// Canonical label of this group (or the totals label for the root).
    pub value: String,
    pub path: DrillPath,
    pub children: DrillChildren,
}

impl DrillNode {
    /// Materialized children; empty for collapsed nodes.
    pub fn children(&self) -> &[DrillNode] {
        match &self.children {
            DrillChildren::Materialized(children) => children,
            DrillChildren::Collapsed { .. } => &[],
        }
    }

    /// Whether the node has (or would have) sub-groups.
    pub fn has_child(&self) -> bool {
        match &self.children {
            DrillChildren::Materialized(children) => !children.is_empty(),
            DrillChildren::Collapsed { has_child } => *has_child,
        }
    }

    /// No materialized children: cells of this node aggregate raw rows.
    pub fn is_terminal(&self) -> bool {
        self.children().is_empty()
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Looks a node up by key in this subtree.
    pub fn find(&self, key: &str) -> Option<&DrillNode> {
        if self.key == key {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(key))
    }

    /// Terminal nodes of this subtree in tree order.
    pub fn leaves(&self) -> Vec<&DrillNode> {
        let mut out = Vec::new();
        collect_leaves(self, &mut out);
        out
    }
}

fn collect_leaves<'a>(node: &'a DrillNode, out: &mut Vec<&'a DrillNode>) {
    if node.is_terminal() {
        out.push(node);
    } else {
        for child in node.children() {
            collect_leaves(child, out);
        }
    }
}

// ============================================================================
// PATH KEYS
// ============================================================================

/// Encodes a path as a JSON array of labels. The empty path is `[]`.
pub fn encode_path(path: &[String]) -> String {
    Value::from(path.to_vec()).to_string()
}

pub fn decode_path(key: &str) -> PivotResult<DrillPath> {
    serde_json::from_str::<Vec<String>>(key)
        .map(DrillPath::from_vec)
        .map_err(|_| PivotError::InvalidPathKey(key.to_string()))
}

/// `"Totals"` for the root path, `"Subtotals"` otherwise.
pub fn total_label_for(path: &[String]) -> &'static str {
    if path.is_empty() {
        TOTALS_LABEL
    } else {
        SUBTOTALS_LABEL
    }
}

/// Parses a canonical label for ordering. Malformed labels fall back to
/// their raw text.
pub fn parse_label(label: &str) -> CellValue {
    match CellValue::parse_canonical(label) {
        Ok(value) => value,
        Err(err) => {
            log_warn!(CAT_DRILL, "label {:?} is not canonical ({}), sorting as text", label, err);
            CellValue::Text(label.to_string())
        }
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Options for [`build_drill_tree`].
pub struct DrillTreeOptions {
    pub total_label: String,
    /// Wrap the forest in a single root node with the empty path.
    pub include_top_wrapper: bool,
    /// Decides per node key whether to expand it. `None` expands everything.
    pub is_expand: Option<Box<dyn Fn(&str) -> bool>>,
    /// Always expand the root regardless of `is_expand`.
    pub enforce_expand_total_node: bool,
    pub sort_type: SortType,
}

impl Default for DrillTreeOptions {
    fn default() -> Self {
        DrillTreeOptions {
            total_label: TOTALS_LABEL.to_string(),
            include_top_wrapper: false,
            is_expand: None,
            enforce_expand_total_node: true,
            sort_type: SortType::Asc,
        }
    }
}

impl DrillTreeOptions {
    pub fn wrapped(sort_type: SortType) -> Self {
        DrillTreeOptions {
            include_top_wrapper: true,
            sort_type,
            ..Default::default()
        }
    }

    pub fn with_expand<F>(mut self, is_expand: F) -> Self
    where
        F: Fn(&str) -> bool + 'static,
    {
        self.is_expand = Some(Box::new(is_expand));
        self
    }

    fn expands(&self, key: &str) -> bool {
        self.is_expand.as_ref().map_or(true, |f| f(key))
    }
}

/// Groups rows into a drill tree over `codes` (outer to inner).
pub fn build_drill_tree(
    rows: &[FlattenedRow],
    codes: &[String],
    options: &DrillTreeOptions,
) -> Vec<DrillNode> {
    let empty_path = DrillPath::new();
    let total_key = encode_path(&empty_path);

    let children = if codes.is_empty() {
        DrillChildren::Materialized(Vec::new())
    } else if !options.enforce_expand_total_node && !options.expands(&total_key) {
        DrillChildren::Collapsed {
            has_child: !rows.is_empty(),
        }
    } else {
        let slice: Vec<&FlattenedRow> = rows.iter().collect();
        let mut path = DrillPath::new();
        DrillChildren::Materialized(group_level(&slice, codes, &mut path, options))
    };

    log_debug!(
        CAT_DRILL,
        "grouped {} rows over {:?}",
        rows.len(),
        codes
    );

    if !options.include_top_wrapper {
        return match children {
            DrillChildren::Materialized(forest) => forest,
            DrillChildren::Collapsed { .. } => Vec::new(),
        };
    }

    vec![DrillNode {
        key: total_key,
        value: options.total_label.clone(),
        path: empty_path,
        children,
    }]
}

fn group_level(
    slice: &[&FlattenedRow],
    codes: &[String],
    path: &mut DrillPath,
    options: &DrillTreeOptions,
) -> Vec<DrillNode> {
    let depth = path.len();
    let code = &codes[depth];

    let mut order: FxHashMap<&str, usize> = FxHashMap::default();
    let mut groups: Vec<(&str, Vec<&FlattenedRow>)> = Vec::new();
    for &row in slice {
        let label = row.label(code).unwrap_or(NULL_LABEL);
        match order.get(label) {
            Some(&idx) => groups[idx].1.push(row),
            None => {
                order.insert(label, groups.len());
                groups.push((label, vec![row]));
            }
        }
    }

    let mut nodes = Vec::with_capacity(groups.len());
    for (label, group) in groups {
        path.push(label.to_string());
        let key = encode_path(path);

        let children = if depth + 1 < codes.len() && !group.is_empty() {
            if options.expands(&key) {
                DrillChildren::Materialized(group_level(&group, codes, path, options))
            } else {
                DrillChildren::Collapsed { has_child: true }
            }
        } else {
            DrillChildren::Collapsed { has_child: false }
        };

        nodes.push(DrillNode {
            key,
            value: label.to_string(),
            path: path.clone(),
            children,
        });
        path.pop();
    }

    sort_siblings(nodes, options.sort_type)
}

fn sort_siblings(nodes: Vec<DrillNode>, sort_type: SortType) -> Vec<DrillNode> {
    if sort_type == SortType::None {
        return nodes;
    }
    let mut keyed: Vec<(CellValue, DrillNode)> = nodes
        .into_iter()
        .map(|node| (parse_label(&node.value), node))
        .collect();
    stable_sort_by(&mut keyed, |a, b| match sort_type {
        SortType::Desc => compare(&b.0, &a.0),
        _ => compare(&a.0, &b.0),
    });
    keyed.into_iter().map(|(_, node)| node).collect()
}
