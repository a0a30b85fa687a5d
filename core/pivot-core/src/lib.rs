//! FILENAME: core/pivot-core/src/lib.rs
//! Pivot aggregation core.
//!
//! Turns a flat list of records plus a row/column/value configuration into
//! drill-down trees, an aggregated lookup matrix and a cross-tabulated grid.
//!
//! Layers:
//! - `definition`: Serializable configuration (what the pivot IS)
//! - `resolver`: Records flattened into canonical pivot rows
//! - `drill` / `matrix`: Grouping and aggregation (HOW we compute)
//! - `crosstab` / `render`: Displayable grid (WHAT we display)
//! - `engine`: The pipeline tying it together

pub mod logging;
pub mod aggregate;
pub mod comparator;
pub mod crosstab;
pub mod definition;
pub mod drill;
pub mod engine;
pub mod error;
pub mod matrix;
pub mod render;
pub mod resolver;
pub mod value;

pub use aggregate::{
    aggregate_leaves, combine_partials, Accumulator, AggregateFunction, AggregateValue,
    MeasureResult, StatType,
};
pub use comparator::{compare, sort_ordering, stable_sort_by};
pub use crosstab::{
    build_cross_table, compare_grid_values, CrossTable, CrossTableOptions, EmptyState, EntryKind,
    GridColumn, GridRow, GridValue, SortOrder,
};
pub use definition::*;
pub use drill::{
    build_drill_tree, decode_path, encode_path, total_label_for, DrillChildren, DrillNode,
    DrillPath, DrillTreeOptions, SUBTOTALS_LABEL, TOTALS_LABEL,
};
pub use engine::{calculate_pivot, PivotOutput, RenderedRow};
pub use error::{PivotError, PivotResult};
pub use matrix::{build_record_matrix, PivotMatrix};
pub use render::{render_axis_label, render_measure, PLACEHOLDER};
pub use resolver::{DimensionResolver, FlattenedRow, Indicator, MapRecord, Record, NULL_LABEL};
pub use value::{CellValue, Labeled};
