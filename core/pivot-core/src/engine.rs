//! FILENAME: core/pivot-core/src/engine.rs
//! Pivot Engine - runs the whole pipeline for one configuration.
//!
//! Algorithm:
//! 1. Validate the configuration and resolve it against field metadata
//! 2. Flatten records into pivot rows
//! 3. Build the row and column drill trees (both wrapped in a totals root)
//! 4. Aggregate the matrix: leaf cells from rows, the rest from partials
//! 5. Assemble the cross table
//!
//! Everything is rebuilt from scratch on every call.

use serde::Serialize;

use crate::aggregate::AggregateFunction;
use crate::crosstab::{build_cross_table, render_enable, CrossTable, CrossTableOptions, EmptyState};
use crate::definition::{FieldMeta, PivotConfig};
use crate::drill::{build_drill_tree, DrillNode, DrillTreeOptions};
use crate::error::PivotResult;
use crate::{log_debug, log_info};
use crate::logging::CAT_PIVOT;
use crate::matrix::{build_record_matrix, PivotMatrix};
use crate::render::{render_axis_label, render_measure};
use crate::resolver::{DimensionResolver, FlattenedRow, Indicator, Record};

// ============================================================================
// OUTPUT
// ============================================================================

/// Everything one calculation produces.
#[derive(Debug, Clone, Default)]
pub struct PivotOutput {
    pub rows: Vec<FlattenedRow>,
    pub row_tree: Vec<DrillNode>,
    pub column_tree: Vec<DrillNode>,
    pub matrix: PivotMatrix,
    pub table: CrossTable,
    pub indicators: Vec<Indicator>,
    /// Fields of the resolved row axis, outer to inner.
    pub row_fields: Vec<FieldMeta>,
    /// Fields of the resolved column axis, outer to inner.
    pub column_fields: Vec<FieldMeta>,
}

/// A body or total row rendered to text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedRow {
    pub serial: usize,
    pub label: String,
    pub cells: Vec<String>,
}

impl PivotOutput {
    pub fn row_root(&self) -> Option<&DrillNode> {
        self.row_tree.first()
    }

    pub fn column_root(&self) -> Option<&DrillNode> {
        self.column_tree.first()
    }

    pub fn empty_state(&self) -> Option<EmptyState> {
        self.table.empty_state()
    }

    /// Header text of every table column.
    pub fn column_titles(&self) -> Vec<String> {
        self.table
            .columns
            .iter()
            .map(|column| {
                let field = column
                    .entry
                    .depth
                    .checked_sub(1)
                    .and_then(|d| self.column_fields.get(d));
                let entry = match field {
                    Some(field) => render_axis_label(&column.entry.label, field),
                    None => column.entry.label.clone(),
                };
                format!("{} / {}", entry, column.name)
            })
            .collect()
    }

    /// Display rows (body then grand total) rendered to text.
    pub fn render_rows(&self) -> Vec<RenderedRow> {
        self.table
            .display_rows()
            .into_iter()
            .map(|display| {
                let entry = &display.row.entry;
                let field = entry.depth.checked_sub(1).and_then(|d| self.row_fields.get(d));
                let label = match field {
                    Some(field) => render_axis_label(&entry.label, field),
                    None => entry.label.clone(),
                };
                let cells = display
                    .row
                    .values
                    .iter()
                    .zip(&self.table.columns)
                    .map(|(value, column)| {
                        self.indicators
                            .iter()
                            .find(|ind| ind.code == column.code)
                            .map_or_else(String::new, |ind| render_measure(value, ind))
                    })
                    .collect();
                RenderedRow {
                    serial: display.serial,
                    label,
                    cells,
                }
            })
            .collect()
    }
}

// ============================================================================
// CALCULATOR
// ============================================================================

struct PivotCalculator<'a> {
    config: &'a PivotConfig,
    resolver: DimensionResolver,
}

impl<'a> PivotCalculator<'a> {
    fn new(config: &'a PivotConfig, fields: &[FieldMeta]) -> Self {
        PivotCalculator {
            config,
            resolver: DimensionResolver::new(config, fields),
        }
    }

    fn calculate<R: Record>(&self, records: &[R]) -> PivotOutput {
        if !self.resolver.is_valid() {
            log_info!(CAT_PIVOT, "no resolvable axis or measure, producing an empty pivot");
        }
        let rows = self.resolver.flatten(records);
        let indicators = self.resolver.indicators();
        let row_codes = self.resolver.row_codes();
        let column_codes = self.resolver.column_codes();
        let options = &self.config.more;

        let row_tree = build_drill_tree(&rows, &row_codes, &DrillTreeOptions::wrapped(options.row_sort_type));
        let column_tree = build_drill_tree(
            &rows,
            &column_codes,
            &DrillTreeOptions::wrapped(options.column_sort_type),
        );

        let aggregate = AggregateFunction::for_measures(self.resolver.measures());
        let matrix = build_record_matrix(
            &rows,
            &row_tree,
            &row_codes,
            &column_tree,
            &column_codes,
            &aggregate,
        );

        let table = match (row_tree.first(), column_tree.first()) {
            (Some(row_root), Some(column_root)) => {
                let table_options = CrossTableOptions {
                    is_summary: options.is_summary,
                    render_enable: render_enable(!rows.is_empty(), row_root, column_root),
                };
                build_cross_table(
                    row_root,
                    column_root,
                    &matrix,
                    &indicators,
                    &row_codes,
                    &table_options,
                )
            }
            _ => CrossTable::default(),
        };

        log_debug!(
            CAT_PIVOT,
            "pivot: {} records -> {} rows, {} columns x {} body rows",
            records.len(),
            rows.len(),
            table.columns.len(),
            table.body.len()
        );

        PivotOutput {
            rows,
            row_tree,
            column_tree,
            matrix,
            table,
            indicators,
            row_fields: self.resolver.row_axes().iter().map(|a| a.field.clone()).collect(),
            column_fields: self.resolver.column_axes().iter().map(|a| a.field.clone()).collect(),
        }
    }
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Calculates a pivot for the given records.
///
/// Fails only when the configuration exceeds the dimension limits. A
/// configuration that resolves to no axis or no measure yields an empty
/// output.
pub fn calculate_pivot<R: Record>(
    records: &[R],
    fields: &[FieldMeta],
    config: &PivotConfig,
) -> PivotResult<PivotOutput> {
    config.validate()?;
    let calculator = PivotCalculator::new(config, fields);
    Ok(calculator.calculate(records))
}
