//! FILENAME: core/pivot-core/src/render.rs
//! Display text for axis labels and measure cells.

use crate::aggregate::{AggregateValue, StatType};
use crate::crosstab::GridValue;
use crate::definition::{DateTimeFormat, FieldMeta, FieldType};
use crate::drill::{SUBTOTALS_LABEL, TOTALS_LABEL};
use crate::resolver::{format_date, parse_datetime, Indicator};
use crate::value::{format_number, CellValue};

/// Shown for null groups and cells without records.
pub const PLACEHOLDER: &str = "-";

const CHECK_MARK: &str = "\u{2713}";

// ============================================================================
// AXIS LABELS
// ============================================================================

/// Renders a canonical axis label for a field.
pub fn render_axis_label(label: &str, field: &FieldMeta) -> String {
    if label == TOTALS_LABEL || label == SUBTOTALS_LABEL {
        return label.to_string();
    }
    let Ok(value) = CellValue::parse_canonical(label) else {
        return PLACEHOLDER.to_string();
    };
    if value.is_null() || (is_split_type(field.entity_type) && is_empty_list(&value)) {
        return PLACEHOLDER.to_string();
    }
    if field.entity_type == FieldType::Checkbox {
        return if value.is_truthy() {
            CHECK_MARK.to_string()
        } else {
            String::new()
        };
    }
    joined_text(&value)
}

fn is_split_type(field_type: FieldType) -> bool {
    matches!(
        field_type,
        FieldType::Member | FieldType::MultiSelect | FieldType::MagicLink | FieldType::MagicLookUp
    )
}

fn is_empty_list(value: &CellValue) -> bool {
    matches!(value, CellValue::List(items) if items.is_empty())
}

/// Lists join their elements' text with ", "; objects show name or title.
fn joined_text(value: &CellValue) -> String {
    match value {
        CellValue::List(items) => items
            .iter()
            .map(CellValue::display_text)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.display_text(),
    }
}

// ============================================================================
// MEASURES
// ============================================================================

/// Renders a grid cell for its indicator.
pub fn render_measure(value: &GridValue, indicator: &Indicator) -> String {
    match value {
        GridValue::Absent => PLACEHOLDER.to_string(),
        GridValue::Value(value) => render_aggregate(value, indicator),
    }
}

fn render_aggregate(value: &AggregateValue, indicator: &Indicator) -> String {
    match value {
        AggregateValue::Absent => PLACEHOLDER.to_string(),
        AggregateValue::Text(text) => text.clone(),
        AggregateValue::Number(n) => {
            let is_date_extreme = matches!(indicator.stat_type, StatType::Max | StatType::Min)
                && indicator.field.as_ref().is_some_and(FieldMeta::is_datetime);
            if is_date_extreme {
                if let Some(dt) = parse_datetime(&CellValue::Number(*n)) {
                    return format_date(dt, DateTimeFormat::Day);
                }
            }
            format_number(*n)
        }
    }
}
