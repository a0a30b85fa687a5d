//! FILENAME: core/pivot-core/src/definition.rs
//! Pivot Definition - The serializable configuration.
//!
//! This module contains the types needed to DESCRIBE a pivot:
//! - field metadata supplied by the host data source
//! - the row/column/value dimension configuration
//! - display options (summary rows, per-axis sort order)
//!
//! These are immutable snapshots of user intent; everything derived from
//! them is rebuilt on each calculation.

use serde::{Deserialize, Serialize};

use crate::aggregate::StatType;
use crate::error::{PivotError, PivotResult};

/// Identifier of a field in the host data source.
pub type FieldId = String;

/// Synthetic value-dimension field id meaning "count every record".
pub const COUNT_ALL_FIELD_ID: &str = "fldCountAll";

/// Display name of count-all measures.
pub const COUNT_ALL_NAME: &str = "Record count";

/// Maximum number of row (and of column) dimensions.
pub const MAX_AXIS_DIMENSIONS: usize = 1;

/// Maximum number of value dimensions.
pub const MAX_VALUE_DIMENSIONS: usize = 3;

// ============================================================================
// FIELD METADATA
// ============================================================================

/// Declared type of a field in the host data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    SingleText,
    Text,
    Number,
    Currency,
    Percent,
    AutoNumber,
    Rating,
    DateTime,
    CreatedTime,
    LastModifiedTime,
    SingleSelect,
    MultiSelect,
    Checkbox,
    Member,
    CreatedBy,
    LastModifiedBy,
    MagicLink,
    MagicLookUp,
    Formula,
    Attachment,
    URL,
    Phone,
    Email,
    #[serde(other)]
    Other,
}

/// Coarse value category of a field's cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BasicValueType {
    String,
    Number,
    Boolean,
    DateTime,
    Array,
}

impl FieldType {
    /// Natural value category for a field of this type.
    pub fn basic_value_type(self) -> BasicValueType {
        match self {
            FieldType::Number
            | FieldType::Currency
            | FieldType::Percent
            | FieldType::AutoNumber
            | FieldType::Rating => BasicValueType::Number,
            FieldType::DateTime | FieldType::CreatedTime | FieldType::LastModifiedTime => {
                BasicValueType::DateTime
            }
            FieldType::Checkbox => BasicValueType::Boolean,
            FieldType::MultiSelect
            | FieldType::Member
            | FieldType::MagicLink
            | FieldType::MagicLookUp
            | FieldType::Attachment => BasicValueType::Array,
            _ => BasicValueType::String,
        }
    }

    pub fn is_datetime(self) -> bool {
        matches!(
            self,
            FieldType::DateTime | FieldType::CreatedTime | FieldType::LastModifiedTime
        )
    }

    pub fn is_text(self) -> bool {
        matches!(self, FieldType::SingleText | FieldType::Text)
    }
}

/// Metadata for one field, as reported by the host data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMeta {
    pub id: FieldId,

    /// Display name.
    pub name: String,

    /// Declared type.
    pub field_type: FieldType,

    /// Effective type after following lookup/formula indirection.
    pub entity_type: FieldType,

    pub basic_value_type: BasicValueType,
}

impl FieldMeta {
    /// A plain (non-lookup) field: the entity type is the declared type.
    pub fn new(id: impl Into<FieldId>, name: impl Into<String>, field_type: FieldType) -> Self {
        FieldMeta {
            id: id.into(),
            name: name.into(),
            field_type,
            entity_type: field_type,
            basic_value_type: field_type.basic_value_type(),
        }
    }

    /// A lookup or formula field resolving to `entity_type`.
    pub fn indirect(
        id: impl Into<FieldId>,
        name: impl Into<String>,
        field_type: FieldType,
        entity_type: FieldType,
        basic_value_type: BasicValueType,
    ) -> Self {
        FieldMeta {
            id: id.into(),
            name: name.into(),
            field_type,
            entity_type,
            basic_value_type,
        }
    }

    /// Datetime cells are read through the record's datetime accessor and
    /// formatted before grouping.
    pub fn is_datetime(&self) -> bool {
        self.entity_type.is_datetime() || self.basic_value_type == BasicValueType::DateTime
    }

    /// Whether multi-valued cells of this field can be split into one
    /// group per element.
    pub fn is_splittable(&self) -> bool {
        matches!(
            self.field_type,
            FieldType::Member | FieldType::MultiSelect | FieldType::MagicLink | FieldType::MagicLookUp
        )
    }

    pub fn is_lookup(&self) -> bool {
        self.field_type == FieldType::MagicLookUp
    }
}

// ============================================================================
// DATE FORMATS
// ============================================================================

/// Bucketing format applied to datetime axis values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DateTimeFormat {
    #[default]
    #[serde(rename = "YYYY-MM-DD")]
    Day,
    #[serde(rename = "YYYY-[W]ww")]
    Week,
    #[serde(rename = "YYYY-MM")]
    Month,
    #[serde(rename = "YYYY-[Q]Q")]
    Quarter,
    #[serde(rename = "YYYY")]
    Year,
}

impl DateTimeFormat {
    pub const ALL: [DateTimeFormat; 5] = [
        DateTimeFormat::Day,
        DateTimeFormat::Week,
        DateTimeFormat::Month,
        DateTimeFormat::Quarter,
        DateTimeFormat::Year,
    ];

    pub fn pattern(self) -> &'static str {
        match self {
            DateTimeFormat::Day => "YYYY-MM-DD",
            DateTimeFormat::Week => "YYYY-[W]ww",
            DateTimeFormat::Month => "YYYY-MM",
            DateTimeFormat::Quarter => "YYYY-[Q]Q",
            DateTimeFormat::Year => "YYYY",
        }
    }
}

// ============================================================================
// DIMENSIONS
// ============================================================================

/// Sort order of drill-tree siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortType {
    /// Keep the order in which groups were first seen.
    #[default]
    None,
    Asc,
    Desc,
}

/// A row or column axis definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisDimension {
    pub field_id: FieldId,

    /// Bucketing for datetime fields. Defaults to day granularity.
    #[serde(default)]
    pub date_time_format: Option<DateTimeFormat>,

    /// Split multi-valued cells into one group per element.
    #[serde(default)]
    pub split_multi_value: bool,
}

impl AxisDimension {
    pub fn new(field_id: impl Into<FieldId>) -> Self {
        AxisDimension {
            field_id: field_id.into(),
            date_time_format: None,
            split_multi_value: false,
        }
    }

    pub fn with_date_time_format(mut self, format: DateTimeFormat) -> Self {
        self.date_time_format = Some(format);
        self
    }

    pub fn split(mut self) -> Self {
        self.split_multi_value = true;
        self
    }
}

/// A measure definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueDimension {
    /// A field id, or [`COUNT_ALL_FIELD_ID`].
    pub field_id: FieldId,

    #[serde(default)]
    pub stat_type: StatType,
}

impl ValueDimension {
    pub fn new(field_id: impl Into<FieldId>, stat_type: StatType) -> Self {
        ValueDimension {
            field_id: field_id.into(),
            stat_type,
        }
    }

    pub fn count_all() -> Self {
        ValueDimension::new(COUNT_ALL_FIELD_ID, StatType::CountAll)
    }

    pub fn is_count_all(&self) -> bool {
        self.field_id == COUNT_ALL_FIELD_ID
    }
}

/// Where a resolved measure reads its values from.
#[derive(Debug, Clone, PartialEq)]
pub enum MeasureSource {
    /// Every record contributes a literal 1.
    CountAll,
    Field(FieldMeta),
}

/// A value dimension joined with its field.
#[derive(Debug, Clone, PartialEq)]
pub struct Measure {
    /// Unique key of this measure in flattened rows and matrix cells.
    pub id: String,

    /// Display name, e.g. "Amount-Sum".
    pub name: String,

    pub stat_type: StatType,

    pub source: MeasureSource,
}

impl Measure {
    pub fn field(&self) -> Option<&FieldMeta> {
        match &self.source {
            MeasureSource::CountAll => None,
            MeasureSource::Field(field) => Some(field),
        }
    }

    pub fn is_count_all(&self) -> bool {
        self.source == MeasureSource::CountAll
    }
}

// ============================================================================
// MAIN DEFINITION STRUCT
// ============================================================================

/// Display options. Both axes keep first-seen order unless a sort is chosen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PivotOptions {
    /// Show subtotal rows/columns and the pinned grand total.
    #[serde(default)]
    pub is_summary: bool,

    #[serde(default)]
    pub row_sort_type: SortType,

    #[serde(default)]
    pub column_sort_type: SortType,
}

/// The complete, serializable definition of a pivot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PivotConfig {
    /// Row axis (outer to inner).
    #[serde(default)]
    pub row_dimensions: Vec<AxisDimension>,

    /// Column axis (outer to inner).
    #[serde(default)]
    pub column_dimensions: Vec<AxisDimension>,

    #[serde(default)]
    pub value_dimensions: Vec<ValueDimension>,

    #[serde(default)]
    pub more: PivotOptions,
}

impl PivotConfig {
    pub fn new() -> Self {
        PivotConfig::default()
    }

    pub fn with_row(mut self, dimension: AxisDimension) -> Self {
        self.row_dimensions.push(dimension);
        self
    }

    pub fn with_column(mut self, dimension: AxisDimension) -> Self {
        self.column_dimensions.push(dimension);
        self
    }

    pub fn with_value(mut self, dimension: ValueDimension) -> Self {
        self.value_dimensions.push(dimension);
        self
    }

    pub fn with_summary(mut self, is_summary: bool) -> Self {
        self.more.is_summary = is_summary;
        self
    }

    /// Checks the dimension cardinality limits.
    pub fn validate(&self) -> PivotResult<()> {
        if self.row_dimensions.len() > MAX_AXIS_DIMENSIONS {
            return Err(PivotError::TooManyAxisDimensions {
                axis: "row",
                count: self.row_dimensions.len(),
                max: MAX_AXIS_DIMENSIONS,
            });
        }
        if self.column_dimensions.len() > MAX_AXIS_DIMENSIONS {
            return Err(PivotError::TooManyAxisDimensions {
                axis: "column",
                count: self.column_dimensions.len(),
                max: MAX_AXIS_DIMENSIONS,
            });
        }
        if self.value_dimensions.len() > MAX_VALUE_DIMENSIONS {
            return Err(PivotError::TooManyValueDimensions {
                count: self.value_dimensions.len(),
                max: MAX_VALUE_DIMENSIONS,
            });
        }
        Ok(())
    }
}
