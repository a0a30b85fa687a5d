//! FILENAME: core/pivot-core/src/resolver.rs
//! Dimension Resolver - flattens records into pivot rows.
//!
//! Joins the configured dimensions with field metadata, then turns every
//! record into one or more `FlattenedRow`s: canonical axis labels keyed by
//! field id plus the raw measure values keyed by measure id. Multi-valued
//! axis cells can be split so that each element forms its own group.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::aggregate::StatType;
use crate::comparator::stable_sort_by;
use crate::definition::{
    AxisDimension, DateTimeFormat, FieldMeta, FieldType, Measure, MeasureSource, PivotConfig,
    BasicValueType, COUNT_ALL_FIELD_ID, COUNT_ALL_NAME,
};
use crate::logging::CAT_RESOLVE;
use crate::value::{CellValue, Labeled};
use crate::{log_debug, log_warn};

/// Label of a null (or empty) axis cell.
pub const NULL_LABEL: &str = "null";

static NULL_CELL: CellValue = CellValue::Null;

// ============================================================================
// RECORDS
// ============================================================================

/// Read access to one record of the host data source.
pub trait Record {
    /// The cell value of a field; missing fields read as null.
    fn get_value(&self, field_id: &str) -> CellValue;

    /// The cell value of a datetime field as a timestamp (epoch milliseconds)
    /// or date text. Hosts whose `get_value` already returns that can rely on
    /// the default.
    fn get_datetime_value(&self, field_id: &str) -> CellValue {
        self.get_value(field_id)
    }
}

/// A record backed by a hash map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapRecord {
    #[serde(default)]
    pub values: FxHashMap<String, CellValue>,
}

impl MapRecord {
    pub fn new() -> Self {
        MapRecord::default()
    }

    pub fn with(mut self, field_id: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.values.insert(field_id.into(), value.into());
        self
    }

    pub fn set(&mut self, field_id: impl Into<String>, value: impl Into<CellValue>) {
        self.values.insert(field_id.into(), value.into());
    }
}

impl Record for MapRecord {
    fn get_value(&self, field_id: &str) -> CellValue {
        self.values.get(field_id).cloned().unwrap_or_default()
    }
}

// ============================================================================
// FLATTENED ROW
// ============================================================================

/// One pivot input row derived from a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlattenedRow {
    /// Canonical axis labels, keyed by field id.
    pub labels: FxHashMap<String, String>,

    /// Raw measure values, keyed by measure id.
    pub measures: FxHashMap<String, CellValue>,
}

impl FlattenedRow {
    pub fn with_label(mut self, field_id: impl Into<String>, label: impl Into<String>) -> Self {
        self.labels.insert(field_id.into(), label.into());
        self
    }

    pub fn with_measure(mut self, measure_id: impl Into<String>, value: CellValue) -> Self {
        self.measures.insert(measure_id.into(), value);
        self
    }

    pub fn label(&self, field_id: &str) -> Option<&str> {
        self.labels.get(field_id).map(String::as_str)
    }

    /// Raw value of a measure; null when the row does not carry it.
    pub fn measure(&self, measure_id: &str) -> &CellValue {
        self.measures.get(measure_id).unwrap_or(&NULL_CELL)
    }
}

// ============================================================================
// RESOLVED DIMENSIONS
// ============================================================================

/// An axis dimension joined with its field.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAxis {
    pub dimension: AxisDimension,
    pub field: FieldMeta,
}

impl ResolvedAxis {
    pub fn field_id(&self) -> &str {
        &self.field.id
    }

    pub fn date_time_format(&self) -> DateTimeFormat {
        self.dimension.date_time_format.unwrap_or_default()
    }

    /// Split is honored only for member, multi-select, link and lookup fields.
    pub fn splits(&self) -> bool {
        self.dimension.split_multi_value && self.field.is_splittable()
    }
}

/// Presentation metadata for one measure column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicator {
    /// Measure id; also the key into matrix cells.
    pub code: String,
    pub name: String,
    pub stat_type: StatType,
    /// `None` for count-all measures.
    pub field: Option<FieldMeta>,
}

/// Resolves value dimensions against the field list.
///
/// Dimensions whose field cannot be found are dropped. Count-all measures
/// are keyed `fldCountAll_<index>`; a field that is measured more than once
/// keys its later measures `<field id>_<index>`. A key that is already taken
/// gets a further `_<n>` suffix, so no two measures share a key.
pub fn resolve_measures(config: &PivotConfig, fields: &[FieldMeta]) -> Vec<Measure> {
    let mut used: FxHashSet<String> = FxHashSet::default();
    let mut measures = Vec::with_capacity(config.value_dimensions.len());

    for (index, dim) in config.value_dimensions.iter().enumerate() {
        if dim.is_count_all() {
            let id = unused_id(format!("{}_{}", COUNT_ALL_FIELD_ID, index), &used);
            used.insert(id.clone());
            measures.push(Measure {
                id,
                name: COUNT_ALL_NAME.to_string(),
                stat_type: dim.stat_type,
                source: MeasureSource::CountAll,
            });
            continue;
        }

        let Some(field) = fields.iter().find(|f| f.id == dim.field_id) else {
            log_debug!(CAT_RESOLVE, "value field '{}' not found, dropped", dim.field_id);
            continue;
        };

        let id = if used.contains(&field.id) {
            unused_id(format!("{}_{}", field.id, index), &used)
        } else {
            field.id.clone()
        };
        used.insert(id.clone());

        let name = match dim.stat_type.label() {
            "" => field.name.clone(),
            label => format!("{}-{}", field.name, label),
        };
        measures.push(Measure {
            id,
            name,
            stat_type: dim.stat_type,
            source: MeasureSource::Field(field.clone()),
        });
    }
    measures
}

fn unused_id(candidate: String, used: &FxHashSet<String>) -> String {
    if !used.contains(&candidate) {
        return candidate;
    }
    let mut n = 1;
    loop {
        let id = format!("{}_{}", candidate, n);
        if !used.contains(&id) {
            return id;
        }
        n += 1;
    }
}

fn resolve_axes(dimensions: &[AxisDimension], fields: &[FieldMeta]) -> Vec<ResolvedAxis> {
    dimensions
        .iter()
        .filter_map(|dim| {
            let field = fields.iter().find(|f| f.id == dim.field_id);
            if field.is_none() {
                log_debug!(CAT_RESOLVE, "axis field '{}' not found, dropped", dim.field_id);
            }
            field.map(|field| ResolvedAxis {
                dimension: dim.clone(),
                field: field.clone(),
            })
        })
        .collect()
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Configuration joined with field metadata, ready to flatten records.
#[derive(Debug, Clone, Default)]
pub struct DimensionResolver {
    rows: Vec<ResolvedAxis>,
    columns: Vec<ResolvedAxis>,
    measures: Vec<Measure>,
}

impl DimensionResolver {
    pub fn new(config: &PivotConfig, fields: &[FieldMeta]) -> Self {
        DimensionResolver {
            rows: resolve_axes(&config.row_dimensions, fields),
            columns: resolve_axes(&config.column_dimensions, fields),
            measures: resolve_measures(config, fields),
        }
    }

    /// At least one axis and at least one measure resolved.
    pub fn is_valid(&self) -> bool {
        (!self.rows.is_empty() || !self.columns.is_empty()) && !self.measures.is_empty()
    }

    pub fn row_axes(&self) -> &[ResolvedAxis] {
        &self.rows
    }

    pub fn column_axes(&self) -> &[ResolvedAxis] {
        &self.columns
    }

    pub fn measures(&self) -> &[Measure] {
        &self.measures
    }

    pub fn row_codes(&self) -> Vec<String> {
        self.rows.iter().map(|a| a.field.id.clone()).collect()
    }

    pub fn column_codes(&self) -> Vec<String> {
        self.columns.iter().map(|a| a.field.id.clone()).collect()
    }

    /// One indicator per measure, in configuration order. Empty when the
    /// configuration is not valid.
    pub fn indicators(&self) -> Vec<Indicator> {
        if !self.is_valid() {
            return Vec::new();
        }
        self.measures
            .iter()
            .map(|m| Indicator {
                code: m.id.clone(),
                name: m.name.clone(),
                stat_type: m.stat_type,
                field: m.field().cloned(),
            })
            .collect()
    }

    /// Flattens records into pivot rows. Returns nothing when the
    /// configuration is not valid.
    pub fn flatten<R: Record>(&self, records: &[R]) -> Vec<FlattenedRow> {
        if !self.is_valid() {
            log_debug!(CAT_RESOLVE, "configuration not valid, nothing to flatten");
            return Vec::new();
        }

        let mut out = Vec::with_capacity(records.len());
        for record in records {
            let base = FlattenedRow {
                labels: FxHashMap::default(),
                measures: self.measure_values(record),
            };

            let mut expanded = vec![base];
            for axis in self.rows.iter().chain(self.columns.iter()) {
                let labels = axis_labels(record, axis);
                expanded = expanded
                    .into_iter()
                    .flat_map(|row| {
                        labels
                            .iter()
                            .map(move |label| row.clone().with_label(axis.field_id(), label.clone()))
                    })
                    .collect();
            }
            out.extend(expanded);
        }

        log_debug!(
            CAT_RESOLVE,
            "flattened {} records into {} rows",
            records.len(),
            out.len()
        );
        out
    }

    fn measure_values<R: Record>(&self, record: &R) -> FxHashMap<String, CellValue> {
        self.measures
            .iter()
            .map(|m| {
                let value = match &m.source {
                    MeasureSource::CountAll => CellValue::Number(1.0),
                    MeasureSource::Field(field) => read_cell(record, field),
                };
                (m.id.clone(), value)
            })
            .collect()
    }
}

fn read_cell<R: Record>(record: &R, field: &FieldMeta) -> CellValue {
    if field.is_datetime() {
        record.get_datetime_value(&field.id)
    } else {
        record.get_value(&field.id)
    }
}

/// Labels a record contributes on one axis. Split axes yield one label per
/// element (none for an empty list); other axes yield exactly one.
fn axis_labels<R: Record>(record: &R, axis: &ResolvedAxis) -> Vec<String> {
    let value = read_cell(record, &axis.field);
    if !axis.splits() {
        return vec![canonicalize(value, axis)];
    }
    match value {
        CellValue::List(items) => items
            .into_iter()
            .map(|item| canonicalize(CellValue::List(vec![item]), axis))
            .collect(),
        other => vec![canonicalize(CellValue::List(vec![other]), axis)],
    }
}

// ============================================================================
// CANONICALIZATION
// ============================================================================

/// Normalizes null-like cells: lists are flattened one level and falsy
/// elements dropped; null and empty lists become `None`.
pub fn check_null(value: CellValue) -> Option<CellValue> {
    match value {
        CellValue::Null => None,
        CellValue::List(items) => {
            let flat: Vec<CellValue> = items
                .into_iter()
                .flat_map(|item| match item {
                    CellValue::List(inner) => inner,
                    other => vec![other],
                })
                .filter(CellValue::is_truthy)
                .collect();
            if flat.is_empty() {
                None
            } else {
                Some(CellValue::List(flat))
            }
        }
        other => Some(other),
    }
}

/// Canonical axis label of a cell for the given axis field.
pub fn canonicalize(value: CellValue, axis: &ResolvedAxis) -> String {
    let Some(mut value) = check_null(value) else {
        return NULL_LABEL.to_string();
    };
    let field = &axis.field;

    if field.is_lookup() && field.entity_type.is_text() {
        if let CellValue::List(items) = &value {
            let joined = items
                .iter()
                .map(CellValue::display_text)
                .collect::<Vec<_>>()
                .join(", ");
            value = CellValue::Text(joined);
        }
    }
    if field.is_lookup() && field.basic_value_type == BasicValueType::Number {
        return value.canonical();
    }
    if field.is_datetime() {
        value = CellValue::Text(format_datetime(&value, axis.date_time_format()));
    }

    match field.entity_type {
        FieldType::MagicLink => sort_elements(&mut value, |obj| obj.title.as_deref()),
        FieldType::Member | FieldType::MultiSelect => {
            sort_elements(&mut value, |obj| obj.name.as_deref())
        }
        _ => {}
    }
    value.canonical()
}

/// Orders list elements by an object key so permuted sets share a label.
/// Text elements order by their text; elements without a key go last.
fn sort_elements(value: &mut CellValue, key: fn(&Labeled) -> Option<&str>) {
    let CellValue::List(items) = value else {
        return;
    };
    let element_key = |item: &CellValue| -> Option<String> {
        match item {
            CellValue::Labeled(obj) => key(obj).map(str::to_string),
            CellValue::Text(s) => Some(s.clone()),
            _ => None,
        }
    };
    stable_sort_by(items, |a, b| match (element_key(a), element_key(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

// ============================================================================
// DATETIME FORMATTING
// ============================================================================

/// Formats a datetime cell. Lists format element-wise and join with ",";
/// unparsable elements render as empty text.
pub fn format_datetime(value: &CellValue, format: DateTimeFormat) -> String {
    let single = std::slice::from_ref(value);
    let items = match value {
        CellValue::List(items) => items.as_slice(),
        _ => single,
    };
    items
        .iter()
        .map(|item| match parse_datetime(item) {
            Some(dt) => format_date(dt, format),
            None => {
                log_warn!(CAT_RESOLVE, "unparsable datetime cell {}", item.canonical());
                String::new()
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Epoch milliseconds, RFC 3339 text, or plain date / datetime text (UTC).
pub fn parse_datetime(value: &CellValue) -> Option<DateTime<Utc>> {
    match value {
        CellValue::Number(ms) if ms.is_finite() => Utc.timestamp_millis_opt(*ms as i64).single(),
        CellValue::Text(text) => {
            if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
                return Some(dt.with_timezone(&Utc));
            }
            if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
                return Some(naive.and_utc());
            }
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        }
        _ => None,
    }
}

pub fn format_date(dt: DateTime<Utc>, format: DateTimeFormat) -> String {
    match format {
        DateTimeFormat::Day => dt.format("%Y-%m-%d").to_string(),
        DateTimeFormat::Week => {
            format!("{}-W{:02}", dt.format("%Y"), week_of_year(dt.date_naive()))
        }
        DateTimeFormat::Month => dt.format("%Y-%m").to_string(),
        DateTimeFormat::Quarter => format!("{}-Q{}", dt.format("%Y"), dt.month0() / 3 + 1),
        DateTimeFormat::Year => dt.format("%Y").to_string(),
    }
}

/// Week number with Sunday-start weeks where week 1 contains 1 January.
/// Late-December days whose week already contains the next 1 January are
/// week 1 (the year part stays the calendar year).
pub fn week_of_year(date: NaiveDate) -> u32 {
    let weekday = date.weekday().num_days_from_sunday();
    if date.month() == 12 && date.day() > 25 {
        let days_to_new_year = 32 - date.day();
        if days_to_new_year <= 6 - weekday {
            return 1;
        }
    }
    let jan1_offset = NaiveDate::from_ymd_opt(date.year(), 1, 1)
        .map_or(0, |jan1| jan1.weekday().num_days_from_sunday());
    (date.ordinal0() + jan1_offset) / 7 + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::ValueDimension;

    fn axis(field: FieldMeta) -> ResolvedAxis {
        ResolvedAxis {
            dimension: AxisDimension::new(field.id.clone()),
            field,
        }
    }

    fn member(name: &str) -> CellValue {
        CellValue::Labeled(Labeled::named(name).with_id(format!("u-{}", name)))
    }

    #[test]
    fn test_check_null() {
        assert_eq!(check_null(CellValue::Null), None);
        assert_eq!(check_null(CellValue::List(vec![])), None);
        assert_eq!(
            check_null(CellValue::from(vec![CellValue::Null, CellValue::text("")])),
            None
        );
        let nested = CellValue::from(vec![CellValue::from(vec!["a", "b"]), CellValue::from("c")]);
        assert_eq!(check_null(nested), Some(CellValue::from(vec!["a", "b", "c"])));
        assert_eq!(check_null(CellValue::Number(0.0)), Some(CellValue::Number(0.0)));
    }

    #[test]
    fn test_canonicalize_plain_values() {
        let text = axis(FieldMeta::new("f", "Title", FieldType::SingleText));
        assert_eq!(canonicalize(CellValue::text("abc"), &text), "\"abc\"");
        assert_eq!(canonicalize(CellValue::Null, &text), NULL_LABEL);

        let number = axis(FieldMeta::new("n", "Amount", FieldType::Number));
        assert_eq!(canonicalize(CellValue::Number(12.0), &number), "12");
    }

    #[test]
    fn test_canonicalize_members_ignores_order() {
        let owners = axis(FieldMeta::new("f", "Owners", FieldType::Member));
        let a = canonicalize(CellValue::from(vec![member("b"), member("a")]), &owners);
        let b = canonicalize(CellValue::from(vec![member("a"), member("b")]), &owners);
        assert_eq!(a, b);
        assert!(a.find("\"a\"").unwrap() < a.find("\"b\"").unwrap());
    }

    #[test]
    fn test_canonicalize_links_by_title() {
        let links = axis(FieldMeta::new("f", "Docs", FieldType::MagicLink));
        let cell = CellValue::from(vec![Labeled::titled("Zeta"), Labeled::titled("Alpha")]);
        assert_eq!(
            canonicalize(cell, &links),
            r#"[{"title":"Alpha"},{"title":"Zeta"}]"#
        );
    }

    #[test]
    fn test_canonicalize_lookups() {
        let text_lookup = axis(FieldMeta::indirect(
            "f",
            "Names",
            FieldType::MagicLookUp,
            FieldType::SingleText,
            BasicValueType::Array,
        ));
        assert_eq!(
            canonicalize(CellValue::from(vec!["x", "y"]), &text_lookup),
            "\"x, y\""
        );

        let number_lookup = axis(FieldMeta::indirect(
            "g",
            "Prices",
            FieldType::MagicLookUp,
            FieldType::Number,
            BasicValueType::Number,
        ));
        assert_eq!(
            canonicalize(CellValue::from(vec![3.0, 1.0]), &number_lookup),
            "[3,1]"
        );
    }

    #[test]
    fn test_canonicalize_datetime_formats() {
        let field = FieldMeta::new("d", "Due", FieldType::DateTime);
        // 2023-05-17T10:00:00Z
        let ts = CellValue::Number(1_684_317_600_000.0);
        let cases = [
            (DateTimeFormat::Day, "\"2023-05-17\""),
            (DateTimeFormat::Week, "\"2023-W20\""),
            (DateTimeFormat::Month, "\"2023-05\""),
            (DateTimeFormat::Quarter, "\"2023-Q2\""),
            (DateTimeFormat::Year, "\"2023\""),
        ];
        for (format, expected) in cases {
            let resolved = ResolvedAxis {
                dimension: AxisDimension::new("d").with_date_time_format(format),
                field: field.clone(),
            };
            assert_eq!(canonicalize(ts.clone(), &resolved), expected);
        }
    }

    #[test]
    fn test_format_datetime_lists_and_garbage() {
        let value = CellValue::from(vec![
            CellValue::text("2024-02-29"),
            CellValue::text("not a date"),
        ]);
        assert_eq!(format_datetime(&value, DateTimeFormat::Month), "2024-02,");
    }

    #[test]
    fn test_week_of_year() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        // 2023-01-01 is a Sunday
        assert_eq!(week_of_year(d(2023, 1, 1)), 1);
        assert_eq!(week_of_year(d(2023, 1, 7)), 1);
        assert_eq!(week_of_year(d(2023, 1, 8)), 2);
        // 2022-01-01 is a Saturday, so the next day starts week 2
        assert_eq!(week_of_year(d(2022, 1, 1)), 1);
        assert_eq!(week_of_year(d(2022, 1, 2)), 2);
        // 2023-12-31 is a Sunday whose week contains 2024-01-01
        assert_eq!(week_of_year(d(2023, 12, 31)), 1);
        // 2022-12-31 is a Saturday, week ends before the new year
        assert_eq!(week_of_year(d(2022, 12, 31)), 53);
    }

    fn fields() -> Vec<FieldMeta> {
        vec![
            FieldMeta::new("fldTags", "Tags", FieldType::MultiSelect),
            FieldMeta::new("fldOwner", "Owner", FieldType::Member),
            FieldMeta::new("fldAmount", "Amount", FieldType::Number),
        ]
    }

    #[test]
    fn test_resolve_measures_ids() {
        let config = PivotConfig::new()
            .with_value(ValueDimension::count_all())
            .with_value(ValueDimension::new("fldAmount", StatType::Sum))
            .with_value(ValueDimension::new("fldAmount", StatType::Max));
        let measures = resolve_measures(&config, &fields());
        let ids: Vec<&str> = measures.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["fldCountAll_0", "fldAmount", "fldAmount_2"]);
        assert_eq!(measures[0].name, COUNT_ALL_NAME);
        assert_eq!(measures[1].name, "Amount-Sum");
    }

    #[test]
    fn test_measure_ids_never_collide() {
        let fields = vec![
            FieldMeta::new("fldA", "A", FieldType::Number),
            FieldMeta::new("fldA_2", "A2", FieldType::Number),
            FieldMeta::new("fldCountAll_1", "Legacy", FieldType::Number),
        ];
        let config = PivotConfig::new()
            .with_value(ValueDimension::new("fldA", StatType::Sum))
            .with_value(ValueDimension::new("fldA_2", StatType::Sum))
            .with_value(ValueDimension::new("fldA", StatType::Max));
        let measures = resolve_measures(&config, &fields);
        let ids: Vec<&str> = measures.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["fldA", "fldA_2", "fldA_2_1"]);

        let config = config.with_row(AxisDimension::new("fldA"));
        let record = MapRecord::new().with("fldA", 1.0).with("fldA_2", 100.0);
        let rows = DimensionResolver::new(&config, &fields).flatten(&[record]);
        assert_eq!(rows[0].measure("fldA"), &CellValue::Number(1.0));
        assert_eq!(rows[0].measure("fldA_2"), &CellValue::Number(100.0));
        assert_eq!(rows[0].measure("fldA_2_1"), &CellValue::Number(1.0));

        let config = PivotConfig::new()
            .with_value(ValueDimension::new("fldCountAll_1", StatType::Sum))
            .with_value(ValueDimension::count_all());
        let ids: Vec<String> = resolve_measures(&config, &fields)
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, ["fldCountAll_1", "fldCountAll_1_1"]);
    }

    #[test]
    fn test_invalid_configuration_flattens_to_nothing() {
        let records = vec![MapRecord::new().with("fldAmount", 3.0)];

        let no_axis = PivotConfig::new().with_value(ValueDimension::count_all());
        assert!(DimensionResolver::new(&no_axis, &fields()).flatten(&records).is_empty());

        let no_value = PivotConfig::new().with_row(AxisDimension::new("fldTags"));
        let resolver = DimensionResolver::new(&no_value, &fields());
        assert!(!resolver.is_valid());
        assert!(resolver.flatten(&records).is_empty());
        assert!(resolver.indicators().is_empty());

        let dangling = PivotConfig::new()
            .with_row(AxisDimension::new("fldMissing"))
            .with_value(ValueDimension::new("fldGone", StatType::Sum));
        assert!(!DimensionResolver::new(&dangling, &fields()).is_valid());
    }

    #[test]
    fn test_split_row_and_column_cross_product() {
        let config = PivotConfig::new()
            .with_row(AxisDimension::new("fldTags").split())
            .with_column(AxisDimension::new("fldOwner").split())
            .with_value(ValueDimension::count_all());
        let resolver = DimensionResolver::new(&config, &fields());
        let record = MapRecord::new()
            .with("fldTags", vec!["a", "b"])
            .with("fldOwner", vec![member("x"), member("y")]);

        let rows = resolver.flatten(&[record]);
        let pairs: Vec<(String, String)> = rows
            .iter()
            .map(|r| {
                (
                    r.label("fldTags").unwrap().to_string(),
                    r.label("fldOwner").unwrap().to_string(),
                )
            })
            .collect();
        assert_eq!(pairs.len(), 4);
        assert_eq!(pairs[0].0, r#"["a"]"#);
        assert!(pairs[0].1.contains("\"x\""));
        assert_eq!(pairs[1].0, r#"["a"]"#);
        assert!(pairs[1].1.contains("\"y\""));
        assert_eq!(pairs[3].0, r#"["b"]"#);
        assert!(rows.iter().all(|r| r.measure("fldCountAll_0") == &CellValue::Number(1.0)));
    }

    #[test]
    fn test_split_empty_and_null_cells() {
        let config = PivotConfig::new()
            .with_row(AxisDimension::new("fldTags").split())
            .with_value(ValueDimension::new("fldAmount", StatType::Sum));
        let resolver = DimensionResolver::new(&config, &fields());
        let empty = MapRecord::new().with("fldTags", CellValue::List(vec![]));
        let null = MapRecord::new().with("fldAmount", 2.0);

        assert!(resolver.flatten(&[empty]).is_empty());
        let rows = resolver.flatten(&[null]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].label("fldTags"), Some(NULL_LABEL));
        assert_eq!(rows[0].measure("fldAmount"), &CellValue::Number(2.0));
    }

    #[test]
    fn test_split_ignored_for_plain_fields() {
        let config = PivotConfig::new()
            .with_row(AxisDimension::new("fldAmount").split())
            .with_value(ValueDimension::count_all());
        let resolver = DimensionResolver::new(&config, &fields());
        let rows = resolver.flatten(&[MapRecord::new().with("fldAmount", vec![1.0, 2.0])]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].label("fldAmount"), Some("[1,2]"));
    }

    #[test]
    fn test_datetime_measure_reads_datetime_value() {
        struct Stamped;
        impl Record for Stamped {
            fn get_value(&self, _field_id: &str) -> CellValue {
                CellValue::text("May 17")
            }
            fn get_datetime_value(&self, _field_id: &str) -> CellValue {
                CellValue::Number(1_684_317_600_000.0)
            }
        }

        let fields = vec![
            FieldMeta::new("fldDue", "Due", FieldType::DateTime),
            FieldMeta::new("fldTitle", "Title", FieldType::SingleText),
        ];
        let config = PivotConfig::new()
            .with_row(AxisDimension::new("fldDue").with_date_time_format(DateTimeFormat::Year))
            .with_value(ValueDimension::new("fldDue", StatType::Max));
        let rows = DimensionResolver::new(&config, &fields).flatten(&[Stamped]);
        assert_eq!(rows[0].label("fldDue"), Some("\"2023\""));
        assert_eq!(rows[0].measure("fldDue"), &CellValue::Number(1_684_317_600_000.0));
    }
}
