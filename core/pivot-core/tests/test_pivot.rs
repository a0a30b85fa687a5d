//! FILENAME: tests/test_pivot.rs
//! Integration tests for the pivot pipeline.

mod common;

use common::{assert_grid_number, large_records, member, SalesFixture};
use pivot_core::{
    calculate_pivot, AggregateValue, AxisDimension, CellValue, DateTimeFormat, EmptyState,
    EntryKind, GridValue, MapRecord, PivotConfig, PivotError, SortOrder, SortType, StatType,
    ValueDimension, TOTALS_LABEL,
};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn region_by_quarter(stat: StatType) -> PivotConfig {
    let mut config = PivotConfig::new()
        .with_row(AxisDimension::new("fldRegion"))
        .with_column(AxisDimension::new("fldQuarter"))
        .with_value(ValueDimension::new("fldSales", stat));
    config.more.row_sort_type = SortType::Asc;
    config.more.column_sort_type = SortType::Asc;
    config
}

fn body_labels(output: &pivot_core::PivotOutput) -> Vec<String> {
    output.render_rows().into_iter().map(|r| r.label).collect()
}

// ============================================================================
// BASIC LAYOUT
// ============================================================================

#[test]
fn test_region_by_quarter_sums() {
    let output = calculate_pivot(
        &SalesFixture::records(),
        &SalesFixture::fields(),
        &region_by_quarter(StatType::Sum),
    )
    .unwrap();

    assert_eq!(body_labels(&output), ["East", "North", "South"]);
    assert_eq!(output.table.columns.len(), 2);

    let north = &output.table.body[1];
    assert_grid_number(&north.values[0], 18000.0);
    assert_grid_number(&north.values[1], 21000.0);
    assert!(output.table.total_row.is_none());
}

#[test]
fn test_summary_totals() {
    let config = region_by_quarter(StatType::Sum).with_summary(true);
    let output = calculate_pivot(&SalesFixture::records(), &SalesFixture::fields(), &config).unwrap();

    // Q1, Q2 and the totals column
    assert_eq!(output.table.columns.len(), 3);
    assert_eq!(output.table.columns[2].entry.label, TOTALS_LABEL);

    let east = &output.table.body[0];
    assert_grid_number(&east.values[2], 35500.0);

    let total = output.table.total_row.as_ref().unwrap();
    assert_grid_number(&total.values[0], 60000.0);
    assert_grid_number(&total.values[1], 67500.0);
    assert_grid_number(&total.values[2], 127500.0);

    let rendered = output.render_rows();
    assert_eq!(rendered.last().unwrap().label, TOTALS_LABEL);
    assert_eq!(rendered.last().unwrap().cells, ["60000", "67500", "127500"]);
}

#[test]
fn test_average_totals_are_not_average_of_averages() {
    let config = PivotConfig::new()
        .with_row(AxisDimension::new("fldRegion"))
        .with_value(ValueDimension::new("fldSales", StatType::Average))
        .with_summary(true);
    let mut records = SalesFixture::records();
    // one extra small North sale skews the per-region group sizes
    records.push(
        MapRecord::new()
            .with("fldRegion", "North")
            .with("fldSales", 500.0),
    );
    let output = calculate_pivot(&records, &SalesFixture::fields(), &config).unwrap();

    let total = output.table.total_row.as_ref().unwrap();
    assert_grid_number(&total.values[0], 128000.0 / 13.0);
}

#[test]
fn test_multiple_measures_share_columns() {
    let config = PivotConfig::new()
        .with_row(AxisDimension::new("fldProduct"))
        .with_column(AxisDimension::new("fldQuarter"))
        .with_value(ValueDimension::count_all())
        .with_value(ValueDimension::new("fldSales", StatType::Max))
        .with_value(ValueDimension::new("fldQuantity", StatType::PercentFilled));
    let output = calculate_pivot(&SalesFixture::records(), &SalesFixture::fields(), &config).unwrap();

    assert_eq!(output.indicators.len(), 3);
    assert_eq!(output.indicators[0].code, "fldCountAll_0");
    assert_eq!(output.table.columns.len(), 6);

    // groups keep first-seen order by default
    assert_eq!(body_labels(&output), ["Widget", "Gadget"]);
    let gadget = &output.table.body[1];
    assert_grid_number(&gadget.values[0], 3.0);
    assert_grid_number(&gadget.values[1], 11000.0);
    assert_eq!(
        gadget.values[2],
        GridValue::Value(AggregateValue::Text("100%".to_string()))
    );
}

#[test]
fn test_default_order_is_first_seen() {
    let config = PivotConfig::new()
        .with_row(AxisDimension::new("fldRegion"))
        .with_column(AxisDimension::new("fldQuarter"))
        .with_value(ValueDimension::new("fldSales", StatType::Sum));
    let output = calculate_pivot(&SalesFixture::records(), &SalesFixture::fields(), &config).unwrap();

    assert_eq!(body_labels(&output), ["North", "South", "East"]);
    assert_eq!(output.column_titles(), ["Q1 / Sales-Sum", "Q2 / Sales-Sum"]);
}

#[test]
fn test_descending_row_sort() {
    let mut config = region_by_quarter(StatType::Sum);
    config.more.row_sort_type = SortType::Desc;
    config.more.column_sort_type = SortType::Desc;
    let output = calculate_pivot(&SalesFixture::records(), &SalesFixture::fields(), &config).unwrap();

    assert_eq!(body_labels(&output), ["South", "North", "East"]);
    assert_eq!(output.column_titles(), ["Q2 / Sales-Sum", "Q1 / Sales-Sum"]);
}

#[test]
fn test_sort_by_total_column() {
    let config = region_by_quarter(StatType::Sum).with_summary(true);
    let mut output =
        calculate_pivot(&SalesFixture::records(), &SalesFixture::fields(), &config).unwrap();

    output.table.sort_by_column(2, SortOrder::Desc);
    assert_eq!(body_labels(&output), ["South", "North", "East", TOTALS_LABEL]);

    output.table.sort_by_column(2, SortOrder::None);
    assert_eq!(body_labels(&output), ["East", "North", "South", TOTALS_LABEL]);
}

// ============================================================================
// DIMENSION HANDLING
// ============================================================================

#[test]
fn test_split_cross_product() {
    let config = PivotConfig::new()
        .with_row(AxisDimension::new("fldTags").split())
        .with_column(AxisDimension::new("fldOwners").split())
        .with_value(ValueDimension::count_all());
    let records = vec![MapRecord::new()
        .with("fldTags", vec!["a", "b"])
        .with("fldOwners", vec![member("x"), member("y")])];
    let output = calculate_pivot(&records, &SalesFixture::fields(), &config).unwrap();

    assert_eq!(output.rows.len(), 4);
    assert_eq!(body_labels(&output), ["a", "b"]);
    assert_eq!(output.column_titles(), ["x / Record count", "y / Record count"]);
    for row in &output.table.body {
        for value in &row.values {
            assert_grid_number(value, 1.0);
        }
    }
}

#[test]
fn test_permuted_members_share_a_group() {
    let config = PivotConfig::new()
        .with_row(AxisDimension::new("fldOwners"))
        .with_value(ValueDimension::count_all());
    let records = vec![
        MapRecord::new().with("fldOwners", vec![member("ann"), member("bob")]),
        MapRecord::new().with("fldOwners", vec![member("bob"), member("ann")]),
        MapRecord::new().with("fldOwners", CellValue::List(vec![])),
    ];
    let output = calculate_pivot(&records, &SalesFixture::fields(), &config).unwrap();

    assert_eq!(body_labels(&output), ["ann, bob", "-"]);
    assert_grid_number(&output.table.body[0].values[0], 2.0);
}

#[test]
fn test_datetime_axis_by_month() {
    let config = PivotConfig::new()
        .with_row(AxisDimension::new("fldClosed").with_date_time_format(DateTimeFormat::Month))
        .with_value(ValueDimension::new("fldSales", StatType::Sum));
    let records = vec![
        MapRecord::new().with("fldClosed", "2024-01-15").with("fldSales", 10.0),
        MapRecord::new().with("fldClosed", "2024-01-31").with("fldSales", 5.0),
        // 2024-02-01T00:00:00Z
        MapRecord::new().with("fldClosed", 1_706_745_600_000.0).with("fldSales", 1.0),
    ];
    let output = calculate_pivot(&records, &SalesFixture::fields(), &config).unwrap();

    assert_eq!(body_labels(&output), ["2024-01", "2024-02"]);
    assert_grid_number(&output.table.body[0].values[0], 15.0);
}

#[test]
fn test_dangling_row_dimension_is_dropped() {
    let config = PivotConfig::new()
        .with_row(AxisDimension::new("fldDeleted"))
        .with_column(AxisDimension::new("fldQuarter"))
        .with_value(ValueDimension::new("fldSales", StatType::Sum));
    let output = calculate_pivot(&SalesFixture::records(), &SalesFixture::fields(), &config).unwrap();

    assert_eq!(output.table.body.len(), 1);
    assert_eq!(output.table.body[0].entry.kind, EntryKind::GrandTotal);
    assert_grid_number(&output.table.body[0].values[0], 60000.0);
    assert!(output.table.row_codes.is_empty());
}

// ============================================================================
// CONFIGURATION
// ============================================================================

#[test]
fn test_config_from_json() {
    let json = r#"{
        "row_dimensions": [{ "field_id": "fldRegion" }],
        "column_dimensions": [],
        "value_dimensions": [{ "field_id": "fldQuantity", "stat_type": "Min" }],
        "more": { "is_summary": true, "row_sort_type": "none" }
    }"#;
    let config: PivotConfig = serde_json::from_str(json).unwrap();
    let output = calculate_pivot(&SalesFixture::records(), &SalesFixture::fields(), &config).unwrap();

    // first-seen order without sorting
    assert_eq!(body_labels(&output), ["North", "South", "East", TOTALS_LABEL]);
    let total = output.table.total_row.as_ref().unwrap();
    assert_grid_number(&total.values[0], 70.0);
}

#[test]
fn test_too_many_value_dimensions() {
    let mut config = region_by_quarter(StatType::Sum);
    for _ in 0..3 {
        config = config.with_value(ValueDimension::count_all());
    }
    let err = calculate_pivot(&SalesFixture::records(), &SalesFixture::fields(), &config).unwrap_err();
    assert!(matches!(err, PivotError::TooManyValueDimensions { count: 4, max: 3 }));
}

#[test]
fn test_no_records() {
    let records: Vec<MapRecord> = Vec::new();
    let output =
        calculate_pivot(&records, &SalesFixture::fields(), &region_by_quarter(StatType::Sum)).unwrap();
    assert!(output.rows.is_empty());
    assert_eq!(output.empty_state(), Some(EmptyState::NoData));
}

// ============================================================================
// PERFORMANCE
// ============================================================================

#[test]
fn test_large_dataset_counts() {
    let config = PivotConfig::new()
        .with_row(AxisDimension::new("fldRegion"))
        .with_column(AxisDimension::new("fldProduct"))
        .with_value(ValueDimension::count_all())
        .with_summary(true);
    let output = calculate_pivot(&large_records(10_000), &SalesFixture::fields(), &config).unwrap();

    assert_eq!(output.table.body.len(), 4);
    let total = output.table.total_row.as_ref().unwrap();
    assert_grid_number(total.values.last().unwrap(), 10_000.0);
}
