//! FILENAME: tests/common/mod.rs
//! Fixtures for pivot-core integration tests.

#![allow(dead_code)]

use pivot_core::{
    AggregateValue, CellValue, FieldMeta, FieldType, GridValue, Labeled, MapRecord,
};

// ============================================================================
// SALES FIXTURE
// ============================================================================

pub struct SalesFixture;

impl SalesFixture {
    pub fn fields() -> Vec<FieldMeta> {
        vec![
            FieldMeta::new("fldRegion", "Region", FieldType::SingleText),
            FieldMeta::new("fldProduct", "Product", FieldType::SingleText),
            FieldMeta::new("fldQuarter", "Quarter", FieldType::SingleSelect),
            FieldMeta::new("fldSales", "Sales", FieldType::Number),
            FieldMeta::new("fldQuantity", "Quantity", FieldType::Number),
            FieldMeta::new("fldOwners", "Owners", FieldType::Member),
            FieldMeta::new("fldTags", "Tags", FieldType::MultiSelect),
            FieldMeta::new("fldClosed", "Closed", FieldType::DateTime),
        ]
    }

    pub fn data() -> Vec<(&'static str, &'static str, &'static str, f64, f64)> {
        vec![
            ("North", "Widget", "Q1", 10000.0, 100.0),
            ("North", "Widget", "Q2", 12000.0, 120.0),
            ("North", "Gadget", "Q1", 8000.0, 80.0),
            ("North", "Gadget", "Q2", 9000.0, 90.0),
            ("South", "Widget", "Q1", 15000.0, 150.0),
            ("South", "Widget", "Q2", 14000.0, 140.0),
            ("South", "Gadget", "Q1", 11000.0, 110.0),
            ("South", "Gadget", "Q2", 13000.0, 130.0),
            ("East", "Widget", "Q1", 9000.0, 90.0),
            ("East", "Widget", "Q2", 11000.0, 110.0),
            ("East", "Gadget", "Q1", 7000.0, 70.0),
            ("East", "Gadget", "Q2", 8500.0, 85.0),
        ]
    }

    pub fn records() -> Vec<MapRecord> {
        Self::data()
            .into_iter()
            .map(|(region, product, quarter, sales, quantity)| {
                MapRecord::new()
                    .with("fldRegion", region)
                    .with("fldProduct", product)
                    .with("fldQuarter", quarter)
                    .with("fldSales", sales)
                    .with("fldQuantity", quantity)
            })
            .collect()
    }
}

pub fn member(name: &str) -> CellValue {
    CellValue::Labeled(Labeled::named(name).with_id(format!("usr{}", name)))
}

/// Generates `count` synthetic records for load tests.
pub fn large_records(count: usize) -> Vec<MapRecord> {
    let regions = ["North", "South", "East", "West"];
    let products = ["Widget", "Gadget", "Gizmo"];
    (0..count)
        .map(|i| {
            MapRecord::new()
                .with("fldRegion", regions[i % regions.len()])
                .with("fldProduct", products[i % products.len()])
                .with("fldQuarter", format!("Q{}", i % 4 + 1))
                .with("fldSales", (i % 100) as f64)
                .with("fldQuantity", 1.0)
        })
        .collect()
}

// ============================================================================
// ASSERTION HELPERS
// ============================================================================

/// Assert that a grid cell holds an expected number.
pub fn assert_grid_number(value: &GridValue, expected: f64) {
    match value {
        GridValue::Value(AggregateValue::Number(n)) => {
            assert!(
                (n - expected).abs() < 0.001,
                "expected {} but got {}",
                expected,
                n
            );
        }
        other => panic!("expected Number({}) but got {:?}", expected, other),
    }
}
