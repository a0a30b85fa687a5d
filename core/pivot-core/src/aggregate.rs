//! FILENAME: core/pivot-core/src/aggregate.rs
//! Measure aggregation.
//!
//! Aggregation runs in two explicit phases:
//! - `aggregate_leaves` folds raw flattened rows into an [`Accumulator`]
//! - `combine_partials` folds accumulators of finer groups into a coarser one
//!
//! Accumulators carry the numerator/denominator state each statistic needs,
//! so a subtotal built from child cells equals the same statistic computed
//! over the raw rows (averages and percentages included). The one exception
//! is `Unique`: combining sums child counts, which over-counts when a value
//! appears in several child groups.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::definition::{Measure, MeasureSource};
use crate::logging::CAT_PIVOT;
use crate::log_warn;
use crate::resolver::FlattenedRow;
use crate::value::{format_number, CellValue};

// ============================================================================
// STAT TYPE
// ============================================================================

/// Aggregation function selector for a value dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StatType {
    /// Not aggregated: the value passes through untouched.
    None,
    CountAll,
    Empty,
    Filled,
    Unique,
    PercentEmpty,
    PercentFilled,
    PercentUnique,
    Sum,
    Average,
    Max,
    Min,
}

impl Default for StatType {
    fn default() -> Self {
        StatType::Sum
    }
}

impl StatType {
    pub const ALL: [StatType; 12] = [
        StatType::None,
        StatType::CountAll,
        StatType::Empty,
        StatType::Filled,
        StatType::Unique,
        StatType::PercentEmpty,
        StatType::PercentFilled,
        StatType::PercentUnique,
        StatType::Sum,
        StatType::Average,
        StatType::Max,
        StatType::Min,
    ];

    /// Stable identifier used in configurations.
    pub fn as_str(self) -> &'static str {
        match self {
            StatType::None => "None",
            StatType::CountAll => "CountAll",
            StatType::Empty => "Empty",
            StatType::Filled => "Filled",
            StatType::Unique => "Unique",
            StatType::PercentEmpty => "PercentEmpty",
            StatType::PercentFilled => "PercentFilled",
            StatType::PercentUnique => "PercentUnique",
            StatType::Sum => "Sum",
            StatType::Average => "Average",
            StatType::Max => "Max",
            StatType::Min => "Min",
        }
    }

    /// Display label appended to measure names.
    pub fn label(self) -> &'static str {
        match self {
            StatType::None => "",
            StatType::CountAll => "Count all",
            StatType::Empty => "Empty",
            StatType::Filled => "Filled",
            StatType::Unique => "Unique",
            StatType::PercentEmpty => "Percent empty",
            StatType::PercentFilled => "Percent filled",
            StatType::PercentUnique => "Percent unique",
            StatType::Sum => "Sum",
            StatType::Average => "Average",
            StatType::Max => "Max",
            StatType::Min => "Min",
        }
    }

    pub fn parse(identifier: &str) -> Option<StatType> {
        StatType::ALL.into_iter().find(|s| s.as_str() == identifier)
    }
}

impl From<String> for StatType {
    fn from(identifier: String) -> Self {
        StatType::parse(&identifier).unwrap_or_else(|| {
            log_warn!(CAT_PIVOT, "unknown stat type '{}', not aggregating", identifier);
            StatType::None
        })
    }
}

impl From<StatType> for String {
    fn from(stat: StatType) -> Self {
        stat.as_str().to_string()
    }
}

// ============================================================================
// AGGREGATE VALUE
// ============================================================================

/// A finished measure value as handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AggregateValue {
    Number(f64),
    /// Percentages are rendered text such as `"20%"`.
    Text(String),
    /// Nothing to show (e.g. max over no numbers). Distinct from zero.
    Absent,
}

impl AggregateValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AggregateValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, AggregateValue::Absent)
    }

    /// The value as a comparator operand; `Absent` compares as null.
    pub fn to_cell_value(&self) -> CellValue {
        match self {
            AggregateValue::Number(n) => CellValue::Number(*n),
            AggregateValue::Text(s) => CellValue::Text(s.clone()),
            AggregateValue::Absent => CellValue::Null,
        }
    }
}

// ============================================================================
// ACCUMULATOR
// ============================================================================

/// Combiner state for one measure in one group.
#[derive(Debug, Clone, PartialEq)]
pub enum Accumulator {
    /// CountAll, Empty, Filled, Unique.
    Count(u64),
    /// PercentEmpty, PercentFilled, PercentUnique.
    Ratio { valid: u64, total: u64 },
    Sum(f64),
    Mean { total_value: f64, total_count: f64 },
    Max(Option<f64>),
    Min(Option<f64>),
}

impl Accumulator {
    /// Identity element for the statistic; `None` for `StatType::None`.
    pub fn empty(stat: StatType) -> Option<Self> {
        let acc = match stat {
            StatType::None => return None,
            StatType::CountAll | StatType::Empty | StatType::Filled | StatType::Unique => {
                Accumulator::Count(0)
            }
            StatType::PercentEmpty | StatType::PercentFilled | StatType::PercentUnique => {
                Accumulator::Ratio { valid: 0, total: 0 }
            }
            StatType::Sum => Accumulator::Sum(0.0),
            StatType::Average => Accumulator::Mean {
                total_value: 0.0,
                total_count: 0.0,
            },
            StatType::Max => Accumulator::Max(None),
            StatType::Min => Accumulator::Min(None),
        };
        Some(acc)
    }

    /// Merges another accumulator of the same kind into this one.
    pub fn merge(&mut self, other: &Accumulator) {
        match (self, other) {
            (Accumulator::Count(a), Accumulator::Count(b)) => *a += b,
            (
                Accumulator::Ratio { valid, total },
                Accumulator::Ratio {
                    valid: other_valid,
                    total: other_total,
                },
            ) => {
                *valid += other_valid;
                *total += other_total;
            }
            (Accumulator::Sum(a), Accumulator::Sum(b)) => *a += b,
            (
                Accumulator::Mean {
                    total_value,
                    total_count,
                },
                Accumulator::Mean {
                    total_value: other_value,
                    total_count: other_count,
                },
            ) => {
                *total_value += other_value;
                *total_count += other_count;
            }
            (Accumulator::Max(a), Accumulator::Max(b)) => *a = pick_extreme(*a, *b, f64::max),
            (Accumulator::Min(a), Accumulator::Min(b)) => *a = pick_extreme(*a, *b, f64::min),
            (this, other) => {
                log_warn!(
                    CAT_PIVOT,
                    "cannot merge {:?} into {:?}, partial ignored",
                    other,
                    this
                );
            }
        }
    }

    /// Finishes the accumulator into a presentable value.
    pub fn value(&self) -> AggregateValue {
        match self {
            Accumulator::Count(n) => AggregateValue::Number(*n as f64),
            Accumulator::Ratio { valid, total } => {
                if *total == 0 {
                    AggregateValue::Absent
                } else {
                    let percent = round_half_up(*valid as f64 * 100.0 / *total as f64);
                    AggregateValue::Text(format!("{}%", format_number(percent)))
                }
            }
            Accumulator::Sum(sum) => AggregateValue::Number(*sum),
            Accumulator::Mean {
                total_value,
                total_count,
            } => {
                if *total_count == 0.0 {
                    AggregateValue::Absent
                } else {
                    AggregateValue::Number(total_value / total_count)
                }
            }
            Accumulator::Max(v) | Accumulator::Min(v) => {
                v.map_or(AggregateValue::Absent, AggregateValue::Number)
            }
        }
    }
}

fn pick_extreme(a: Option<f64>, b: Option<f64>, pick: fn(f64, f64) -> f64) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(pick(x, y)),
        (x, None) => x,
        (None, y) => y,
    }
}

fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

// ============================================================================
// AGGREGATION PHASES
// ============================================================================

/// Aggregates raw flattened rows for one measure.
/// Returns `None` when the statistic does not aggregate.
pub fn aggregate_leaves(
    rows: &[&FlattenedRow],
    measure_id: &str,
    stat: StatType,
) -> Option<Accumulator> {
    let total = rows.len() as u64;
    let values = || rows.iter().map(|row| row.measure(measure_id));

    let acc = match stat {
        StatType::None => return None,
        StatType::CountAll => Accumulator::Count(total),
        StatType::Empty => Accumulator::Count(values().filter(|v| !v.is_truthy()).count() as u64),
        StatType::Filled => Accumulator::Count(values().filter(|v| v.is_truthy()).count() as u64),
        StatType::Unique => Accumulator::Count(distinct_count(values())),
        StatType::PercentEmpty => Accumulator::Ratio {
            valid: values().filter(|v| !v.is_truthy()).count() as u64,
            total,
        },
        StatType::PercentFilled => Accumulator::Ratio {
            valid: values().filter(|v| v.is_truthy()).count() as u64,
            total,
        },
        StatType::PercentUnique => Accumulator::Ratio {
            valid: distinct_count(values()),
            total,
        },
        StatType::Sum => Accumulator::Sum(values().map(CellValue::numeric_sum).sum()),
        StatType::Average => Accumulator::Mean {
            total_value: values().map(CellValue::numeric_sum).sum(),
            total_count: values().map(CellValue::numeric_count).sum(),
        },
        StatType::Max => Accumulator::Max(values().filter_map(CellValue::numeric_max).reduce(f64::max)),
        StatType::Min => Accumulator::Min(values().filter_map(CellValue::numeric_min).reduce(f64::min)),
    };
    Some(acc)
}

/// Combines accumulators of finer-grained groups into one.
/// Returns `None` when the statistic does not aggregate.
pub fn combine_partials<'a, I>(partials: I, stat: StatType) -> Option<Accumulator>
where
    I: IntoIterator<Item = &'a Accumulator>,
{
    let mut acc = Accumulator::empty(stat)?;
    for partial in partials {
        acc.merge(partial);
    }
    Some(acc)
}

fn distinct_count<'a>(values: impl Iterator<Item = &'a CellValue>) -> u64 {
    values
        .map(CellValue::canonical)
        .collect::<FxHashSet<String>>()
        .len() as u64
}

// ============================================================================
// MEASURE RESULT
// ============================================================================

/// Aggregated state of every measure for one group (one matrix cell).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasureResult {
    entries: SmallVec<[(String, Accumulator); 3]>,
}

impl MeasureResult {
    pub fn new() -> Self {
        MeasureResult::default()
    }

    pub fn insert(&mut self, measure_id: &str, acc: Accumulator) {
        match self.entries.iter_mut().find(|(id, _)| id == measure_id) {
            Some(entry) => entry.1 = acc,
            None => self.entries.push((measure_id.to_string(), acc)),
        }
    }

    pub fn accumulator(&self, measure_id: &str) -> Option<&Accumulator> {
        self.entries
            .iter()
            .find(|(id, _)| id == measure_id)
            .map(|(_, acc)| acc)
    }

    /// Finished value for a measure; measures that were not aggregated
    /// are absent.
    pub fn value(&self, measure_id: &str) -> AggregateValue {
        self.accumulator(measure_id)
            .map_or(AggregateValue::Absent, Accumulator::value)
    }

    pub fn measure_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// AGGREGATE FUNCTION
// ============================================================================

/// Several `(measure id, stat)` pairs fused into one aggregation.
#[derive(Debug, Clone, Default)]
pub struct AggregateFunction {
    measures: Vec<(String, StatType)>,
}

impl AggregateFunction {
    pub fn new<I, S>(measures: I) -> Self
    where
        I: IntoIterator<Item = (S, StatType)>,
        S: Into<String>,
    {
        AggregateFunction {
            measures: measures
                .into_iter()
                .map(|(id, stat)| (id.into(), stat))
                .collect(),
        }
    }

    /// Builds the function for resolved measures. Count-all measures carry a
    /// literal 1 per row, so they aggregate with `Sum`.
    pub fn for_measures(measures: &[Measure]) -> Self {
        AggregateFunction::new(measures.iter().map(|m| {
            let stat = match m.source {
                MeasureSource::CountAll => StatType::Sum,
                MeasureSource::Field(_) => m.stat_type,
            };
            (m.id.clone(), stat)
        }))
    }

    pub fn measures(&self) -> &[(String, StatType)] {
        &self.measures
    }

    pub fn aggregate_leaves(&self, rows: &[&FlattenedRow]) -> MeasureResult {
        let mut result = MeasureResult::new();
        for (id, stat) in &self.measures {
            if let Some(acc) = aggregate_leaves(rows, id, *stat) {
                result.insert(id, acc);
            }
        }
        result
    }

    pub fn combine_partials(&self, partials: &[&MeasureResult]) -> MeasureResult {
        let mut result = MeasureResult::new();
        for (id, stat) in &self.measures {
            let accs = partials.iter().filter_map(|p| p.accumulator(id));
            if let Some(acc) = combine_partials(accs, *stat) {
                result.insert(id, acc);
            }
        }
        result
    }
}
