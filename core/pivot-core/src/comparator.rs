//! FILENAME: core/pivot-core/src/comparator.rs
//! Heterogeneous ordering over cell values.
//!
//! Used to order drill-tree siblings and as the sort predicate of aggregated
//! grid columns. The rules are checked in a fixed order:
//! 1. A null left operand is Less, then a null right operand is Greater.
//!    The left side is checked first, so null against null is Less.
//! 2. Two numbers compare numerically.
//! 3. Two strings compare lexicographically.
//! 4. Two lists compare element-wise, then by length (shorter first).
//! 5. Two objects compare by `name` if the left one has it, else by `title`.
//! Every other pairing is Equal.
//!
//! Because of rule 1 and the mixed-type fallback this is not a total order,
//! so sorting goes through [`stable_sort_by`], which never panics on an
//! inconsistent comparator.

use std::cmp::Ordering;

use crate::value::{CellValue, Labeled};

// ============================================================================
// COMPARISON
// ============================================================================

/// Compares two cell values.
pub fn compare(x: &CellValue, y: &CellValue) -> Ordering {
    if x.is_null() {
        return Ordering::Less;
    }
    if y.is_null() {
        return Ordering::Greater;
    }

    match (x, y) {
        (CellValue::Number(a), CellValue::Number(b)) => {
            (a - b).partial_cmp(&0.0).unwrap_or(Ordering::Equal)
        }
        (CellValue::Text(a), CellValue::Text(b)) => a.cmp(b),
        (CellValue::List(a), CellValue::List(b)) => compare_lists(a, b),
        (CellValue::Labeled(a), CellValue::Labeled(b)) => compare_labeled(a, b),
        _ => Ordering::Equal,
    }
}

fn compare_lists(a: &[CellValue], b: &[CellValue]) -> Ordering {
    for (left, right) in a.iter().zip(b.iter()) {
        let cmp = match (left, right) {
            (CellValue::Labeled(l), CellValue::Labeled(r)) => {
                if l.name.is_some() {
                    compare(&key_value(&l.name), &key_value(&r.name))
                } else {
                    compare(&key_value(&l.title), &key_value(&r.title))
                }
            }
            _ => compare(left, right),
        };
        if cmp != Ordering::Equal {
            return cmp;
        }
    }
    a.len().cmp(&b.len())
}

fn compare_labeled(a: &Labeled, b: &Labeled) -> Ordering {
    if a.name.as_deref().is_some_and(|name| !name.is_empty()) {
        compare(&key_value(&a.name), &key_value(&b.name))
    } else {
        compare(&key_value(&a.title), &key_value(&b.title))
    }
}

fn key_value(key: &Option<String>) -> CellValue {
    key.as_ref().map_or(CellValue::Null, |s| CellValue::Text(s.clone()))
}

/// Ordering for sort keys: two nulls tie so equal keys keep their input
/// order, every other pair goes through [`compare`].
pub fn sort_ordering(x: &CellValue, y: &CellValue) -> Ordering {
    if x.is_null() && y.is_null() {
        Ordering::Equal
    } else {
        compare(x, y)
    }
}

// ============================================================================
// STABLE SORT
// ============================================================================

/// Stable merge sort that tolerates comparators which are not total orders.
///
/// `slice::sort_by` may panic when the comparator is inconsistent, which the
/// rules above allow (mixed types compare Equal).
pub fn stable_sort_by<T, F>(items: &mut Vec<T>, mut cmp: F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    if items.len() < 2 {
        return;
    }
    let mut runs: Vec<Vec<T>> = items.drain(..).map(|item| vec![item]).collect();
    while runs.len() > 1 {
        let mut merged = Vec::with_capacity(runs.len() / 2 + 1);
        let mut iter = runs.into_iter();
        while let Some(left) = iter.next() {
            match iter.next() {
                Some(right) => merged.push(merge_runs(left, right, &mut cmp)),
                None => merged.push(left),
            }
        }
        runs = merged;
    }
    if let Some(sorted) = runs.pop() {
        *items = sorted;
    }
}

fn merge_runs<T, F>(left: Vec<T>, right: Vec<T>, cmp: &mut F) -> Vec<T>
where
    F: FnMut(&T, &T) -> Ordering,
{
    let mut out = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => cmp(r, l) == Ordering::Less,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };
        let next = if take_right { right.next() } else { left.next() };
        if let Some(item) = next {
            out.push(item);
        }
    }
    out
}
