//! Descriptive statistics over a dataset.

use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

use crate::models::{DatasetAnalysis, FieldStatistics};

/// Numeric view of a value for statistics: numbers, booleans (0/1) and
/// strings that parse as a finite float after trimming.
pub fn numeric_value(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// Field names in first-seen order across all object rows.
pub fn collect_fields(rows: &[Value]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut fields = Vec::new();

    for row in rows.iter().filter_map(Value::as_object) {
        for key in row.keys() {
            if seen.insert(key.as_str()) {
                fields.push(key.clone());
            }
        }
    }

    fields
}

/// Statistics for one field. Rows without the field count as null.
///
/// `min`, `max` and `mean` cover the values that coerce to a number; the rest
/// are skipped.
pub fn analyze_field(rows: &[Value], field: &str) -> FieldStatistics {
    let non_null: Vec<&Value> = rows
        .iter()
        .filter_map(|row| row.get(field))
        .filter(|v| !v.is_null())
        .collect();

    let unique: HashSet<String> = non_null.iter().map(|v| v.to_string()).collect();
    let numbers: Vec<f64> = non_null.iter().filter_map(|v| numeric_value(v)).collect();

    let (min, max, mean) = if numbers.is_empty() {
        (None, None, None)
    } else {
        let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
        let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;
        (Some(min), Some(max), Some(mean))
    };

    FieldStatistics {
        total_count: rows.len(),
        non_null_count: non_null.len(),
        null_count: rows.len() - non_null.len(),
        unique_count: unique.len(),
        min,
        max,
        mean,
    }
}

/// Per-field statistics for a dataset. An empty dataset yields an empty analysis.
pub fn analyze_rows(rows: &[Value]) -> DatasetAnalysis {
    let fields = collect_fields(rows);
    let statistics: BTreeMap<String, FieldStatistics> = fields
        .iter()
        .map(|field| (field.clone(), analyze_field(rows, field)))
        .collect();

    DatasetAnalysis {
        total_records: rows.len(),
        fields,
        statistics,
    }
}
