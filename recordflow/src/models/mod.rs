//! Domain models for the recordflow pipeline.
//!
//! - [`Record`] - one ingested row as an ordered field → value map
//! - [`ValidationResult`] - per-record outcome with itemised errors/warnings
//! - [`ProcessingResult`] - dataset-level outcome of cleaning + transformation
//! - [`DatasetValidation`] - dataset-level validation summary
//! - [`FieldStatistics`] / [`DatasetAnalysis`] - descriptive statistics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

// =============================================================================
// Record
// =============================================================================

/// One row of tabular data.
///
/// Values are JSON scalars (string, number, boolean or null). Insertion order
/// is preserved.
pub type Record = Map<String, Value>;

/// Build a [`Record`] from string pairs. Mostly useful for sample data and tests.
pub fn record_from_pairs<'a, I>(pairs: I) -> Record
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect()
}

/// Render a scalar value the way it appears in a delimited file.
///
/// Null becomes an empty cell, strings are written verbatim and every other
/// value uses its JSON text.
pub fn value_to_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// =============================================================================
// Validation
// =============================================================================

/// A message attached to a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Outcome of validating one record.
///
/// `is_valid` always equals `errors.is_empty()`; issues can only be appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    is_valid: bool,
    errors: Vec<FieldIssue>,
    warnings: Vec<FieldIssue>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldIssue::new(field, message));
        self.is_valid = false;
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(FieldIssue::new(field, message));
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn errors(&self) -> &[FieldIssue] {
        &self.errors
    }

    pub fn warnings(&self) -> &[FieldIssue] {
        &self.warnings
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn error_messages(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.message.as_str()).collect()
    }

    pub fn warning_messages(&self) -> Vec<&str> {
        self.warnings.iter().map(|w| w.message.as_str()).collect()
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// One error line in a dataset validation report. `row` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowIssue {
    pub row: usize,
    pub field: String,
    pub message: String,
}

/// Dataset-level validation summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetValidation {
    pub total_records: usize,
    pub valid_records: usize,
    pub invalid_records: usize,
    pub errors: Vec<RowIssue>,
}

impl DatasetValidation {
    /// The structured report persisted by the `validate` command.
    pub fn to_report(&self) -> Value {
        serde_json::json!({
            "summary": {
                "total_records": self.total_records,
                "valid_records": self.valid_records,
                "invalid_records": self.invalid_records,
            },
            "errors": self.errors,
        })
    }
}

// =============================================================================
// Processing
// =============================================================================

/// A record that could not be cleaned or transformed. `row` is 0-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingError {
    pub row: usize,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

/// Dataset-level outcome of [`crate::transform::RecordProcessor::process_dataset`].
///
/// `error_count` always equals `errors.len()`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessingResult {
    pub records: Vec<Record>,
    pub processed_count: usize,
    pub error_count: usize,
    pub errors: Vec<ProcessingError>,
    pub metadata: Map<String, Value>,
}

impl ProcessingResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_record(&mut self, record: Record) {
        self.records.push(record);
        self.processed_count += 1;
    }

    pub fn add_error(&mut self, row: usize, message: impl Into<String>, data: Option<Value>) {
        self.errors.push(ProcessingError {
            row,
            message: message.into(),
            data,
            timestamp: Utc::now(),
        });
        self.error_count += 1;
    }

    pub fn is_success(&self) -> bool {
        self.error_count == 0
    }
}

// =============================================================================
// Analysis
// =============================================================================

/// Descriptive statistics for one field.
///
/// `total_count == non_null_count + null_count`. `min`, `max` and `mean` are
/// present iff at least one value coerces to a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldStatistics {
    pub total_count: usize,
    pub non_null_count: usize,
    pub null_count: usize,
    pub unique_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
}

/// Dataset-level statistics. `fields` keeps first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetAnalysis {
    pub total_records: usize,
    pub fields: Vec<String>,
    pub statistics: BTreeMap<String, FieldStatistics>,
}

impl DatasetAnalysis {
    pub fn field(&self, name: &str) -> Option<&FieldStatistics> {
        self.statistics.get(name)
    }
}
