//! Dataset-level operations: process, validate and analyze.
//!
//! # Example
//!
//! ```rust
//! use recordflow::config::Settings;
//! use recordflow::context::AppContext;
//! use recordflow::transform::RecordProcessor;
//! use serde_json::json;
//!
//! let ctx = AppContext::new(Settings::from_value(json!({})).unwrap());
//! let processor = RecordProcessor::new(&ctx);
//!
//! let rows = vec![json!({"Name": " john doe ", "Age": "30", "Email": "John@Example.com"})];
//! let result = processor.process_dataset(&rows);
//!
//! assert_eq!(result.processed_count, 1);
//! assert_eq!(result.records[0]["age_category"], "Adult");
//! ```

use chrono::Utc;
use serde_json::Value;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use super::analysis::analyze_rows;
use super::clean::clean_record;
use super::enrich::transform_record;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::models::{DatasetAnalysis, DatasetValidation, ProcessingResult, Record, RowIssue};
use crate::validation::FieldValidator;

/// How warnings count during dataset validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Only errors make a record invalid.
    #[default]
    Standard,
    /// Warnings are reported as errors too.
    Strict,
}

/// Cleans, transforms, validates and analyzes datasets.
#[derive(Debug, Clone)]
pub struct RecordProcessor {
    app_name: String,
    validator: FieldValidator,
}

impl RecordProcessor {
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            app_name: ctx.settings().app_name().to_string(),
            validator: FieldValidator::new(),
        }
    }

    pub fn validator(&self) -> &FieldValidator {
        &self.validator
    }

    /// Clean and transform every row. Rows that fail are recorded in
    /// `errors` (0-based) and left out of `records`; the batch never aborts.
    pub fn process_dataset(&self, rows: &[Value]) -> ProcessingResult {
        info!("Processing dataset with {} records", rows.len());
        let started = Instant::now();
        let started_at = Utc::now();
        let mut result = ProcessingResult::new();

        for (i, row) in rows.iter().enumerate() {
            match process_row(row, i) {
                Ok(record) => result.push_record(record),
                Err(e) => {
                    warn!("Error processing record {}: {}", i, e);
                    result.add_error(i, e.to_string(), Some(row.clone()));
                }
            }
        }

        info!(
            "Processed {} records successfully, {} errors",
            result.processed_count, result.error_count
        );
        if !result.is_success() {
            warn!("Processing completed with {} errors", result.error_count);
        }

        let metadata = &mut result.metadata;
        metadata.insert("run_id".into(), Value::from(Uuid::new_v4().to_string()));
        metadata.insert("processor".into(), Value::from(self.app_name.clone()));
        metadata.insert("input_records".into(), Value::from(rows.len()));
        metadata.insert("started_at".into(), Value::from(started_at.to_rfc3339()));
        metadata.insert(
            "elapsed_ms".into(),
            Value::from(started.elapsed().as_millis() as u64),
        );

        result
    }

    /// [`RecordProcessor::validate_dataset_with`] in standard mode.
    pub fn validate_dataset(&self, rows: &[Value]) -> DatasetValidation {
        self.validate_dataset_with(rows, ValidationMode::Standard)
    }

    /// Validate every row. Error rows are 1-based.
    pub fn validate_dataset_with(&self, rows: &[Value], mode: ValidationMode) -> DatasetValidation {
        info!("Validating dataset with {} records", rows.len());
        let mut summary = DatasetValidation {
            total_records: rows.len(),
            ..Default::default()
        };

        for (i, row) in rows.iter().enumerate() {
            let row_number = i + 1;
            let Some(record) = row.as_object() else {
                summary.invalid_records += 1;
                summary.errors.push(RowIssue {
                    row: row_number,
                    field: "general".to_string(),
                    message: format!("Validation error: expected an object, got {row}"),
                });
                continue;
            };

            let result = self.validator.validate_record(record);
            let strict = mode == ValidationMode::Strict;
            if !result.has_errors() && !(strict && result.has_warnings()) {
                summary.valid_records += 1;
                continue;
            }

            summary.invalid_records += 1;
            let warnings: &[_] = if strict { result.warnings() } else { &[] };
            summary
                .errors
                .extend(result.errors().iter().chain(warnings).map(|issue| RowIssue {
                    row: row_number,
                    field: issue.field.clone(),
                    message: issue.message.clone(),
                }));
        }

        info!(
            "Validation complete: {} valid, {} invalid",
            summary.valid_records, summary.invalid_records
        );
        summary
    }

    pub fn analyze_dataset(&self, rows: &[Value]) -> DatasetAnalysis {
        info!("Analyzing dataset with {} records", rows.len());
        analyze_rows(rows)
    }
}

fn process_row(row: &Value, index: usize) -> AppResult<Record> {
    let record = row.as_object().ok_or_else(|| AppError::DataProcessing {
        row: index,
        message: format!("expected an object, got {row}"),
    })?;

    let mut processed = transform_record(clean_record(record))?;
    processed.insert("_processed_at".into(), Value::from(Utc::now().to_rfc3339()));
    processed.insert("_row_index".into(), Value::from(index));
    Ok(processed)
}

/// Wrap records as JSON rows for the dataset operations.
pub fn rows_from_records(records: Vec<Record>) -> Vec<Value> {
    records.into_iter().map(Value::Object).collect()
}
