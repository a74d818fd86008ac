//! File-based commands: process, validate, analyze and convert.

use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::CommandDispatcher;
use crate::error::{AppError, AppResult};
use crate::files::TableFormat;
use crate::middleware::{timed, timed_result};
use crate::models::Record;
use crate::transform::{rows_from_records, ValidationMode};

/// `processed_<file name>` in the directory of `input`.
pub(crate) fn default_process_output(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output.csv".to_string());
    input.with_file_name(format!("processed_{name}"))
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Objects from a structured document: an array of objects or one object.
fn records_from_document(path: &Path, document: Value) -> AppResult<Vec<Record>> {
    let entries = match document {
        Value::Array(items) => items,
        other => vec![other],
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| match entry {
            Value::Object(record) => Ok(record),
            other => Err(AppError::Format {
                path: path.to_path_buf(),
                message: format!("entry {i} is not an object: {other}"),
            }),
        })
        .collect()
}

impl CommandDispatcher {
    fn encoding(&self) -> &str {
        self.files.default_encoding()
    }

    fn read_table_with_retry(&self, path: &Path) -> AppResult<Vec<Record>> {
        timed_result("read_table", || {
            self.ctx
                .retry()
                .run("read_table", || self.files.read_table(path, self.encoding()))
        })
    }

    fn missing_input<W: Write>(&self, label: &str, path: &Path, out: &mut W) -> AppResult<i32> {
        writeln!(out, "❌ Error: {label} '{}' not found", path.display())?;
        Ok(1)
    }

    pub(super) fn run_process<W: Write>(
        &self,
        file: &Path,
        output: Option<&Path>,
        skip_validation: bool,
        out: &mut W,
    ) -> AppResult<i32> {
        writeln!(out, "📊 Processing data file: {}", file.display())?;
        if !self.files.exists(file) {
            return self.missing_input("File", file, out);
        }

        writeln!(out, "📖 Reading input data...")?;
        let rows = rows_from_records(self.read_table_with_retry(file)?);
        writeln!(out, "✅ Read {} records", rows.len())?;

        writeln!(out, "🔄 Processing data...")?;
        let (result, elapsed) = timed("process_dataset", || self.processor.process_dataset(&rows));
        writeln!(
            out,
            "✅ Processed {} records in {:.1} ms",
            result.processed_count,
            elapsed.as_secs_f64() * 1000.0
        )?;

        if !result.is_success() {
            writeln!(out, "\n⚠️  {} records could not be processed:", result.error_count)?;
            Self::print_bounded(
                out,
                result
                    .errors
                    .iter()
                    .map(|e| format!("Row {}: {}", e.row, e.message)),
                result.error_count,
            )?;
        }

        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| default_process_output(file));
        writeln!(out, "💾 Writing results to: {}", output.display())?;
        self.ctx.retry().run("write_table", || {
            self.files.write_table(&output, &result.records, self.encoding())
        })?;

        if !skip_validation {
            let processed = rows_from_records(result.records);
            let (summary, _) = timed("validate_dataset", || self.processor.validate_dataset(&processed));
            writeln!(
                out,
                "🔍 Validation: {} of {} processed records valid",
                summary.valid_records, summary.total_records
            )?;
            if !summary.errors.is_empty() {
                Self::print_bounded(
                    out,
                    summary
                        .errors
                        .iter()
                        .map(|e| format!("Row {}: {}", e.row, e.message)),
                    summary.errors.len(),
                )?;
            }
        }

        writeln!(out, "✅ Processing completed successfully")?;
        Ok(0)
    }

    pub(super) fn run_validate<W: Write>(
        &self,
        file: &Path,
        output: Option<&Path>,
        strict: bool,
        out: &mut W,
    ) -> AppResult<i32> {
        writeln!(out, "🔍 Validating data file: {}", file.display())?;
        if !self.files.exists(file) {
            return self.missing_input("File", file, out);
        }

        let rows = rows_from_records(self.read_table_with_retry(file)?);
        let mode = if strict {
            ValidationMode::Strict
        } else {
            ValidationMode::Standard
        };
        let (results, _) = timed("validate_dataset", || {
            self.processor.validate_dataset_with(&rows, mode)
        });

        let total = results.total_records;
        let valid = results.valid_records;
        let invalid = results.invalid_records;

        writeln!(out, "\n📋 Validation Results:")?;
        writeln!(out, "   Total records: {total}")?;
        writeln!(out, "   Valid records: {valid} ({:.1}%)", percent(valid, total))?;
        writeln!(out, "   Invalid records: {invalid} ({:.1}%)", percent(invalid, total))?;

        if results.errors.is_empty() {
            writeln!(out, "\n✅ All records are valid!")?;
        } else {
            writeln!(out, "\n❌ Validation Errors ({} total):", results.errors.len())?;
            Self::print_bounded(
                out,
                results
                    .errors
                    .iter()
                    .map(|e| format!("Row {}: {}", e.row, e.message)),
                results.errors.len(),
            )?;

            if let Some(report_path) = output {
                self.files
                    .write_structured(report_path, &results.to_report(), self.encoding(), Some(2))?;
                writeln!(out, "\n📄 Detailed error report saved to: {}", report_path.display())?;
            }
        }

        Ok(if invalid == 0 { 0 } else { 1 })
    }

    pub(super) fn run_analyze<W: Write>(
        &self,
        file: &Path,
        output: Option<&Path>,
        include_nulls: bool,
        out: &mut W,
    ) -> AppResult<i32> {
        writeln!(out, "📊 Analyzing data file: {}", file.display())?;
        if !self.files.exists(file) {
            return self.missing_input("File", file, out);
        }

        let rows = rows_from_records(self.read_table_with_retry(file)?);
        let (analysis, _) = timed("analyze_dataset", || self.processor.analyze_dataset(&rows));

        writeln!(out, "\n📈 Analysis Results:")?;
        writeln!(out, "   Total Records: {}", analysis.total_records)?;
        writeln!(out, "   Fields: {}", analysis.fields.len())?;

        writeln!(out, "\n🏷️  Field Analysis:")?;
        for field in &analysis.fields {
            let Some(stats) = analysis.field(field) else {
                continue;
            };
            writeln!(out, "   {field}:")?;
            writeln!(out, "      Non-null: {}/{}", stats.non_null_count, stats.total_count)?;
            if include_nulls {
                writeln!(out, "      Null: {}", stats.null_count)?;
            }
            writeln!(out, "      Unique values: {}", stats.unique_count)?;
            if let (Some(min), Some(max), Some(mean)) = (stats.min, stats.max, stats.mean) {
                writeln!(out, "      Range: {min:.2} - {max:.2}")?;
                writeln!(out, "      Average: {mean:.2}")?;
            }
        }

        if let Some(path) = output {
            self.files
                .write_structured(path, &analysis, self.encoding(), Some(2))?;
            writeln!(out, "\n💾 Analysis saved to: {}", path.display())?;
        }

        Ok(0)
    }

    pub(super) fn run_convert<W: Write>(
        &self,
        input: &Path,
        output: &Path,
        pretty: bool,
        out: &mut W,
    ) -> AppResult<i32> {
        writeln!(out, "🔄 Converting file: {} -> {}", input.display(), output.display())?;
        if !self.files.exists(input) {
            return self.missing_input("Input file", input, out);
        }

        let records = match TableFormat::from_path(input) {
            Some(TableFormat::Delimited) => self.read_table_with_retry(input)?,
            Some(TableFormat::Structured) => {
                let document = self
                    .ctx
                    .retry()
                    .run("read_structured", || self.files.read_structured(input, self.encoding()))?;
                records_from_document(input, document)?
            }
            None => {
                return Err(AppError::InvalidArgument(format!(
                    "Unsupported input format: {}",
                    input.display()
                )))
            }
        };

        if records.is_empty() {
            writeln!(out, "⚠️  No records found in {}, nothing written", input.display())?;
            return Ok(0);
        }

        match TableFormat::from_path(output) {
            Some(TableFormat::Delimited) => {
                self.files.write_table(output, &records, self.encoding())?;
            }
            Some(TableFormat::Structured) => {
                let indent = pretty.then_some(2);
                self.files
                    .write_structured(output, &records, self.encoding(), indent)?;
            }
            None => {
                return Err(AppError::InvalidArgument(format!(
                    "Unsupported output format: {}",
                    output.display()
                )))
            }
        }

        writeln!(out, "✅ Successfully converted {} records", records.len())?;
        writeln!(out, "📄 Output saved to: {}", output.display())?;
        Ok(0)
    }
}
