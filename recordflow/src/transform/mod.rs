//! Record processing.
//!
//! This module turns raw rows into processed records and dataset reports:
//! - Clean: key normalisation and value trimming
//! - Enrich: type coercion and derived fields
//! - Analysis: per-field statistics
//! - Pipeline: [`RecordProcessor`], the dataset-level entry point

pub mod analysis;
pub mod clean;
pub mod enrich;
pub mod pipeline;

pub use analysis::{analyze_rows, numeric_value};
pub use clean::{clean_record, normalize_key};
pub use enrich::{categorize_age, title_case, transform_record};
pub use pipeline::{rows_from_records, RecordProcessor, ValidationMode};
