//! # Recordflow - tabular data ingestion, validation and analysis
//!
//! Recordflow reads delimited and JSON files, cleans and enriches their rows,
//! validates them against field rules and produces descriptive statistics.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  CSV / JSON │────▶│    Files    │────▶│  Transform  │────▶│ CSV / JSON  │
//! │   (input)   │     │ (auto-enc)  │     │ (validate)  │     │  (reports)  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use recordflow::{AppContext, RecordProcessor, Settings};
//! use serde_json::json;
//!
//! let ctx = AppContext::new(Settings::from_value(json!({})).unwrap());
//! let processor = RecordProcessor::new(&ctx);
//!
//! let rows = vec![json!({"name": "Ann", "email": "ann@example.com"})];
//! let report = processor.validate_dataset(&rows);
//! assert_eq!(report.valid_records, 1);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy with display codes
//! - [`models`] - Records and result types
//! - [`config`] - Layered settings (file, environment, overrides)
//! - [`logging`] - `tracing` subscriber setup
//! - [`context`] - Process-wide context handed to constructors
//! - [`middleware`] - Retry and timing wrappers
//! - [`cache`] - TTL memoisation
//! - [`parser`] - Encoding and delimiter detection, CSV parsing
//! - [`files`] - File access service
//! - [`validation`] - Field rules
//! - [`transform`] - Cleaning, enrichment, dataset operations
//! - [`commands`] - CLI command dispatcher

// Core modules
pub mod error;
pub mod models;

// Configuration
pub mod config;
pub mod context;
pub mod logging;

// Call wrappers
pub mod cache;
pub mod middleware;

// I/O
pub mod files;
pub mod parser;

// Validation
pub mod validation;

// Processing
pub mod transform;

// CLI
pub mod commands;

// =============================================================================
// Re-exports - Errors and models
// =============================================================================

pub use error::{AppError, AppResult};

pub use models::{
    DatasetAnalysis,
    DatasetValidation,
    FieldIssue,
    FieldStatistics,
    ProcessingError,
    ProcessingResult,
    Record,
    RowIssue,
    ValidationResult,
};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::{Settings, SettingsLoader};
pub use context::AppContext;

// =============================================================================
// Re-exports - Wrappers
// =============================================================================

pub use cache::TtlCache;
pub use middleware::{timed, timed_result, RetryPolicy};

// =============================================================================
// Re-exports - Files and parsing
// =============================================================================

pub use files::{FileService, TableFormat};
pub use parser::{
    decode_content,
    detect_delimiter,
    detect_encoding,
    parse_bytes_auto,
    CsvError,
    ParseResult,
};

// =============================================================================
// Re-exports - Validation and processing
// =============================================================================

pub use validation::{FieldType, FieldValidator};
pub use transform::{RecordProcessor, ValidationMode};

// =============================================================================
// Re-exports - Commands
// =============================================================================

pub use commands::{Command, CommandDispatcher};
