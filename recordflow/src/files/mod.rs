//! File access: the boundary between the pipeline and the filesystem.
//!
//! Two formats are supported:
//!
//! - **delimited** (`.csv`): read with delimiter auto-detection, written with
//!   a sorted-union header
//! - **structured** (`.json`): any JSON document
//!
//! Every write creates missing parent directories. Writes are not atomic: a
//! failure midway can leave a partial file behind.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::TtlCache;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::models::{value_to_cell, Record};
use crate::parser::{encode_content, parse_bytes_auto};

/// File formats understood by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Delimited,
    Structured,
}

impl TableFormat {
    /// Format implied by the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(TableFormat::Delimited),
            "json" => Some(TableFormat::Structured),
            _ => None,
        }
    }
}

/// Reads and writes tabular and structured files.
pub struct FileService {
    data_directory: PathBuf,
    encoding: String,
    structured_cache: Option<Mutex<TtlCache<PathBuf, Value>>>,
}

impl FileService {
    pub fn new(ctx: &AppContext) -> Self {
        let settings = ctx.settings();
        Self {
            data_directory: settings.data_directory(),
            encoding: settings.file_encoding().to_string(),
            structured_cache: settings
                .cache_ttl()
                .map(|ttl| Mutex::new(TtlCache::new(Some(ttl)))),
        }
    }

    /// Memoise [`FileService::read_structured`] for `ttl` (forever when `None`).
    pub fn with_structured_cache(mut self, ttl: Option<std::time::Duration>) -> Self {
        self.structured_cache = Some(Mutex::new(TtlCache::new(ttl)));
        self
    }

    /// Encoding label configured for this service.
    pub fn default_encoding(&self) -> &str {
        &self.encoding
    }

    pub fn data_directory(&self) -> &Path {
        &self.data_directory
    }

    /// Create the configured data directory if it does not exist yet.
    pub fn ensure_data_directory(&self) -> AppResult<()> {
        fs::create_dir_all(&self.data_directory)
            .map_err(|e| AppError::from_write(&self.data_directory, e))
    }

    /// Whether `path` exists. OS errors count as "does not exist".
    pub fn exists(&self, path: &Path) -> bool {
        match path.try_exists() {
            Ok(exists) => exists,
            Err(e) => {
                debug!("Error checking file existence for {}: {}", path.display(), e);
                false
            }
        }
    }

    // =========================================================================
    // Delimited files
    // =========================================================================

    /// Read a delimited file into records, one per data row.
    pub fn read_table(&self, path: &Path, encoding: &str) -> AppResult<Vec<Record>> {
        info!("Reading CSV file: {}", path.display());

        let bytes = fs::read(path).map_err(|e| AppError::from_read(path, e))?;
        let parsed = parse_bytes_auto(&bytes, encoding).map_err(|e| AppError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        debug!(
            "Parsed {} with encoding {} and delimiter {:?}",
            path.display(),
            parsed.encoding,
            parsed.delimiter
        );
        info!("Successfully read {} rows from {}", parsed.records.len(), path.display());
        Ok(parsed.records)
    }

    /// Write records as CSV. The header is the sorted union of all field names.
    ///
    /// Writing an empty batch is a no-op that only logs a warning.
    pub fn write_table(&self, path: &Path, records: &[Record], encoding: &str) -> AppResult<()> {
        if records.is_empty() {
            warn!("No data to write to CSV: {}", path.display());
            return Ok(());
        }

        info!("Writing {} rows to CSV file: {}", records.len(), path.display());
        create_parent_dirs(path)?;

        let header: Vec<&str> = records
            .iter()
            .flat_map(|r| r.keys().map(String::as_str))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
        writer
            .write_record(&header)
            .map_err(|e| AppError::from_write(path, e))?;

        for record in records {
            let row = header
                .iter()
                .map(|field| record.get(*field).map(value_to_cell).unwrap_or_default());
            writer
                .write_record(row)
                .map_err(|e| AppError::from_write(path, e))?;
        }

        let text = writer
            .into_inner()
            .map_err(|e| AppError::from_write(path, e))
            .and_then(|buf| String::from_utf8(buf).map_err(|e| AppError::from_write(path, e)))?;
        let bytes = encode_content(&text, encoding).map_err(|e| AppError::from_write(path, e))?;
        fs::write(path, bytes).map_err(|e| AppError::from_write(path, e))?;

        info!("Successfully wrote data to {}", path.display());
        Ok(())
    }

    // =========================================================================
    // Structured files
    // =========================================================================

    /// Read and parse a JSON document.
    pub fn read_structured(&self, path: &Path, encoding: &str) -> AppResult<Value> {
        match &self.structured_cache {
            Some(cache) => {
                let mut cache = cache.lock().unwrap_or_else(|e| e.into_inner());
                cache.get_or_try_insert_with(path.to_path_buf(), || {
                    read_structured_uncached(path, encoding)
                })
            }
            None => read_structured_uncached(path, encoding),
        }
    }

    /// Serialise `value` as JSON. `indent: None` writes compact output.
    pub fn write_structured<T: Serialize + ?Sized>(
        &self,
        path: &Path,
        value: &T,
        encoding: &str,
        indent: Option<usize>,
    ) -> AppResult<()> {
        info!("Writing JSON file: {}", path.display());
        create_parent_dirs(path)?;

        let mut buf = Vec::new();
        match indent {
            Some(width) => {
                let pad = vec![b' '; width];
                let formatter = serde_json::ser::PrettyFormatter::with_indent(&pad);
                let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
                value
                    .serialize(&mut ser)
                    .map_err(|e| AppError::from_write(path, e))?;
            }
            None => {
                serde_json::to_writer(&mut buf, value).map_err(|e| AppError::from_write(path, e))?;
            }
        }

        let text = String::from_utf8(buf).map_err(|e| AppError::from_write(path, e))?;
        let bytes = encode_content(&text, encoding).map_err(|e| AppError::from_write(path, e))?;
        fs::write(path, bytes).map_err(|e| AppError::from_write(path, e))?;

        info!("Successfully wrote JSON file: {}", path.display());
        Ok(())
    }
}

fn read_structured_uncached(path: &Path, encoding: &str) -> AppResult<Value> {
    info!("Reading JSON file: {}", path.display());

    let bytes = fs::read(path).map_err(|e| AppError::from_read(path, e))?;
    let (text, _) = crate::parser::decode_content(&bytes, encoding).map_err(|e| AppError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    serde_json::from_str(&text).map_err(|e| AppError::Format {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn create_parent_dirs(path: &Path) -> AppResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| AppError::from_write(path, e))
        }
        _ => Ok(()),
    }
}
