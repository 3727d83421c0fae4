//! # File I/O Module
//!
//! Reads and writes settings, lookup tables and work documents.
//!
//! - **Format by extension**: `.toml` goes through `toml`, anything else is JSON
//! - **Atomic saves**: write to `.tmp`, sync, rename over the target
//! - **Validated tables**: a table file is checked before it is returned
//!
//! ## Example
//!
//! ```rust,no_run
//! use rab_core::file_io::{load_settings, load_tables};
//! use std::path::Path;
//!
//! let settings = load_settings(Path::new("rab.toml"))?;
//! let tables = load_tables(Path::new("tables.json"))?;
//! settings.validate(&tables)?;
//! # Ok::<(), rab_core::errors::CalcError>(())
//! ```

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::{CalcError, CalcResult};
use crate::settings::EstimationSettings;
use crate::tables::LookupTables;

/// On-disk document format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Toml,
}

impl DocumentFormat {
    /// Pick the format from a file extension (JSON unless `.toml`)
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => DocumentFormat::Toml,
            _ => DocumentFormat::Json,
        }
    }
}

/// Read and deserialize a document, choosing the format by extension.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> CalcResult<T> {
    let contents = fs::read_to_string(path)
        .map_err(|e| CalcError::config_error("read", path.display().to_string(), e.to_string()))?;

    match DocumentFormat::from_path(path) {
        DocumentFormat::Toml => {
            toml::from_str(&contents).map_err(|e| CalcError::SerializationError {
                reason: format!("Invalid TOML in {}: {}", path.display(), e),
            })
        }
        DocumentFormat::Json => {
            serde_json::from_str(&contents).map_err(|e| CalcError::SerializationError {
                reason: format!("Invalid JSON in {}: {}", path.display(), e),
            })
        }
    }
}

/// Serialize a document and save it with atomic write semantics.
///
/// The save process:
/// 1. Serialize (format by extension)
/// 2. Write to a temporary file next to the target
/// 3. Sync to disk
/// 4. Rename over the target
pub fn write_document<T: Serialize>(value: &T, path: &Path) -> CalcResult<()> {
    let text = match DocumentFormat::from_path(path) {
        DocumentFormat::Toml => {
            toml::to_string_pretty(value).map_err(|e| CalcError::SerializationError {
                reason: e.to_string(),
            })?
        }
        DocumentFormat::Json => serde_json::to_string_pretty(value)?,
    };

    let tmp_path = path.with_extension(match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}.tmp", ext),
        None => "tmp".to_string(),
    });

    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        CalcError::config_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;
    tmp_file.write_all(text.as_bytes()).map_err(|e| {
        CalcError::config_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;
    tmp_file.sync_all().map_err(|e| {
        CalcError::config_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        CalcError::config_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    tracing::debug!(path = %path.display(), "document saved");
    Ok(())
}

/// Load estimation settings; missing fields take their defaults.
pub fn load_settings(path: &Path) -> CalcResult<EstimationSettings> {
    let settings = read_document(path)?;
    tracing::info!(path = %path.display(), "settings loaded");
    Ok(settings)
}

/// Save estimation settings atomically.
pub fn save_settings(settings: &EstimationSettings, path: &Path) -> CalcResult<()> {
    write_document(settings, path)
}

/// Load a complete table set and validate it.
///
/// # Errors
///
/// * `ConfigError` / `SerializationError` - unreadable file
/// * any table validation error (unknown default grade, bad preset, ...)
pub fn load_tables(path: &Path) -> CalcResult<LookupTables> {
    let tables: LookupTables = read_document(path)?;
    tables.validate()?;
    tracing::info!(
        path = %path.display(),
        grades = tables.concrete_grades.len(),
        presets = tables.conversion_presets.len(),
        "lookup tables loaded"
    );
    Ok(tables)
}
