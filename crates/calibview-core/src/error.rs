//! Error types for calibview.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for calibview operations.
///
/// Every variant is fatal: loading stops at the first one and no scene is built.
/// Lenient conditions (unknown transform types, absent optional numbers, unused
/// zones) are logged instead and never show up here.
#[derive(Error, Debug)]
pub enum CalibviewError {
    /// A configuration file could not be opened.
    #[error("config file not found: {}", .path.display())]
    ConfigNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A required key is absent.
    #[error("missing field '{key}' in {}", .path.display())]
    MissingField { path: PathBuf, key: String },

    /// A value that should be numeric could not be converted.
    #[error("malformed number for '{key}' in {}: {value}", .path.display())]
    MalformedNumber {
        path: PathBuf,
        key: String,
        value: String,
    },

    /// A numeric array has the wrong number of entries.
    #[error("malformed array '{key}' in {}: expected {expected} values, got {actual}", .path.display())]
    MalformedArray {
        path: PathBuf,
        key: String,
        expected: usize,
        actual: usize,
    },

    /// A value has the wrong JSON type.
    #[error("field '{key}' in {} must be {expected}", .path.display())]
    UnexpectedType {
        path: PathBuf,
        key: String,
        expected: &'static str,
    },

    /// A car model entry lacks its structural markers.
    #[error("malformed model entry '{name}': {reason}")]
    MalformedModelEntry { name: String, reason: String },

    /// The requested car model is not in the registry.
    #[error("model '{name}' not found in {}", .path.display())]
    ModelNotFound { name: String, path: PathBuf },

    /// A visualization parameter is out of range.
    #[error("invalid parameter '{key}': {value} (must be finite and positive)")]
    InvalidParameter { key: String, value: f64 },

    /// A zone id outside `1..=ZONE_COUNT`.
    #[error("zone number must be between 1 and {max}, got {id}")]
    InvalidZoneId { id: i64, max: u32 },

    /// The file is not valid JSON.
    #[error("JSON error in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A specialized Result type for calibview operations.
pub type Result<T> = std::result::Result<T, CalibviewError>;
