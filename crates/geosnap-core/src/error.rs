//! Error types for the GeoSnap extraction and export pipeline.
//!
//! Errors are organized by stage. Per-item extraction errors never escape the
//! orchestrator: they are converted into skip reasons on the batch report.
//! Only whole-batch conditions (an input that cannot be enumerated) and
//! per-format export failures reach the caller as `Err`.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for GeoSnap operations.
#[derive(Error, Debug)]
pub enum GeoSnapError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Extraction errors that abort a whole batch
    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    /// Export serialization or write errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Extraction errors.
///
/// `UnreadableImage` and `MalformedCoordinate` are per-item and become skip
/// reasons. `InputNotFound` and `Enumerate` are fatal for the whole batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    /// The byte stream could not be decoded as an image
    #[error("Unreadable image {file}: {message}")]
    UnreadableImage { file: String, message: String },

    /// GPS block present but a component or hemisphere flag is unusable
    #[error("Malformed coordinate in {file}: {message}")]
    MalformedCoordinate { file: String, message: String },

    /// The batch input does not exist
    #[error("Input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// The batch input exists but could not be listed
    #[error("Cannot enumerate {}: {message}", path.display())]
    Enumerate { path: PathBuf, message: String },
}

/// Export errors, reported per format.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Caller asked for an export without choosing a single format
    #[error("No export format selected")]
    NoFormatSelected,

    /// Unknown format name (config or CLI)
    #[error("Unknown export format: {0}")]
    UnknownFormat(String),

    /// Tabular encoder failure
    #[error("CSV encoding failed: {0}")]
    Csv(String),

    /// Point-markup encoder failure
    #[error("KML encoding failed: {0}")]
    Xml(String),

    /// Geometry file set encoder failure
    #[error("Shapefile encoding failed: {0}")]
    Shapefile(String),

    /// Destination could not be written
    #[error("Cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience type alias for GeoSnap results.
pub type Result<T> = std::result::Result<T, GeoSnapError>;

/// Convenience type alias for extraction results.
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

/// Convenience type alias for export results.
pub type ExportResult<T> = std::result::Result<T, ExportError>;
