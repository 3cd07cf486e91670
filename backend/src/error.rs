//! Error types for the racoon ingestion pipeline.
//!
//! One error type per layer:
//!
//! - [`CsvError`] - CSV decoding and structural errors
//! - [`SourceError`] - Fetch failures (HTTP, status, local IO)
//! - [`ConfigError`] - Invalid environment configuration
//! - [`PipelineError`] - Top-level load orchestration errors
//! - [`ServerError`] - HTTP API errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.
//!
//! Unparseable date headers and cell values are not errors: the
//! transformer drops them silently.

use thiserror::Error;

// =============================================================================
// CSV Parsing Errors
// =============================================================================

/// Errors during CSV parsing.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to decode the raw bytes.
    #[error("Failed to decode content as {encoding}: {message}")]
    EncodingError { encoding: String, message: String },

    /// Malformed record.
    #[error("Invalid CSV format at line {line}: {message}")]
    ParseError { line: u64, message: String },

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,
}

// =============================================================================
// Source Errors (fetch failures)
// =============================================================================

/// Errors retrieving a dataset.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Transport-level failure (DNS, connection, body read).
    #[error("HTTP request to {url} failed: {message}")]
    Http { url: String, message: String },

    /// Server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// Local dataset could not be read.
    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors in environment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Variable is set but cannot be used.
    #[error("Invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by [`crate::transform::pipeline::load_metric`]
/// and [`crate::transform::pipeline::load_dashboard`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Dataset could not be fetched.
    #[error("Fetch failed: {0}")]
    Source(#[from] SourceError),

    /// CSV parsing error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The load was abandoned before completion.
    #[error("Load cancelled")]
    Cancelled,
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Dataset is not loaded (yet).
    #[error("Dataset is still loading")]
    Loading,

    /// Unknown country or metric.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Listener or runtime failure.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for fetch operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
