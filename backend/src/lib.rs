//! # Racoon - COVID-19 time-series ingestion
//!
//! Racoon loads the Johns Hopkins CSSE global time-series datasets
//! (confirmed cases, deaths) and reshapes each wide table into one daily
//! series per country, ready to be drawn by the dashboard frontend.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Wide CSV   │────▶│   Parser    │────▶│  Aggregate  │────▶│  JSON API   │
//! │ (HTTP/disk) │     │  (ordered)  │     │ (per country│     │ (dashboard) │
//! └─────────────┘     └─────────────┘     │  zero-trim) │     └─────────────┘
//!                                         └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use racoon::{aggregate, parse_str};
//!
//! let csv = "Province/State,Country/Region,Lat,Long,1/22/2020,1/23/2020\n\
//!            Bavaria,Germany,48.7,11.4,0,1\n\
//!            Berlin,Germany,52.5,13.4,1,0\n";
//! let rows = parse_str(csv).unwrap().rows;
//! let map = aggregate(&rows);
//! assert_eq!(map["Germany"].len(), 2);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per layer
//! - [`models`] - Rows, records, series maps, metrics
//! - [`config`] - Environment configuration
//! - [`parser`] - CSV parsing with encoding detection
//! - [`source`] - Dataset retrieval (HTTP or local directory)
//! - [`transform`] - Row parsing, aggregation, combination, pipeline
//! - [`api`] - HTTP API server and log broadcasting

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Ingestion
pub mod parser;
pub mod source;

// Transformation
pub mod transform;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{ConfigError, CsvError, PipelineError, ServerError, SourceError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    CombinedMap, CombinedSeries, CountryTimeSeriesMap, Metric, Record, Row, TimeSeries,
};

// =============================================================================
// Re-exports - Configuration and sources
// =============================================================================

pub use config::Config;
pub use source::DataSource;

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{decode_content, detect_encoding, parse_bytes, parse_file, parse_str, ParseResult};

// =============================================================================
// Re-exports - Transformation
// =============================================================================

pub use transform::{
    aggregate, aggregate_with, combine_metrics, parse_header_date, parse_row, select_countries,
    trim_zeros, AggregateMode, AggregateOptions,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    load_dashboard, load_metric, load_until, transform_bytes, CsvInfo, Dashboard, LoadOptions,
    MetricData,
};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
