//! Transformation module.
//!
//! This module turns wide COVID-19 CSV rows into per-country series:
//! - Series: one row to `(country, records)`, zero trimming
//! - Aggregate: group split rows by country and sum them
//! - Combine: pair confirmed and deaths per country
//! - Pipeline: fetch, parse, aggregate, combine

pub mod aggregate;
pub mod combine;
pub mod pipeline;
pub mod series;

pub use aggregate::{
    aggregate, aggregate_with, normalize_country, select_countries, AggregateMode,
    AggregateOptions,
};
pub use combine::combine_metrics;
pub use pipeline::*;
pub use series::{parse_header_date, parse_row, parse_value, trim_zeros};
