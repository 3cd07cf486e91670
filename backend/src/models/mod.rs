//! Domain models for the racoon ingestion pipeline.
//!
//! - [`Row`] - One wide CSV row, fields in header order
//! - [`Record`] - Cumulative count for one day
//! - [`TimeSeries`] / [`CountryTimeSeriesMap`] - Per-country daily series
//! - [`CombinedSeries`] / [`CombinedMap`] - Confirmed and deaths side by side
//! - [`Metric`] - Which dataset a series comes from

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Column holding the sub-region name (often empty).
pub const PROVINCE_COLUMN: &str = "Province/State";

/// Column holding the country name used as grouping key.
pub const COUNTRY_COLUMN: &str = "Country/Region";

/// Latitude column.
pub const LAT_COLUMN: &str = "Lat";

/// Longitude column.
pub const LONG_COLUMN: &str = "Long";

// =============================================================================
// Row
// =============================================================================

/// One CSV row as an ordered list of `(column, value)` pairs.
///
/// Order follows the header. The transformer relies on it: date columns are
/// assumed to be chronological in the source file. Serializes as a JSON
/// object with keys in header order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    fields: Vec<(String, String)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field. Later duplicates of a column are kept as-is.
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.fields.push((column.into(), value.into()));
    }

    /// Builder-style [`Row::push`].
    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(column, value);
        self
    }

    /// Value of the first field named `column`.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }

    /// Fields in header order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(c, v)| (c.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Render a country's series back into a wide row.
    ///
    /// Date headers are written as `M/D/YYYY` without padding, the same shape
    /// the source files use, so the row parses back to the same series.
    pub fn from_series(country: &str, series: &[Record]) -> Self {
        let mut row = Row::new()
            .with(PROVINCE_COLUMN, "")
            .with(COUNTRY_COLUMN, country);
        for record in series {
            row.push(format_header_date(record.date), record.value.to_string());
        }
        row
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.fields())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Format a date as a column header (`3/5/2020`).
pub fn format_header_date(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.month(), date.day(), date.year())
}

// =============================================================================
// Series
// =============================================================================

/// Cumulative count reported for one country on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub date: NaiveDate,
    pub value: i64,
}

impl Record {
    pub fn new(date: NaiveDate, value: i64) -> Self {
        Self { date, value }
    }
}

/// Daily records of one country, in source column order.
pub type TimeSeries = Vec<Record>;

/// Country name to its aggregated series, ordered by name.
pub type CountryTimeSeriesMap = BTreeMap<String, TimeSeries>;

/// Confirmed cases and deaths of one country.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedSeries {
    pub confirmed_per_day: TimeSeries,
    pub deaths_per_day: TimeSeries,
}

/// Country name to both metrics.
pub type CombinedMap = BTreeMap<String, CombinedSeries>;

// =============================================================================
// Metric
// =============================================================================

/// Which of the two global datasets a series comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Confirmed,
    Deaths,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Confirmed => "confirmed",
            Metric::Deaths => "deaths",
        }
    }

    /// Dataset file name, e.g. `time_series_covid19_deaths_global.csv`.
    pub fn file_name(&self) -> String {
        format!("time_series_covid19_{}_global.csv", self.as_str())
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "confirmed" | "cases" => Ok(Metric::Confirmed),
            "deaths" => Ok(Metric::Deaths),
            other => Err(format!("unknown metric '{}' (expected confirmed or deaths)", other)),
        }
    }
}
