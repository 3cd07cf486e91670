//! Turn one wide CSV row into a country's daily series.
//!
//! ```text
//! Province/State,Country/Region,Lat,Long,1/22/2020,1/23/2020
//! Bavaria,Germany,48.7,11.4,0,1
//!
//!   →  ("Germany", [(2020-01-22, 0), (2020-01-23, 1)])
//! ```
//!
//! Only columns whose header is a `M/D/YYYY` date produce records. Cells
//! without a leading integer are left out of the series, never zeroed.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Record, Row, TimeSeries, COUNTRY_COLUMN};

/// `M/D/YYYY`, with the two-digit year form used by the published files.
static HEADER_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4}|\d{2})$").expect("valid header date regex")
});

/// Optional sign and the leading ASCII digits of a cell.
static LEADING_INT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?[0-9]+").expect("valid leading integer regex"));

/// Parse a column header as a calendar date.
///
/// `"3/5/2020"` is March 5, 2020. A two-digit year is read as `20YY`.
/// Headers such as `"Lat"` and impossible dates such as `"2/30/2020"`
/// return `None`.
pub fn parse_header_date(header: &str) -> Option<NaiveDate> {
    let caps = HEADER_DATE.captures(header.trim())?;
    let month: u32 = caps[1].parse().ok()?;
    let day: u32 = caps[2].parse().ok()?;
    let year_digits = &caps[3];
    let mut year: i32 = year_digits.parse().ok()?;
    if year_digits.len() == 2 {
        year += 2000;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse a cell as an integer count.
///
/// Reads the leading integer after whitespace and ignores the rest, so
/// `"2.5"` is 2 and `"12abc"` is 12. `None` when there are no leading digits
/// or the number does not fit an `i64`.
pub fn parse_value(cell: &str) -> Option<i64> {
    let digits = LEADING_INT.find(cell.trim_start())?;
    digits.as_str().parse().ok()
}

/// Split a row into its country name and its daily records.
///
/// Records follow the row's column order; nothing is sorted.
pub fn parse_row(row: &Row) -> (String, TimeSeries) {
    let country = row.get(COUNTRY_COLUMN).unwrap_or_default().to_string();

    let records = row
        .fields()
        .filter_map(|(column, cell)| {
            let date = parse_header_date(column)?;
            let value = parse_value(cell)?;
            Some(Record::new(date, value))
        })
        .collect();

    (country, records)
}

/// Strip leading and trailing runs of zero-valued records.
///
/// Interior zeros stay. An all-zero series becomes empty.
pub fn trim_zeros(series: &mut TimeSeries) {
    let Some(last) = series.iter().rposition(|r| r.value != 0) else {
        series.clear();
        return;
    };
    series.truncate(last + 1);

    let first = series.iter().position(|r| r.value != 0).unwrap_or(0);
    series.drain(..first);
}
