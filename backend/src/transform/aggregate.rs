//! Group parsed rows by country and sum split rows.
//!
//! Several countries are published as one row per province or state. Their
//! rows are folded into a single series per country.
//!
//! ```text
//! Rows                                   →  Map
//! ┌──────────────────────────────────┐      ┌──────────────────────────────┐
//! │ Bavaria, Germany   [0, 1, 3]     │      │ Germany  [1, 1, 4]           │
//! │ Berlin,  Germany   [1, 0, 1]     │  →   ├──────────────────────────────┤
//! │ ,        Italy     [0, 0, 2]     │      │ Italy    [2]  (zeros trimmed)│
//! └──────────────────────────────────┘      └──────────────────────────────┘
//! ```
//!
//! # Alignment
//!
//! The default [`AggregateMode::Positional`] adds the Nth record of each row
//! to the Nth accumulated record and keeps the accumulated date. It assumes
//! every row of a country carries the same date columns in the same order;
//! rows that do not will produce wrong sums without any report.
//! [`AggregateMode::ByDate`] keys the sum by parsed date instead.

use chrono::NaiveDate;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use super::series::{parse_row, trim_zeros};
use crate::models::{CountryTimeSeriesMap, Record, Row, TimeSeries};

/// How records of split rows are matched before summing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AggregateMode {
    /// Sum by column position.
    #[default]
    Positional,
    /// Sum by parsed date; result ordered by date.
    ByDate,
}

/// Options for [`aggregate_with`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregateOptions {
    pub mode: AggregateMode,
    /// Trim and collapse whitespace in country names before grouping.
    pub normalize_keys: bool,
}

/// Aggregate rows into one zero-trimmed series per country.
///
/// Positional summation, country names used verbatim.
pub fn aggregate(rows: &[Row]) -> CountryTimeSeriesMap {
    aggregate_with(rows, AggregateOptions::default())
}

/// Aggregate rows with explicit options.
pub fn aggregate_with(rows: &[Row], options: AggregateOptions) -> CountryTimeSeriesMap {
    let mut groups: BTreeMap<String, SeriesBuilder> = BTreeMap::new();

    for row in rows {
        let (country, records) = parse_row(row);
        let key = if options.normalize_keys {
            normalize_country(&country)
        } else {
            country
        };

        match groups.entry(key) {
            Entry::Occupied(mut entry) => entry.get_mut().add(records),
            Entry::Vacant(entry) => {
                entry.insert(SeriesBuilder::new(options.mode, records));
            }
        }
    }

    groups
        .into_iter()
        .map(|(country, builder)| (country, builder.build()))
        .collect()
}

/// Collapse runs of whitespace and trim the ends. Case is kept.
pub fn normalize_country(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keep only the selected countries. Unknown names are ignored.
pub fn select_countries<V: Clone>(
    map: &BTreeMap<String, V>,
    names: &[String],
) -> BTreeMap<String, V> {
    names
        .iter()
        .filter_map(|name| map.get(name).map(|v| (name.clone(), v.clone())))
        .collect()
}

/// Accumulates the rows of one country.
enum SeriesBuilder {
    Positional(TimeSeries),
    ByDate(BTreeMap<NaiveDate, i64>),
}

impl SeriesBuilder {
    fn new(mode: AggregateMode, records: TimeSeries) -> Self {
        match mode {
            AggregateMode::Positional => Self::Positional(records),
            AggregateMode::ByDate => {
                let mut builder = Self::ByDate(BTreeMap::new());
                builder.add(records);
                builder
            }
        }
    }

    fn add(&mut self, records: TimeSeries) {
        match self {
            // Accumulated length wins; surplus positions are not reconciled.
            Self::Positional(acc) => {
                for (slot, record) in acc.iter_mut().zip(&records) {
                    slot.value = slot.value.saturating_add(record.value);
                }
            }
            Self::ByDate(by_date) => {
                for record in records {
                    let sum = by_date.entry(record.date).or_insert(0);
                    *sum = sum.saturating_add(record.value);
                }
            }
        }
    }

    fn build(self) -> TimeSeries {
        let mut series = match self {
            Self::Positional(series) => series,
            Self::ByDate(by_date) => by_date
                .into_iter()
                .map(|(date, value)| Record::new(date, value))
                .collect(),
        };
        trim_zeros(&mut series);
        series
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{COUNTRY_COLUMN, LAT_COLUMN, LONG_COLUMN, PROVINCE_COLUMN};
    use crate::parser::parse_str;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(province: &str, country: &str, cells: &[(&str, &str)]) -> Row {
        let mut row = Row::new()
            .with(PROVINCE_COLUMN, province)
            .with(COUNTRY_COLUMN, country)
            .with(LAT_COLUMN, "0.0")
            .with(LONG_COLUMN, "0.0");
        for (column, value) in cells {
            row.push(*column, *value);
        }
        row
    }

    #[test]
    fn test_split_rows_are_summed() {
        let rows = vec![
            row("A", "X", &[("1/22/2020", "1"), ("1/23/2020", "2")]),
            row("B", "X", &[("1/22/2020", "3"), ("1/23/2020", "4")]),
        ];

        let map = aggregate(&rows);

        assert_eq!(
            map["X"],
            vec![
                Record::new(date(2020, 1, 22), 4),
                Record::new(date(2020, 1, 23), 6),
            ]
        );
    }

    #[test]
    fn test_single_row_passes_through() {
        let rows = vec![row(
            "",
            "Y",
            &[
                ("1/22/2020", "0"),
                ("1/23/2020", "7"),
                ("1/24/2020", "0"),
                ("1/25/2020", "9"),
            ],
        )];

        let map = aggregate(&rows);

        assert_eq!(
            map["Y"],
            vec![
                Record::new(date(2020, 1, 23), 7),
                Record::new(date(2020, 1, 24), 0),
                Record::new(date(2020, 1, 25), 9),
            ]
        );
    }

    #[test]
    fn test_zero_trimming_per_country() {
        let rows = vec![
            row("", "Early", &[("1/22/2020", "1"), ("1/23/2020", "1")]),
            row("", "Late", &[("1/22/2020", "0"), ("1/23/2020", "1")]),
            row("", "None", &[("1/22/2020", "0"), ("1/23/2020", "0")]),
        ];

        let map = aggregate(&rows);

        assert_eq!(map["Early"].len(), 2);
        assert_eq!(map["Late"], vec![Record::new(date(2020, 1, 23), 1)]);
        assert!(map["None"].is_empty());
    }

    #[test]
    fn test_germany_end_to_end() {
        let csv = "Province/State,Country/Region,Lat,Long,1/22/2020,1/23/2020
Bavaria,Germany,48.7,11.4,0,1
Berlin,Germany,52.5,13.4,1,0
";
        let parsed = parse_str(csv).unwrap();

        let map = aggregate(&parsed.rows);

        assert_eq!(map.len(), 1);
        assert_eq!(
            map["Germany"],
            vec![
                Record::new(date(2020, 1, 22), 1),
                Record::new(date(2020, 1, 23), 1),
            ]
        );
    }

    #[test]
    fn test_aggregating_output_is_stable() {
        let rows = vec![
            row("A", "X", &[("1/22/2020", "0"), ("1/23/2020", "2"), ("1/24/2020", "5")]),
            row("B", "X", &[("1/22/2020", "0"), ("1/23/2020", "4"), ("1/24/2020", "0")]),
            row("", "Z", &[("1/22/2020", "3"), ("1/23/2020", "0"), ("1/24/2020", "3")]),
        ];
        let first = aggregate(&rows);

        let again: Vec<Row> = first
            .iter()
            .map(|(country, series)| Row::from_series(country, series))
            .collect();
        let second = aggregate(&again);

        assert_eq!(first, second);
    }

    #[test]
    fn test_positional_keeps_accumulated_dates() {
        // Second row lists its dates in the opposite order.
        let rows = vec![
            row("A", "X", &[("1/22/2020", "1"), ("1/23/2020", "2")]),
            row("B", "X", &[("1/23/2020", "10"), ("1/22/2020", "20")]),
        ];

        let map = aggregate(&rows);

        assert_eq!(
            map["X"],
            vec![
                Record::new(date(2020, 1, 22), 11),
                Record::new(date(2020, 1, 23), 22),
            ]
        );
    }

    #[test]
    fn test_positional_ignores_surplus_records() {
        let rows = vec![
            row("A", "X", &[("1/22/2020", "1")]),
            row("B", "X", &[("1/22/2020", "1"), ("1/23/2020", "5")]),
        ];

        let map = aggregate(&rows);

        assert_eq!(map["X"], vec![Record::new(date(2020, 1, 22), 2)]);
    }

    #[test]
    fn test_positional_keeps_unmatched_accumulated_records() {
        let rows = vec![
            row("A", "X", &[("1/22/2020", "1"), ("1/23/2020", "2"), ("1/24/2020", "3")]),
            row("B", "X", &[("1/22/2020", "1")]),
        ];

        let map = aggregate(&rows);

        assert_eq!(
            map["X"],
            vec![
                Record::new(date(2020, 1, 22), 2),
                Record::new(date(2020, 1, 23), 2),
                Record::new(date(2020, 1, 24), 3),
            ]
        );
    }

    #[test]
    fn test_sums_saturate() {
        let max = i64::MAX.to_string();
        let rows = vec![
            row("A", "X", &[("1/22/2020", max.as_str())]),
            row("B", "X", &[("1/22/2020", "5")]),
        ];

        assert_eq!(aggregate(&rows)["X"][0].value, i64::MAX);

        let options = AggregateOptions {
            mode: AggregateMode::ByDate,
            ..Default::default()
        };
        assert_eq!(aggregate_with(&rows, options)["X"][0].value, i64::MAX);
    }

    #[test]
    fn test_by_date_aligns_misordered_rows() {
        let rows = vec![
            row("A", "X", &[("1/22/2020", "1"), ("1/23/2020", "2")]),
            row("B", "X", &[("1/23/2020", "10"), ("1/22/2020", "20"), ("1/24/2020", "5")]),
        ];
        let options = AggregateOptions {
            mode: AggregateMode::ByDate,
            ..Default::default()
        };

        let map = aggregate_with(&rows, options);

        assert_eq!(
            map["X"],
            vec![
                Record::new(date(2020, 1, 22), 21),
                Record::new(date(2020, 1, 23), 12),
                Record::new(date(2020, 1, 24), 5),
            ]
        );
    }

    #[test]
    fn test_keys_verbatim_by_default() {
        let rows = vec![
            row("", "Germany", &[("1/22/2020", "1")]),
            row("", " Germany ", &[("1/22/2020", "1")]),
        ];

        assert_eq!(aggregate(&rows).len(), 2);

        let options = AggregateOptions {
            normalize_keys: true,
            ..Default::default()
        };
        let map = aggregate_with(&rows, options);
        assert_eq!(map.len(), 1);
        assert_eq!(map["Germany"][0].value, 2);
    }

    #[test]
    fn test_select_countries() {
        let rows = vec![
            row("", "France", &[("1/22/2020", "1")]),
            row("", "Italy", &[("1/22/2020", "2")]),
        ];
        let map = aggregate(&rows);

        let selected = select_countries(&map, &["Italy".to_string(), "Atlantis".to_string()]);

        assert_eq!(selected.len(), 1);
        assert!(selected.contains_key("Italy"));
    }

    #[test]
    fn test_normalize_country() {
        assert_eq!(normalize_country("  Korea,   South "), "Korea, South");
        assert_eq!(normalize_country("US"), "US");
    }
}
