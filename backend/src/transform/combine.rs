//! Pair the confirmed and deaths series of each country.

use crate::models::{CombinedMap, CombinedSeries, CountryTimeSeriesMap};

/// Pair each country of `confirmed` with its deaths series.
///
/// Countries missing from `deaths` get an empty deaths series; countries only
/// present in `deaths` are dropped. Series lengths are not reconciled.
pub fn combine_metrics(
    confirmed: &CountryTimeSeriesMap,
    deaths: &CountryTimeSeriesMap,
) -> CombinedMap {
    confirmed
        .iter()
        .map(|(country, confirmed_per_day)| {
            let combined = CombinedSeries {
                confirmed_per_day: confirmed_per_day.clone(),
                deaths_per_day: deaths.get(country).cloned().unwrap_or_default(),
            };
            (country.clone(), combined)
        })
        .collect()
}
