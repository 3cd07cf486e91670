//! High-level load pipeline: fetch, parse, aggregate, combine.
//!
//! # Example
//!
//! ```rust,ignore
//! use racoon::config::Config;
//! use racoon::transform::pipeline::{load_dashboard, LoadOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = Config::from_env()?.source();
//!     let client = reqwest::Client::new();
//!     let dashboard = load_dashboard(&client, &source, LoadOptions::default()).await?;
//!
//!     println!("{} countries", dashboard.combined.len());
//!     Ok(())
//! }
//! ```
//!
//! A load runs once. A fetch failure is logged and returned; there is no
//! retry. [`load_until`] lets the caller abandon a pending load.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::future::Future;
use uuid::Uuid;

use super::aggregate::{aggregate_with, AggregateOptions};
use super::combine::combine_metrics;
use super::series::parse_header_date;
use crate::api::logs::{log_error, log_info, log_success, log_warning};
use crate::error::{PipelineError, PipelineResult};
use crate::models::{CombinedMap, CountryTimeSeriesMap, Metric};
use crate::parser::{parse_bytes, ParseResult};
use crate::source::DataSource;

/// Options for the load pipeline
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    pub aggregate: AggregateOptions,
}

/// CSV file information
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvInfo {
    pub encoding: String,
    pub row_count: usize,
    pub column_count: usize,
    /// Columns whose header is a date
    pub date_columns: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

impl CsvInfo {
    fn from_parse_result(result: &ParseResult) -> Self {
        let dates: Vec<NaiveDate> = result
            .headers
            .iter()
            .filter_map(|h| parse_header_date(h))
            .collect();

        Self {
            encoding: result.encoding.clone(),
            row_count: result.rows.len(),
            column_count: result.headers.len(),
            date_columns: dates.len(),
            first_date: dates.iter().min().copied(),
            last_date: dates.iter().max().copied(),
        }
    }
}

/// One metric, aggregated per country
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricData {
    pub metric: Metric,
    pub series: CountryTimeSeriesMap,
    pub csv_info: CsvInfo,
}

/// Both metrics plus the combined per-country view
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    /// Unique identifier of this load
    pub load_id: Uuid,
    pub loaded_at: DateTime<Utc>,
    pub confirmed: MetricData,
    pub deaths: MetricData,
    pub combined: CombinedMap,
}

impl Dashboard {
    /// Build from two loaded metrics.
    pub fn new(confirmed: MetricData, deaths: MetricData) -> Self {
        let combined = combine_metrics(&confirmed.series, &deaths.series);
        Self {
            load_id: Uuid::new_v4(),
            loaded_at: Utc::now(),
            confirmed,
            deaths,
            combined,
        }
    }

    /// Aggregated series of one metric.
    pub fn series(&self, metric: Metric) -> &CountryTimeSeriesMap {
        match metric {
            Metric::Confirmed => &self.confirmed.series,
            Metric::Deaths => &self.deaths.series,
        }
    }
}

/// Parse and aggregate raw CSV bytes of one metric.
pub fn transform_bytes(
    metric: Metric,
    bytes: &[u8],
    options: LoadOptions,
) -> PipelineResult<MetricData> {
    log_info(format!("📖 Parsing {} dataset ({} bytes)...", metric, bytes.len()));
    let parse_result = parse_bytes(bytes)?;
    let csv_info = CsvInfo::from_parse_result(&parse_result);

    log_success(format!("Detected encoding: {}", csv_info.encoding));
    log_success(format!(
        "Read {} rows, {} date columns",
        csv_info.row_count, csv_info.date_columns
    ));
    if csv_info.date_columns == 0 {
        log_warning(format!("No date columns found in {} dataset", metric));
    }

    log_info(format!("📦 Aggregating {} by country...", metric));
    let series = aggregate_with(&parse_result.rows, options.aggregate);
    log_success(format!("{} countries", series.len()));

    Ok(MetricData {
        metric,
        series,
        csv_info,
    })
}

/// Fetch and transform one metric.
pub async fn load_metric(
    client: &reqwest::Client,
    source: &DataSource,
    metric: Metric,
    options: LoadOptions,
) -> PipelineResult<MetricData> {
    log_info(format!("🌐 Fetching {}", source.location(metric)));

    let bytes = source.fetch(client, metric).await.map_err(|e| {
        log_error(format!("Fetch failed: {}", e));
        PipelineError::from(e)
    })?;

    transform_bytes(metric, &bytes, options)
}

/// Fetch both metrics concurrently and combine them.
pub async fn load_dashboard(
    client: &reqwest::Client,
    source: &DataSource,
    options: LoadOptions,
) -> PipelineResult<Dashboard> {
    let (confirmed, deaths) = tokio::try_join!(
        load_metric(client, source, Metric::Confirmed, options),
        load_metric(client, source, Metric::Deaths, options),
    )?;

    let dashboard = Dashboard::new(confirmed, deaths);
    log_success(format!(
        "Dashboard ready: {} countries (load {})",
        dashboard.combined.len(),
        dashboard.load_id
    ));
    Ok(dashboard)
}

/// Run `load` unless `shutdown` completes first.
///
/// On shutdown the load future is dropped, which aborts any request in
/// flight, and [`PipelineError::Cancelled`] is returned.
pub async fn load_until<T, L, S>(load: L, shutdown: S) -> PipelineResult<T>
where
    L: Future<Output = PipelineResult<T>>,
    S: Future<Output = ()>,
{
    tokio::select! {
        result = load => result,
        _ = shutdown => {
            log_warning("Load cancelled before completion");
            Err(PipelineError::Cancelled)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DATASET_PATH;

    const CONFIRMED: &str = "Province/State,Country/Region,Lat,Long,1/22/2020,1/23/2020,1/24/2020
,Afghanistan,33.0,65.0,0,0,1
Bavaria,Germany,48.7,11.4,0,1,2
Berlin,Germany,52.5,13.4,1,0,3
";

    const DEATHS: &str = "Province/State,Country/Region,Lat,Long,1/22/2020,1/23/2020,1/24/2020
,Afghanistan,33.0,65.0,0,0,0
Bavaria,Germany,48.7,11.4,0,0,1
Berlin,Germany,52.5,13.4,0,0,0
";

    fn local_source() -> (tempfile::TempDir, DataSource) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(Metric::Confirmed.file_name()), CONFIRMED).unwrap();
        std::fs::write(dir.path().join(Metric::Deaths.file_name()), DEATHS).unwrap();
        let source = DataSource::Local {
            dir: dir.path().to_path_buf(),
        };
        (dir, source)
    }

    #[test]
    fn test_transform_bytes_csv_info() {
        let data =
            transform_bytes(Metric::Confirmed, CONFIRMED.as_bytes(), LoadOptions::default())
                .unwrap();

        assert_eq!(data.csv_info.row_count, 3);
        assert_eq!(data.csv_info.column_count, 7);
        assert_eq!(data.csv_info.date_columns, 3);
        assert_eq!(data.csv_info.first_date, NaiveDate::from_ymd_opt(2020, 1, 22));
        assert_eq!(data.csv_info.last_date, NaiveDate::from_ymd_opt(2020, 1, 24));
        assert_eq!(data.series["Germany"].len(), 3);
        assert_eq!(data.series["Afghanistan"].len(), 1);
    }

    #[test]
    fn test_transform_bytes_empty() {
        let err = transform_bytes(Metric::Deaths, b"", LoadOptions::default()).unwrap_err();
        assert!(matches!(err, PipelineError::Csv(_)));
    }

    #[tokio::test]
    async fn test_load_dashboard_from_directory() {
        let (_dir, source) = local_source();

        let dashboard = load_dashboard(&reqwest::Client::new(), &source, LoadOptions::default())
            .await
            .unwrap();

        let germany = &dashboard.combined["Germany"];
        let confirmed: Vec<i64> = germany.confirmed_per_day.iter().map(|r| r.value).collect();
        let deaths: Vec<i64> = germany.deaths_per_day.iter().map(|r| r.value).collect();
        assert_eq!(confirmed, vec![1, 1, 5]);
        assert_eq!(deaths, vec![1]);
        assert!(dashboard.combined["Afghanistan"].deaths_per_day.is_empty());
    }

    #[tokio::test]
    async fn test_load_metric_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = DataSource::Local {
            dir: dir.path().join(DATASET_PATH),
        };

        let client = reqwest::Client::new();
        let err = load_metric(&client, &source, Metric::Deaths, LoadOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Source(_)));
    }

    #[tokio::test]
    async fn test_load_until_cancelled() {
        let pending = std::future::pending::<PipelineResult<()>>();

        let result = load_until(pending, async {}).await;

        assert!(matches!(result, Err(PipelineError::Cancelled)));
    }

    #[tokio::test]
    async fn test_load_until_completes() {
        let (_dir, source) = local_source();
        let client = reqwest::Client::new();

        let result = load_until(
            load_metric(&client, &source, Metric::Confirmed, LoadOptions::default()),
            std::future::pending::<()>(),
        )
        .await
        .unwrap();

        assert_eq!(result.metric, Metric::Confirmed);
    }
}
