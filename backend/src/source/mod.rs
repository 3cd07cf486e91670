//! Dataset retrieval.
//!
//! A [`DataSource`] knows where the two global time-series files live and
//! returns their raw bytes. Failures are reported once; nothing is retried.

use std::path::{Path, PathBuf};

use crate::config::DATASET_PATH;
use crate::error::{SourceError, SourceResult};
use crate::models::Metric;

/// Where datasets are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// Public asset base URL; files live under [`DATASET_PATH`].
    Http { base_url: String },
    /// Local directory, either holding the files directly or mirroring the
    /// public asset layout.
    Local { dir: PathBuf },
}

impl DataSource {
    /// Interpret a CLI argument: `http(s)://` prefixes are URLs, anything
    /// else is a directory.
    pub fn parse(location: &str) -> Self {
        let location = location.trim();
        if location.starts_with("http://") || location.starts_with("https://") {
            DataSource::Http {
                base_url: location.trim_end_matches('/').to_string(),
            }
        } else {
            DataSource::Local {
                dir: PathBuf::from(location),
            }
        }
    }

    /// Full URL or path of a metric's file.
    pub fn location(&self, metric: Metric) -> String {
        match self {
            DataSource::Http { base_url } => {
                format!("{}/{}/{}", base_url, DATASET_PATH, metric.file_name())
            }
            DataSource::Local { dir } => local_path(dir, metric).display().to_string(),
        }
    }

    /// Retrieve a metric's CSV bytes.
    pub async fn fetch(&self, client: &reqwest::Client, metric: Metric) -> SourceResult<Vec<u8>> {
        match self {
            DataSource::Http { .. } => fetch_http(client, &self.location(metric)).await,
            DataSource::Local { dir } => {
                let path = local_path(dir, metric);
                tokio::fs::read(&path).await.map_err(|source| SourceError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        }
    }
}

/// `dir/<file>` if present, otherwise `dir/<DATASET_PATH>/<file>`.
fn local_path(dir: &Path, metric: Metric) -> PathBuf {
    let flat = dir.join(metric.file_name());
    if flat.exists() {
        flat
    } else {
        dir.join(DATASET_PATH).join(metric.file_name())
    }
}

async fn fetch_http(client: &reqwest::Client, url: &str) -> SourceResult<Vec<u8>> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| SourceError::Http {
            url: url.to_string(),
            message: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.bytes().await.map_err(|e| SourceError::Http {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    Ok(body.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_location() {
        assert_eq!(
            DataSource::parse("https://example.org/app/"),
            DataSource::Http {
                base_url: "https://example.org/app".to_string()
            }
        );
        assert_eq!(
            DataSource::parse("./public"),
            DataSource::Local {
                dir: PathBuf::from("./public")
            }
        );
    }

    #[test]
    fn test_http_location_pattern() {
        let source = DataSource::parse("http://localhost:8080");
        assert_eq!(
            source.location(Metric::Deaths),
            "http://localhost:8080/COVID-19/csse_covid_19_data/csse_covid_19_time_series/time_series_covid19_deaths_global.csv"
        );
    }

    #[tokio::test]
    async fn test_local_flat_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(Metric::Confirmed.file_name());
        std::fs::write(path, b"Country/Region\n").unwrap();

        let source = DataSource::Local {
            dir: dir.path().to_path_buf(),
        };
        let bytes = source.fetch(&reqwest::Client::new(), Metric::Confirmed).await.unwrap();

        assert_eq!(bytes, b"Country/Region\n");
    }

    #[tokio::test]
    async fn test_local_public_layout() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join(DATASET_PATH);
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join(Metric::Deaths.file_name()), b"x").unwrap();

        let source = DataSource::Local {
            dir: dir.path().to_path_buf(),
        };
        let bytes = source.fetch(&reqwest::Client::new(), Metric::Deaths).await.unwrap();

        assert_eq!(bytes, b"x");
    }

    #[tokio::test]
    async fn test_local_missing_file_is_fetch_failure() {
        let dir = tempfile::tempdir().unwrap();
        let source = DataSource::Local {
            dir: dir.path().to_path_buf(),
        };

        let err = source.fetch(&reqwest::Client::new(), Metric::Deaths).await.unwrap_err();

        assert!(matches!(err, SourceError::Io { .. }));
    }
}
