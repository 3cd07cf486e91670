//! Runtime configuration.
//!
//! Read from the environment (a `.env` file is loaded first if present):
//!
//! | Variable          | Default                 | Meaning                              |
//! |-------------------|-------------------------|--------------------------------------|
//! | `PUBLIC_URL`      | `http://localhost:8080` | Base URL of the public assets        |
//! | `RACOON_DATA_DIR` | unset                   | Read datasets from disk instead      |
//! | `RACOON_PORT`     | `3000`                  | HTTP API port                        |

use std::env;
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::source::DataSource;

/// Base URL used when `PUBLIC_URL` is not set.
pub const DEFAULT_PUBLIC_URL: &str = "http://localhost:8080";

/// HTTP API port used when `RACOON_PORT` is not set.
pub const DEFAULT_PORT: u16 = 3000;

/// Location of the time-series files below the public base path.
pub const DATASET_PATH: &str = "COVID-19/csse_covid_19_data/csse_covid_19_time_series";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Public asset base URL.
    pub public_url: String,
    /// Local dataset directory; takes precedence over `public_url`.
    pub data_dir: Option<PathBuf>,
    /// HTTP API port.
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            public_url: DEFAULT_PUBLIC_URL.to_string(),
            data_dir: None,
            port: DEFAULT_PORT,
        }
    }
}

impl Config {
    /// Load from process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Try loading .env file
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup("PUBLIC_URL").filter(|v| !v.trim().is_empty()) {
            config.public_url = url.trim().trim_end_matches('/').to_string();
        }

        config.data_dir = lookup("RACOON_DATA_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        if let Some(port) = lookup("RACOON_PORT") {
            config.port = port.trim().parse().map_err(|e| ConfigError::InvalidValue {
                name: "RACOON_PORT".to_string(),
                message: format!("'{}': {}", port, e),
            })?;
        }

        Ok(config)
    }

    /// Where datasets are read from.
    pub fn source(&self) -> DataSource {
        match &self.data_dir {
            Some(dir) => DataSource::Local { dir: dir.clone() },
            None => DataSource::Http {
                base_url: self.public_url.clone(),
            },
        }
    }
}
