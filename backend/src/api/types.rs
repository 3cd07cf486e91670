//! REST API types for the dashboard frontend.
//!
//! Dates are serialized as `YYYY-MM-DD`, field names in camelCase.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ServerError;
use crate::models::{CombinedMap, Metric, TimeSeries};
use crate::transform::pipeline::CsvInfo;

/// Country names available in the loaded dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountriesResponse {
    pub load_id: Uuid,
    pub countries: Vec<String>,
}

/// One country's series for one metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesResponse {
    pub country: String,
    pub metric: Metric,
    pub series: TimeSeries,
}

/// Combined confirmed/deaths series, optionally filtered to selected countries.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub load_id: Uuid,
    pub loaded_at: DateTime<Utc>,
    /// Names requested that are not in the dataset
    pub unknown_countries: Vec<String>,
    pub countries: CombinedMap,
    pub csv_info: DatasetInfo,
}

/// Per-metric CSV metadata
#[derive(Debug, Clone, Serialize)]
pub struct DatasetInfo {
    pub confirmed: CsvInfo,
    pub deaths: CsvInfo,
}

/// Query string of `/api/series/{country}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeriesQuery {
    pub metric: Option<String>,
}

/// Query string of `/api/dashboard`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardQuery {
    /// Country names separated by `;` (names may contain commas)
    pub countries: Option<String>,
}

impl DashboardQuery {
    /// Selected names, trimmed, empty entries dropped.
    pub fn selected(&self) -> Vec<String> {
        self.countries
            .as_deref()
            .unwrap_or("")
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }
}

/// Body returned while the dataset is not available.
pub fn loading_response() -> Value {
    json!({
        "status": "loading",
    })
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "status": "error",
        "error": error,
    })
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match self {
            ServerError::Loading => {
                (StatusCode::SERVICE_UNAVAILABLE, Json(loading_response())).into_response()
            }
            ServerError::NotFound(_) => {
                (StatusCode::NOT_FOUND, Json(error_response(&self.to_string()))).into_response()
            }
            ServerError::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, Json(error_response(&self.to_string()))).into_response()
            }
            ServerError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(error_response(&self.to_string())),
            )
                .into_response(),
        }
    }
}
