//! HTTP Server for the racoon API.
//!
//! Publishes the aggregated series to the dashboard frontend, which does all
//! drawing itself.
//!
//! # API Endpoints
//!
//! | Method | Path                     | Description                          |
//! |--------|--------------------------|--------------------------------------|
//! | GET    | `/health`                | Health check                         |
//! | GET    | `/api/countries`         | Country names                        |
//! | GET    | `/api/series/{country}`  | One country, `?metric=deaths`        |
//! | GET    | `/api/dashboard`         | Combined series, `?countries=A;B`    |
//! | GET    | `/api/logs`              | SSE stream for real-time logs        |
//!
//! The dataset is loaded once in the background after the listener is up.
//! Until it arrives, data endpoints answer `503` with `{"status":"loading"}`.
//! A failed load is logged and never retried, so the server keeps answering
//! `loading`.
//!
//! On shutdown the pending load is aborted and open `/api/logs` streams are
//! closed, so connected dashboards do not hold the server open.

use axum::{
    extract::{Path, Query, State},
    http::{header, Method},
    response::{sse::Event, Json, Sse},
    routing::get,
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, future::Future, net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, log_info, LOG_BROADCASTER};
use super::types::{
    CountriesResponse, DashboardQuery, DashboardResponse, DatasetInfo, SeriesQuery,
    SeriesResponse,
};
use crate::error::{ServerError, ServerResult};
use crate::models::Metric;
use crate::source::DataSource;
use crate::transform::aggregate::select_countries;
use crate::transform::pipeline::{load_dashboard, Dashboard, LoadOptions};

/// Shared server state: the dataset once loaded, and the shutdown flag.
#[derive(Clone)]
pub struct AppState {
    dataset: Arc<RwLock<Option<Arc<Dashboard>>>>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl Default for AppState {
    fn default() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            dataset: Arc::default(),
            shutdown: Arc::new(shutdown),
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tell long-lived responses to finish.
    pub fn shut_down(&self) {
        self.shutdown.send_replace(true);
    }

    /// Resolves once [`AppState::shut_down`] has been called.
    fn stopped(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.shutdown.subscribe();
        async move {
            let _ = rx.wait_for(|stopped| *stopped).await;
        }
    }

    /// Make a loaded dataset visible to handlers.
    pub async fn publish(&self, dashboard: Dashboard) {
        *self.dataset.write().await = Some(Arc::new(dashboard));
    }

    /// The loaded dataset, or [`ServerError::Loading`].
    pub async fn current(&self) -> ServerResult<Arc<Dashboard>> {
        self.dataset.read().await.clone().ok_or(ServerError::Loading)
    }

    pub async fn is_loaded(&self) -> bool {
        self.dataset.read().await.is_some()
    }
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/countries", get(countries))
        .route("/api/series/{country}", get(series))
        .route("/api/dashboard", get(dashboard))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server and load the dataset in the background.
///
/// Returns when Ctrl+C is received; a load still in flight is aborted.
pub async fn start_server(
    port: u16,
    source: DataSource,
    options: LoadOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState::new();

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    println!("🚀 Racoon server running on http://localhost:{}", port);
    println!("   GET /api/countries        - Country names");
    println!("   GET /api/series/{{country}} - One country's series");
    println!("   GET /api/dashboard        - Combined series");
    println!("   GET /api/logs             - SSE log stream");
    println!("   GET /health               - Health check");
    println!();

    let loader = tokio::spawn(load_into(
        state.clone(),
        reqwest::Client::new(),
        source,
        options,
    ));

    serve_until(listener, state, loader, async {
        let _ = tokio::signal::ctrl_c().await;
        log_info("Ctrl+C received; shutting down");
    })
    .await?;

    Ok(())
}

/// Serve the API until `signal` resolves.
///
/// The signal aborts `loader` and ends every SSE log stream before the
/// remaining connections are drained.
pub async fn serve_until<F>(
    listener: TcpListener,
    state: AppState,
    loader: JoinHandle<()>,
    signal: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(state.clone());

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            signal.await;
            loader.abort();
            state.shut_down();
        })
        .await
}

/// Load the dataset once and publish it.
///
/// A failure is logged and leaves the state empty.
pub async fn load_into(
    state: AppState,
    client: reqwest::Client,
    source: DataSource,
    options: LoadOptions,
) {
    match load_dashboard(&client, &source, options).await {
        Ok(dashboard) => state.publish(dashboard).await,
        Err(e) => log_error(format!("Dataset load failed, no retry: {}", e)),
    }
}

/// Health check endpoint
async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "racoon",
        "version": env!("CARGO_PKG_VERSION"),
        "loaded": state.is_loaded().await,
        "endpoints": {
            "countries": "GET /api/countries",
            "series": "GET /api/series/{country}?metric=confirmed|deaths",
            "dashboard": "GET /api/dashboard?countries=A;B",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

async fn countries(State(state): State<AppState>) -> ServerResult<Json<CountriesResponse>> {
    let dataset = state.current().await?;
    Ok(Json(CountriesResponse {
        load_id: dataset.load_id,
        countries: dataset.combined.keys().cloned().collect(),
    }))
}

async fn series(
    State(state): State<AppState>,
    Path(country): Path<String>,
    Query(query): Query<SeriesQuery>,
) -> ServerResult<Json<SeriesResponse>> {
    let metric = match query.metric.as_deref() {
        Some(m) => m.parse::<Metric>().map_err(ServerError::BadRequest)?,
        None => Metric::Confirmed,
    };

    let dataset = state.current().await?;
    let series = dataset
        .series(metric)
        .get(&country)
        .cloned()
        .ok_or_else(|| ServerError::NotFound(format!("country '{}'", country)))?;

    Ok(Json(SeriesResponse {
        country,
        metric,
        series,
    }))
}

async fn dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> ServerResult<Json<DashboardResponse>> {
    let dataset = state.current().await?;
    let selected = query.selected();

    let (countries, unknown_countries) = if selected.is_empty() {
        (dataset.combined.clone(), Vec::new())
    } else {
        let unknown = selected
            .iter()
            .filter(|name| !dataset.combined.contains_key(*name))
            .cloned()
            .collect();
        (select_countries(&dataset.combined, &selected), unknown)
    };

    Ok(Json(DashboardResponse {
        load_id: dataset.load_id,
        loaded_at: dataset.loaded_at,
        unknown_countries,
        countries,
        csv_info: DatasetInfo {
            confirmed: dataset.confirmed.csv_info.clone(),
            deaths: dataset.deaths.csv_info.clone(),
        },
    }))
}

/// SSE endpoint for real-time log streaming
///
/// The stream ends when the server shuts down.
async fn sse_logs(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let events = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });
    let stream = futures::StreamExt::take_until(events, state.stopped());

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
