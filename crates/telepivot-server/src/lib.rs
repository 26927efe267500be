//! HTTP report server.
//!
//! Accepts a batch of telemetry records in the request body (a bare array or
//! the telemetry API's envelope) and answers with one of the derived data
//! products, wrapped in the same `{success, data, error}` envelope the
//! telemetry API uses.

use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use telepivot_core::{
    Dataset, Error, GroupStatsRow, PivotExport, Report, ReportConfig, SummaryStats, load_records,
};

/// Request bodies above this size are refused.
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Shared server state.
struct AppState {
    config: ReportConfig,
}

/// Response envelope shared by every endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

type Reply<T> = (StatusCode, Json<ApiResponse<T>>);

/// Decode the body and build a dataset with the server's configuration.
fn load_dataset(state: &AppState, body: &[u8]) -> telepivot_core::Result<Dataset> {
    let body = std::str::from_utf8(body)
        .map_err(|e| Error::Payload(format!("request body is not UTF-8: {e}")))?;
    let records = load_records(body)?;
    Dataset::from_records(state.config.clone(), records)
}

fn reply<T>(endpoint: &str, result: telepivot_core::Result<T>) -> Reply<T> {
    match result {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::ok(data))),
        Err(err) => {
            let status = match err {
                Error::Config(_) | Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_REQUEST,
            };
            if status.is_server_error() {
                log::error!("{endpoint}: {err}");
            } else {
                log::warn!("{endpoint}: rejected request: {err}");
            }
            (status, Json(ApiResponse::failure(err.to_string())))
        }
    }
}

async fn handle_statistics(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Reply<Vec<GroupStatsRow>> {
    let result = load_dataset(&state, &body).map(|d| d.groups().rows());
    reply("/api/v1/statistics", result)
}

async fn handle_pivot(State(state): State<Arc<AppState>>, body: Bytes) -> Reply<PivotExport> {
    let result = load_dataset(&state, &body).map(|d| d.pivot().to_export());
    reply("/api/v1/pivot", result)
}

async fn handle_summary(State(state): State<Arc<AppState>>, body: Bytes) -> Reply<SummaryStats> {
    let result = load_dataset(&state, &body).map(|d| d.summary());
    reply("/api/v1/summary", result)
}

async fn handle_report(State(state): State<Arc<AppState>>, body: Bytes) -> Reply<Report> {
    let result = load_dataset(&state, &body).map(|d| {
        log::debug!("building report over {} records", d.len());
        d.report()
    });
    reply("/api/v1/report", result)
}

async fn handle_health() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        version: telepivot_core::VERSION.to_string(),
    }))
}

async fn handle_index(State(state): State<Arc<AppState>>) -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse::ok(serde_json::json!({
        "name": "telepivot",
        "version": telepivot_core::VERSION,
        "config": {
            "utc_offset_hours": state.config.utc_offset_hours,
            "bucket_format": state.config.bucket_format,
        },
        "endpoints": {
            "/": "This API index",
            "/health": "Health check",
            "/api/v1/statistics": {
                "method": "POST",
                "description": "Per (target, metric) count, mean, min, max, std_dev, range",
            },
            "/api/v1/pivot": {
                "method": "POST",
                "description": "Time buckets x (target, metric) table of mean values",
            },
            "/api/v1/summary": {
                "method": "POST",
                "description": "Point count, distinct targets and metrics, time span, value range",
            },
            "/api/v1/report": {
                "method": "POST",
                "description": "All of the above plus the records in one document",
            },
        },
        "body": "JSON array of records, or {\"data\": [...]}, or the API envelope",
    })))
}

/// Build the axum router.
pub fn build_router(config: ReportConfig) -> Router {
    let state = Arc::new(AppState { config });

    Router::new()
        .route("/", get(handle_index))
        .route("/health", get(handle_health))
        .route("/api/v1/statistics", post(handle_statistics))
        .route("/api/v1/pivot", post(handle_pivot))
        .route("/api/v1/summary", post(handle_summary))
        .route("/api/v1/report", post(handle_report))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

/// Run the HTTP report server until it fails.
pub async fn run_server(config: ReportConfig, host: &str, port: u16) -> std::io::Result<()> {
    let app = build_router(config);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("telepivot server listening on http://{addr}");
    axum::serve(listener, app).await
}
