use axum::{
    routing::{get, post},
    Router,
    Json,
};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use chrono::Utc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

mod alert_log;
mod config;
mod engine;
mod models;
mod tracker;

use config::{load_params, DetectionParams, DEFAULT_PARAMS_PATH};
use engine::{AlertEngine, CycleOutcome};
use models::{AlertView, AlertsResponse, DetectionEvent, EngineStatus};

/// Proctoring alert HTTP API
/// Detection batches come in, aggregated alerts come out
/// All temporal state lives in the engine
#[derive(Clone)]
struct AppState {
    engine: Arc<AlertEngine>,
}

#[tokio::main]
async fn main() {
    env_logger::init();

    // Detection parameters: optional path argument, sane defaults otherwise
    let params_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_PARAMS_PATH.to_string());
    let state = AppState {
        engine: Arc::new(AlertEngine::new(load_params(Path::new(&params_path)))),
    };

    // The dashboard is served from a different origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/start_monitoring", get(start_monitoring))
        .route("/stop_monitoring", get(stop_monitoring))
        .route("/ingest", post(ingest_detections))
        .route("/get_alerts", get(get_alerts))
        .route("/status", get(get_status))
        .route("/config", get(get_config))
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(state);

    // Run server
    let addr = SocketAddr::from(([0, 0, 0, 0], 5000));
    println!("🚀 Server running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

async fn root() -> &'static str {
    "Proctor Monitoring API v0.1.0"
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Begin a monitoring session
/// Clears any previous session's alerts and timers; idempotent
async fn start_monitoring(
    state: axum::extract::State<AppState>,
) -> Json<serde_json::Value> {
    let session_id = state.engine.start_session();

    Json(serde_json::json!({
        "status": "started",
        "session_id": session_id,
    }))
}

/// End the monitoring session
/// Logged alerts stay readable afterwards
async fn stop_monitoring(
    state: axum::extract::State<AppState>,
) -> Json<serde_json::Value> {
    state.engine.stop_session();

    Json(serde_json::json!({
        "status": "stopped",
    }))
}

/// Ingest one capture cycle's detection events
/// Malformed elements are skipped rather than failing the batch
async fn ingest_detections(
    state: axum::extract::State<AppState>,
    Json(batch): Json<Vec<serde_json::Value>>,
) -> Json<serde_json::Value> {
    let events = DetectionEvent::decode_batch(batch);

    match state.engine.ingest(&events) {
        CycleOutcome::Processed { fired } => Json(serde_json::json!({
            "status": "processed",
            "alerts_fired": fired,
        })),
        CycleOutcome::Discarded => Json(serde_json::json!({
            "status": "ignored",
            "reason": "monitoring is stopped",
        })),
    }
}

/// List logged alerts, newest first, formatted for the dashboard
async fn get_alerts(
    state: axum::extract::State<AppState>,
) -> Json<AlertsResponse> {
    let alerts = state
        .engine
        .recent_alerts()
        .iter()
        .map(AlertView::from)
        .collect();

    Json(AlertsResponse { alerts })
}

/// Current engine status
async fn get_status(
    state: axum::extract::State<AppState>,
) -> Json<EngineStatus> {
    Json(state.engine.status())
}

/// Active detection parameters (read-only)
async fn get_config(
    state: axum::extract::State<AppState>,
) -> Json<DetectionParams> {
    Json(state.engine.params().clone())
}
