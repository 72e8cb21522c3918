//! HTTP API for predictions, lookups, health checks, and Prometheus metrics

use crate::error::ApiError;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use style_lib::{
    health::{ComponentStatus, HealthRegistry},
    observability::{ServiceMetrics, StructuredLogger},
    store::{LookupKey, PredictionRecord, PredictionRecorder, DEFAULT_RECENT_LIMIT},
    FieldError, InferenceContext, PredictionResponse, StudentRecord, ValidationErrors,
};
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub context: Arc<InferenceContext>,
    pub recorder: PredictionRecorder,
    pub health_registry: HealthRegistry,
    pub metrics: ServiceMetrics,
    pub logger: StructuredLogger,
    pub max_list_limit: usize,
}

impl AppState {
    pub fn new(
        context: Arc<InferenceContext>,
        recorder: PredictionRecorder,
        health_registry: HealthRegistry,
        metrics: ServiceMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            context,
            recorder,
            health_registry,
            metrics,
            logger,
            max_list_limit: 100,
        }
    }

    pub fn with_max_list_limit(mut self, limit: usize) -> Self {
        self.max_list_limit = limit;
        self
    }
}

async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "Learning Style Detection API is running!",
        "status": "healthy",
    }))
}

/// Validate, classify, and answer; persistence runs detached and never
/// affects the response
async fn predict_style(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<PredictionResponse>, ApiError> {
    let parsed = serde_json::from_slice::<Value>(&body).map_err(|e| ValidationErrors {
        errors: vec![FieldError::new(
            "body",
            format!("JSON decode error: {}", e),
            Value::from("N/A"),
        )],
    });
    let record = parsed
        .and_then(|value| StudentRecord::from_json(&value))
        .map_err(|errors| {
            state.metrics.inc_validation_failures();
            info!(
                fields = ?errors.errors.iter().map(|e| e.field.as_str()).collect::<Vec<_>>(),
                "Rejected invalid record"
            );
            errors
        })?;

    let start = Instant::now();
    let prediction = state.context.predict(&record).map_err(|e| {
        state.metrics.inc_inference_errors();
        e
    })?;
    let elapsed = start.elapsed().as_secs_f64();

    state.metrics.observe_inference_latency(elapsed);
    state.metrics.inc_predictions(prediction.style);
    state
        .logger
        .log_prediction(prediction.style, prediction.confidence(), elapsed);

    state.recorder.spawn_record(&prediction, record);

    Ok(Json(PredictionResponse::new(&prediction, record)))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct RecentPredictions {
    predictions: Vec<PredictionRecord>,
    count: usize,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct FoundPrediction {
    prediction: PredictionRecord,
    status: &'static str,
}

async fn list_predictions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<RecentPredictions>, ApiError> {
    let store = state.recorder.store().ok_or(ApiError::PersistenceDisabled)?;
    let limit = params
        .limit
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .min(state.max_list_limit);

    let predictions = store.recent(limit).await?;
    Ok(Json(RecentPredictions {
        count: predictions.len(),
        predictions,
        status: "success",
    }))
}

/// Resolve either a store id or a prediction id
async fn get_prediction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<FoundPrediction>, ApiError> {
    let store = state.recorder.store().ok_or(ApiError::PersistenceDisabled)?;
    let prediction = store
        .find(&LookupKey::parse(&id))
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(FoundPrediction {
        prediction,
        status: "success",
    }))
}

/// Health check response - returns 200 if healthy or degraded, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            Vec::new(),
        );
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/predict-style", post(predict_style))
        .route("/predictions", get(list_predictions))
        .route("/predictions/:id", get(get_prediction))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server and run until `shutdown` resolves
pub async fn serve<F>(addr: &str, state: Arc<AppState>, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);

    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
