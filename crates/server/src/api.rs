//! HTTP API: prediction, landing summary, health checks and metrics

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Local, NaiveDate};
use heal_lib::{
    health::ComponentStatus,
    store::{DocumentStore, StoreGateway},
    HealError, HealthRegistry, LandingService, PredictionService, ServiceMetrics,
    StructuredLogger,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub predictions: PredictionService,
    pub landing: LandingService,
    pub health_registry: HealthRegistry,
    /// Reference date for predictions
    pub today: fn() -> NaiveDate,
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        health_registry: HealthRegistry,
        metrics: ServiceMetrics,
        logger: StructuredLogger,
    ) -> Self {
        let gateway = Arc::new(StoreGateway::new(store, metrics.clone()));
        Self {
            predictions: PredictionService::new(gateway.clone(), metrics.clone(), logger.clone())
                .with_health(health_registry.clone()),
            landing: LandingService::new(gateway, metrics, logger),
            health_registry,
            today: local_today,
        }
    }

    /// Replace the clock used for the prediction reference date
    pub fn with_today(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictRequest {
    pub user_id: Option<String>,
    pub screening_id: Option<String>,
}

/// Response body of `/api/predict-period`
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PredictionEnvelope {
    Success {
        status: &'static str,
        #[serde(rename = "predictedDate")]
        predicted_date: Option<NaiveDate>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<&'static str>,
    },
    Error {
        status: &'static str,
        message: String,
    },
}

impl PredictionEnvelope {
    pub fn success(predicted_date: Option<NaiveDate>) -> Self {
        PredictionEnvelope::Success {
            status: "success",
            predicted_date,
            message: predicted_date
                .is_none()
                .then_some("No prediction available"),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        PredictionEnvelope::Error {
            status: "error",
            message: message.into(),
        }
    }
}

fn error_status(err: &HealError) -> StatusCode {
    match err {
        HealError::ScreeningNotFound { .. } | HealError::UserNotFound(_) => StatusCode::NOT_FOUND,
        HealError::InvalidPath(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Predict the next period for a screening
async fn predict_period(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PredictRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(PredictionEnvelope::error(rejection.body_text())),
            )
                .into_response()
        }
    };

    let (Some(user_id), Some(screening_id)) = (
        non_empty(request.user_id),
        non_empty(request.screening_id),
    ) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(PredictionEnvelope::error("userId and screeningId are required")),
        )
            .into_response();
    };

    let today = (state.today)();
    match state
        .predictions
        .predict_next_period(&user_id, &screening_id, today)
        .await
    {
        Ok(prediction) => (
            StatusCode::OK,
            Json(PredictionEnvelope::success(prediction.map(|p| p.date))),
        )
            .into_response(),
        Err(e) => (error_status(&e), Json(PredictionEnvelope::error(e.to_string()))).into_response(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandingQuery {
    pub user_id: Option<String>,
}

/// Landing page summary for a user
async fn landing(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LandingQuery>,
) -> Response {
    let Some(user_id) = non_empty(query.user_id) else {
        return (StatusCode::BAD_REQUEST, "Missing userId").into_response();
    };

    match state.landing.landing(&user_id).await {
        Ok(Some(landing)) => (StatusCode::OK, Json(landing)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            format!("User not found: {}", user_id),
        )
            .into_response(),
        Err(e) => {
            error!(user_id = %user_id, error = %e, "Landing lookup failed");
            (error_status(&e), format!("Error: {}", e)).into_response()
        }
    }
}

/// Returns 200 if healthy or degraded, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Returns 200 once started and no component is unhealthy
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
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/predict-period", post(predict_period))
        .route("/v1/me/landing", get(landing))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Serve the API until `shutdown` resolves
pub async fn serve(
    addr: &str,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state);

    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
