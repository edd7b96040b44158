use crate::infra::AppState;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use fleet_score::scoring::{scoring_router, RecordStore, ScoringPolicy, ScoringService};
use serde_json::json;
use std::sync::Arc;

/// Scoring endpoints plus the operational probes and the active policy.
pub(crate) fn with_scoring_routes<S>(service: Arc<ScoringService<S>>) -> Router
where
    S: RecordStore + 'static,
{
    let policy = Arc::new(service.policy().clone());

    scoring_router(service)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .merge(
            Router::new()
                .route("/api/v1/policy", get(policy_endpoint))
                .with_state(policy),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn policy_endpoint(
    State(policy): State<Arc<ScoringPolicy>>,
) -> Json<ScoringPolicy> {
    Json(policy.as_ref().clone())
}
