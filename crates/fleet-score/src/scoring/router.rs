use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use super::domain::{OperativeId, OperativeIdentity};
use super::policy::MonetaryBasis;
use super::service::{ScoringError, ScoringService};
use super::store::{RecordStore, StoreError};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct OperativeParams {
    name: Option<String>,
    phone: Option<String>,
    as_of: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FleetParams {
    name: Option<String>,
    #[serde(default)]
    basis: MonetaryBasis,
    as_of: Option<NaiveDate>,
}

fn as_of_or_today(as_of: Option<NaiveDate>) -> NaiveDate {
    as_of.unwrap_or_else(|| Utc::now().date_naive())
}

/// Read-only scoring endpoints.
pub fn scoring_router<S>(service: Arc<ScoringService<S>>) -> Router
where
    S: RecordStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/operatives/:operative_id/metrics",
            get(metrics_handler::<S>),
        )
        .route(
            "/api/v1/operatives/:operative_id/rating",
            get(rating_handler::<S>),
        )
        .route("/api/v1/fleet/ranking", get(ranking_handler::<S>))
        .route("/api/v1/fleet/ranking/batch", get(ranking_batch_handler::<S>))
        .route("/api/v1/fleet/benchmarks", get(benchmarks_handler::<S>))
        .with_state(service)
}

pub(crate) async fn metrics_handler<S>(
    State(service): State<Arc<ScoringService<S>>>,
    Path(operative_id): Path<String>,
    Query(params): Query<OperativeParams>,
) -> Response
where
    S: RecordStore + 'static,
{
    let identity = OperativeIdentity {
        id: Some(OperativeId(operative_id)),
        name: params.name,
        phone: params.phone,
    };
    match service
        .performance_metrics(&identity, as_of_or_today(params.as_of))
        .await
    {
        Ok(snapshot) => (StatusCode::OK, axum::Json(snapshot)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn rating_handler<S>(
    State(service): State<Arc<ScoringService<S>>>,
    Path(operative_id): Path<String>,
    Query(params): Query<OperativeParams>,
) -> Response
where
    S: RecordStore + 'static,
{
    let identity = OperativeIdentity {
        id: Some(OperativeId(operative_id)),
        name: params.name,
        phone: params.phone,
    };
    match service
        .operative_rating(&identity, as_of_or_today(params.as_of))
        .await
    {
        Ok(snapshot) => (StatusCode::OK, axum::Json(snapshot)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn ranking_handler<S>(
    State(service): State<Arc<ScoringService<S>>>,
    Query(params): Query<FleetParams>,
) -> Response
where
    S: RecordStore + 'static,
{
    let name = params.name.unwrap_or_default();
    match service
        .fleet_ranking(&name, params.basis, as_of_or_today(params.as_of))
        .await
    {
        Ok(lookup) => (StatusCode::OK, axum::Json(lookup)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn ranking_batch_handler<S>(
    State(service): State<Arc<ScoringService<S>>>,
    Query(params): Query<FleetParams>,
) -> Response
where
    S: RecordStore + 'static,
{
    match service
        .fleet_ranking_batch(params.basis, as_of_or_today(params.as_of))
        .await
    {
        Ok(ranking) => (StatusCode::OK, axum::Json(ranking)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn benchmarks_handler<S>(
    State(service): State<Arc<ScoringService<S>>>,
    Query(params): Query<FleetParams>,
) -> Response
where
    S: RecordStore + 'static,
{
    let name = params.name.unwrap_or_default();
    match service
        .pool_benchmarks(&name, as_of_or_today(params.as_of))
        .await
    {
        Ok(snapshot) => (StatusCode::OK, axum::Json(snapshot)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) fn error_status(error: &ScoringError) -> StatusCode {
    match error {
        ScoringError::MissingIdentifier(_) => StatusCode::BAD_REQUEST,
        ScoringError::UnknownOperative(_) => StatusCode::NOT_FOUND,
        ScoringError::Dependency { .. } => StatusCode::FAILED_DEPENDENCY,
        ScoringError::Store(StoreError::InvalidQuery(_)) => StatusCode::BAD_REQUEST,
        ScoringError::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn error_response(error: ScoringError) -> Response {
    let status = error_status(&error);
    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
