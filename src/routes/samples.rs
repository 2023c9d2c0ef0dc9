use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};

use crate::error::map_db_error;
use crate::services::alerts::AlertKind;
use crate::services::ingest::{self, IngestError, NewSample};
use crate::services::samples::{self, Sample};
use crate::state::AppState;

#[derive(Debug, Clone, serde::Deserialize, utoipa::ToSchema)]
pub(crate) struct SampleRequest {
    motor_id: i32,
    temperature: f64,
    voltage: f64,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct AlertNotice {
    motor_id: i32,
    alert_type: AlertKind,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct SampleResponse {
    status: String,
    alerts: Vec<AlertNotice>,
}

fn map_ingest_error(err: IngestError) -> (StatusCode, String) {
    match err {
        IngestError::UnknownMotor(_) | IngestError::NonFinite(_) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        IngestError::ThresholdNotConfigured(_) => (StatusCode::NOT_FOUND, err.to_string()),
        IngestError::Store(db_err) => map_db_error(db_err),
    }
}

#[utoipa::path(
    post,
    path = "/api/data/",
    tag = "data",
    request_body = SampleRequest,
    responses(
        (status = 200, description = "Sample accepted", body = SampleResponse),
        (status = 400, description = "Invalid sample"),
        (status = 404, description = "Thresholds not configured")
    )
)]
pub(crate) async fn ingest_sample(
    State(state): State<AppState>,
    Json(payload): Json<SampleRequest>,
) -> Result<Json<SampleResponse>, (StatusCode, String)> {
    let outcome = ingest::submit(
        &state.db,
        &state.alerts,
        &state.config,
        NewSample {
            motor_id: payload.motor_id,
            temperature: payload.temperature,
            voltage: payload.voltage,
            timestamp: payload.timestamp,
        },
    )
    .await
    .map_err(map_ingest_error)?;

    let alerts = outcome
        .evaluation
        .active
        .iter()
        .map(|&alert_type| AlertNotice {
            motor_id: outcome.sample.motor_id,
            alert_type,
        })
        .collect();
    Ok(Json(SampleResponse {
        status: "success".to_string(),
        alerts,
    }))
}

#[derive(Debug, Clone, serde::Deserialize, utoipa::IntoParams)]
pub(crate) struct HistoryQuery {
    #[param(minimum = 1, maximum = 1000)]
    limit: Option<u32>,
}

#[utoipa::path(
    get,
    path = "/api/data/{motor_id}/history",
    tag = "data",
    params(
        ("motor_id" = i32, Path, description = "Motor id"),
        HistoryQuery
    ),
    responses((status = 200, description = "Most-recent-first samples", body = Vec<Sample>))
)]
pub(crate) async fn motor_history(
    State(state): State<AppState>,
    Path(motor_id): Path<i32>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<Sample>>, (StatusCode, String)> {
    let limit = query.limit.unwrap_or(100).clamp(1, 1000) as i64;
    samples::history(&state.db, motor_id, limit)
        .await
        .map(Json)
        .map_err(map_db_error)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/data/", post(ingest_sample))
        .route("/data/{motor_id}/history", get(motor_history))
}
