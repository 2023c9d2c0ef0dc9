use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::error::map_db_error;
use crate::services::thresholds::{self, Threshold, ThresholdError};
use crate::state::AppState;

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct StatusResponse {
    status: String,
}

fn map_threshold_error(err: ThresholdError) -> (StatusCode, String) {
    let status = match &err {
        ThresholdError::UnsatisfiableBand { .. } => StatusCode::CONFLICT,
        ThresholdError::UnknownMotor(_) | ThresholdError::NonFinite(_) => StatusCode::BAD_REQUEST,
    };
    (status, err.to_string())
}

#[utoipa::path(
    get,
    path = "/api/thresholds/{motor_id}",
    tag = "thresholds",
    params(("motor_id" = i32, Path, description = "Motor id")),
    responses(
        (status = 200, description = "Current thresholds", body = Threshold),
        (status = 404, description = "Thresholds not found")
    )
)]
pub(crate) async fn get_thresholds(
    State(state): State<AppState>,
    Path(motor_id): Path<i32>,
) -> Result<Json<Threshold>, (StatusCode, String)> {
    thresholds::get(&state.db, motor_id)
        .await
        .map_err(map_db_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Thresholds not found".to_string()))
}

#[utoipa::path(
    post,
    path = "/api/thresholds/",
    tag = "thresholds",
    request_body = Threshold,
    responses(
        (status = 200, description = "Thresholds replaced", body = StatusResponse),
        (status = 400, description = "Invalid thresholds"),
        (status = 409, description = "voltage_min exceeds voltage_max")
    )
)]
pub(crate) async fn upsert_thresholds(
    State(state): State<AppState>,
    Json(payload): Json<Threshold>,
) -> Result<Json<StatusResponse>, (StatusCode, String)> {
    thresholds::validate(&payload, state.config.motor_count).map_err(map_threshold_error)?;
    thresholds::set(&state.db, &payload)
        .await
        .map_err(map_db_error)?;
    Ok(Json(StatusResponse {
        status: "success".to_string(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/thresholds/{motor_id}", get(get_thresholds))
        .route("/thresholds/", post(upsert_thresholds))
}
