use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "motor-server-rs",
        description = "Motor telemetry ingest and threshold alert API"
    ),
    paths(
        crate::routes::health::healthz_handler,
        crate::routes::samples::ingest_sample,
        crate::routes::samples::motor_history,
        crate::routes::thresholds::get_thresholds,
        crate::routes::thresholds::upsert_thresholds,
    ),
    components(schemas(
        crate::routes::health::HealthResponse,
        crate::routes::samples::SampleRequest,
        crate::routes::samples::SampleResponse,
        crate::routes::samples::AlertNotice,
        crate::routes::thresholds::StatusResponse,
        crate::services::alerts::AlertKind,
        crate::services::samples::Sample,
        crate::services::thresholds::Threshold,
    ))
)]
struct ApiDoc;

pub fn openapi_json() -> serde_json::Value {
    serde_json::to_value(ApiDoc::openapi()).unwrap_or_else(|_| serde_json::json!({}))
}

async fn openapi_handler() -> Json<serde_json::Value> {
    Json(openapi_json())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_handler))
}
