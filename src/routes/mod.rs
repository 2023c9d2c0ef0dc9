pub mod health;
pub mod samples;
pub mod thresholds;

use axum::Router;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .nest(
            "/api",
            Router::new()
                .merge(samples::router())
                .merge(thresholds::router())
                .merge(crate::openapi::router()),
        )
        .with_state(state)
}
