use crate::config::CoreConfig;
use crate::services::alerts::AlertLifecycle;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: CoreConfig,
    pub db: PgPool,
    pub alerts: Arc<AlertLifecycle>,
}
