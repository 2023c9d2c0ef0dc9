use crate::config::CoreConfig;
use crate::db;
use crate::services::alerts::AlertLifecycle;
use crate::state::AppState;
use std::sync::Arc;

pub fn test_config() -> CoreConfig {
    CoreConfig {
        database_url: "postgresql://postgres@localhost/postgres".to_string(),
        motor_count: 4,
        sample_retention: 300,
    }
}

/// State over a lazy pool: request paths that fail validation never touch
/// the database, so no server needs to be running.
pub fn test_state() -> AppState {
    let config = test_config();
    let pool = db::connect_lazy(&config.database_url).expect("connect_lazy");
    AppState {
        config,
        db: pool,
        alerts: Arc::new(AlertLifecycle::default()),
    }
}
