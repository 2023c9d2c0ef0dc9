use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

pub fn connect_lazy(database_url: &str) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(8))
        .connect_lazy(database_url)
        .with_context(|| format!("failed to create lazy database pool for {database_url}"))
}

pub async fn ensure_schema(db: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS motor_samples (
            id bigserial primary key,
            motor_id int not null,
            temperature double precision not null,
            voltage double precision not null,
            timestamp timestamptz not null
        )
        "#,
    )
    .execute(db)
    .await?;
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS motor_samples_motor_ts_idx
        ON motor_samples (motor_id, timestamp DESC)
        "#,
    )
    .execute(db)
    .await?;
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS motor_thresholds (
            motor_id int primary key,
            temp_max double precision not null,
            voltage_min double precision not null,
            voltage_max double precision not null
        )
        "#,
    )
    .execute(db)
    .await?;
    Ok(())
}
