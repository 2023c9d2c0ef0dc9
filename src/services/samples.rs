use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// One timestamped temperature/voltage reading for a motor. Immutable once
/// persisted; duplicates are not deduplicated (callers submit once per
/// reading).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Sample {
    pub motor_id: i32,
    pub temperature: f64,
    pub voltage: f64,
    pub timestamp: DateTime<Utc>,
}

pub async fn append(db: &PgPool, sample: &Sample) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO motor_samples (motor_id, temperature, voltage, timestamp)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(sample.motor_id)
    .bind(sample.temperature)
    .bind(sample.voltage)
    .bind(sample.timestamp)
    .execute(db)
    .await?;
    Ok(())
}

/// Most-recent-first window of persisted samples for one motor.
pub async fn history(db: &PgPool, motor_id: i32, limit: i64) -> Result<Vec<Sample>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT motor_id, temperature, voltage, timestamp
        FROM motor_samples
        WHERE motor_id = $1
        ORDER BY timestamp DESC, id DESC
        LIMIT $2
        "#,
    )
    .bind(motor_id)
    .bind(limit)
    .fetch_all(db)
    .await
}

/// Drops rows past the `keep` most recent for the motor.
pub async fn prune(db: &PgPool, motor_id: i32, keep: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM motor_samples
        WHERE motor_id = $1
          AND id NOT IN (
            SELECT id
            FROM motor_samples
            WHERE motor_id = $1
            ORDER BY timestamp DESC, id DESC
            LIMIT $2
        )
        "#,
    )
    .bind(motor_id)
    .bind(keep)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}
