use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

pub const DEFAULT_TEMP_MAX: f64 = 85.0;
pub const DEFAULT_VOLTAGE_MIN: f64 = 200.0;
pub const DEFAULT_VOLTAGE_MAX: f64 = 240.0;

/// Upper temperature bound and voltage band for one motor. Replaced as a
/// whole on update; the fields are not independently addressable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Threshold {
    pub motor_id: i32,
    pub temp_max: f64,
    pub voltage_min: f64,
    pub voltage_max: f64,
}

impl Threshold {
    pub fn default_for(motor_id: i32) -> Self {
        Self {
            motor_id,
            temp_max: DEFAULT_TEMP_MAX,
            voltage_min: DEFAULT_VOLTAGE_MIN,
            voltage_max: DEFAULT_VOLTAGE_MAX,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ThresholdError {
    #[error("unknown motor id {0}")]
    UnknownMotor(i32),
    #[error("{0} must be a finite number")]
    NonFinite(&'static str),
    #[error("voltage_min {min} exceeds voltage_max {max}")]
    UnsatisfiableBand { min: f64, max: f64 },
}

pub fn validate(threshold: &Threshold, motor_count: i32) -> Result<(), ThresholdError> {
    if threshold.motor_id < 1 || threshold.motor_id > motor_count {
        return Err(ThresholdError::UnknownMotor(threshold.motor_id));
    }
    for (field, value) in [
        ("temp_max", threshold.temp_max),
        ("voltage_min", threshold.voltage_min),
        ("voltage_max", threshold.voltage_max),
    ] {
        if !value.is_finite() {
            return Err(ThresholdError::NonFinite(field));
        }
    }
    if threshold.voltage_min > threshold.voltage_max {
        return Err(ThresholdError::UnsatisfiableBand {
            min: threshold.voltage_min,
            max: threshold.voltage_max,
        });
    }
    Ok(())
}

pub async fn get(db: &PgPool, motor_id: i32) -> Result<Option<Threshold>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT motor_id, temp_max, voltage_min, voltage_max
        FROM motor_thresholds
        WHERE motor_id = $1
        "#,
    )
    .bind(motor_id)
    .fetch_optional(db)
    .await
}

/// Full replace of all three bounds in one statement.
pub async fn set(db: &PgPool, threshold: &Threshold) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO motor_thresholds (motor_id, temp_max, voltage_min, voltage_max)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (motor_id) DO UPDATE SET
            temp_max = EXCLUDED.temp_max,
            voltage_min = EXCLUDED.voltage_min,
            voltage_max = EXCLUDED.voltage_max
        "#,
    )
    .bind(threshold.motor_id)
    .bind(threshold.temp_max)
    .bind(threshold.voltage_min)
    .bind(threshold.voltage_max)
    .execute(db)
    .await?;
    Ok(())
}

/// Seeds the default threshold row for every registered motor; existing
/// configuration is left untouched.
pub async fn seed_defaults(db: &PgPool, motor_count: i32) -> Result<(), sqlx::Error> {
    for motor_id in 1..=motor_count {
        let defaults = Threshold::default_for(motor_id);
        sqlx::query(
            r#"
            INSERT INTO motor_thresholds (motor_id, temp_max, voltage_min, voltage_max)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (motor_id) DO NOTHING
            "#,
        )
        .bind(defaults.motor_id)
        .bind(defaults.temp_max)
        .bind(defaults.voltage_min)
        .bind(defaults.voltage_max)
        .execute(db)
        .await?;
    }
    Ok(())
}
