use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::config::CoreConfig;
use crate::services::alerts::{AlertLifecycle, Evaluation};
use crate::services::samples::{self, Sample};
use crate::services::thresholds;

/// A reading as submitted by a sensor/agent; the timestamp is optional and
/// defaults to submission time.
#[derive(Debug, Clone)]
pub struct NewSample {
    pub motor_id: i32,
    pub temperature: f64,
    pub voltage: f64,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("unknown motor id {0}")]
    UnknownMotor(i32),
    #[error("{0} must be a finite number")]
    NonFinite(&'static str),
    #[error("no thresholds configured for motor {0}")]
    ThresholdNotConfigured(i32),
    #[error(transparent)]
    Store(#[from] sqlx::Error),
}

#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub sample: Sample,
    pub evaluation: Evaluation,
}

fn validate(new: &NewSample, motor_count: i32) -> Result<(), IngestError> {
    if new.motor_id < 1 || new.motor_id > motor_count {
        return Err(IngestError::UnknownMotor(new.motor_id));
    }
    if !new.temperature.is_finite() {
        return Err(IngestError::NonFinite("temperature"));
    }
    if !new.voltage.is_finite() {
        return Err(IngestError::NonFinite("voltage"));
    }
    Ok(())
}

/// Accepts one reading: validates, persists (trimming retained rows past the
/// configured limit), then evaluates it against the motor's thresholds.
///
/// Invalid readings are rejected before anything is persisted. A missing
/// threshold row leaves the sample persisted but skips evaluation. Store
/// failures surface to the caller; retrying is the caller's concern.
pub async fn submit(
    db: &PgPool,
    alerts: &AlertLifecycle,
    config: &CoreConfig,
    new: NewSample,
) -> Result<SubmitOutcome, IngestError> {
    validate(&new, config.motor_count)?;

    let sample = Sample {
        motor_id: new.motor_id,
        temperature: new.temperature,
        voltage: new.voltage,
        timestamp: new.timestamp.unwrap_or_else(Utc::now),
    };

    samples::append(db, &sample).await?;
    samples::prune(db, sample.motor_id, config.sample_retention).await?;

    let Some(threshold) = thresholds::get(db, sample.motor_id).await? else {
        return Err(IngestError::ThresholdNotConfigured(sample.motor_id));
    };

    let evaluation = alerts.evaluate(sample.motor_id, &sample, &threshold);
    if !evaluation.raised.is_empty() || !evaluation.cleared.is_empty() {
        tracing::info!(
            motor_id = sample.motor_id,
            raised = ?evaluation.raised,
            cleared = ?evaluation.cleared,
            "alert state transition"
        );
    }

    Ok(SubmitOutcome { sample, evaluation })
}
