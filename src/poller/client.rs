use anyhow::{Context, Result};
use reqwest::StatusCode;

use crate::services::samples::Sample;
use crate::services::thresholds::Threshold;

/// Read-side client for the ingest/query API.
#[derive(Debug, Clone)]
pub struct HistoryClient {
    http: reqwest::Client,
    base_url: String,
}

impl HistoryClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// The single most recent persisted sample for the motor, if any.
    pub async fn latest_sample(&self, motor_id: i32) -> Result<Option<Sample>> {
        let url = format!("{}/api/data/{motor_id}/history?limit=1", self.base_url);
        let mut samples: Vec<Sample> = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("failed to fetch latest sample for motor {motor_id}"))?
            .error_for_status()
            .with_context(|| format!("history request rejected for motor {motor_id}"))?
            .json()
            .await
            .with_context(|| format!("invalid history payload for motor {motor_id}"))?;
        if samples.is_empty() {
            Ok(None)
        } else {
            Ok(Some(samples.remove(0)))
        }
    }

    /// Current server-side thresholds; `None` when unset (404).
    pub async fn thresholds(&self, motor_id: i32) -> Result<Option<Threshold>> {
        let url = format!("{}/api/thresholds/{motor_id}", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("failed to fetch thresholds for motor {motor_id}"))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let threshold = response
            .error_for_status()
            .with_context(|| format!("threshold request rejected for motor {motor_id}"))?
            .json()
            .await
            .with_context(|| format!("invalid threshold payload for motor {motor_id}"))?;
        Ok(Some(threshold))
    }
}
