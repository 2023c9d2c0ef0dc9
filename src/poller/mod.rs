pub mod client;
pub mod history;
pub mod notify;

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::services::alerts::{AlertKind, AlertLifecycle};
use crate::services::samples::Sample;
use crate::services::thresholds::Threshold;
use client::HistoryClient;
use history::HistoryBuffer;
use notify::{ActiveNotification, NotificationChange, NotificationController};

/// Runtime-tunable poller knobs, delivered over a watch channel. An interval
/// change re-arms the timer; a capacity change applies on the next append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerSettings {
    pub interval: Duration,
    pub history_capacity: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollerEvent {
    DataReady {
        motor_id: i32,
        sample: Sample,
    },
    AlertsChanged {
        motor_id: i32,
        raised: Vec<AlertKind>,
        cleared: Vec<AlertKind>,
    },
    NotificationOpened(ActiveNotification),
    NotificationClosed,
}

/// The dashboard-side mirror of the evaluation engine: per-motor history
/// buffers, a threshold mirror, local alert flags, and the standing
/// notification. Mutated only by the poll loop.
#[derive(Debug)]
pub struct PollerState {
    history: HashMap<i32, HistoryBuffer>,
    thresholds: HashMap<i32, Threshold>,
    alerts: AlertLifecycle,
    notifications: NotificationController,
}

impl PollerState {
    pub fn new(motor_ids: &[i32], history_capacity: usize) -> Self {
        let history = motor_ids
            .iter()
            .map(|&motor_id| (motor_id, HistoryBuffer::new(history_capacity)))
            .collect();
        let thresholds = motor_ids
            .iter()
            .map(|&motor_id| (motor_id, Threshold::default_for(motor_id)))
            .collect();
        Self {
            history,
            thresholds,
            alerts: AlertLifecycle::default(),
            notifications: NotificationController::default(),
        }
    }

    pub fn set_threshold(&mut self, threshold: Threshold) {
        self.thresholds.insert(threshold.motor_id, threshold);
    }

    pub fn set_history_capacity(&mut self, capacity: usize) {
        for buffer in self.history.values_mut() {
            buffer.set_capacity(capacity);
        }
    }

    pub fn history(&self, motor_id: i32) -> Option<&HistoryBuffer> {
        self.history.get(&motor_id)
    }

    /// Applies one motor's fetch result. A failed or empty fetch leaves every
    /// piece of state untouched; the next cycle simply retries.
    pub fn apply_fetch(
        &mut self,
        motor_id: i32,
        fetched: anyhow::Result<Option<Sample>>,
    ) -> Vec<PollerEvent> {
        let sample = match fetched {
            Ok(Some(sample)) => sample,
            Ok(None) => return Vec::new(),
            Err(err) => {
                tracing::warn!(motor_id, error = %err, "poll fetch failed; retrying next tick");
                return Vec::new();
            }
        };

        let mut events = Vec::new();
        if let Some(buffer) = self.history.get_mut(&motor_id) {
            buffer.push(sample.clone());
        }
        events.push(PollerEvent::DataReady {
            motor_id,
            sample: sample.clone(),
        });

        let threshold = self
            .thresholds
            .get(&motor_id)
            .copied()
            .unwrap_or_else(|| Threshold::default_for(motor_id));
        let evaluation = self.alerts.evaluate(motor_id, &sample, &threshold);
        if !evaluation.raised.is_empty() || !evaluation.cleared.is_empty() {
            events.push(PollerEvent::AlertsChanged {
                motor_id,
                raised: evaluation.raised,
                cleared: evaluation.cleared,
            });
        }

        match self.notifications.sync(&self.alerts.active_alerts()) {
            Some(NotificationChange::Opened(notification)) => {
                events.push(PollerEvent::NotificationOpened(notification));
            }
            Some(NotificationChange::Closed) => events.push(PollerEvent::NotificationClosed),
            None => {}
        }
        events
    }
}

/// Polls the latest sample per motor on a fixed cadence and feeds the local
/// mirror. The fetch cycle is awaited inside the loop and missed ticks are
/// skipped, so at most one cycle is ever in flight.
pub struct MotorPoller {
    client: HistoryClient,
    motor_ids: Vec<i32>,
    state: PollerState,
    events: mpsc::Sender<PollerEvent>,
    settings: watch::Receiver<PollerSettings>,
}

impl MotorPoller {
    pub fn new(
        client: HistoryClient,
        motor_ids: Vec<i32>,
        settings: watch::Receiver<PollerSettings>,
        events: mpsc::Sender<PollerEvent>,
    ) -> Self {
        let initial = *settings.borrow();
        let state = PollerState::new(&motor_ids, initial.history_capacity);
        Self {
            client,
            motor_ids,
            state,
            events,
            settings,
        }
    }

    /// Runs until cancelled, then hands back the mirror state so the caller
    /// can export retained history.
    pub async fn run(mut self, cancel: CancellationToken) -> PollerState {
        self.refresh_thresholds().await;

        let mut settings = *self.settings.borrow();
        let mut ticker = new_ticker(settings.interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = self.settings.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let next = *self.settings.borrow();
                    if next.interval != settings.interval {
                        ticker = new_ticker(next.interval);
                    }
                    self.state.set_history_capacity(next.history_capacity);
                    settings = next;
                }
                _ = ticker.tick() => {
                    if !self.fetch_cycle().await {
                        break;
                    }
                }
            }
        }
        self.state
    }

    /// Seeds the threshold mirror from the server, keeping defaults for any
    /// motor the server has no configuration for yet.
    async fn refresh_thresholds(&mut self) {
        for motor_id in self.motor_ids.clone() {
            match self.client.thresholds(motor_id).await {
                Ok(Some(threshold)) => self.state.set_threshold(threshold),
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(motor_id, error = %err, "threshold fetch failed; keeping defaults");
                }
            }
        }
    }

    /// One full pass over the motor set. Returns false once the event
    /// receiver is gone and polling has no audience left.
    async fn fetch_cycle(&mut self) -> bool {
        for motor_id in self.motor_ids.clone() {
            let fetched = self.client.latest_sample(motor_id).await;
            for event in self.state.apply_fetch(motor_id, fetched) {
                if self.events.send(event).await.is_err() {
                    return false;
                }
            }
        }
        true
    }
}

fn new_ticker(interval: Duration) -> tokio::time::Interval {
    let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(10)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

/// History capacity for a minutes-based setting at the one-sample-per-second
/// poll cadence.
pub fn capacity_from_minutes(minutes: u64) -> usize {
    (minutes.max(1) * 60) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample(motor_id: i32, temperature: f64, voltage: f64) -> Sample {
        Sample {
            motor_id,
            temperature,
            voltage,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn empty_fetch_skips_motor() {
        let mut state = PollerState::new(&[1, 2], 10);
        let events = state.apply_fetch(1, Ok(None));
        assert!(events.is_empty());
        assert!(state.history(1).expect("buffer").is_empty());
    }

    #[test]
    fn sample_produces_data_ready_and_alert_events() {
        let mut state = PollerState::new(&[1], 10);

        let events = state.apply_fetch(1, Ok(Some(sample(1, 90.0, 220.0))));
        assert_eq!(events.len(), 3);
        assert!(matches!(
            events[0],
            PollerEvent::DataReady { motor_id: 1, .. }
        ));
        assert_eq!(
            events[1],
            PollerEvent::AlertsChanged {
                motor_id: 1,
                raised: vec![AlertKind::HighTemp],
                cleared: vec![],
            }
        );
        assert!(matches!(events[2], PollerEvent::NotificationOpened(_)));

        let events = state.apply_fetch(1, Ok(Some(sample(1, 80.0, 220.0))));
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[1],
            PollerEvent::AlertsChanged {
                motor_id: 1,
                raised: vec![],
                cleared: vec![AlertKind::HighTemp],
            }
        );
        assert_eq!(events[2], PollerEvent::NotificationClosed);
    }

    #[test]
    fn steady_readings_emit_data_only() {
        let mut state = PollerState::new(&[1], 10);

        let events = state.apply_fetch(1, Ok(Some(sample(1, 70.0, 220.0))));
        assert_eq!(events.len(), 1);
        let events = state.apply_fetch(1, Ok(Some(sample(1, 71.0, 221.0))));
        assert_eq!(events.len(), 1);
        assert_eq!(state.history(1).expect("buffer").len(), 2);
    }

    #[test]
    fn outage_leaves_state_unchanged() {
        let mut state = PollerState::new(&[1], 10);
        state.apply_fetch(1, Ok(Some(sample(1, 90.0, 220.0))));
        state.apply_fetch(1, Ok(Some(sample(1, 91.0, 220.0))));
        let len_before = state.history(1).expect("buffer").len();

        for _ in 0..3 {
            let events = state.apply_fetch(1, Err(anyhow::anyhow!("connection refused")));
            assert!(events.is_empty());
        }
        assert_eq!(state.history(1).expect("buffer").len(), len_before);
        assert!(state.alerts.is_any_active(1));
        assert!(state.notifications.current().is_some());

        // A successful fetch resumes updates without duplication.
        let events = state.apply_fetch(1, Ok(Some(sample(1, 92.0, 220.0))));
        assert_eq!(events.len(), 1);
        assert_eq!(state.history(1).expect("buffer").len(), len_before + 1);
    }

    #[test]
    fn capacity_reconfiguration_applies_on_next_append() {
        let mut state = PollerState::new(&[1], 5);
        for i in 0..5 {
            state.apply_fetch(1, Ok(Some(sample(1, 70.0 + i as f64, 220.0))));
        }

        state.set_history_capacity(2);
        assert_eq!(state.history(1).expect("buffer").len(), 5);

        state.apply_fetch(1, Ok(Some(sample(1, 80.0, 220.0))));
        assert_eq!(state.history(1).expect("buffer").len(), 2);
    }

    #[test]
    fn mirror_uses_updated_thresholds() {
        let mut state = PollerState::new(&[1], 10);
        state.set_threshold(Threshold {
            motor_id: 1,
            temp_max: 60.0,
            voltage_min: 200.0,
            voltage_max: 240.0,
        });

        let events = state.apply_fetch(1, Ok(Some(sample(1, 70.0, 220.0))));
        assert!(events
            .iter()
            .any(|event| matches!(event, PollerEvent::AlertsChanged { raised, .. } if raised == &vec![AlertKind::HighTemp])));
    }

    #[test]
    fn minutes_convert_to_one_second_capacity() {
        assert_eq!(capacity_from_minutes(5), 300);
        assert_eq!(capacity_from_minutes(0), 60);
    }
}
