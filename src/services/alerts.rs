use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use crate::services::samples::Sample;
use crate::services::thresholds::Threshold;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    HighTemp,
    VoltageAnomaly,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct MotorAlertState {
    temp_active: bool,
    voltage_active: bool,
}

impl MotorAlertState {
    fn any_active(self) -> bool {
        self.temp_active || self.voltage_active
    }

    fn active_kinds(self) -> Vec<AlertKind> {
        let mut kinds = Vec::new();
        if self.temp_active {
            kinds.push(AlertKind::HighTemp);
        }
        if self.voltage_active {
            kinds.push(AlertKind::VoltageAnomaly);
        }
        kinds
    }
}

/// Outcome of evaluating one sample against one motor's thresholds.
///
/// `active` is the post-evaluation state; `raised` and `cleared` are the
/// edge transitions of this call only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    pub active: Vec<AlertKind>,
    pub raised: Vec<AlertKind>,
    pub cleared: Vec<AlertKind>,
}

/// Per-motor alert flags, owned exclusively by the evaluation path.
///
/// State tracks the latest evaluated sample only: a single in-range reading
/// clears the corresponding dimension, with no debounce window.
#[derive(Debug, Default)]
pub struct AlertLifecycle {
    states: Mutex<HashMap<i32, MotorAlertState>>,
}

impl AlertLifecycle {
    pub fn evaluate(&self, motor_id: i32, sample: &Sample, threshold: &Threshold) -> Evaluation {
        let next = MotorAlertState {
            temp_active: sample.temperature > threshold.temp_max,
            voltage_active: sample.voltage < threshold.voltage_min
                || sample.voltage > threshold.voltage_max,
        };

        let mut states = self.states.lock().expect("alert state mutex poisoned");
        let prev = states.insert(motor_id, next).unwrap_or_default();
        drop(states);

        let mut evaluation = Evaluation {
            active: next.active_kinds(),
            ..Evaluation::default()
        };
        for (kind, was, now) in [
            (AlertKind::HighTemp, prev.temp_active, next.temp_active),
            (
                AlertKind::VoltageAnomaly,
                prev.voltage_active,
                next.voltage_active,
            ),
        ] {
            if now && !was {
                evaluation.raised.push(kind);
            } else if !now && was {
                evaluation.cleared.push(kind);
            }
        }
        evaluation
    }

    pub fn is_any_active(&self, motor_id: i32) -> bool {
        self.states
            .lock()
            .expect("alert state mutex poisoned")
            .get(&motor_id)
            .copied()
            .unwrap_or_default()
            .any_active()
    }

    /// Motors with at least one active alert dimension, with their kinds.
    /// Empty exactly when every motor is fully in range.
    pub fn active_alerts(&self) -> BTreeMap<i32, Vec<AlertKind>> {
        self.states
            .lock()
            .expect("alert state mutex poisoned")
            .iter()
            .filter(|(_, state)| state.any_active())
            .map(|(motor_id, state)| (*motor_id, state.active_kinds()))
            .collect()
    }
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

    fn threshold(motor_id: i32) -> Threshold {
        Threshold {
            motor_id,
            temp_max: 85.0,
            voltage_min: 200.0,
            voltage_max: 240.0,
        }
    }

    #[test]
    fn high_temperature_raises_alert() {
        let alerts = AlertLifecycle::default();
        let evaluation = alerts.evaluate(1, &sample(1, 90.0, 220.0), &threshold(1));

        assert_eq!(evaluation.active, vec![AlertKind::HighTemp]);
        assert_eq!(evaluation.raised, vec![AlertKind::HighTemp]);
        assert!(evaluation.cleared.is_empty());
        assert!(alerts.is_any_active(1));
    }

    #[test]
    fn return_to_normal_clears_immediately() {
        let alerts = AlertLifecycle::default();
        alerts.evaluate(1, &sample(1, 90.0, 220.0), &threshold(1));

        let evaluation = alerts.evaluate(1, &sample(1, 80.0, 220.0), &threshold(1));
        assert!(evaluation.active.is_empty());
        assert!(evaluation.raised.is_empty());
        assert_eq!(evaluation.cleared, vec![AlertKind::HighTemp]);
        assert!(!alerts.is_any_active(1));
        assert!(alerts.active_alerts().is_empty());
    }

    #[test]
    fn boundary_values_do_not_alert() {
        let alerts = AlertLifecycle::default();

        let evaluation = alerts.evaluate(1, &sample(1, 85.0, 200.0), &threshold(1));
        assert!(evaluation.active.is_empty());

        let evaluation = alerts.evaluate(1, &sample(1, 84.9, 240.0), &threshold(1));
        assert!(evaluation.active.is_empty());
        assert!(evaluation.raised.is_empty());
    }

    #[test]
    fn voltage_alerts_on_either_side_of_band() {
        let alerts = AlertLifecycle::default();

        let low = alerts.evaluate(1, &sample(1, 70.0, 199.9), &threshold(1));
        assert_eq!(low.raised, vec![AlertKind::VoltageAnomaly]);

        let high = alerts.evaluate(2, &sample(2, 70.0, 240.1), &threshold(2));
        assert_eq!(high.raised, vec![AlertKind::VoltageAnomaly]);
    }

    #[test]
    fn re_raise_is_idempotent() {
        let alerts = AlertLifecycle::default();
        alerts.evaluate(1, &sample(1, 90.0, 220.0), &threshold(1));

        let evaluation = alerts.evaluate(1, &sample(1, 95.0, 220.0), &threshold(1));
        assert_eq!(evaluation.active, vec![AlertKind::HighTemp]);
        assert!(evaluation.raised.is_empty());
        assert!(evaluation.cleared.is_empty());
    }

    #[test]
    fn dimensions_are_independent() {
        let alerts = AlertLifecycle::default();
        let evaluation = alerts.evaluate(1, &sample(1, 90.0, 250.0), &threshold(1));
        assert_eq!(
            evaluation.active,
            vec![AlertKind::HighTemp, AlertKind::VoltageAnomaly]
        );

        let evaluation = alerts.evaluate(1, &sample(1, 90.0, 220.0), &threshold(1));
        assert_eq!(evaluation.active, vec![AlertKind::HighTemp]);
        assert_eq!(evaluation.cleared, vec![AlertKind::VoltageAnomaly]);
        assert!(alerts.is_any_active(1));
    }

    #[test]
    fn active_alerts_aggregates_across_motors() {
        let alerts = AlertLifecycle::default();
        alerts.evaluate(1, &sample(1, 90.0, 220.0), &threshold(1));
        alerts.evaluate(2, &sample(2, 70.0, 220.0), &threshold(2));
        alerts.evaluate(3, &sample(3, 70.0, 190.0), &threshold(3));

        let active = alerts.active_alerts();
        assert_eq!(active.len(), 2);
        assert_eq!(active[&1], vec![AlertKind::HighTemp]);
        assert_eq!(active[&3], vec![AlertKind::VoltageAnomaly]);

        alerts.evaluate(1, &sample(1, 70.0, 220.0), &threshold(1));
        alerts.evaluate(3, &sample(3, 70.0, 220.0), &threshold(3));
        assert!(alerts.active_alerts().is_empty());
    }
}
