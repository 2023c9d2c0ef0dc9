use std::collections::BTreeMap;

use crate::services::alerts::AlertKind;

/// The single standing alert notification surfaced to the display layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveNotification {
    pub motor_id: i32,
    pub kinds: Vec<AlertKind>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationChange {
    Opened(ActiveNotification),
    Closed,
}

/// Owns the standing-notification state. At most one notification is open at
/// a time; it closes only once no motor has any active alert, not when the
/// motor that opened it recovers.
#[derive(Debug, Default)]
pub struct NotificationController {
    current: Option<ActiveNotification>,
}

impl NotificationController {
    pub fn sync(&mut self, active: &BTreeMap<i32, Vec<AlertKind>>) -> Option<NotificationChange> {
        if active.is_empty() {
            return self.current.take().map(|_| NotificationChange::Closed);
        }
        if self.current.is_some() {
            return None;
        }
        let (motor_id, kinds) = active.iter().next()?;
        let notification = ActiveNotification {
            motor_id: *motor_id,
            kinds: kinds.clone(),
        };
        self.current = Some(notification.clone());
        Some(NotificationChange::Opened(notification))
    }

    pub fn current(&self) -> Option<&ActiveNotification> {
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active(entries: &[(i32, &[AlertKind])]) -> BTreeMap<i32, Vec<AlertKind>> {
        entries
            .iter()
            .map(|(motor_id, kinds)| (*motor_id, kinds.to_vec()))
            .collect()
    }

    #[test]
    fn opens_for_first_alerting_motor() {
        let mut controller = NotificationController::default();
        let change = controller.sync(&active(&[(2, &[AlertKind::HighTemp])]));

        assert_eq!(
            change,
            Some(NotificationChange::Opened(ActiveNotification {
                motor_id: 2,
                kinds: vec![AlertKind::HighTemp],
            }))
        );
        assert!(controller.current().is_some());
    }

    #[test]
    fn keeps_single_notification_while_any_motor_alerts() {
        let mut controller = NotificationController::default();
        controller.sync(&active(&[(2, &[AlertKind::HighTemp])]));

        // A second motor alerting does not open another notification.
        assert_eq!(
            controller.sync(&active(&[
                (1, &[AlertKind::VoltageAnomaly]),
                (2, &[AlertKind::HighTemp]),
            ])),
            None
        );

        // The opening motor recovering is not enough to close it.
        assert_eq!(
            controller.sync(&active(&[(1, &[AlertKind::VoltageAnomaly])])),
            None
        );
        assert!(controller.current().is_some());
    }

    #[test]
    fn closes_only_on_global_quiet() {
        let mut controller = NotificationController::default();
        controller.sync(&active(&[(2, &[AlertKind::HighTemp])]));

        assert_eq!(
            controller.sync(&BTreeMap::new()),
            Some(NotificationChange::Closed)
        );
        assert!(controller.current().is_none());
        assert_eq!(controller.sync(&BTreeMap::new()), None);
    }
}
