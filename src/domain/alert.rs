//! Dashboard alerts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    #[serde(rename = "type")]
    pub level: AlertLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
}

impl Alert {
    pub fn new(level: AlertLevel, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            level,
            message: message.into(),
            timestamp: Utc::now(),
            read: false,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(AlertLevel::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(AlertLevel::Warning, message)
    }
}

/// Ordered list of alerts shown on one dashboard
#[derive(Debug, Clone, Default)]
pub struct AlertFeed {
    alerts: Vec<Alert>,
}

impl AlertFeed {
    pub fn new(alerts: Vec<Alert>) -> Self {
        Self { alerts }
    }

    pub fn technician_seed() -> Self {
        Self::new(vec![
            Alert::warning("Battery 90% full → discharge recommended"),
            Alert::info("Shift HVAC to 2 PM → solar surplus expected"),
        ])
    }

    pub fn admin_seed() -> Self {
        Self::new(vec![
            Alert::warning("High demand in North Campus - optimize load"),
            Alert::info("ML model ready for deployment"),
        ])
    }

    pub fn push(&mut self, alert: Alert) {
        self.alerts.push(alert);
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn unread_count(&self) -> usize {
        self.alerts.iter().filter(|a| !a.read).count()
    }

    /// Returns false when no alert has this id.
    pub fn mark_read(&mut self, id: &str) -> bool {
        match self.alerts.iter_mut().find(|a| a.id == id) {
            Some(alert) => {
                alert.read = true;
                true
            }
            None => false,
        }
    }

    pub fn mark_all_read(&mut self) {
        for alert in &mut self.alerts {
            alert.read = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unread_count_tracks_reads() {
        let mut feed = AlertFeed::technician_seed();
        assert_eq!(feed.unread_count(), 2);

        let id = feed.alerts()[0].id.clone();
        assert!(feed.mark_read(&id));
        assert_eq!(feed.unread_count(), 1);

        feed.push(Alert::new(AlertLevel::Critical, "Inverter offline"));
        assert_eq!(feed.unread_count(), 2);

        feed.mark_all_read();
        assert_eq!(feed.unread_count(), 0);
    }

    #[test]
    fn mark_read_unknown_id() {
        let mut feed = AlertFeed::admin_seed();
        assert!(!feed.mark_read("missing"));
        assert_eq!(feed.unread_count(), 2);
    }

    #[test]
    fn alert_level_serializes_as_type() {
        let json = serde_json::to_value(Alert::warning("x")).unwrap();
        assert_eq!(json["type"], "warning");
        assert_eq!(json["read"], false);
    }
}
