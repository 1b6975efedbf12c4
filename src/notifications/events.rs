//! Notification events
//!
//! Defines all event types broadcast to dashboard subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Alert, PriorityRequest, Role, Settings, TelemetrySnapshot};

/// Event types for notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    /// An identity signed in
    SessionStarted(SessionEvent),
    /// The active identity signed out
    SessionEnded(SessionEvent),
    /// A simulator tick produced a new snapshot
    TelemetryUpdated(TelemetryEvent),
    /// A simulator was stopped
    SimulatorStopped(SimulatorStoppedEvent),
    /// An alert was added to a dashboard feed
    AlertRaised(AlertEvent),
    /// A zone priority was edited
    PriorityUpdated(PriorityEvent),
    /// The assistant appended a reply
    AssistantReplied(AssistantEvent),
    /// A user saved their settings
    SettingsSaved(SettingsEvent),
}

impl Event {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::SessionStarted(_) => "session_started",
            Event::SessionEnded(_) => "session_ended",
            Event::TelemetryUpdated(_) => "telemetry_updated",
            Event::SimulatorStopped(_) => "simulator_stopped",
            Event::AlertRaised(_) => "alert_raised",
            Event::PriorityUpdated(_) => "priority_updated",
            Event::AssistantReplied(_) => "assistant_replied",
            Event::SettingsSaved(_) => "settings_saved",
        }
    }

    /// Get the dashboard ID if applicable
    pub fn dashboard_id(&self) -> Option<&str> {
        match self {
            Event::SessionStarted(_) | Event::SessionEnded(_) => None,
            Event::TelemetryUpdated(e) => Some(&e.dashboard_id),
            Event::SimulatorStopped(e) => Some(&e.dashboard_id),
            Event::AlertRaised(e) => Some(&e.dashboard_id),
            Event::PriorityUpdated(e) => Some(&e.dashboard_id),
            Event::AssistantReplied(e) => Some(&e.dashboard_id),
            Event::SettingsSaved(e) => Some(&e.dashboard_id),
        }
    }
}

/// Session started / ended event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    pub identity_id: String,
    pub email: String,
    pub role: Role,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub dashboard_id: String,
    pub tick: u64,
    pub snapshot: TelemetrySnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorStoppedEvent {
    pub dashboard_id: String,
    pub ticks: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
    pub dashboard_id: String,
    pub alert: Alert,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorityEvent {
    pub dashboard_id: String,
    pub updated_by: String,
    pub request: PriorityRequest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantEvent {
    pub dashboard_id: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsEvent {
    pub dashboard_id: String,
    pub user_id: String,
    pub settings: Settings,
}

/// Wrapper for sending events with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: Event,
}

impl EventMessage {
    pub fn new(event: Event) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event,
        }
    }
}
