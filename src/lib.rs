//! # EnergyFlow
//!
//! Core of a campus renewable-energy dashboard: who is signed in, and a
//! simulated live feed of solar, wind, battery and load readings.
//!
//! ## Architecture
//!
//! - **domain**: Identities, telemetry snapshots, alerts, zone priorities,
//!   points and campus KPIs
//! - **application**: Session store, telemetry simulator, role-gated
//!   dashboards and the assistant panels
//! - **infrastructure**: Session storage backends (memory, JSON file)
//! - **interfaces**: Sign-in form validation and CSV report export
//! - **notifications**: In-process event bus for dashboard updates
//! - **host**: Long-running dashboard host (tracing, storage, shutdown)

pub mod application;
pub mod config;
pub mod domain;
pub mod host;
pub mod infrastructure;
pub mod interfaces;
pub mod notifications;
pub mod shared;

pub use config::{config_path_from_env, default_config_path, AppConfig};

pub use application::{Dashboard, DashboardKind, SessionState, SessionStore, TelemetrySimulator};
pub use domain::{DomainError, DomainResult, Identity, Role, TelemetrySnapshot};

// Re-export notifications
pub use notifications::{create_event_bus, Event, EventBus, SharedEventBus};
