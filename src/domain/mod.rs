//! Domain layer: campus energy entities and errors

pub mod alert;
pub mod campus;
pub mod error;
pub mod identity;
pub mod points;
pub mod priority;
pub mod settings;
pub mod telemetry;

// Re-export commonly used types
pub use alert::{Alert, AlertFeed, AlertLevel};
pub use campus::{Campus, Kpi, Region, RegionMix};
pub use error::{DomainError, DomainResult};
pub use identity::{Identity, Role};
pub use points::{points_for_renewable_kwh, Leaderboard, UserPoints};
pub use priority::{PriorityBoard, PriorityRequest, PriorityUpdate, SourcePreference, Zone};
pub use settings::{
    AlertSettings, LoadPreferences, Profile, ReportFrequency, ReportSettings, Settings, SettingsUpdate,
};
pub use telemetry::{BatteryState, Jitter, TelemetrySnapshot};
