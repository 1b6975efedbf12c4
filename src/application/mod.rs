pub mod assistant;
pub mod dashboard;
pub mod identity;
pub mod session;
pub mod telemetry;

// Re-export key types for convenience
pub use assistant::{Assistant, ChatMessage, LoadOptimizer, Speaker};
pub use dashboard::{Dashboard, DashboardKind, OutputSource};
pub use identity::{role_for_email, MockEmailRoleResolver, RoleResolver};
pub use session::{SessionState, SessionStore, DEFAULT_SESSION_KEY};
pub use telemetry::{SimulatorHandle, TelemetrySimulator};
