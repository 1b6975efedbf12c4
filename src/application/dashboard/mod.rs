//! Dashboard views per role

pub mod view;

pub use view::{Dashboard, DashboardKind, OutputSource};
