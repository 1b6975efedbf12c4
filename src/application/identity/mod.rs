//! Identity module: resolving a sign-in into an [`Identity`]
//!
//! [`Identity`]: crate::domain::Identity

pub mod resolver;

pub use resolver::{role_for_email, MockEmailRoleResolver, RoleResolver};
