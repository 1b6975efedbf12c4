//! Role resolution for sign-in
//!
//! There is no account database. The only resolver shipped is a demo
//! stand-in that infers the role from the email address; it must not be
//! treated as an authorization rule.

use crate::domain::{Identity, Role};

/// Maps a submitted email to the identity that signs in.
pub trait RoleResolver: Send + Sync {
    fn resolve(&self, email: &str) -> Identity;
}

/// Demo-only resolver: role by case-sensitive substring match on the email.
///
/// - contains `admin` → admin
/// - contains `tech` or `facility` → technician
/// - anything else → government
///
/// Each role maps to a fixed demo profile; only the email is taken from input.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockEmailRoleResolver;

impl RoleResolver for MockEmailRoleResolver {
    fn resolve(&self, email: &str) -> Identity {
        match role_for_email(email) {
            Role::Admin => Identity::new("3", email, Role::Admin, "Admin User", Some("System Admin".into())),
            Role::Technician => {
                Identity::new("1", email, Role::Technician, "John Smith", Some("Main Campus".into()))
            }
            Role::Government => Identity::new("2", email, Role::Government, "Sarah Johnson", None),
        }
    }
}

/// The substring rule on its own. `admin` wins over `tech`/`facility`.
pub fn role_for_email(email: &str) -> Role {
    if email.contains("admin") {
        Role::Admin
    } else if email.contains("tech") || email.contains("facility") {
        Role::Technician
    } else {
        Role::Government
    }
}
