//! Signed-in principal

use std::fmt;

use serde::{Deserialize, Serialize};

/// Role of the signed-in principal. Decides which dashboard is mounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Technician,
    Government,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Technician => "technician",
            Role::Government => "government",
            Role::Admin => "admin",
        }
    }

    /// Only administrators may edit zone priorities or run the optimizer.
    pub fn can_manage_priorities(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authenticated identity.
///
/// The serialized form is the persisted session record, so field names
/// are part of the storage layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campus: Option<String>,
}

impl Identity {
    pub fn new(
        id: impl Into<String>,
        email: impl Into<String>,
        role: Role,
        name: impl Into<String>,
        campus: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            role,
            name: name.into(),
            campus,
        }
    }
}
