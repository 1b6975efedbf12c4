//! Sign-in form
//!
//! The session store accepts any email/password pair; the required-field
//! and email-format checks live here, at the boundary.

use serde::Deserialize;
use validator::Validate;

use crate::application::SessionStore;
use crate::domain::{DomainError, DomainResult, Identity};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginForm {
    #[validate(
        length(min = 1, message = "email is required"),
        email(message = "invalid email format")
    )]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into().trim().to_string(),
            password: password.into(),
        }
    }

    /// Validate, then sign in through `store`.
    pub async fn submit(&self, store: &SessionStore) -> DomainResult<Identity> {
        self.validate().map_err(|e| DomainError::Validation(describe(&e)))?;
        store.login(&self.email, &self.password).await
    }
}

/// Flatten field errors into `field: message; field: message`, sorted by field.
pub fn describe(errors: &validator::ValidationErrors) -> String {
    let mut field_errors: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let msg = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                format!("{}: {}", field, msg)
            })
        })
        .collect();
    field_errors.sort();

    if field_errors.is_empty() {
        "Validation failed".to_string()
    } else {
        field_errors.join("; ")
    }
}
