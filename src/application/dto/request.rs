//! Request DTOs
//!
//! Data structures for API request bodies.

use std::fmt;

use serde::Deserialize;
use validator::Validate;

use crate::domain::MASK;
use crate::shared::validation::ValidationResult;

pub const ERR_PASSWORDS_DO_NOT_MATCH: &str = "passwords do not match";

/// Registration request.
///
/// Missing fields decode as empty strings so that they are reported by the
/// entity rules together with every other violation.
#[derive(Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RegisterAccountRequest {
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub email: String,

    #[validate(length(max = 128, message = "must be at most 128 characters"))]
    pub password: String,

    pub password_confirm: Option<String>,

    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub name: String,
}

impl RegisterAccountRequest {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            password_confirm: None,
            name: name.into(),
        }
    }

    pub fn with_confirmation(mut self, confirm: impl Into<String>) -> Self {
        self.password_confirm = Some(confirm.into());
        self
    }

    /// Transport-level rules: length limits and the optional confirmation.
    pub fn validate_transport(&self) -> ValidationResult {
        let mut result = match self.validate() {
            Ok(()) => ValidationResult::new(),
            Err(errors) => ValidationResult::from(errors),
        };
        if let Some(confirm) = &self.password_confirm {
            result.assert(
                confirm == &self.password,
                "password_confirm",
                ERR_PASSWORDS_DO_NOT_MATCH,
            );
        }
        result
    }
}

impl fmt::Debug for RegisterAccountRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterAccountRequest")
            .field("email", &self.email)
            .field("password", &MASK)
            .field("password_confirm", &self.password_confirm.as_ref().map(|_| MASK))
            .field("name", &self.name)
            .finish()
    }
}
