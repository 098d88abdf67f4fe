//! Email value object.

use std::fmt;

use validator::ValidateEmail;

use crate::shared::validation::{not_blank, ValidationResult, ERR_NOT_BLANK};

pub const EMAIL_FIELD: &str = "email";
pub const ERR_INVALID_EMAIL: &str = "invalid email format";

/// Email address, trimmed and ASCII-lowercased on construction so that
/// uniqueness comparisons are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Evaluate every email rule.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.assert(not_blank(&self.0), EMAIL_FIELD, ERR_NOT_BLANK);
        result.assert(self.0.as_str().validate_email(), EMAIL_FIELD, ERR_INVALID_EMAIL);
        result
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
