//! Password value object.
//!
//! Holds the plaintext credential only for the duration of a registration
//! call. The buffer is wiped when the value is dropped and never shows up in
//! `Debug` output.

use std::fmt;

use zeroize::Zeroizing;

use crate::shared::validation::{
    has_digit, has_lowercase, has_special, has_uppercase, min_chars, not_blank, ValidationResult,
    ERR_NOT_BLANK,
};

pub const PASSWORD_FIELD: &str = "password";
pub const PASSWORD_MIN_LENGTH: usize = 8;

pub const ERR_PASSWORD_TOO_SHORT: &str = "must be at least 8 characters";
pub const ERR_PASSWORD_UPPERCASE: &str = "must contain at least one uppercase letter";
pub const ERR_PASSWORD_LOWERCASE: &str = "must contain at least one lowercase letter";
pub const ERR_PASSWORD_DIGIT: &str = "must contain at least one number";
pub const ERR_PASSWORD_SPECIAL: &str = "must contain at least one special character";

/// Mask used wherever a credential would otherwise be printed.
pub const MASK: &str = "********";

#[derive(Clone, Default, PartialEq, Eq)]
pub struct Password(Zeroizing<String>);

impl Password {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(Zeroizing::new(raw.into()))
    }

    /// Borrow the plaintext. Only the credential hasher should call this.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    pub fn validate(&self) -> ValidationResult {
        Self::validate_raw(self.expose())
    }

    /// Evaluate every strength rule against `raw`; nothing short-circuits.
    pub fn validate_raw(raw: &str) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.assert(not_blank(raw), PASSWORD_FIELD, ERR_NOT_BLANK);
        result.assert(min_chars(raw, PASSWORD_MIN_LENGTH), PASSWORD_FIELD, ERR_PASSWORD_TOO_SHORT);
        result.assert(has_uppercase(raw), PASSWORD_FIELD, ERR_PASSWORD_UPPERCASE);
        result.assert(has_lowercase(raw), PASSWORD_FIELD, ERR_PASSWORD_LOWERCASE);
        result.assert(has_digit(raw), PASSWORD_FIELD, ERR_PASSWORD_DIGIT);
        result.assert(has_special(raw), PASSWORD_FIELD, ERR_PASSWORD_SPECIAL);
        result
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Password").field(&MASK).finish()
    }
}
