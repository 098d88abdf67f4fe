//! Validation Utilities
//!
//! Rule evaluation that accumulates every violation instead of stopping at
//! the first one.

use std::collections::BTreeMap;

use validator::ValidationErrors;

/// Message used by [`not_blank`] failures.
pub const ERR_NOT_BLANK: &str = "must not be blank";

/// Accumulated validation violations grouped by field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` under `field` when `ok` is false.
    pub fn assert(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add(field, message);
        }
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Fold another result into this one, keeping per-field order.
    pub fn merge(&mut self, other: ValidationResult) {
        for (field, messages) in other.fields {
            self.fields.entry(field).or_default().extend(messages);
        }
    }

    pub fn is_valid(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.is_valid()
    }

    pub fn field_errors(&self) -> &BTreeMap<String, Vec<String>> {
        &self.fields
    }

    /// Flattened `field: message` list ordered by field name.
    pub fn errors(&self) -> Vec<String> {
        self.fields
            .iter()
            .flat_map(|(field, messages)| messages.iter().map(move |m| format!("{field}: {m}")))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.fields.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.is_valid()
    }
}

impl From<ValidationErrors> for ValidationResult {
    fn from(errors: ValidationErrors) -> Self {
        let mut result = ValidationResult::new();
        for (field, errs) in errors.field_errors() {
            for e in errs.iter() {
                let message = e
                    .message
                    .clone()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                result.add(&field, message);
            }
        }
        result
    }
}

pub fn not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

pub fn min_chars(value: &str, min: usize) -> bool {
    value.chars().count() >= min
}

pub fn has_uppercase(value: &str) -> bool {
    value.chars().any(char::is_uppercase)
}

pub fn has_lowercase(value: &str) -> bool {
    value.chars().any(char::is_lowercase)
}

pub fn has_digit(value: &str) -> bool {
    value.chars().any(|c| c.is_ascii_digit())
}

/// Any visible character that is neither a letter nor a digit.
pub fn has_special(value: &str) -> bool {
    value
        .chars()
        .any(|c| !c.is_alphanumeric() && !c.is_whitespace() && !c.is_control())
}
