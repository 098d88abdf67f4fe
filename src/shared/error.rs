//! Application Error Types
//!
//! Every failure in the registration path is converted into an [`AppError`]
//! at the point where it is detected. Layers above that point may attach
//! context (origin, fields, messages) but never re-classify.

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::validation::ValidationResult;

/// Friendly message used for every internal failure.
pub const SERVER_ERROR_FRIENDLY_MESSAGE: &str = "Ops... something went wrong. Please try again later.";

/// Boxed underlying cause.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Fixed error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    BadRequest,
    NotFound,
    Unauthorized,
    Forbidden,
    Conflict,
    UnprocessableEntity,
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadRequest => "BAD_REQUEST",
            Self::NotFound => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::Conflict => "CONFLICT",
            Self::UnprocessableEntity => "UNPROCESSABLE_ENTITY",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified application error.
///
/// Carries a code, diagnostic messages, an optional field map, the origin
/// operation, a user-safe friendly message and an optional wrapped cause.
/// The cause is reachable through [`AppError::cause`] and
/// [`std::error::Error::source`] but never through the friendly message.
#[derive(Debug, thiserror::Error, Serialize)]
#[error("[{code}] {origin}: {}", .messages.join("; "))]
pub struct AppError {
    code: ErrorCode,
    messages: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    fields: BTreeMap<String, Vec<String>>,
    origin: String,
    friendly_message: String,
    #[serde(skip)]
    #[source]
    cause: Option<BoxError>,
}

impl AppError {
    /// Create an error with a code and a single diagnostic message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            messages: vec![message.into()],
            fields: BTreeMap::new(),
            origin: String::new(),
            friendly_message: String::new(),
            cause: None,
        }
    }

    /// Create an error wrapping an underlying cause. The cause text becomes
    /// the diagnostic message.
    pub fn wrap<E>(code: ErrorCode, cause: E) -> Self
    where
        E: Into<BoxError>,
    {
        let cause = cause.into();
        let mut error = Self::new(code, cause.to_string());
        error.cause = Some(cause);
        error
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    pub fn with_friendly(mut self, message: impl Into<String>) -> Self {
        self.friendly_message = message.into();
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.messages.push(message.into());
        self
    }

    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.entry(field.into()).or_default().push(value.into());
        self
    }

    pub fn with_fields(mut self, fields: BTreeMap<String, Vec<String>>) -> Self {
        for (field, values) in fields {
            self.fields.entry(field).or_default().extend(values);
        }
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn fields(&self) -> &BTreeMap<String, Vec<String>> {
        &self.fields
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn friendly_message(&self) -> &str {
        &self.friendly_message
    }

    /// Explicit access to the wrapped cause.
    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    pub fn cause_message(&self) -> Option<String> {
        self.cause.as_ref().map(|c| c.to_string())
    }

    pub fn is_conflict(&self) -> bool {
        self.code == ErrorCode::Conflict
    }

    /// Machine-readable view for structured logs, including the cause text.
    pub fn to_log_value(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or(serde_json::Value::Null);
        if let (Some(map), Some(cause)) = (value.as_object_mut(), self.cause_message()) {
            map.insert("cause".into(), serde_json::Value::String(cause));
        }
        value
    }
}

// ============================================================================
// Validation
// ============================================================================

impl AppError {
    /// Entity failed validation. Carries the full field map.
    pub fn validation(result: &ValidationResult, entity: &str) -> Self {
        Self {
            code: ErrorCode::BadRequest,
            messages: result.errors(),
            fields: result.field_errors().clone(),
            origin: format!("Invalid entity {entity}"),
            friendly_message: "Validation failed for the provided input.".into(),
            cause: None,
        }
    }

    /// Request body could not be decoded.
    pub fn malformed_body<E>(cause: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::wrap(ErrorCode::BadRequest, cause)
            .with_origin("RequestDecoder.decode")
            .with_friendly("Malformed request body.")
    }
}

// ============================================================================
// Repository
// ============================================================================

impl AppError {
    /// Pre-check found an existing account.
    pub fn email_already_exists(public_id: &str) -> Self {
        Self::new(
            ErrorCode::Conflict,
            format!("User with public ID {public_id} already exists"),
        )
        .with_origin("AccountService.ensure_email_available")
        .with_friendly("User with this email already exists.")
    }

    /// Store rejected the insert through its unique constraint.
    pub fn duplicate_email<E>(cause: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::wrap(ErrorCode::Conflict, cause)
            .with_origin("AccountRepository.create_user")
            .with_friendly("User with this email already exists.")
    }

    pub fn create_user<E>(cause: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::wrap(ErrorCode::Internal, cause)
            .with_origin("AccountRepository.create_user")
            .with_friendly(SERVER_ERROR_FRIENDLY_MESSAGE)
    }

    pub fn find_user_by_email<E>(cause: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::wrap(ErrorCode::Internal, cause)
            .with_origin("AccountRepository.find_user_by_email")
            .with_friendly(SERVER_ERROR_FRIENDLY_MESSAGE)
    }
}

// ============================================================================
// Unit of Work
// ============================================================================

impl AppError {
    pub fn transaction_already_active() -> Self {
        Self::new(
            ErrorCode::Conflict,
            "a transaction is already active for this call chain",
        )
        .with_origin("UnitOfWork.with_transaction")
        .with_friendly(SERVER_ERROR_FRIENDLY_MESSAGE)
    }

    pub fn begin_transaction<E>(cause: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::wrap(ErrorCode::Internal, cause)
            .with_origin("UnitOfWork.begin")
            .with_friendly(SERVER_ERROR_FRIENDLY_MESSAGE)
    }

    pub fn commit_failed<E>(cause: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::wrap(ErrorCode::Internal, cause)
            .with_origin("UnitOfWork.commit")
            .with_friendly(SERVER_ERROR_FRIENDLY_MESSAGE)
    }

    /// Rollback failed after `original`. Both failures are kept: the
    /// original error becomes the cause, the rollback failure is appended to
    /// the messages.
    pub fn rollback_failed<E>(original: AppError, rollback: E) -> Self
    where
        E: Into<BoxError>,
    {
        let rollback = rollback.into();
        let mut messages = original.messages.clone();
        messages.push(format!("rollback failed: {rollback}"));
        Self {
            code: ErrorCode::Internal,
            messages,
            fields: BTreeMap::new(),
            origin: "UnitOfWork.rollback".into(),
            friendly_message: SERVER_ERROR_FRIENDLY_MESSAGE.into(),
            cause: Some(Box::new(original)),
        }
    }
}

// ============================================================================
// Credentials & cancellation
// ============================================================================

impl AppError {
    pub fn hash_password<E>(cause: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::wrap(ErrorCode::Internal, cause)
            .with_origin("CredentialHasher.hash")
            .with_friendly(SERVER_ERROR_FRIENDLY_MESSAGE)
    }

    pub fn cancelled(origin: &str) -> Self {
        Self::new(ErrorCode::Internal, "operation cancelled by caller")
            .with_origin(origin)
            .with_friendly(SERVER_ERROR_FRIENDLY_MESSAGE)
    }
}
