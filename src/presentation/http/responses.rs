//! Error Responses
//!
//! Translates classified errors into HTTP responses. This is the only place
//! that knows about status codes.

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::shared::error::{AppError, ErrorCode};

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, Vec<String>>>,
}

/// Map a classification code to an HTTP status.
pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::UnprocessableEntity => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<&AppError> for ErrorResponse {
    fn from(error: &AppError) -> Self {
        let fields = match error.code() {
            ErrorCode::Internal => None,
            _ if error.fields().is_empty() => None,
            _ => Some(error.fields().clone()),
        };
        Self {
            code: error.code(),
            message: error.friendly_message().to_owned(),
            fields,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = status_for(self.code());
        if status.is_server_error() {
            tracing::error!(error = %self.to_log_value(), "Request failed");
        } else {
            tracing::debug!(error = %self.to_log_value(), "Request rejected");
        }

        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}
