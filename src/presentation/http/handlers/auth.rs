//! Authentication Handlers

use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use uuid::Uuid;

use crate::application::dto::{RegisterAccountRequest, RegisteredAccount};
use crate::infrastructure::metrics;
use crate::presentation::http::responses::status_for;
use crate::presentation::http::routes::SIGNUP_PATH;
use crate::shared::context::CallContext;
use crate::shared::error::AppError;
use crate::startup::AppState;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Register a new account
pub async fn signup(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<RegisterAccountRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisteredAccount>), AppError> {
    let start = Instant::now();
    let ctx = request_context(&headers);

    let result = match body {
        Ok(Json(request)) => state.registration.register(&ctx, request).await,
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "Malformed signup body");
            Err(AppError::malformed_body(rejection.body_text()))
        }
    };

    let status = match &result {
        Ok(_) => StatusCode::CREATED,
        Err(e) => status_for(e.code()),
    };
    metrics::record_http_request(
        "POST",
        SIGNUP_PATH,
        status.as_u16(),
        start.elapsed().as_secs_f64(),
    );
    metrics::record_registration(match &result {
        Ok(_) => "created",
        Err(e) => e.code().as_str(),
    });

    result.map(|account| (StatusCode::CREATED, Json(account)))
}

/// Per-request context. Reuses a caller-supplied `x-request-id` when it is
/// a valid UUID.
fn request_context(headers: &HeaderMap) -> CallContext {
    let ctx = CallContext::background();
    let supplied = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value).ok());
    match supplied {
        Some(id) => ctx.with_request_id(id),
        None => ctx,
    }
}
