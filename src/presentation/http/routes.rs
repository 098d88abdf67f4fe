//! Router for the public API and the operational endpoints.

use axum::http::header::CONTENT_TYPE;
use axum::routing::{get, post};
use axum::Router;

use super::handlers::{auth, health};
use crate::infrastructure::metrics;
use crate::startup::AppState;

pub const SIGNUP_PATH: &str = "/api/v1/auth/signup";

const PROMETHEUS_TEXT: &str = "text/plain; version=0.0.4; charset=utf-8";

pub fn create_router(state: AppState) -> Router {
    let operational = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/metrics", get(prometheus_text));

    Router::new()
        .route(SIGNUP_PATH, post(auth::signup))
        .merge(operational)
        .with_state(state)
}

async fn prometheus_text() -> ([(axum::http::HeaderName, &'static str); 1], String) {
    ([(CONTENT_TYPE, PROMETHEUS_TEXT)], metrics::gather_metrics())
}
