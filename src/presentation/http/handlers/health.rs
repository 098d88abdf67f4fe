//! Health endpoints.
//!
//! `/health` and `/health/live` never touch the account store. `/health/ready`
//! answers 503 when the configured store cannot take a registration.

use std::time::{Duration, Instant};

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::Serialize;
use sqlx::PgPool;

use crate::startup::AppState;

static STARTED: Lazy<(Instant, DateTime<Utc>)> = Lazy::new(|| (Instant::now(), Utc::now()));

/// Store round trips slower than this report `degraded`.
const SLOW_STORE: Duration = Duration::from_millis(100);

/// Reported in place of the driver error, which stays in the logs.
const STORE_UNREACHABLE: &str = "connection failed";

/// Pin the uptime origin to process startup rather than the first request.
pub fn init_server_start() {
    Lazy::force(&STARTED);
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Readiness {
    Healthy,
    Degraded,
    Unhealthy,
}

impl Readiness {
    fn status_code(self) -> StatusCode {
        match self {
            Self::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
            Self::Healthy | Self::Degraded => StatusCode::OK,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Liveness {
    pub status: &'static str,
    pub version: &'static str,
}

/// Result of probing the account store.
#[derive(Debug, Serialize)]
pub struct StoreCheck {
    pub backend: &'static str,
    pub status: Readiness,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReadinessReport {
    pub status: Readiness,
    pub environment: String,
    pub started_at: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub store: StoreCheck,
}

pub async fn health_check() -> Json<Liveness> {
    Json(Liveness {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn liveness() -> Json<Liveness> {
    Json(Liveness {
        status: "alive",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadinessReport>) {
    let store = match &state.db {
        Some(pool) => ping_postgres(pool).await,
        None => StoreCheck {
            backend: "memory",
            status: Readiness::Healthy,
            latency_ms: None,
            error: None,
        },
    };

    let (since, started_at) = *STARTED;
    let report = ReadinessReport {
        status: store.status,
        environment: state.settings.environment.clone(),
        started_at,
        uptime_seconds: since.elapsed().as_secs(),
        store,
    };

    (report.status.status_code(), Json(report))
}

async fn ping_postgres(pool: &PgPool) -> StoreCheck {
    let start = Instant::now();
    let outcome = sqlx::query("SELECT 1").execute(pool).await;
    let elapsed = start.elapsed();

    match outcome {
        Ok(_) => StoreCheck {
            backend: "postgres",
            status: classify_latency(elapsed),
            latency_ms: Some(elapsed.as_millis()),
            error: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check could not reach postgres");
            StoreCheck {
                backend: "postgres",
                status: Readiness::Unhealthy,
                latency_ms: None,
                error: Some(STORE_UNREACHABLE.to_string()),
            }
        }
    }
}

fn classify_latency(elapsed: Duration) -> Readiness {
    if elapsed < SLOW_STORE {
        Readiness::Healthy
    } else {
        Readiness::Degraded
    }
}
