//! Prometheus metrics.
//!
//! Every collector lives in [`REGISTRY`] under the `identity_service`
//! namespace and is exposed as text on `GET /metrics`.

use once_cell::sync::Lazy;
use prometheus::core::Collector;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, Result, TextEncoder,
};

const NAMESPACE: &str = "identity_service";

const LATENCY_BUCKETS: &[f64] = &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0];

pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    let collectors: [Box<dyn Collector>; 5] = [
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()),
        Box::new(DB_QUERY_DURATION_SECONDS.clone()),
        Box::new(TRANSACTIONS_TOTAL.clone()),
        Box::new(REGISTRATIONS_TOTAL.clone()),
    ];
    for collector in collectors {
        if let Err(e) = registry.register(collector) {
            tracing::error!(error = %e, "Metric registration rejected");
        }
    }
    registry
});

/// Requests by method, route and status code.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    counter(
        "http_requests_total",
        "HTTP requests handled",
        &["method", "path", "status"],
    )
    .expect("Failed to create HTTP_REQUESTS_TOTAL metric")
});

pub static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    histogram(
        "http_request_duration_seconds",
        "HTTP request latency in seconds",
        &["method", "path"],
    )
    .expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric")
});

/// Statement and transaction-control latency by operation and table.
pub static DB_QUERY_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    histogram(
        "db_query_duration_seconds",
        "Account store statement latency in seconds",
        &["operation", "table"],
    )
    .expect("Failed to create DB_QUERY_DURATION_SECONDS metric")
});

/// `committed`, `rolled_back`, `commit_failed` or `rollback_failed`.
pub static TRANSACTIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    counter(
        "transactions_total",
        "Finished transactions by outcome",
        &["outcome"],
    )
    .expect("Failed to create TRANSACTIONS_TOTAL metric")
});

/// `created` or the error code that ended the registration.
pub static REGISTRATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    counter(
        "registrations_total",
        "Account registrations by outcome",
        &["outcome"],
    )
    .expect("Failed to create REGISTRATIONS_TOTAL metric")
});

fn counter(name: &str, help: &str, labels: &[&str]) -> Result<IntCounterVec> {
    IntCounterVec::new(Opts::new(name, help).namespace(NAMESPACE), labels)
}

fn histogram(name: &str, help: &str, labels: &[&str]) -> Result<HistogramVec> {
    let opts = HistogramOpts::new(name, help)
        .namespace(NAMESPACE)
        .buckets(LATENCY_BUCKETS.to_vec());
    HistogramVec::new(opts, labels)
}

/// Encode the registry in the Prometheus text format.
pub fn gather_metrics() -> String {
    let mut buffer = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let status = status.to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, status.as_str()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration_secs);
}

pub fn record_db_query(operation: &str, table: &str, duration_secs: f64) {
    DB_QUERY_DURATION_SECONDS
        .with_label_values(&[operation, table])
        .observe(duration_secs);
}

pub fn record_transaction(outcome: &str) {
    TRANSACTIONS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_registration(outcome: &str) {
    REGISTRATIONS_TOTAL.with_label_values(&[outcome]).inc();
}
