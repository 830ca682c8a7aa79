//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{Counter, IntCounterVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("podshare_http_requests_total", "Total number of HTTP requests"),
        &["method", "endpoint", "status"]
    ).expect("metric can be created");

    // Upload Metrics
    pub static ref UPLOADS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("podshare_uploads_total", "Total number of stored audio uploads"),
        &["storage"]
    ).expect("metric can be created");
    pub static ref UPLOAD_BYTES_TOTAL: Counter = Counter::new(
        "podshare_upload_bytes_total",
        "Total bytes of audio uploaded"
    ).expect("metric can be created");

    // Store Metrics
    pub static ref STORE_OPERATIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("podshare_store_operations_total", "Metadata store operations by outcome"),
        &["operation", "store", "outcome"]
    ).expect("metric can be created");

    // Background Metrics
    pub static ref SIDE_EFFECTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("podshare_side_effects_total", "Fire-and-forget tasks by outcome"),
        &["task", "outcome"]
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("podshare_errors_total", "Total number of errors returned to clients"),
        &["error_type"]
    ).expect("metric can be created");
}

/// Record the outcome of a metadata store call.
pub fn observe_store(operation: &str, store: &str, outcome: &str) {
    STORE_OPERATIONS_TOTAL
        .with_label_values(&[operation, store, outcome])
        .inc();
}

/// Initialize metrics registry.
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .expect("HTTP_REQUESTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(UPLOADS_TOTAL.clone()))
        .expect("UPLOADS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(UPLOAD_BYTES_TOTAL.clone()))
        .expect("UPLOAD_BYTES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(STORE_OPERATIONS_TOTAL.clone()))
        .expect("STORE_OPERATIONS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(SIDE_EFFECTS_TOTAL.clone()))
        .expect("SIDE_EFFECTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(ERRORS_TOTAL.clone()))
        .expect("ERRORS_TOTAL can be registered");

    tracing::info!("Metrics registry initialized");
}
