//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{
    Counter, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("cityfix_http_requests_total", "Total number of HTTP requests"),
        &["method", "endpoint", "status"]
    ).expect("metric can be created");
    pub static ref HTTP_REQUEST_DURATION_SECONDS: prometheus::HistogramVec = prometheus::HistogramVec::new(
        HistogramOpts::new(
            "cityfix_http_request_duration_seconds",
            "HTTP request duration in seconds"
        ).buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["method", "endpoint"]
    ).expect("metric can be created");

    // Complaint Metrics
    pub static ref COMPLAINTS_SUBMITTED_TOTAL: IntCounter = IntCounter::new(
        "cityfix_complaints_submitted_total",
        "Total number of complaints submitted"
    ).expect("metric can be created");
    pub static ref COMPLAINTS_RESOLVED_TOTAL: IntCounter = IntCounter::new(
        "cityfix_complaints_resolved_total",
        "Total number of complaints resolved by an operator"
    ).expect("metric can be created");
    pub static ref COMPLAINTS_PENDING: IntGauge = IntGauge::new(
        "cityfix_complaints_pending",
        "Current number of pending complaints"
    ).expect("metric can be created");

    // Storage Metrics
    pub static ref IMAGES_UPLOADED_TOTAL: IntCounter = IntCounter::new(
        "cityfix_images_uploaded_total",
        "Total number of complaint photos uploaded"
    ).expect("metric can be created");
    pub static ref IMAGE_BYTES_UPLOADED: Counter = Counter::new(
        "cityfix_image_bytes_uploaded_total",
        "Total bytes of normalized photos uploaded"
    ).expect("metric can be created");

    // Streaming Metrics
    pub static ref SNAPSHOTS_DELIVERED_TOTAL: IntCounter = IntCounter::new(
        "cityfix_snapshots_delivered_total",
        "Total number of collection snapshots delivered to dashboard subscribers"
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("cityfix_errors_total", "Total number of errors"),
        &["error_type", "endpoint"]
    ).expect("metric can be created");
}

/// Initialize metrics registry.
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .expect("HTTP_REQUESTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))
        .expect("HTTP_REQUEST_DURATION_SECONDS can be registered");
    REGISTRY
        .register(Box::new(COMPLAINTS_SUBMITTED_TOTAL.clone()))
        .expect("COMPLAINTS_SUBMITTED_TOTAL can be registered");
    REGISTRY
        .register(Box::new(COMPLAINTS_RESOLVED_TOTAL.clone()))
        .expect("COMPLAINTS_RESOLVED_TOTAL can be registered");
    REGISTRY
        .register(Box::new(COMPLAINTS_PENDING.clone()))
        .expect("COMPLAINTS_PENDING can be registered");
    REGISTRY
        .register(Box::new(IMAGES_UPLOADED_TOTAL.clone()))
        .expect("IMAGES_UPLOADED_TOTAL can be registered");
    REGISTRY
        .register(Box::new(IMAGE_BYTES_UPLOADED.clone()))
        .expect("IMAGE_BYTES_UPLOADED can be registered");
    REGISTRY
        .register(Box::new(SNAPSHOTS_DELIVERED_TOTAL.clone()))
        .expect("SNAPSHOTS_DELIVERED_TOTAL can be registered");
    REGISTRY
        .register(Box::new(ERRORS_TOTAL.clone()))
        .expect("ERRORS_TOTAL can be registered");

    tracing::info!("Metrics registry initialized");
}
