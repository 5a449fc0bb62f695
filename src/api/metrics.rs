//! Prometheus exposition endpoint
//!
//! Serves every registered instrument in the Prometheus text format. The
//! endpoint is mounted without a session check; the registry holds only
//! counters, gauges, and histograms, never complaint content.

use axum::{
    Router,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use prometheus::{Encoder, TextEncoder};

use crate::metrics::REGISTRY;

/// GET /metrics
async fn export_metrics() -> Response {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();

    if let Err(error) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        tracing::error!(%error, "Metrics encoding failed");
        return (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response();
    }

    ([(header::CONTENT_TYPE, encoder.format_type())], buffer).into_response()
}

/// Create the scrape router. Generic over state so it can be merged onto
/// the application router after `with_state`.
pub fn metrics_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/metrics", get(export_metrics))
}
