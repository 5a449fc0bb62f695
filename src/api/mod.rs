//! API layer
//!
//! HTTP handlers for:
//! - Complaint submission and admin operations
//! - Real-time dashboard streaming (SSE)
//! - Metrics (Prometheus)

mod complaints;
pub mod metrics;
mod streaming;

pub use complaints::complaints_router;
pub use metrics::metrics_router;
pub use streaming::streaming_router;
