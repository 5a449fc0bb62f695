//! Streaming API endpoints
//!
//! Pushes full collection snapshots to the admin dashboard via
//! Server-Sent Events (SSE). Every committed write publishes a new
//! snapshot; the current snapshot is delivered immediately on connect.

use axum::{
    Router,
    extract::State,
    response::IntoResponse,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use futures::stream::{self, Stream};
use std::convert::Infallible;

use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::metrics::SNAPSHOTS_DELIVERED_TOTAL;
use crate::view::DashboardViewModel;

/// Create streaming router
///
/// Routes:
/// - GET /api/v1/streaming/health - Streaming health check
/// - GET /api/v1/streaming/complaints - Live complaint snapshots (admin)
pub fn streaming_router() -> Router<AppState> {
    Router::new()
        .route("/v1/streaming/health", get(streaming_health))
        .route("/v1/streaming/complaints", get(stream_complaints))
}

/// GET /api/v1/streaming/health
async fn streaming_health() -> impl IntoResponse {
    "OK"
}

/// GET /api/v1/streaming/complaints
///
/// Each event carries the complete collection as JSON, newest first;
/// the dashboard replaces its state wholesale. Dropping the connection
/// drops the subscription.
async fn stream_complaints(
    State(state): State<AppState>,
    CurrentUser(_session): CurrentUser,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let view = DashboardViewModel::new(state.store.clone());

    // First iteration emits the snapshot already held by the view; later
    // iterations wait for the store to publish a replacement.
    let stream = stream::unfold((view, true), |(mut view, initial)| async move {
        if !initial && view.changed().await.is_err() {
            return None;
        }

        let snapshot = view.snapshot();
        let event = match serde_json::to_string(&snapshot) {
            Ok(data) => {
                SNAPSHOTS_DELIVERED_TOTAL.inc();
                Event::default().event("update").data(data)
            }
            Err(error) => {
                tracing::error!(%error, "Failed to serialize complaint snapshot");
                Event::default()
                    .event("error")
                    .data("{\"error\":\"snapshot serialization failed\"}")
            }
        };

        Some((Ok(event), (view, false)))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
