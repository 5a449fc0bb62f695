//! Complaint endpoints
//!
//! Public submission plus the admin dashboard operations.

use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};

use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::metrics::{
    COMPLAINTS_PENDING, COMPLAINTS_RESOLVED_TOTAL, COMPLAINTS_SUBMITTED_TOTAL,
    HTTP_REQUEST_DURATION_SECONDS, HTTP_REQUESTS_TOTAL,
};
use crate::model::ComplaintRecord;
use crate::receipt;
use crate::view::{DashboardStats, DashboardViewModel, MapPin};
use crate::workflow::{SubmissionRequest, SubmissionService};

const MAX_IMAGE_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Whole-request cap for the multipart submission body. Must exceed the
/// per-image cap times a plausible photo count, or the framework's
/// default 2 MB body limit rejects ordinary phone photos before the
/// handler ever sees them.
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Create complaint router
///
/// Routes:
/// - POST /api/v1/complaints - Public submission (multipart)
/// - GET /api/v1/complaints - List all complaints (admin)
/// - GET /api/v1/complaints/stats - Dashboard counters (admin)
/// - GET /api/v1/complaints/map - Map markers (admin)
/// - POST /api/v1/complaints/:id/resolve - Mark resolved (admin)
/// - GET /api/v1/complaints/:id/receipt - Plain-text receipt (by CF- id)
pub fn complaints_router() -> Router<AppState> {
    Router::new()
        .route("/v1/complaints", post(submit_complaint).get(list_complaints))
        .route("/v1/complaints/stats", get(complaint_stats))
        .route("/v1/complaints/map", get(complaint_map))
        .route("/v1/complaints/:id/resolve", post(resolve_complaint))
        .route("/v1/complaints/:id/receipt", get(download_receipt))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
}

/// POST /api/v1/complaints
///
/// Accepts a multipart form with the identity fields, the captured
/// location, and zero or more photos under repeated `image` parts.
async fn submit_complaint(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["POST", "/api/v1/complaints"])
        .start_timer();

    let mut request = SubmissionRequest::default();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to parse multipart: {}", e)))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "name" => request.name = read_text(field, "name").await?,
            "phone" => request.phone = read_text(field, "phone").await?,
            "aadhar" => request.aadhar = read_text(field, "aadhar").await?,
            "description" => request.description = read_text(field, "description").await?,
            "lat" => request.lat = Some(read_coordinate(field, "lat").await?),
            "lng" => request.lng = Some(read_coordinate(field, "lng").await?),
            "image" => {
                let mut bytes = Vec::new();
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read image: {}", e)))?
                {
                    if bytes.len() + chunk.len() > MAX_IMAGE_UPLOAD_BYTES {
                        return Err(AppError::Validation(format!(
                            "Image too large: exceeds {} bytes",
                            MAX_IMAGE_UPLOAD_BYTES
                        )));
                    }
                    bytes.extend_from_slice(&chunk);
                }
                request.images.push(bytes);
            }
            _ => {}
        }
    }

    let service = SubmissionService::new(state.store.clone(), state.objects.clone());
    let outcome = service.submit(request).await?;

    COMPLAINTS_SUBMITTED_TOTAL.inc();
    COMPLAINTS_PENDING.inc();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&["POST", "/api/v1/complaints", "201"])
        .inc();

    Ok((StatusCode::CREATED, Json(outcome.record)))
}

async fn read_text(field: axum::extract::multipart::Field<'_>, name: &str) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read {}: {}", name, e)))
}

async fn read_coordinate(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<f64, AppError> {
    read_text(field, name)
        .await?
        .trim()
        .parse::<f64>()
        .map_err(|_| AppError::Validation(format!("{} must be a valid float", name)))
}

/// GET /api/v1/complaints
///
/// Full collection, newest first. Admin only.
async fn list_complaints(
    State(state): State<AppState>,
    CurrentUser(_session): CurrentUser,
) -> Result<Json<Vec<ComplaintRecord>>, AppError> {
    let records = state.store.list().await?;
    Ok(Json(records))
}

/// GET /api/v1/complaints/stats
async fn complaint_stats(
    State(state): State<AppState>,
    CurrentUser(_session): CurrentUser,
) -> Result<Json<DashboardStats>, AppError> {
    let view = DashboardViewModel::new(state.store.clone());
    let stats = view.stats();
    COMPLAINTS_PENDING.set(stats.pending as i64);
    Ok(Json(stats))
}

/// GET /api/v1/complaints/map
///
/// Markers for the dashboard map: red while pending, green once resolved.
async fn complaint_map(
    State(state): State<AppState>,
    CurrentUser(_session): CurrentUser,
) -> Result<Json<Vec<MapPin>>, AppError> {
    let view = DashboardViewModel::new(state.store.clone());
    Ok(Json(view.map_pins()))
}

/// POST /api/v1/complaints/:id/resolve
///
/// One-directional: a resolved complaint stays resolved. Admin only.
async fn resolve_complaint(
    State(state): State<AppState>,
    CurrentUser(_session): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ComplaintRecord>, AppError> {
    let view = DashboardViewModel::new(state.store.clone());

    // Counters track transitions, not requests; an idempotent repeat
    // changes nothing.
    if view.resolve(&id).await? {
        COMPLAINTS_RESOLVED_TOTAL.inc();
    }
    COMPLAINTS_PENDING.set(view.stats().pending as i64);

    let record = view
        .snapshot()
        .into_iter()
        .find(|r| r.id == id)
        .ok_or(AppError::NotFound)?;
    tracing::info!(id = %id, complaint_id = %record.complaint_id, "Complaint resolved");
    Ok(Json(record))
}

/// GET /api/v1/complaints/:id/receipt
///
/// Plain-text receipt for a submitted complaint, keyed by the public
/// complaint id so the citizen can fetch it from the confirmation screen.
async fn download_receipt(
    State(state): State<AppState>,
    Path(complaint_id): Path<String>,
) -> Result<Response, AppError> {
    let record = state
        .store
        .get_by_complaint_id(&complaint_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let body = receipt::render(&record);
    let disposition = format!(
        "attachment; filename=\"{}\"",
        receipt::file_name(&record.complaint_id)
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
