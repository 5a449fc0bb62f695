//! Submission workflow
//!
//! Orchestrates a full report submission as an ordered, fail-stop sequence:
//! location precondition, concurrent photo normalization + upload, then
//! record insertion. Photos for one submission are processed concurrently
//! and joined by collecting every outcome before acting; on failure the
//! already-uploaded siblings are explicitly deleted, never left orphaned,
//! and no record is written. There is no automatic retry.

use std::sync::Arc;
use std::time::Duration;

use crate::error::AppError;
use crate::imaging::{self, NormalizedImage};
use crate::metrics::{IMAGE_BYTES_UPLOADED, IMAGES_UPLOADED_TOTAL};
use crate::model::{self, ComplaintRecord};
use crate::store::{ComplaintStore, NewComplaint, ObjectStore};

/// Per-photo upload deadline.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// A submission draft as received from the public form.
///
/// `images` holds raw encoded photos in capture/selection order; the
/// location is absent until the citizen explicitly captures it.
#[derive(Debug, Default)]
pub struct SubmissionRequest {
    pub name: String,
    pub phone: String,
    pub aadhar: String,
    pub description: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub images: Vec<Vec<u8>>,
}

/// Result of a successful submission, handed back for the confirmation
/// screen and receipt generation.
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub complaint_id: String,
    pub record: ComplaintRecord,
}

/// Submission orchestration service
pub struct SubmissionService {
    store: Arc<ComplaintStore>,
    objects: Arc<dyn ObjectStore>,
}

impl SubmissionService {
    /// Create new submission service
    pub fn new(store: Arc<ComplaintStore>, objects: Arc<dyn ObjectStore>) -> Self {
        Self { store, objects }
    }

    /// Submit a complaint.
    ///
    /// # Steps
    /// 1. Reject locally if the location is missing (no network call made)
    /// 2. Generate the complaint id (exactly once; it keys storage paths,
    ///    the record, and the receipt)
    /// 3. Normalize and upload every photo concurrently, join on all
    ///    outcomes, discard uploads on first failure
    /// 4. Insert the record with status `Pending`
    ///
    /// # Errors
    /// Any phase failure is terminal for this attempt: the error is
    /// returned, uploaded photos are deleted, and no record is committed.
    pub async fn submit(&self, request: SubmissionRequest) -> Result<SubmissionOutcome, AppError> {
        let (Some(lat), Some(lng)) = (request.lat, request.lng) else {
            return Err(AppError::Validation(
                "Please verify your location first".to_string(),
            ));
        };

        let complaint_id = model::generate_complaint_id();
        tracing::info!(
            complaint_id = %complaint_id,
            images = request.images.len(),
            "Starting submission"
        );

        let uploaded = self.upload_images(&complaint_id, request.images).await?;
        let (keys, urls): (Vec<String>, Vec<String>) = uploaded.into_iter().unzip();

        let new = NewComplaint {
            complaint_id: complaint_id.clone(),
            name: request.name,
            phone: model::sanitize_phone(&request.phone),
            aadhar: model::format_aadhar(&request.aadhar),
            description: request.description,
            lat,
            lng,
            images: urls,
        };

        let record = match self.store.insert(new).await {
            Ok(record) => record,
            Err(error) => {
                // Record insert failed after the photos were stored; delete
                // them so the object store holds no orphans.
                self.delete_keys(&keys).await;
                return Err(error);
            }
        };

        tracing::info!(
            complaint_id = %complaint_id,
            id = %record.id,
            "Submission persisted"
        );

        Ok(SubmissionOutcome {
            complaint_id,
            record,
        })
    }

    /// Normalize and upload photos concurrently.
    ///
    /// All outcomes are collected before acting (join barrier); the first
    /// failure wins and successfully uploaded siblings are deleted. The
    /// returned (key, url) pairs preserve capture order.
    async fn upload_images(
        &self,
        complaint_id: &str,
        images: Vec<Vec<u8>>,
    ) -> Result<Vec<(String, String)>, AppError> {
        let mut tasks = Vec::with_capacity(images.len());
        for (index, raw) in images.into_iter().enumerate() {
            let objects = Arc::clone(&self.objects);
            let key = image_key(complaint_id, index);

            tasks.push(tokio::spawn(async move {
                let normalized = tokio::task::spawn_blocking(move || imaging::normalize(&raw))
                    .await
                    .map_err(|e| {
                        AppError::Internal(anyhow::anyhow!("normalization task failed: {}", e))
                    })??;

                let byte_len = normalized.data.len();
                let url = tokio::time::timeout(
                    UPLOAD_TIMEOUT,
                    objects.upload(&key, normalized.data, NormalizedImage::CONTENT_TYPE),
                )
                .await
                .map_err(|_| AppError::Upload(format!("upload of {} timed out", key)))??;

                Ok::<(String, String, usize), AppError>((key, url, byte_len))
            }));
        }

        let outcomes = futures::future::join_all(tasks).await;

        let mut uploaded = Vec::new();
        let mut first_error = None;

        for outcome in outcomes {
            match outcome {
                Ok(Ok((key, url, byte_len))) => {
                    IMAGES_UPLOADED_TOTAL.inc();
                    IMAGE_BYTES_UPLOADED.inc_by(byte_len as f64);
                    uploaded.push((key, url));
                }
                Ok(Err(error)) => {
                    first_error.get_or_insert(error);
                }
                Err(join_error) => {
                    first_error.get_or_insert(AppError::Internal(anyhow::anyhow!(
                        "upload task panicked: {}",
                        join_error
                    )));
                }
            }
        }

        if let Some(error) = first_error {
            let keys: Vec<String> = uploaded.into_iter().map(|(key, _)| key).collect();
            tracing::warn!(
                complaint_id = %complaint_id,
                uploaded = keys.len(),
                error = %error,
                "Submission upload phase failed; discarding sibling uploads"
            );
            self.delete_keys(&keys).await;
            return Err(error);
        }

        Ok(uploaded)
    }

    /// Best-effort orphan cleanup; failures are logged, not surfaced.
    async fn delete_keys(&self, keys: &[String]) {
        for key in keys {
            if let Err(error) = self.objects.delete(key).await {
                tracing::warn!(key = %key, error = %error, "Failed to delete uploaded photo");
            }
        }
    }
}

/// Storage path for one photo, namespaced by complaint id and index.
fn image_key(complaint_id: &str, index: usize) -> String {
    format!("public_reports/{}/img_{}.jpg", complaint_id, index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ComplaintStatus;
    use crate::store::MemoryObjectStore;
    use image::{DynamicImage, RgbImage};
    use std::io::Cursor;
    use tempfile::TempDir;

    async fn create_service() -> (SubmissionService, Arc<MemoryObjectStore>, Arc<ComplaintStore>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(
            ComplaintStore::connect(&temp_dir.path().join("test.db"))
                .await
                .unwrap(),
        );
        let objects = Arc::new(MemoryObjectStore::new("https://media.test.example.com"));
        let service = SubmissionService::new(Arc::clone(&store), objects.clone());
        (service, objects, store, temp_dir)
    }

    fn encoded_png(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            image::Rgb([40, 90, 200]),
        ));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn valid_request() -> SubmissionRequest {
        SubmissionRequest {
            name: "Asha Raman".to_string(),
            phone: "+91 9876543210".to_string(),
            aadhar: "1234567890123456".to_string(),
            description: "Pothole on Main St".to_string(),
            lat: Some(13.08),
            lng: Some(80.27),
            images: vec![encoded_png(1000, 700), encoded_png(640, 480)],
        }
    }

    #[tokio::test]
    async fn rejects_missing_location_before_any_network_call() {
        let (service, objects, store, _temp_dir) = create_service().await;

        let mut request = valid_request();
        request.lat = None;

        let err = service.submit(request).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(objects.is_empty().await);
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn submits_record_with_photos_under_generated_id() {
        let (service, objects, store, _temp_dir) = create_service().await;

        let outcome = service.submit(valid_request()).await.unwrap();

        assert!(outcome.complaint_id.starts_with("CF-"));
        assert_eq!(outcome.complaint_id.len(), 9);

        let prefix = format!("public_reports/{}/", outcome.complaint_id);
        let keys = objects.keys_with_prefix(&prefix).await;
        assert_eq!(
            keys,
            vec![
                format!("public_reports/{}/img_0.jpg", outcome.complaint_id),
                format!("public_reports/{}/img_1.jpg", outcome.complaint_id),
            ]
        );

        let record = store
            .get_by_complaint_id(&outcome.complaint_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.status, ComplaintStatus::Pending);
        assert_eq!(record.images.len(), 2);
        assert!(record.images[0].ends_with("img_0.jpg"));
        assert!(record.images[1].ends_with("img_1.jpg"));
    }

    #[tokio::test]
    async fn formats_identity_fields_at_the_boundary() {
        let (service, _objects, _store, _temp_dir) = create_service().await;

        let mut request = valid_request();
        request.images = vec![];
        request.aadhar = "1234-5678-9012-3456".to_string();
        request.phone = "+91 98765432101234".to_string();

        let outcome = service.submit(request).await.unwrap();
        assert_eq!(outcome.record.aadhar, "1234 5678 9012 3456");
        assert_eq!(outcome.record.phone, "+91 9876543210");
    }

    #[tokio::test]
    async fn image_order_matches_capture_order() {
        let (service, _objects, _store, _temp_dir) = create_service().await;

        let mut request = valid_request();
        request.images = vec![
            encoded_png(900, 300),
            encoded_png(800, 800),
            encoded_png(1200, 400),
        ];

        let outcome = service.submit(request).await.unwrap();
        for (index, url) in outcome.record.images.iter().enumerate() {
            assert!(url.ends_with(&format!("img_{}.jpg", index)), "url: {}", url);
        }
    }

    #[tokio::test]
    async fn decode_failure_discards_sibling_uploads_and_commits_nothing() {
        let (service, objects, store, _temp_dir) = create_service().await;

        let mut request = valid_request();
        request.images = vec![encoded_png(1000, 700), b"definitely not an image".to_vec()];

        let err = service.submit(request).await.unwrap_err();
        assert!(matches!(err, AppError::Decode(_)));

        // The sibling that uploaded successfully was deleted.
        assert!(objects.is_empty().await);
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn submission_without_photos_is_valid() {
        let (service, objects, store, _temp_dir) = create_service().await;

        let mut request = valid_request();
        request.images = vec![];

        let outcome = service.submit(request).await.unwrap();
        assert!(outcome.record.images.is_empty());
        assert!(objects.is_empty().await);
        assert_eq!(store.list().await.unwrap().len(), 1);
    }
}
