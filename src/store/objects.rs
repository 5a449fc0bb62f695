//! Object storage for complaint photos
//!
//! Photos are uploaded by path and served through a stable public URL.
//! Production uses Cloudflare R2 (S3-compatible); local development and
//! tests use an in-memory store so no credentials are needed.

use std::collections::HashMap;

use aws_sdk_s3::Client as S3Client;
use tokio::sync::RwLock;

use crate::error::AppError;

/// Upload-by-path blob storage with stable retrieval references.
///
/// Paths are namespaced by complaint id and image index
/// (`public_reports/{complaintId}/img_{index}.jpg`).
#[axum::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload a blob and return its public URL.
    async fn upload(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError>;

    /// Delete a previously uploaded blob.
    async fn delete(&self, key: &str) -> Result<(), AppError>;

    /// Public URL for a key, without uploading.
    fn public_url(&self, key: &str) -> String;
}

/// Cloudflare R2 object store.
///
/// Uploads to R2 and returns public URLs via the bucket's custom domain.
pub struct R2ObjectStore {
    /// S3-compatible client for R2
    client: S3Client,
    /// Media bucket name
    bucket: String,
    /// Public URL base (Custom Domain)
    /// e.g., "https://media.example.com"
    public_url: String,
}

impl R2ObjectStore {
    /// Create new R2 object store client
    ///
    /// # Errors
    /// Returns error if S3 client initialization fails
    pub async fn new(
        storage: &crate::config::MediaStorageConfig,
        cloudflare: &crate::config::CloudflareConfig,
    ) -> Result<Self, AppError> {
        use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};

        // R2 endpoint: https://{account_id}.r2.cloudflarestorage.com
        let endpoint = format!("https://{}.r2.cloudflarestorage.com", cloudflare.account_id);

        let credentials = Credentials::new(
            &cloudflare.r2_access_key_id,
            &cloudflare.r2_secret_access_key,
            None,
            None,
            "cityfix-r2",
        );

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("auto"))
            .endpoint_url(&endpoint)
            .credentials_provider(credentials)
            .http_client(super::build_r2_http_client())
            .build();

        let client = S3Client::from_conf(s3_config);

        Ok(Self {
            client,
            bucket: storage.bucket.clone(),
            public_url: storage.public_url.clone(),
        })
    }
}

#[axum::async_trait]
impl ObjectStore for R2ObjectStore {
    async fn upload(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError> {
        use aws_sdk_s3::primitives::ByteStream;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .cache_control("public, max-age=31536000") // 1 year
            .send()
            .await
            .map_err(|e| AppError::Upload(format!("R2 upload failed: {}", e)))?;

        Ok(self.public_url(key))
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::Upload(format!("R2 delete failed: {}", e)))?;

        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_url, key)
    }
}

/// In-memory object store for local development and tests.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<String, (Vec<u8>, String)>>,
    public_url: String,
}

impl MemoryObjectStore {
    pub fn new(public_url: &str) -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    /// Keys stored under a path prefix, sorted.
    pub async fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .read()
            .await
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    /// Stored bytes for a key, if present.
    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.read().await.get(key).map(|(data, _)| data.clone())
    }
}

#[axum::async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError> {
        self.objects
            .write()
            .await
            .insert(key.to_string(), (data, content_type.to_string()));
        Ok(self.public_url(key))
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.objects.write().await.remove(key);
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_url, key)
    }
}
