//! Common test utilities for E2E tests

use cityfix::{AppState, config};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// SHA-256 hex digest of "test-password".
const TEST_PASSWORD_SHA256: &str =
    "c638833f69bbfb3c267afa0a74434812436b8f08a81fd263c6be6871de4f1265";

pub const TEST_ADMIN_EMAIL: &str = "admin@test.example.com";
pub const TEST_ADMIN_PASSWORD: &str = "test-password";

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        // Create test configuration
        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
                domain: "localhost".to_string(),
                protocol: "http".to_string(),
            },
            database: config::DatabaseConfig {
                path: db_path.clone(),
            },
            storage: config::StorageConfig {
                backend: config::StorageBackend::Memory,
                media: config::MediaStorageConfig {
                    bucket: "test-media".to_string(),
                    public_url: "https://media.test.example.com".to_string(),
                },
            },
            cloudflare: config::CloudflareConfig {
                account_id: "test-account".to_string(),
                r2_access_key_id: "test-key".to_string(),
                r2_secret_access_key: "test-secret".to_string(),
            },
            auth: config::AuthConfig {
                admin_email: TEST_ADMIN_EMAIL.to_string(),
                admin_password_sha256: TEST_PASSWORD_SHA256.to_string(),
                session_secret: "test-secret-key-32-bytes-long!!!".to_string(),
                session_max_age: 604800,
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        // Initialize app state
        let state = AppState::new(config.clone()).await.unwrap();

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        // Build router
        let app = cityfix::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Create an admin session token without going through the login route
    pub fn create_admin_token(&self) -> String {
        use chrono::{Duration, Utc};
        use cityfix::auth::session::{Session, create_session_token};

        let now = Utc::now();
        let session = Session {
            email: TEST_ADMIN_EMAIL.to_string(),
            created_at: now,
            expires_at: now + Duration::days(7),
        };

        create_session_token(&session, &self.state.config.auth.session_secret)
            .expect("Failed to create test token")
    }

    /// Submit a complaint through the public endpoint
    ///
    /// Returns the created record as JSON.
    pub async fn submit_complaint(
        &self,
        description: &str,
        images: Vec<Vec<u8>>,
    ) -> serde_json::Value {
        let mut form = reqwest::multipart::Form::new()
            .text("name", "Asha Raman")
            .text("phone", "+91 9876543210")
            .text("aadhar", "1234567890123456")
            .text("description", description.to_string())
            .text("lat", "13.08")
            .text("lng", "80.27");

        for bytes in images {
            form = form.part(
                "image",
                reqwest::multipart::Part::bytes(bytes)
                    .file_name("photo.png")
                    .mime_str("image/png")
                    .unwrap(),
            );
        }

        let response = self
            .client
            .post(self.url("/api/v1/complaints"))
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201, "submission should succeed");
        response.json().await.unwrap()
    }
}

/// Encode a solid-color PNG for upload tests.
pub fn encoded_png(width: u32, height: u32) -> Vec<u8> {
    use image::{DynamicImage, RgbImage};
    use std::io::Cursor;

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

/// Encode a random-pixel PNG. Noise defeats PNG compression, so the
/// encoded size stays close to `width * height * 3` bytes.
#[allow(dead_code)]
pub fn noisy_png(width: u32, height: u32) -> Vec<u8> {
    use image::{DynamicImage, RgbImage};
    use rand::RngCore;
    use std::io::Cursor;

    let mut raw = vec![0u8; (width * height * 3) as usize];
    rand::thread_rng().fill_bytes(&mut raw);

    let img = DynamicImage::ImageRgb8(RgbImage::from_raw(width, height, raw).unwrap());
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}
