//! CityFix - a civic complaint reporting service
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - Public submission endpoint                               │
//! │  - Admin dashboard endpoints                                │
//! │  - SSE streaming                                            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - Submission workflow (normalize, upload, persist)         │
//! │  - Dashboard view model                                     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                              │
//! │  - SQLite (sqlx) with snapshot notifications                │
//! │  - R2 photo storage                                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers for submission, dashboard, and streaming
//! - `workflow`: Submission orchestration
//! - `view`: Dashboard read model
//! - `store`: Complaint records and photo objects
//! - `model`: Domain types and formatting rules
//! - `imaging`: Photo normalization
//! - `receipt`: Plain-text receipt rendering
//! - `auth`: Admin authentication
//! - `config`: Configuration management
//! - `error`: Error types

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod imaging;
pub mod metrics;
pub mod model;
pub mod receipt;
pub mod store;
pub mod view;
pub mod workflow;

use std::sync::Arc;

/// Application state shared across all handlers
///
/// This struct is cloned for each request and contains
/// shared resources like the record store and photo storage.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Complaint record store (SQLite)
    pub store: Arc<store::ComplaintStore>,

    /// Photo object storage (Cloudflare R2, or in-memory for dev)
    pub objects: Arc<dyn store::ObjectStore>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Connect to the SQLite complaint store
    /// 2. Initialize photo storage per the configured backend
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        let store = store::ComplaintStore::connect(&config.database.path).await?;
        tracing::info!("Complaint store connected");

        let objects: Arc<dyn store::ObjectStore> = match config.storage.backend {
            config::StorageBackend::R2 => {
                let storage =
                    store::R2ObjectStore::new(&config.storage.media, &config.cloudflare).await?;
                tracing::info!(bucket = %config.storage.media.bucket, "R2 photo storage initialized");
                Arc::new(storage)
            }
            config::StorageBackend::Memory => {
                tracing::warn!("Using in-memory photo storage; uploads will not survive restarts");
                Arc::new(store::MemoryObjectStore::new(
                    &config.storage.media.public_url,
                ))
            }
        };

        tracing::info!("Application state initialized successfully");

        Ok(Self {
            config: Arc::new(config),
            store: Arc::new(store),
            objects,
        })
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use tower_http::{compression::CompressionLayer, trace::TraceLayer};

    let cors_layer = build_cors_layer(&state.config.server);

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .merge(auth::auth_router())
        .nest("/api", api::complaints_router().merge(api::streaming_router()))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
        .merge(api::metrics_router())
}

fn build_cors_layer(server: &config::ServerConfig) -> tower_http::cors::CorsLayer {
    use axum::http::HeaderValue;
    use tower_http::cors::{Any, CorsLayer};

    if !server.protocol.eq_ignore_ascii_case("https") {
        return CorsLayer::permissive();
    }

    let allowed_origin = server.base_url();
    match HeaderValue::from_str(&allowed_origin) {
        Ok(origin) => CorsLayer::new()
            .allow_origin([origin])
            .allow_methods(Any)
            .allow_headers(Any),
        Err(error) => {
            tracing::error!(
                %error,
                origin = %allowed_origin,
                "Failed to parse CORS origin from server base URL; denying cross-origin requests"
            );
            CorsLayer::new().allow_methods(Any).allow_headers(Any)
        }
    }
}

async fn health_check() -> &'static str {
    "OK"
}
