//! Storage layer
//!
//! Handles the two external-store contracts the portal consumes:
//! - Complaint document store (SQLite, with full-snapshot change push)
//! - Object store for normalized photos (Cloudflare R2, or in-memory for
//!   local development and tests)

mod complaints;
mod objects;

pub use complaints::{ComplaintStore, NewComplaint};
pub use objects::{MemoryObjectStore, ObjectStore, R2ObjectStore};

pub(crate) fn build_r2_http_client() -> aws_sdk_s3::config::SharedHttpClient {
    use aws_smithy_runtime::client::http::hyper_014::HyperClientBuilder;

    let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_only()
        .enable_http1()
        .enable_http2()
        .build();

    HyperClientBuilder::new().build(https_connector)
}
