//! Image normalization
//!
//! Converts an arbitrary device photo into a bounded-size JPEG before it
//! ever reaches network transmission. The core is pure and synchronous;
//! the submission workflow runs one normalization per image on the blocking
//! pool, so concurrent photos share no mutable state.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

use crate::error::AppError;

/// Fixed output width in pixels.
pub const TARGET_WIDTH: u32 = 800;

/// JPEG quality factor (0.6 of the 0-100 scale).
pub const JPEG_QUALITY: u8 = 60;

/// A normalized, upload-ready image.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    /// JPEG-encoded bytes
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl NormalizedImage {
    pub const CONTENT_TYPE: &'static str = "image/jpeg";
}

/// Normalize a raw encoded image.
///
/// Decodes, rescales to [`TARGET_WIDTH`] preserving aspect ratio, and
/// re-encodes as JPEG at [`JPEG_QUALITY`]. Scaling is uniform: inputs
/// narrower than the target are upscaled, matching the portal's original
/// behavior. A source that fails to decode returns `AppError::Decode`
/// immediately rather than hanging.
pub fn normalize(raw: &[u8]) -> Result<NormalizedImage, AppError> {
    let source = image::load_from_memory(raw)
        .map_err(|e| AppError::Decode(format!("failed to decode image: {}", e)))?;

    let scale = TARGET_WIDTH as f64 / source.width() as f64;
    let height = ((source.height() as f64 * scale).round() as u32).max(1);

    // JPEG has no alpha channel; flatten to RGB before encoding.
    let resized = source
        .resize_exact(TARGET_WIDTH, height, FilterType::Triangle)
        .to_rgb8();

    let mut data = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut data, JPEG_QUALITY);
    resized
        .write_with_encoder(encoder)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JPEG encoding failed: {}", e)))?;

    Ok(NormalizedImage {
        data,
        width: TARGET_WIDTH,
        height,
    })
}
