//! Frame decoding and upload preparation.

use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, GenericImageView};
use tracing::{debug, warn};

use crate::error::{VisionError, VisionResult};

/// Bounds applied before a frame is sent to the advisory model.
#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_width: u32,
    pub max_height: u32,
    /// JPEG quality (1-100) used when re-encoding.
    pub jpeg_quality: u8,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_width: 1280,
            max_height: 720,
            jpeg_quality: 75,
        }
    }
}

/// Decode an in-memory image (format sniffed from the bytes).
pub fn decode_bytes(bytes: &[u8]) -> VisionResult<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| VisionError::decode_failed(e.to_string()))
}

/// Read and decode an image file.
pub fn load_path(path: &Path) -> VisionResult<DynamicImage> {
    if !path.exists() {
        return Err(VisionError::FileNotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path)?;
    decode_bytes(&bytes)
}

/// Shrink oversized frames and re-encode them as JPEG.
///
/// Frames already within `limits` are returned untouched. Anything that
/// fails to decode or encode is passed through as-is; the advisory model
/// is better served by the original bytes than by nothing.
pub fn prepare_upload(bytes: &[u8], limits: &UploadLimits) -> Vec<u8> {
    let image = match decode_bytes(bytes) {
        Ok(image) => image,
        Err(e) => {
            warn!(error = %e, "Upload preparation skipped, sending original bytes");
            return bytes.to_vec();
        }
    };

    let (width, height) = image.dimensions();
    if width <= limits.max_width && height <= limits.max_height {
        return bytes.to_vec();
    }

    let resized = image.resize(limits.max_width, limits.max_height, FilterType::Lanczos3);
    match encode_jpeg(&resized, limits.jpeg_quality) {
        Ok(encoded) => {
            debug!(
                from = format!("{}x{}", width, height),
                to = format!("{}x{}", resized.width(), resized.height()),
                bytes = encoded.len(),
                "Frame downscaled for upload"
            );
            encoded
        }
        Err(e) => {
            warn!(error = %e, "JPEG re-encode failed, sending original bytes");
            bytes.to_vec()
        }
    }
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> VisionResult<Vec<u8>> {
    let rgb = image.to_rgb8();
    let mut buffer = Cursor::new(Vec::new());
    let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    encoder
        .encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
        .map_err(|e| VisionError::encode_failed(e.to_string()))?;
    Ok(buffer.into_inner())
}
