//! Image normalization: downsample a user-supplied portrait to fit the
//! transport bounds and re-encode it as base64 JPEG.

use crate::config::NormalizeConfig;
use crate::error::{EnvisionError, Result};
use base64::Engine;
use std::io::Cursor;
use std::path::Path;

/// A source image prepared for transport: base64 JPEG (no data-URI prefix)
/// within the configured pixel bounds and payload ceiling.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    /// Base64-encoded JPEG bytes, without any data-URI prefix.
    pub data: String,
    /// Always `image/jpeg`; normalization re-encodes every source as JPEG.
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
}

impl NormalizedImage {
    /// Self-contained data-URI, usable as a preview handle.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Reads a source image from disk for normalization.
pub fn read_source(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    std::fs::read(path.as_ref())
        .map_err(|e| EnvisionError::Image(format!("Failed to read file: {}", e)))
}

/// Guesses a mime type from magic bytes, for preview display of the raw
/// (un-normalized) source. Defaults to JPEG when unrecognized.
pub fn sniff_mime(data: &[u8]) -> &'static str {
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return "image/png";
    }
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return "image/jpeg";
    }
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return "image/webp";
    }
    if data.starts_with(b"GIF8") {
        return "image/gif";
    }
    "image/jpeg"
}

/// Decodes an arbitrary image, scales it down proportionally if either
/// dimension exceeds the configured bound, and re-encodes as JPEG.
///
/// In-bounds images are never upscaled, only re-encoded (transparency loss
/// for non-JPEG sources is accepted). The limiting dimension is chosen by
/// comparing width and height directly: wider-than-tall images are scaled
/// width-first, everything else height-first.
pub fn normalize(source: &[u8], config: &NormalizeConfig) -> Result<NormalizedImage> {
    let img = image::load_from_memory(source)
        .map_err(|e| EnvisionError::Image(format!("Failed to load image for resizing: {}", e)))?;

    let (width, height) = (img.width(), img.height());
    let (new_width, new_height) = scaled_dimensions(
        width,
        height,
        config.max_width,
        config.max_height,
    );

    let resized = if (new_width, new_height) == (width, height) {
        img
    } else {
        img.resize_exact(new_width, new_height, image::imageops::FilterType::Triangle)
    };

    // JPEG has no alpha channel; flatten before encoding.
    let rgb = image::DynamicImage::ImageRgb8(resized.to_rgb8());

    let mut encoded = Cursor::new(Vec::new());
    rgb.write_to(
        &mut encoded,
        image::ImageOutputFormat::Jpeg(config.jpeg_quality),
    )
    .map_err(|e| EnvisionError::Image(format!("Failed to load image for resizing: {}", e)))?;

    let data = base64::engine::general_purpose::STANDARD.encode(encoded.get_ref());

    if data.len() > config.max_payload_bytes {
        return Err(EnvisionError::PayloadTooLarge {
            size: data.len(),
            limit: config.max_payload_bytes,
        });
    }

    Ok(NormalizedImage {
        data,
        mime_type: "image/jpeg",
        width: new_width,
        height: new_height,
    })
}

/// Target dimensions after proportional downscaling. Returns the input
/// unchanged when both dimensions already fit.
fn scaled_dimensions(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }

    if width > height {
        let scaled = ((height as f64 * max_width as f64) / width as f64).round() as u32;
        (max_width, scaled.max(1))
    } else {
        let scaled = ((width as f64 * max_height as f64) / height as f64).round() as u32;
        (scaled.max(1), max_height)
    }
}
