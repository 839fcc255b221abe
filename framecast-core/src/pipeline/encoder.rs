//! Captured image → frame payload.
//!
//! Transform (resize, then rotate), encode as JPEG or PNG, then
//! optionally zstd-compress the encoded bytes.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{ExtendedColorType, ImageEncoder, RgbImage};

use crate::error::CastError;
use crate::pipeline::types::{Compression, ImageFormat, Rotation};

/// Zstd level used for the optional compression layer. Frames are
/// already image-compressed, so favour speed.
const ZSTD_LEVEL: i32 = 1;

/// Encoder settings.
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    pub format: ImageFormat,
    /// JPEG quality, 1..=100.
    pub quality: u8,
    /// Resize to this size before rotation, if set.
    pub output_size: Option<(u32, u32)>,
    pub rotation: Rotation,
    pub compression: Compression,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            format: ImageFormat::Jpeg,
            quality: 50,
            output_size: None,
            rotation: Rotation::None,
            compression: Compression::None,
        }
    }
}

/// Turns raw captures into wire payloads.
pub struct FrameEncoder {
    config: EncoderConfig,
}

impl FrameEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    /// Encode one captured image into a payload.
    pub fn encode(&self, raw: &RgbImage) -> Result<Vec<u8>, CastError> {
        let image = transform(raw, self.config.output_size, self.config.rotation);
        let encoded = encode_image(&image, self.config.format, self.config.quality)?;

        let payload = match self.config.compression {
            Compression::None => encoded,
            Compression::Zstd => zstd::encode_all(encoded.as_slice(), ZSTD_LEVEL)
                .map_err(|e| CastError::Encode(format!("zstd encode failed: {e}")))?,
        };

        Ok(payload)
    }
}

/// Resize (if requested) and rotate.
pub fn transform(raw: &RgbImage, size: Option<(u32, u32)>, rotation: Rotation) -> RgbImage {
    let resized = match size {
        Some((w, h)) if (w, h) != raw.dimensions() && w > 0 && h > 0 => {
            imageops::resize(raw, w, h, FilterType::Triangle)
        }
        _ => raw.clone(),
    };

    match rotation {
        Rotation::None => resized,
        Rotation::Cw90 => imageops::rotate90(&resized),
        Rotation::Cw180 => imageops::rotate180(&resized),
        Rotation::Cw270 => imageops::rotate270(&resized),
    }
}

/// Encode an RGB image into `format`.
pub fn encode_image(image: &RgbImage, format: ImageFormat, quality: u8) -> Result<Vec<u8>, CastError> {
    let (w, h) = image.dimensions();
    let mut out = Cursor::new(Vec::new());

    let result = match format {
        ImageFormat::Jpeg => JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
            .write_image(image.as_raw(), w, h, ExtendedColorType::Rgb8),
        ImageFormat::Png => {
            PngEncoder::new(&mut out).write_image(image.as_raw(), w, h, ExtendedColorType::Rgb8)
        }
    };
    result.map_err(|e| CastError::Encode(e.to_string()))?;

    Ok(out.into_inner())
}

// ── Tests ────────────────────────────────────────────────────────
