//! Frame payload → displayable image.
//!
//! The inverse of [`FrameEncoder`](crate::pipeline::encoder::FrameEncoder):
//! optional zstd decompression, then image decoding with the format
//! sniffed from the payload. Both failure kinds are frame-fatal only.
//!
//! Decompressed output and decoded dimensions are capped, so a small
//! payload cannot balloon into an unbounded allocation.

use std::io::{Cursor, Read};

use image::imageops::{self, FilterType};
use image::{ImageReader, Limits, RgbImage};

use crate::error::CastError;
use crate::pipeline::receiver::DEFAULT_MAX_FRAME_BYTES;
use crate::pipeline::types::Compression;

/// Largest accepted image side in pixels.
pub const MAX_IMAGE_SIDE: u32 = 8192;

/// Decodes payloads and fits them to the display.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    compression: Compression,
    target: Option<(u32, u32)>,
    limit: usize,
}

impl FrameDecoder {
    /// `target` is the display size; decoded images of a different size
    /// are scaled to it.
    pub fn new(compression: Compression, target: Option<(u32, u32)>) -> Self {
        Self {
            compression,
            target,
            limit: DEFAULT_MAX_FRAME_BYTES as usize,
        }
    }

    /// Cap the decompressed size of one payload.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Decode one payload.
    pub fn decode(&self, payload: &[u8]) -> Result<RgbImage, CastError> {
        let decompressed;
        let bytes = match self.compression {
            Compression::None => payload,
            Compression::Zstd => {
                decompressed = self.decompress(payload)?;
                decompressed.as_slice()
            }
        };

        let mut limits = Limits::default();
        limits.max_image_width = Some(MAX_IMAGE_SIDE);
        limits.max_image_height = Some(MAX_IMAGE_SIDE);

        let mut reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| CastError::UnidentifiedImage(e.to_string()))?;
        reader.limits(limits);
        let image = reader
            .decode()
            .map_err(|e| CastError::UnidentifiedImage(e.to_string()))?
            .to_rgb8();

        Ok(match self.target {
            Some((w, h)) if (w, h) != image.dimensions() && w > 0 && h > 0 => {
                imageops::resize(&image, w, h, FilterType::Triangle)
            }
            _ => image,
        })
    }

    fn decompress(&self, payload: &[u8]) -> Result<Vec<u8>, CastError> {
        let decoder = zstd::stream::read::Decoder::new(payload)
            .map_err(|e| CastError::CorruptData(format!("zstd decode failed: {e}")))?;
        let mut out = Vec::new();
        decoder
            .take(self.limit as u64 + 1)
            .read_to_end(&mut out)
            .map_err(|e| CastError::CorruptData(format!("zstd decode failed: {e}")))?;
        if out.len() > self.limit {
            return Err(CastError::CorruptData(format!(
                "zstd payload expands past {} bytes",
                self.limit
            )));
        }
        Ok(out)
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::encoder::{EncoderConfig, FrameEncoder};
    use crate::pipeline::types::ImageFormat;

    fn payload(compression: Compression, format: ImageFormat, w: u32, h: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(w, h, image::Rgb([200, 10, 10]));
        FrameEncoder::new(EncoderConfig {
            format,
            compression,
            ..EncoderConfig::default()
        })
        .encode(&img)
        .unwrap()
    }

    #[test]
    fn decodes_png_exactly() {
        let dec = FrameDecoder::new(Compression::None, None);
        let img = dec.decode(&payload(Compression::None, ImageFormat::Png, 8, 4)).unwrap();
        assert_eq!(img.dimensions(), (8, 4));
        assert_eq!(img.get_pixel(3, 2).0, [200, 10, 10]);
    }

    #[test]
    fn fits_to_display() {
        let dec = FrameDecoder::new(Compression::Zstd, Some((240, 240)));
        let img = dec.decode(&payload(Compression::Zstd, ImageFormat::Jpeg, 120, 60)).unwrap();
        assert_eq!(img.dimensions(), (240, 240));
    }

    #[test]
    fn garbage_is_unidentified_image() {
        let dec = FrameDecoder::new(Compression::None, None);
        assert!(matches!(
            dec.decode(b"definitely not an image"),
            Err(CastError::UnidentifiedImage(_))
        ));
    }

    #[test]
    fn bad_zstd_is_corrupt_data() {
        let dec = FrameDecoder::new(Compression::Zstd, None);
        let err = dec.decode(&[0x00, 0x01, 0x02, 0x03]).unwrap_err();
        assert!(matches!(err, CastError::CorruptData(_)));
        assert!(err.is_frame_fatal());
    }

    #[test]
    fn zstd_expansion_is_capped() {
        let bomb = zstd::encode_all(&vec![0u8; 64 * 1024][..], 3).unwrap();
        assert!(bomb.len() < 1024);

        let dec = FrameDecoder::new(Compression::Zstd, None).with_limit(16 * 1024);
        let err = dec.decode(&bomb).unwrap_err();
        assert!(matches!(err, CastError::CorruptData(_)));
        assert!(err.is_frame_fatal());
    }

    #[test]
    fn payload_at_limit_still_decodes() {
        let data = payload(Compression::None, ImageFormat::Png, 8, 4);
        let packed = zstd::encode_all(&data[..], 3).unwrap();

        let dec = FrameDecoder::new(Compression::Zstd, None).with_limit(data.len());
        assert_eq!(dec.decode(&packed).unwrap().dimensions(), (8, 4));
    }

    #[test]
    fn oversized_dimensions_are_refused() {
        // One pixel wider than allowed; refused from the header alone.
        let img = RgbImage::from_pixel(MAX_IMAGE_SIDE + 1, 1, image::Rgb([0, 0, 0]));
        let png = crate::pipeline::encoder::encode_image(&img, ImageFormat::Png, 100).unwrap();

        let dec = FrameDecoder::new(Compression::None, None);
        assert!(matches!(dec.decode(&png), Err(CastError::UnidentifiedImage(_))));
    }
}
