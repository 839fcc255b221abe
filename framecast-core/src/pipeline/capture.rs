//! Capture sources.
//!
//! Real screen grabbing lives outside this crate; anything that can hand
//! back an RGB image for a region implements [`CaptureSource`]. Two
//! sources ship here: a synthetic moving pattern and a still image file.

use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::error::CastError;
use crate::pipeline::types::Region;

/// Produces one raw image per call.
pub trait CaptureSource: Send {
    /// Grab the pixels of `region`. A failure ends the sender session.
    fn capture(&mut self, region: &Region) -> Result<RgbImage, CastError>;
}

// ── TestPattern ──────────────────────────────────────────────────

const BAR_COLOURS: [[u8; 3]; 6] = [
    [230, 57, 70],
    [244, 162, 97],
    [233, 196, 106],
    [42, 157, 143],
    [38, 70, 83],
    [241, 250, 238],
];

const BAR_WIDTH: u32 = 40;

/// Vertical colour bars drifting to the right, a few pixels per frame.
///
/// The pattern is defined over an unbounded virtual screen so that the
/// capture region's offset changes what is seen.
#[derive(Debug, Default)]
pub struct TestPattern {
    frame: u64,
}

impl TestPattern {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames produced so far.
    pub fn frames(&self) -> u64 {
        self.frame
    }
}

impl CaptureSource for TestPattern {
    fn capture(&mut self, region: &Region) -> Result<RgbImage, CastError> {
        if region.is_empty() {
            return Err(CastError::Capture("empty capture region".into()));
        }

        let shift = (self.frame % (BAR_WIDTH as u64 * BAR_COLOURS.len() as u64)) as u32 * 4;
        let img = RgbImage::from_fn(region.width, region.height, |x, y| {
            let gx = region.left + x + shift;
            let gy = region.top + y;
            let [r, g, b] = BAR_COLOURS[((gx / BAR_WIDTH) as usize) % BAR_COLOURS.len()];
            // Darken towards the bottom so rotation is visible.
            let shade = 255 - (gy % 256) as u16 / 2;
            image::Rgb([
                (r as u16 * shade / 255) as u8,
                (g as u16 * shade / 255) as u8,
                (b as u16 * shade / 255) as u8,
            ])
        });

        self.frame += 1;
        Ok(img)
    }
}

// ── ImageFileSource ──────────────────────────────────────────────

/// Crops the capture region out of a still image loaded once from disk.
#[derive(Debug)]
pub struct ImageFileSource {
    path: PathBuf,
    image: RgbImage,
}

impl ImageFileSource {
    /// Load the image at `path`.
    pub fn open(path: &Path) -> Result<Self, CastError> {
        let image = image::open(path)
            .map_err(|e| CastError::Capture(format!("{}: {e}", path.display())))?
            .to_rgb8();
        Ok(Self {
            path: path.to_path_buf(),
            image,
        })
    }

    /// Use an in-memory image as the virtual screen.
    pub fn from_image(image: RgbImage) -> Self {
        Self {
            path: PathBuf::new(),
            image,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CaptureSource for ImageFileSource {
    fn capture(&mut self, region: &Region) -> Result<RgbImage, CastError> {
        let (w, h) = self.image.dimensions();
        if region.is_empty() || region.left >= w || region.top >= h {
            return Err(CastError::Capture(format!(
                "region {region:?} outside {w}x{h} source"
            )));
        }
        Ok(image::imageops::crop_imm(
            &self.image,
            region.left,
            region.top,
            region.width,
            region.height,
        )
        .to_image())
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_has_region_size_and_moves() {
        let mut src = TestPattern::new();
        let region = Region::new(10, 20, 64, 48);
        let a = src.capture(&region).unwrap();
        let b = src.capture(&region).unwrap();
        assert_eq!(a.dimensions(), (64, 48));
        assert_ne!(a.as_raw(), b.as_raw());
        assert_eq!(src.frames(), 2);
    }

    #[test]
    fn pattern_rejects_empty_region() {
        let mut src = TestPattern::new();
        assert!(matches!(
            src.capture(&Region::new(0, 0, 0, 0)),
            Err(CastError::Capture(_))
        ));
    }

    #[test]
    fn file_source_crops_and_clamps() {
        let screen = RgbImage::from_fn(100, 50, |x, _| image::Rgb([x as u8, 0, 0]));
        let mut src = ImageFileSource::from_image(screen);

        let img = src.capture(&Region::new(10, 0, 20, 20)).unwrap();
        assert_eq!(img.dimensions(), (20, 20));
        assert_eq!(img.get_pixel(0, 0).0[0], 10);

        let clipped = src.capture(&Region::new(90, 40, 20, 20)).unwrap();
        assert_eq!(clipped.dimensions(), (10, 10));

        assert!(src.capture(&Region::new(200, 0, 10, 10)).is_err());
    }

    #[test]
    fn file_source_reports_missing_file() {
        let err = ImageFileSource::open(Path::new("/nonexistent/screen.png")).unwrap_err();
        assert!(matches!(err, CastError::Capture(_)));
    }
}
