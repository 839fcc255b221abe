//! Capture source selection.

use std::path::Path;

use image::RgbImage;

use framecast_core::pipeline::{ImageFileSource, TestPattern};
use framecast_core::{CaptureSource, CastError, Region};

/// The capture sources this binary can drive.
#[derive(Debug)]
pub enum Source {
    Pattern(TestPattern),
    Image(ImageFileSource),
}

impl Source {
    /// `"pattern"` selects the test pattern; anything else is an image path.
    pub fn from_setting(setting: &str) -> Result<Self, CastError> {
        if setting.eq_ignore_ascii_case("pattern") {
            Ok(Self::Pattern(TestPattern::new()))
        } else {
            ImageFileSource::open(Path::new(setting)).map(Self::Image)
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Pattern(_) => "test pattern".into(),
            Self::Image(src) => format!("image {}", src.path().display()),
        }
    }
}

impl CaptureSource for Source {
    fn capture(&mut self, region: &Region) -> Result<RgbImage, CastError> {
        match self {
            Self::Pattern(src) => src.capture(region),
            Self::Image(src) => src.capture(region),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_setting() {
        let mut src = Source::from_setting("pattern").unwrap();
        assert_eq!(src.describe(), "test pattern");
        let img = src.capture(&Region::new(0, 0, 8, 4)).unwrap();
        assert_eq!(img.dimensions(), (8, 4));
    }

    #[test]
    fn image_setting_crops() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("screen.png");
        RgbImage::from_pixel(32, 32, image::Rgb([9, 8, 7]))
            .save(&path)
            .unwrap();

        let mut src = Source::from_setting(path.to_str().unwrap()).unwrap();
        assert!(src.describe().contains("screen.png"));
        let img = src.capture(&Region::new(4, 4, 10, 10)).unwrap();
        assert_eq!(img.dimensions(), (10, 10));
        assert_eq!(img.get_pixel(0, 0).0, [9, 8, 7]);
    }

    #[test]
    fn missing_image_is_capture_error() {
        let err = Source::from_setting("/nonexistent/screen.png").unwrap_err();
        assert!(matches!(err, CastError::Capture(_)));
    }
}
