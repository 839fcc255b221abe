//! Snapshot display: stands in for the LCD panel.
//!
//! Every presented image is written to a PNG file so the current screen
//! can be inspected (or served) from disk. Writes go to a sibling temp
//! file first and are renamed into place, so readers never see a
//! half-written image.

use std::path::{Path, PathBuf};

use image::{ImageFormat, Rgb, RgbImage};
use tracing::{debug, info};

use framecast_core::{CastError, DisplaySink};

pub struct SnapshotDisplay {
    path: PathBuf,
    width: u32,
    height: u32,
    backlight: u8,
}

impl SnapshotDisplay {
    pub fn new(path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            path: path.into(),
            width,
            height,
            backlight: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backlight(&self) -> u8 {
        self.backlight
    }

    fn write(&self, image: &RgbImage) -> Result<(), CastError> {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        image
            .save_with_format(&tmp, ImageFormat::Png)
            .map_err(|e| CastError::Display(format!("{}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| CastError::Display(format!("{}: {e}", self.path.display())))
    }
}

impl DisplaySink for SnapshotDisplay {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn present(&mut self, image: &RgbImage) -> Result<(), CastError> {
        if image.dimensions() != (self.width, self.height) {
            return Err(CastError::Display(format!(
                "image is {}x{}, panel is {}x{}",
                image.width(),
                image.height(),
                self.width,
                self.height
            )));
        }
        self.write(image)
    }

    fn set_backlight(&mut self, percent: u8) -> Result<(), CastError> {
        let percent = percent.min(100);
        if percent != self.backlight {
            info!("backlight {}% -> {percent}%", self.backlight);
            self.backlight = percent;
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), CastError> {
        debug!("clear");
        self.write(&RgbImage::from_pixel(self.width, self.height, Rgb([0, 0, 0])))
    }
}

// ── Tests ────────────────────────────────────────────────────────
