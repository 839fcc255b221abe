//! Display collaborator interface.
//!
//! The physical panel driver is external; the receiver only needs to
//! present an RGB image, switch the backlight and blank the screen.

use std::sync::{Arc, Mutex, MutexGuard};

use image::RgbImage;

use crate::error::CastError;

/// A small attached display.
pub trait DisplaySink: Send {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Show `image`. The image already has the display's dimensions.
    fn present(&mut self, image: &RgbImage) -> Result<(), CastError>;

    /// Backlight level, 0..=100.
    fn set_backlight(&mut self, percent: u8) -> Result<(), CastError>;

    /// Blank the panel.
    fn clear(&mut self) -> Result<(), CastError>;
}

// ── MemoryDisplay ────────────────────────────────────────────────

/// Everything a [`MemoryDisplay`] was asked to do.
#[derive(Debug, Clone, Default)]
pub struct DisplayLog {
    pub presented: Vec<RgbImage>,
    pub backlight: Option<u8>,
    pub clears: usize,
}

/// Headless display that records presentation calls.
///
/// Cloning shares the log, so a test can keep a handle while the
/// receiver owns the display.
#[derive(Debug, Clone)]
pub struct MemoryDisplay {
    width: u32,
    height: u32,
    log: Arc<Mutex<DisplayLog>>,
}

impl MemoryDisplay {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            log: Arc::new(Mutex::new(DisplayLog::default())),
        }
    }

    /// Lock and inspect the log.
    pub fn log(&self) -> MutexGuard<'_, DisplayLog> {
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DisplaySink for MemoryDisplay {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn present(&mut self, image: &RgbImage) -> Result<(), CastError> {
        self.log().presented.push(image.clone());
        Ok(())
    }

    fn set_backlight(&mut self, percent: u8) -> Result<(), CastError> {
        self.log().backlight = Some(percent.min(100));
        Ok(())
    }

    fn clear(&mut self) -> Result<(), CastError> {
        self.log().clears += 1;
        Ok(())
    }
}
