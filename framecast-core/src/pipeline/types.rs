//! Shared types for the capture → encode and decode → present pipelines.

use serde::{Deserialize, Serialize};

// ── Region ───────────────────────────────────────────────────────

/// Rectangle of the source screen to capture, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub const fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl Default for Region {
    fn default() -> Self {
        Self::new(0, 0, 240, 240)
    }
}

// ── Rotation ─────────────────────────────────────────────────────

/// Clockwise rotation applied after resizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    #[serde(rename = "0")]
    None,
    #[serde(rename = "90")]
    Cw90,
    #[serde(rename = "180")]
    Cw180,
    #[serde(rename = "270")]
    Cw270,
}

impl Rotation {
    /// Map a degree value to a rotation. Only right angles are accepted.
    pub fn from_degrees(degrees: u32) -> Option<Self> {
        match degrees % 360 {
            0 => Some(Self::None),
            90 => Some(Self::Cw90),
            180 => Some(Self::Cw180),
            270 => Some(Self::Cw270),
            _ => None,
        }
    }
}

// ── ImageFormat ──────────────────────────────────────────────────

/// Still-image encoding used for frame payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// Lossy, honours the quality setting.
    #[default]
    Jpeg,
    /// Lossless; quality is ignored.
    Png,
}

// ── Compression ──────────────────────────────────────────────────

/// Optional byte-level compression applied on top of the image encoding.
///
/// Both ends must agree; there is no negotiation on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    None,
    Zstd,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_from_degrees() {
        assert_eq!(Rotation::from_degrees(0), Some(Rotation::None));
        assert_eq!(Rotation::from_degrees(450), Some(Rotation::Cw90));
        assert_eq!(Rotation::from_degrees(45), None);
    }

    #[test]
    fn default_region_matches_small_display() {
        let r = Region::default();
        assert_eq!((r.width, r.height), (240, 240));
        assert!(!r.is_empty());
        assert!(Region::new(0, 0, 0, 10).is_empty());
    }
}
