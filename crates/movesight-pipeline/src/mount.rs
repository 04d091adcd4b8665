//! Camera-mount orientation correction.
//!
//! The camera sits in a fixed position above the board. Whatever rotation
//! that mounting introduces is undone here, before color detection, so
//! that "top" of the rectified board is always the same physical edge.
//! The notation mapping in [`crate::notation`] assumes this correction
//! has been applied.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::RgbImage;

/// Clockwise rotation applied to each capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotation {
    /// Camera already upright.
    None,
    /// Rotate 90 degrees clockwise.
    Rotate90,
    /// Rotate 180 degrees (camera mounted upside down).
    #[default]
    Rotate180,
    /// Rotate 270 degrees clockwise.
    Rotate270,
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Rotate90 => f.write_str("Rotate90"),
            Self::Rotate180 => f.write_str("Rotate180"),
            Self::Rotate270 => f.write_str("Rotate270"),
        }
    }
}

/// Apply the mounting correction to a captured frame.
#[must_use = "returns the oriented frame"]
pub fn orient(frame: &RgbImage, rotation: Rotation) -> RgbImage {
    match rotation {
        Rotation::None => frame.clone(),
        Rotation::Rotate90 => image::imageops::rotate90(frame),
        Rotation::Rotate180 => image::imageops::rotate180(frame),
        Rotation::Rotate270 => image::imageops::rotate270(frame),
    }
}
