//! Image decoding and grayscale conversion.
//!
//! Accepts encoded image bytes already held in memory (PNG, JPEG, BMP,
//! WebP) and produces the 3-channel frames the pipeline works on. Reading
//! the bytes from a camera or disk is the caller's business.

use image::{GrayImage, Luma, Rgb};

use crate::types::{DiffError, FrameRole, RgbImage};

/// Decode encoded image bytes into an RGB frame.
///
/// Alpha, if present, is dropped; 16-bit and grayscale sources are
/// converted to 8-bit RGB.
///
/// # Errors
///
/// Returns [`DiffError::EmptyInput`] if `bytes` is empty.
/// Returns [`DiffError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode_frame(bytes: &[u8], frame: FrameRole) -> Result<RgbImage, DiffError> {
    if bytes.is_empty() {
        return Err(DiffError::EmptyInput { frame });
    }

    let img = image::load_from_memory(bytes)
        .map_err(|source| DiffError::ImageDecode { frame, source })?;
    Ok(img.to_rgb8())
}

// BT.601 luma weights in 14-bit fixed point: 0.299, 0.587, 0.114.
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;
const LUMA_SHIFT: u32 = 14;

/// Convert an RGB board image to single-channel luminance.
///
/// Uses BT.601 weights with round-half-up fixed-point arithmetic, the
/// conversion the difference threshold is calibrated against.
#[must_use = "returns the grayscale image"]
pub fn to_grayscale(image: &RgbImage) -> GrayImage {
    imageproc::map::map_pixels(image, |Rgb([r, g, b])| Luma([luma(r, g, b)]))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_lossless)]
const fn luma(r: u8, g: u8, b: u8) -> u8 {
    let weighted = r as u32 * LUMA_R + g as u32 * LUMA_G + b as u32 * LUMA_B;
    // Weights sum to 1 << LUMA_SHIFT, so the result fits in a u8.
    ((weighted + (1 << (LUMA_SHIFT - 1))) >> LUMA_SHIFT) as u8
}
