//! Crop normalization: trim the border marker off a rectified board and
//! resize the playing surface back to the board size.
//!
//! After this step the 8x8 grid is assumed to fill the image edge to
//! edge, so grid math can divide the image evenly.

use image::imageops::{self, FilterType};

use crate::config::Margins;
use crate::types::RgbImage;

/// Remove `margins` from each side of `board` and resize the remainder
/// back to the board's original dimensions (bilinear).
///
/// Margins are expected to leave at least one pixel in each direction
/// (see [`DiffConfig::validate`](crate::config::DiffConfig::validate));
/// oversized margins are clamped rather than panicking.
#[must_use = "returns the normalized board"]
pub fn crop_and_resize(board: &RgbImage, margins: Margins) -> RgbImage {
    let (width, height) = board.dimensions();
    let left = margins.left.min(width.saturating_sub(1));
    let top = margins.top.min(height.saturating_sub(1));
    let inner_width = width
        .saturating_sub(margins.left)
        .saturating_sub(margins.right)
        .max(1);
    let inner_height = height
        .saturating_sub(margins.top)
        .saturating_sub(margins.bottom)
        .max(1);

    let cropped = imageops::crop_imm(board, left, top, inner_width, inner_height).to_image();
    log::trace!(
        "cropped {width}x{height} board to {}x{}",
        cropped.width(),
        cropped.height()
    );
    imageops::resize(&cropped, width, height, FilterType::Triangle)
}
