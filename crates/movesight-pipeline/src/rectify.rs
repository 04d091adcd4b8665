//! Perspective rectification: resample the framed board into a
//! fixed-size top-down square.

use image::Rgb;
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};

use crate::types::{DiffError, Dimensions, FrameRole, Quad, RgbImage};

/// Projection taking the quad's corners onto the corners of a `size`
/// board.
///
/// Corners map in TL, TR, BR, BL order to `(0, 0)`, `(w-1, 0)`,
/// `(w-1, h-1)` and `(0, h-1)`. Returns `None` for degenerate quads,
/// for which no homography exists.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn board_projection(quad: &Quad, size: Dimensions) -> Option<Projection> {
    if quad.is_degenerate() {
        return None;
    }

    let right = size.width.saturating_sub(1) as f32;
    let bottom = size.height.saturating_sub(1) as f32;

    let from = quad.corners().map(|p| (p.x as f32, p.y as f32));
    let to = [(0.0, 0.0), (right, 0.0), (right, bottom), (0.0, bottom)];

    Projection::from_control_points(from, to)
}

/// Warp `frame` so that `quad` fills a `size` image.
///
/// Bilinear resampling; output pixels whose pre-image falls outside the
/// frame are black.
///
/// # Errors
///
/// Returns [`DiffError::DegenerateBorder`] naming `role` when the quad
/// admits no perspective transform.
pub fn rectify(
    frame: &RgbImage,
    quad: &Quad,
    size: Dimensions,
    role: FrameRole,
) -> Result<RgbImage, DiffError> {
    let projection = board_projection(quad, size).ok_or_else(|| {
        log::warn!("{role}: border {quad:?} is degenerate");
        DiffError::DegenerateBorder { frame: role }
    })?;

    let mut board = RgbImage::new(size.width, size.height);
    warp_into(
        frame,
        &projection,
        Interpolation::Bilinear,
        Rgb([0, 0, 0]),
        &mut board,
    );
    Ok(board)
}
