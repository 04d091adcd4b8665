//! Change detection between two normalized grayscale boards.
//!
//! Both boards are blurred to suppress sensor noise, differenced pixel by
//! pixel, and binarized at a fixed threshold. The binary mask is then
//! opened (drops isolated speckle) and closed (fills pinholes inside real
//! changes). Nothing here adapts to exposure; all tolerances come from
//! [`DiffConfig`].

use image::Luma;
use imageproc::contrast::{ThresholdType, threshold};

use crate::blur::gaussian_blur;
use crate::config::DiffConfig;
use crate::morphology;
use crate::types::{DiffError, Dimensions, GrayImage};

/// Intermediate and final rasters of change detection.
#[derive(Debug, Clone)]
pub struct ChangeMaps {
    /// Absolute difference of the blurred boards.
    pub difference: GrayImage,
    /// Binary change mask after thresholding and morphology.
    pub mask: GrayImage,
}

/// Compare two grayscale boards of identical size.
///
/// # Errors
///
/// Returns [`DiffError::DimensionMismatch`] when the boards differ in
/// size.
pub fn detect_changes(
    before: &GrayImage,
    after: &GrayImage,
    config: &DiffConfig,
) -> Result<ChangeMaps, DiffError> {
    let (dims_before, dims_after) = (Dimensions::of(before), Dimensions::of(after));
    if dims_before != dims_after {
        return Err(DiffError::DimensionMismatch {
            before: dims_before,
            after: dims_after,
        });
    }

    let before = gaussian_blur(before, config.blur_kernel_size);
    let after = gaussian_blur(after, config.blur_kernel_size);

    let difference = absolute_difference(&before, &after);
    let binary = threshold(&difference, config.diff_threshold, ThresholdType::Binary);

    let opened = morphology::open(&binary, config.morph_kernel_size);
    let mask = morphology::close(&opened, config.morph_kernel_size);

    Ok(ChangeMaps { difference, mask })
}

/// Per-pixel `|a - b|`. Inputs must share dimensions.
fn absolute_difference(a: &GrayImage, b: &GrayImage) -> GrayImage {
    imageproc::map::map_pixels2(a, b, |p, q| Luma([p.0[0].abs_diff(q.0[0])]))
}
