//! Binary morphology with square kernels.
//!
//! A `k x k` square kernel is the L-infinity ball of radius `k / 2`, which
//! is what [`imageproc::morphology`] operates on.

use image::GrayImage;
use imageproc::distance_transform::Norm;

/// Kernel sizes above `DiffConfig::MAX_KERNEL_SIZE` are rejected by
/// validation before reaching here.
fn radius(kernel_size: u32) -> u8 {
    u8::try_from(kernel_size / 2).unwrap_or(u8::MAX)
}

/// Erode then dilate: removes foreground specks smaller than the kernel.
#[must_use = "returns the opened mask"]
pub fn open(mask: &GrayImage, kernel_size: u32) -> GrayImage {
    imageproc::morphology::open(mask, Norm::LInf, radius(kernel_size))
}

/// Dilate then erode: fills holes and gaps smaller than the kernel.
#[must_use = "returns the closed mask"]
pub fn close(mask: &GrayImage, kernel_size: u32) -> GrayImage {
    imageproc::morphology::close(mask, Norm::LInf, radius(kernel_size))
}
