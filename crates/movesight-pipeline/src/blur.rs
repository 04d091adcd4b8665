//! Gaussian blur for noise reduction before differencing.
//!
//! Wraps [`imageproc::filter::gaussian_blur_f32`]. The pipeline is
//! configured with a kernel size rather than a sigma, so the sigma is
//! derived the way fixed-kernel Gaussian filters usually pick it when
//! none is given: `0.3 * ((k - 1) / 2 - 1) + 0.8`.

use image::GrayImage;

/// Sigma matching an odd Gaussian kernel of `kernel_size` taps.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn sigma_for_kernel(kernel_size: u32) -> f32 {
    let half = (kernel_size.saturating_sub(1)) as f32 * 0.5;
    0.3f32.mul_add(half - 1.0, 0.8)
}

/// Apply Gaussian blur to a grayscale image.
///
/// A kernel size of 0 or 1 returns the image unchanged.
#[must_use = "returns the blurred image"]
pub fn gaussian_blur(image: &GrayImage, kernel_size: u32) -> GrayImage {
    if kernel_size <= 1 {
        return image.clone();
    }

    imageproc::filter::gaussian_blur_f32(image, sigma_for_kernel(kernel_size))
}
