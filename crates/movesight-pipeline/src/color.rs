//! Border-marker color segmentation.
//!
//! Converts each pixel to hue/saturation/value and keeps the ones whose
//! color matches the configured marker. The hue scale is the common 8-bit
//! convention: `0..=179`, two degrees per step, so that pure red sits at
//! both ends of the scale.
//!
//! This is the first stage after mounting correction: RGB frame in,
//! binary `GrayImage` out (`255` = marker color, `0` = everything else).

use image::{GrayImage, Luma, Rgb};

use crate::config::BorderColor;
use crate::types::RgbImage;

/// A pixel in 8-bit hue/saturation/value form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsv {
    /// Hue, `0..=179`.
    pub hue: u8,
    /// Saturation, `0..=255`.
    pub saturation: u8,
    /// Value (brightness), `0..=255`.
    pub value: u8,
}

impl Hsv {
    /// Convert an RGB pixel.
    ///
    /// Achromatic pixels (all channels equal) get hue and saturation 0.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_rgb(Rgb([r, g, b]): Rgb<u8>) -> Self {
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let chroma = f32::from(max - min);

        if max == 0 || chroma == 0.0 {
            return Self {
                hue: 0,
                saturation: 0,
                value: max,
            };
        }

        let saturation = (255.0 * chroma / f32::from(max)).round() as u8;

        let (rf, gf, bf) = (f32::from(r), f32::from(g), f32::from(b));
        let mut degrees = if max == r {
            60.0 * (gf - bf) / chroma
        } else if max == g {
            60.0f32.mul_add((bf - rf) / chroma, 120.0)
        } else {
            60.0f32.mul_add((rf - gf) / chroma, 240.0)
        };
        if degrees < 0.0 {
            degrees += 360.0;
        }

        let mut hue = (degrees / 2.0).round();
        if hue >= 180.0 {
            hue -= 180.0;
        }

        Self {
            hue: hue as u8,
            saturation,
            value: max,
        }
    }
}

impl BorderColor {
    /// Whether an HSV pixel matches the marker color.
    #[must_use]
    pub fn matches(&self, hsv: Hsv) -> bool {
        hsv.saturation >= self.min_saturation
            && hsv.value >= self.min_value
            && self.hue_ranges.iter().any(|range| range.contains(hsv.hue))
    }
}

/// Build the binary mask of marker-colored pixels.
///
/// The mask is the OR of both hue intervals, each combined with the
/// saturation and value minima.
#[must_use = "returns the color mask"]
pub fn detect_border_color(frame: &RgbImage, color: &BorderColor) -> GrayImage {
    imageproc::map::map_pixels(frame, |pixel| {
        if color.matches(Hsv::from_rgb(pixel)) {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

/// Count the foreground (`255`) pixels of a binary mask.
pub(crate) fn count_foreground(mask: &GrayImage) -> u64 {
    mask.pixels()
        .map(|p| u64::from(u8::from(p.0[0] == 255)))
        .sum()
}
