//! Tunable parameters for the diff pipeline.
//!
//! Every numeric tolerance the pipeline uses lives here with a documented
//! default. The defaults encode one physical rig (camera mounted upside
//! down above the board, red tape border, 800 px working board); a
//! different mounting or marker only needs a different [`DiffConfig`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::mount::Rotation;
use crate::types::{Dimensions, DiffError};

/// Inclusive hue interval on the 8-bit hue scale (`0..=179`, two degrees
/// per step).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HueRange {
    /// Lowest accepted hue.
    pub low: u8,
    /// Highest accepted hue.
    pub high: u8,
}

impl HueRange {
    #[must_use]
    pub const fn new(low: u8, high: u8) -> Self {
        Self { low, high }
    }

    /// Whether `hue` falls inside the interval.
    #[must_use]
    pub const fn contains(self, hue: u8) -> bool {
        hue >= self.low && hue <= self.high
    }
}

impl fmt::Display for HueRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.low, self.high)
    }
}

/// Color bounds identifying border-marker pixels.
///
/// Red straddles the ends of the circular hue axis, so two disjoint hue
/// intervals are OR-ed together. Saturation and value minima reject
/// washed-out and dark pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorderColor {
    /// Hue intervals; a pixel matching either one qualifies.
    pub hue_ranges: [HueRange; 2],
    /// Minimum saturation (`0..=255`).
    pub min_saturation: u8,
    /// Minimum value/brightness (`0..=255`).
    pub min_value: u8,
}

impl BorderColor {
    /// Default hue intervals for red tape.
    pub const DEFAULT_HUE_RANGES: [HueRange; 2] = [HueRange::new(0, 10), HueRange::new(160, 179)];
    /// Default minimum saturation.
    pub const DEFAULT_MIN_SATURATION: u8 = 100;
    /// Default minimum value.
    pub const DEFAULT_MIN_VALUE: u8 = 100;
}

impl Default for BorderColor {
    fn default() -> Self {
        Self {
            hue_ranges: Self::DEFAULT_HUE_RANGES,
            min_saturation: Self::DEFAULT_MIN_SATURATION,
            min_value: Self::DEFAULT_MIN_VALUE,
        }
    }
}

/// Pixels trimmed from each side of the rectified board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Margins {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

impl Margins {
    /// The same margin on every side.
    #[must_use]
    pub const fn uniform(margin: u32) -> Self {
        Self {
            top: margin,
            bottom: margin,
            left: margin,
            right: margin,
        }
    }
}

/// Configuration for the diff pipeline.
///
/// All parameters have defaults tuned for the reference rig. Call
/// [`validate`](Self::validate) (every public entry point does) to reject
/// combinations that would make a stage meaningless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Rotation applied to both captures before anything else, correcting
    /// for how the camera is mounted.
    pub mount_rotation: Rotation,

    /// Color bounds of the border marker.
    pub border_color: BorderColor,

    /// Close then open the color mask before searching for the border.
    /// Helps with frayed tape edges at the cost of a little runtime.
    pub border_mask_cleanup: bool,

    /// Square kernel size for the optional color mask cleanup. Must be odd.
    pub border_cleanup_kernel_size: u32,

    /// A border candidate must enclose strictly more than this many
    /// square pixels.
    pub min_border_area: f64,

    /// Polygon approximation tolerance as a fraction of the contour
    /// perimeter.
    pub approx_epsilon_factor: f64,

    /// Size of the rectified (and normalized) board image.
    pub board_size: Dimensions,

    /// Margins cropped off the rectified board to remove the marker
    /// itself before change detection.
    pub crop_margins: Margins,

    /// Gaussian blur kernel size applied before differencing. Must be odd.
    pub blur_kernel_size: u32,

    /// Absolute gray-level difference above which a pixel counts as
    /// changed.
    pub diff_threshold: u8,

    /// Square kernel size for the opening/closing of the change mask.
    /// Must be odd.
    pub morph_kernel_size: u32,

    /// Changed regions enclosing less than this many square pixels are
    /// discarded as noise.
    pub min_region_area: f64,
}

impl DiffConfig {
    /// Default mounting correction.
    pub const DEFAULT_MOUNT_ROTATION: Rotation = Rotation::Rotate180;
    /// Default border mask cleanup kernel size.
    pub const DEFAULT_BORDER_CLEANUP_KERNEL_SIZE: u32 = 5;
    /// Default minimum border candidate area (any positive area).
    pub const DEFAULT_MIN_BORDER_AREA: f64 = 0.0;
    /// Default polygon approximation tolerance factor.
    pub const DEFAULT_APPROX_EPSILON_FACTOR: f64 = 0.02;
    /// Default rectified board edge length in pixels.
    pub const DEFAULT_BOARD_EDGE: u32 = 800;
    /// Default crop margins.
    pub const DEFAULT_CROP_MARGINS: Margins = Margins {
        top: 29,
        bottom: 43,
        left: 43,
        right: 43,
    };
    /// Default blur kernel size.
    pub const DEFAULT_BLUR_KERNEL_SIZE: u32 = 5;
    /// Default binarization threshold for the difference image.
    pub const DEFAULT_DIFF_THRESHOLD: u8 = 50;
    /// Default morphology kernel size.
    pub const DEFAULT_MORPH_KERNEL_SIZE: u32 = 5;
    /// Default minimum changed-region area.
    pub const DEFAULT_MIN_REGION_AREA: f64 = 2000.0;
    /// Largest usable kernel size; morphology radii are at most 255.
    pub const MAX_KERNEL_SIZE: u32 = 511;

    /// Check that every parameter is usable.
    ///
    /// # Errors
    ///
    /// Returns [`DiffError::InvalidConfig`] describing the first problem
    /// found.
    pub fn validate(&self) -> Result<(), DiffError> {
        check_kernel("blur_kernel_size", self.blur_kernel_size)?;
        check_kernel("morph_kernel_size", self.morph_kernel_size)?;
        check_kernel("border_cleanup_kernel_size", self.border_cleanup_kernel_size)?;

        for (i, range) in self.border_color.hue_ranges.iter().enumerate() {
            if range.low > range.high || range.high > 179 {
                return Err(DiffError::InvalidConfig(format!(
                    "hue range {i} must satisfy low <= high <= 179, got {}..={}",
                    range.low, range.high
                )));
            }
        }

        if !self.approx_epsilon_factor.is_finite() || self.approx_epsilon_factor <= 0.0 {
            return Err(DiffError::InvalidConfig(format!(
                "approx_epsilon_factor must be positive, got {}",
                self.approx_epsilon_factor
            )));
        }

        for (name, value) in [
            ("min_border_area", self.min_border_area),
            ("min_region_area", self.min_region_area),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(DiffError::InvalidConfig(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }

        let Dimensions { width, height } = self.board_size;
        if width < 8 || height < 8 {
            return Err(DiffError::InvalidConfig(format!(
                "board_size must be at least 8x8, got {}",
                self.board_size
            )));
        }

        let m = self.crop_margins;
        if u64::from(m.left) + u64::from(m.right) >= u64::from(width)
            || u64::from(m.top) + u64::from(m.bottom) >= u64::from(height)
        {
            return Err(DiffError::InvalidConfig(format!(
                "crop_margins {m:?} leave nothing of a {} board",
                self.board_size
            )));
        }

        Ok(())
    }
}

fn check_kernel(name: &str, size: u32) -> Result<(), DiffError> {
    if size % 2 == 0 {
        return Err(DiffError::InvalidConfig(format!(
            "{name} must be odd, got {size}"
        )));
    }
    if size > DiffConfig::MAX_KERNEL_SIZE {
        return Err(DiffError::InvalidConfig(format!(
            "{name} must be at most {}, got {size}",
            DiffConfig::MAX_KERNEL_SIZE
        )));
    }
    Ok(())
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            mount_rotation: Self::DEFAULT_MOUNT_ROTATION,
            border_color: BorderColor::default(),
            border_mask_cleanup: false,
            border_cleanup_kernel_size: Self::DEFAULT_BORDER_CLEANUP_KERNEL_SIZE,
            min_border_area: Self::DEFAULT_MIN_BORDER_AREA,
            approx_epsilon_factor: Self::DEFAULT_APPROX_EPSILON_FACTOR,
            board_size: Dimensions {
                width: Self::DEFAULT_BOARD_EDGE,
                height: Self::DEFAULT_BOARD_EDGE,
            },
            crop_margins: Self::DEFAULT_CROP_MARGINS,
            blur_kernel_size: Self::DEFAULT_BLUR_KERNEL_SIZE,
            diff_threshold: Self::DEFAULT_DIFF_THRESHOLD,
            morph_kernel_size: Self::DEFAULT_MORPH_KERNEL_SIZE,
            min_region_area: Self::DEFAULT_MIN_REGION_AREA,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn hue_range_displays_as_low_dash_high() {
        assert_eq!(BorderColor::DEFAULT_HUE_RANGES[1].to_string(), "160-179");
    }

    #[test]
    fn defaults_match_reference_rig() {
        let config = DiffConfig::default();
        assert_eq!(config.mount_rotation, Rotation::Rotate180);
        assert_eq!(
            config.border_color.hue_ranges,
            [HueRange::new(0, 10), HueRange::new(160, 179)]
        );
        assert_eq!(config.border_color.min_saturation, 100);
        assert_eq!(config.border_color.min_value, 100);
        assert!(!config.border_mask_cleanup);
        assert!((config.approx_epsilon_factor - 0.02).abs() < f64::EPSILON);
        assert_eq!(
            config.board_size,
            Dimensions {
                width: 800,
                height: 800
            }
        );
        assert_eq!(
            config.crop_margins,
            Margins {
                top: 29,
                bottom: 43,
                left: 43,
                right: 43
            }
        );
        assert_eq!(config.blur_kernel_size, 5);
        assert_eq!(config.diff_threshold, 50);
        assert_eq!(config.morph_kernel_size, 5);
        assert!((config.min_region_area - 2000.0).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn hue_range_is_inclusive() {
        let range = HueRange::new(160, 179);
        assert!(range.contains(160));
        assert!(range.contains(179));
        assert!(!range.contains(159));
    }

    #[test]
    fn even_kernel_is_rejected() {
        let config = DiffConfig {
            blur_kernel_size: 4,
            ..DiffConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DiffError::InvalidConfig(msg)) if msg.contains("blur_kernel_size")
        ));
    }

    #[test]
    fn oversized_kernel_is_rejected() {
        let config = DiffConfig {
            morph_kernel_size: 513,
            ..DiffConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DiffError::InvalidConfig(msg)) if msg.contains("morph_kernel_size")
        ));

        let config = DiffConfig {
            border_cleanup_kernel_size: DiffConfig::MAX_KERNEL_SIZE,
            ..DiffConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn inverted_hue_range_is_rejected() {
        let mut config = DiffConfig::default();
        config.border_color.hue_ranges[1] = HueRange::new(170, 160);
        assert!(matches!(
            config.validate(),
            Err(DiffError::InvalidConfig(_))
        ));
    }

    #[test]
    fn margins_consuming_board_are_rejected() {
        let config = DiffConfig {
            crop_margins: Margins::uniform(400),
            ..DiffConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DiffError::InvalidConfig(msg)) if msg.contains("crop_margins")
        ));
    }

    #[test]
    fn tiny_board_is_rejected() {
        let config = DiffConfig {
            board_size: Dimensions {
                width: 7,
                height: 800,
            },
            crop_margins: Margins::uniform(0),
            ..DiffConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn non_positive_epsilon_is_rejected() {
        let config = DiffConfig {
            approx_epsilon_factor: 0.0,
            ..DiffConfig::default()
        };
        assert!(config.validate().is_err());

        let config = DiffConfig {
            approx_epsilon_factor: f64::NAN,
            ..DiffConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn negative_region_area_is_rejected() {
        let config = DiffConfig {
            min_region_area: -1.0,
            ..DiffConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_serde_round_trip() {
        let config = DiffConfig {
            mount_rotation: Rotation::None,
            border_mask_cleanup: true,
            crop_margins: Margins::uniform(40),
            diff_threshold: 35,
            min_region_area: 1200.0,
            ..DiffConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: DiffConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: DiffConfig = serde_json::from_str(r#"{"diff_threshold": 30}"#).unwrap();
        assert_eq!(config.diff_threshold, 30);
        assert_eq!(config.crop_margins, DiffConfig::DEFAULT_CROP_MARGINS);
    }
}
