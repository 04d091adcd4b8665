//! Incremental per-frame pipeline: advance one capture stage-by-stage,
//! inspecting each intermediate result before continuing.
//!
//! Unlike [`crate::diff`], which runs both captures through every stage
//! in one call, [`FramePipeline`] lets the caller drive a single frame
//! from capture to normalized board:
//!
//! ```rust
//! # use movesight_pipeline::{DiffConfig, DiffError, FrameRole, RgbImage};
//! # use movesight_pipeline::pipeline::FramePipeline;
//! # fn run(frame: &RgbImage) -> Result<(), DiffError> {
//! let config = DiffConfig::default();
//! let board = FramePipeline::new(frame, FrameRole::Before, &config)
//!     .orient()
//!     .detect_border_color()
//!     .locate_border()?
//!     .rectify()?
//!     .normalize()
//!     .into_board();
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next state (or a
//! `Result` for the fallible border and rectification steps), carrying
//! the intermediates computed so far. Calling stages out of order does
//! not compile.

use crate::border::{BorderCandidate, BorderSearch, locate_border};
use crate::config::DiffConfig;
use crate::diagnostics::StageMetrics;
use crate::types::{DiffError, Dimensions, FrameRole, GrayImage, Quad, RgbImage};

/// A normalized board ready for comparison.
#[derive(Debug, Clone)]
pub struct NormalizedBoard {
    /// Cropped and resized color board.
    pub rgb: RgbImage,
    /// Grayscale version of [`rgb`](Self::rgb), input to change detection.
    pub gray: GrayImage,
    /// Border corners found in the oriented frame.
    pub border: Quad,
}

/// Every intermediate produced for one capture.
#[derive(Debug, Clone)]
pub struct FrameResult {
    /// Which capture this is.
    pub role: FrameRole,
    /// Capture after the mounting correction.
    pub oriented: RgbImage,
    /// Binary mask of border-colored pixels.
    pub color_mask: GrayImage,
    /// Top-down warp of the framed board, before cropping.
    pub rectified: RgbImage,
    /// The board used for comparison.
    pub board: NormalizedBoard,
}

/// Entry point for the per-frame pipeline.
pub struct FramePipeline;

impl FramePipeline {
    /// Start processing `frame` as the `role` capture.
    pub fn new<'a>(frame: &'a RgbImage, role: FrameRole, config: &DiffConfig) -> Captured<'a> {
        Captured {
            config: config.clone(),
            role,
            frame,
        }
    }
}

// ───────────────────────── Stage 0: Captured ─────────────────────────

/// A capture that has not been touched yet.
#[must_use = "pipeline stages are consumed by advancing, call .orient() to continue"]
pub struct Captured<'a> {
    config: DiffConfig,
    role: FrameRole,
    frame: &'a RgbImage,
}

impl Captured<'_> {
    /// The raw capture.
    #[must_use]
    pub const fn frame(&self) -> &RgbImage {
        self.frame
    }

    /// Apply the mounting correction.
    pub fn orient(self) -> Oriented {
        let oriented = crate::mount::orient(self.frame, self.config.mount_rotation);
        log::debug!(
            "{}: oriented {} by {}",
            self.role,
            Dimensions::of(&oriented),
            self.config.mount_rotation
        );
        Oriented {
            config: self.config,
            role: self.role,
            oriented,
        }
    }
}

// ───────────────────────── Stage 1: Oriented ─────────────────────────

/// A capture after the mounting correction.
#[must_use = "pipeline stages are consumed by advancing, call .detect_border_color() to continue"]
pub struct Oriented {
    config: DiffConfig,
    role: FrameRole,
    oriented: RgbImage,
}

impl Oriented {
    /// The oriented capture.
    #[must_use]
    pub const fn oriented(&self) -> &RgbImage {
        &self.oriented
    }

    /// Segment border-colored pixels, optionally closing then opening
    /// the mask to mend frayed marker edges.
    pub fn detect_border_color(self) -> ColorMasked {
        let raw = crate::color::detect_border_color(&self.oriented, &self.config.border_color);
        let mask = if self.config.border_mask_cleanup {
            let k = self.config.border_cleanup_kernel_size;
            crate::morphology::open(&crate::morphology::close(&raw, k), k)
        } else {
            raw
        };
        let mask_pixels = crate::color::count_foreground(&mask);
        log::debug!("{}: {mask_pixels} border-colored pixels", self.role);
        ColorMasked {
            config: self.config,
            role: self.role,
            oriented: self.oriented,
            mask,
            mask_pixels,
        }
    }
}

// ───────────────────────── Stage 2: ColorMasked ──────────────────────

/// A capture with its border color mask.
#[must_use = "pipeline stages are consumed by advancing, call .locate_border() to continue"]
pub struct ColorMasked {
    config: DiffConfig,
    role: FrameRole,
    oriented: RgbImage,
    mask: GrayImage,
    mask_pixels: u64,
}

impl ColorMasked {
    /// The binary border color mask.
    #[must_use]
    pub const fn mask(&self) -> &GrayImage {
        &self.mask
    }

    /// Find the border quadrilateral and order its corners.
    ///
    /// # Errors
    ///
    /// Returns [`DiffError::BorderNotFound`] when the mask holds no
    /// four-sided contour of sufficient area.
    pub fn locate_border(self) -> Result<BorderLocated, DiffError> {
        let (candidate, search) = locate_border(&self.mask, &self.config, self.role)?;
        let border = crate::corners::order_corners(candidate.vertices);
        log::debug!("{}: border {border:?} area {:.0}", self.role, candidate.area);
        Ok(BorderLocated {
            config: self.config,
            role: self.role,
            oriented: self.oriented,
            mask: self.mask,
            search,
            candidate,
            border,
        })
    }
}

// ───────────────────────── Stage 3: BorderLocated ────────────────────

/// A capture whose border corners are known.
#[must_use = "pipeline stages are consumed by advancing, call .rectify() to continue"]
pub struct BorderLocated {
    config: DiffConfig,
    role: FrameRole,
    oriented: RgbImage,
    mask: GrayImage,
    search: BorderSearch,
    candidate: BorderCandidate,
    border: Quad,
}

impl BorderLocated {
    /// The border corners in TL, TR, BR, BL order.
    #[must_use]
    pub const fn border(&self) -> &Quad {
        &self.border
    }

    /// The selected quadrilateral as approximated, before ordering.
    #[must_use]
    pub const fn candidate(&self) -> &BorderCandidate {
        &self.candidate
    }

    /// Warp the framed board to a top-down square.
    ///
    /// # Errors
    ///
    /// Returns [`DiffError::DegenerateBorder`] when corner ordering
    /// collapsed two corners together.
    pub fn rectify(self) -> Result<Rectified, DiffError> {
        let rectified = crate::rectify::rectify(
            &self.oriented,
            &self.border,
            self.config.board_size,
            self.role,
        )?;
        Ok(Rectified {
            config: self.config,
            role: self.role,
            oriented: self.oriented,
            mask: self.mask,
            border: self.border,
            rectified,
        })
    }
}

// ───────────────────────── Stage 4: Rectified ────────────────────────

/// A capture warped to a top-down board.
#[must_use = "pipeline stages are consumed by advancing, call .normalize() to continue"]
pub struct Rectified {
    config: DiffConfig,
    role: FrameRole,
    oriented: RgbImage,
    mask: GrayImage,
    border: Quad,
    rectified: RgbImage,
}

impl Rectified {
    /// The rectified board, marker included.
    #[must_use]
    pub const fn rectified(&self) -> &RgbImage {
        &self.rectified
    }

    /// Crop the marker margins, resize back and convert to grayscale.
    pub fn normalize(self) -> Normalized {
        let board = crate::crop::crop_and_resize(&self.rectified, self.config.crop_margins);
        let gray = crate::decode::to_grayscale(&board);
        Normalized {
            config: self.config,
            role: self.role,
            oriented: self.oriented,
            mask: self.mask,
            border: self.border,
            rectified: self.rectified,
            board,
            gray,
        }
    }
}

// ───────────────────────── Stage 5: Normalized ───────────────────────

/// A capture reduced to a normalized board. Final per-frame stage.
#[must_use = "call .into_board() or .into_result() to take the normalized board"]
pub struct Normalized {
    config: DiffConfig,
    role: FrameRole,
    oriented: RgbImage,
    mask: GrayImage,
    border: Quad,
    rectified: RgbImage,
    board: RgbImage,
    gray: GrayImage,
}

impl Normalized {
    /// The normalized color board.
    #[must_use]
    pub const fn board(&self) -> &RgbImage {
        &self.board
    }

    /// The normalized grayscale board.
    #[must_use]
    pub const fn gray(&self) -> &GrayImage {
        &self.gray
    }

    /// Take the normalized board, dropping other intermediates.
    #[must_use]
    pub fn into_board(self) -> NormalizedBoard {
        NormalizedBoard {
            rgb: self.board,
            gray: self.gray,
            border: self.border,
        }
    }

    /// Take every intermediate.
    #[must_use]
    pub fn into_result(self) -> FrameResult {
        FrameResult {
            role: self.role,
            oriented: self.oriented,
            color_mask: self.mask,
            rectified: self.rectified,
            board: NormalizedBoard {
                rgb: self.board,
                gray: self.gray,
                border: self.border,
            },
        }
    }
}

// ──────────────────────────── Stage traits ───────────────────────────

/// Behaviour shared by every per-frame stage.
pub trait FrameStage: Sized {
    /// Short stage name for logs and reports.
    const NAME: &'static str;
    /// Zero-based position in the pipeline.
    const INDEX: usize;

    /// Which capture is being processed.
    fn role(&self) -> FrameRole;

    /// Run every remaining stage.
    ///
    /// # Errors
    ///
    /// Returns the first error a remaining fallible stage produces.
    fn complete(self) -> Result<FrameResult, DiffError>;
}

/// A stage that did work worth measuring. Every stage except
/// [`Captured`] implements it.
pub trait MeasuredStage: FrameStage {
    /// Metrics describing the work done to reach this stage.
    fn metrics(&self) -> StageMetrics;
}

impl FrameStage for Captured<'_> {
    const NAME: &'static str = "captured";
    const INDEX: usize = 0;

    fn role(&self) -> FrameRole {
        self.role
    }

    fn complete(self) -> Result<FrameResult, DiffError> {
        self.orient().complete()
    }
}

impl FrameStage for Oriented {
    const NAME: &'static str = "orient";
    const INDEX: usize = 1;

    fn role(&self) -> FrameRole {
        self.role
    }

    fn complete(self) -> Result<FrameResult, DiffError> {
        self.detect_border_color().complete()
    }
}

impl MeasuredStage for Oriented {
    fn metrics(&self) -> StageMetrics {
        StageMetrics::Orient {
            rotation: self.config.mount_rotation,
            width: self.oriented.width(),
            height: self.oriented.height(),
        }
    }
}

impl FrameStage for ColorMasked {
    const NAME: &'static str = "color_mask";
    const INDEX: usize = 2;

    fn role(&self) -> FrameRole {
        self.role
    }

    fn complete(self) -> Result<FrameResult, DiffError> {
        self.locate_border()?.complete()
    }
}

impl MeasuredStage for ColorMasked {
    fn metrics(&self) -> StageMetrics {
        StageMetrics::ColorMask {
            mask_pixel_count: self.mask_pixels,
            total_pixel_count: u64::from(self.mask.width()) * u64::from(self.mask.height()),
            cleaned: self.config.border_mask_cleanup,
        }
    }
}

impl FrameStage for BorderLocated {
    const NAME: &'static str = "border";
    const INDEX: usize = 3;

    fn role(&self) -> FrameRole {
        self.role
    }

    fn complete(self) -> Result<FrameResult, DiffError> {
        self.rectify()?.complete()
    }
}

impl MeasuredStage for BorderLocated {
    fn metrics(&self) -> StageMetrics {
        StageMetrics::Border {
            contour_count: self.search.contours,
            quadrilateral_count: self.search.quadrilaterals,
            border_area: self.candidate.area,
        }
    }
}

impl FrameStage for Rectified {
    const NAME: &'static str = "rectify";
    const INDEX: usize = 4;

    fn role(&self) -> FrameRole {
        self.role
    }

    fn complete(self) -> Result<FrameResult, DiffError> {
        self.normalize().complete()
    }
}

impl MeasuredStage for Rectified {
    fn metrics(&self) -> StageMetrics {
        StageMetrics::Rectify {
            width: self.rectified.width(),
            height: self.rectified.height(),
        }
    }
}

impl FrameStage for Normalized {
    const NAME: &'static str = "normalize";
    const INDEX: usize = 5;

    fn role(&self) -> FrameRole {
        self.role
    }

    fn complete(self) -> Result<FrameResult, DiffError> {
        Ok(self.into_result())
    }
}

impl MeasuredStage for Normalized {
    fn metrics(&self) -> StageMetrics {
        let m = self.config.crop_margins;
        StageMetrics::Normalize {
            cropped_width: self
                .rectified
                .width()
                .saturating_sub(m.left)
                .saturating_sub(m.right),
            cropped_height: self
                .rectified
                .height()
                .saturating_sub(m.top)
                .saturating_sub(m.bottom),
            width: self.board.width(),
            height: self.board.height(),
        }
    }
}
