//! movesight-pipeline: Pure vision pipeline for inferring chess moves
//! (sans-IO).
//!
//! Compares two photographs of a physical board, taken before and after
//! a move, and reports the squares that changed:
//!
//! orient -> border color mask -> border quad -> corner ordering ->
//! perspective rectification -> margin crop -> change detection ->
//! region extraction -> grid mapping -> algebraic notation.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! frames or encoded byte slices and returns structured data. Reading
//! captures from a camera or disk is the caller's job, as is deciding
//! what a given set of changed squares means as a move.

pub mod annotate;
pub mod blur;
pub mod border;
pub mod change;
pub mod cluster;
pub mod color;
pub mod config;
pub mod contour;
pub mod corners;
pub mod crop;
pub mod decode;
pub mod diagnostics;
pub mod grid;
pub mod morphology;
pub mod mount;
pub mod notation;
pub mod pipeline;
pub mod rectify;
pub mod simplify;
pub mod types;

use web_time::Instant;

use crate::diagnostics::{
    ComparisonDiagnostics, DiffDiagnostics, DiffSummary, FrameDiagnostics, StageDiagnostics,
    StageMetrics,
};
use crate::pipeline::MeasuredStage;

pub use config::{BorderColor, DiffConfig, HueRange, Margins};
pub use mount::Rotation;
pub use notation::{ParseSquareError, Square};
pub use pipeline::{FramePipeline, FrameResult, NormalizedBoard};
pub use types::{
    Cell, ChangeRegion, DiffError, Dimensions, FramePair, FrameRole, GrayImage, Point, Polyline,
    Quad, RgbImage,
};

/// Outcome of comparing two normalized boards.
#[derive(Debug, Clone)]
pub struct BoardComparison {
    /// Absolute difference of the blurred boards.
    pub difference: GrayImage,
    /// Binary change mask after thresholding and morphology.
    pub change_mask: GrayImage,
    /// Change regions that passed the area filter.
    pub regions: Vec<ChangeRegion>,
    /// How many regions the area filter discarded.
    pub rejected_regions: usize,
    /// Grid cell of each region, parallel to [`regions`](Self::regions).
    pub cells: Vec<Cell>,
    /// Square name of each region, parallel to [`regions`](Self::regions).
    pub squares: Vec<Square>,
}

/// A complete diff with every intermediate and its diagnostics.
#[derive(Debug, Clone)]
pub struct StagedDiff {
    /// Per-frame intermediates of the "before" capture.
    pub before: FrameResult,
    /// Per-frame intermediates of the "after" capture.
    pub after: FrameResult,
    /// Pair comparison of the two normalized boards.
    pub comparison: BoardComparison,
    /// Timing and counts for every stage.
    pub diagnostics: DiffDiagnostics,
}

impl StagedDiff {
    /// The changed squares.
    #[must_use]
    pub fn squares(&self) -> &[Square] {
        &self.comparison.squares
    }
}

/// Report the squares that changed between two captures.
///
/// Both frames go through orientation, border detection, rectification
/// and normalization independently; the normalized boards are then
/// compared. Squares come out in contour-tracing order, one per change
/// region, so a region straddling the same square twice is not merged.
///
/// An empty list means no qualifying change was found. Detection
/// failures are always errors, never an empty list.
///
/// # Errors
///
/// Returns [`DiffError::InvalidConfig`] for an unusable configuration,
/// [`DiffError::BorderNotFound`] or [`DiffError::DegenerateBorder`]
/// naming the failing capture, and [`DiffError::CellOutOfRange`] if a
/// change maps off the board.
pub fn diff(
    before: &RgbImage,
    after: &RgbImage,
    config: &DiffConfig,
) -> Result<Vec<Square>, DiffError> {
    config.validate()?;

    let before = normalize_frame(before, FrameRole::Before, config)?;
    let after = normalize_frame(after, FrameRole::After, config)?;

    let (comparison, _) = compare(&before.gray, &after.gray, config)?;
    Ok(comparison.squares)
}

/// Decode two encoded captures (PNG, JPEG, BMP, WebP) and [`diff`] them.
///
/// # Errors
///
/// Returns [`DiffError::EmptyInput`] or [`DiffError::ImageDecode`]
/// naming the capture that could not be decoded, plus every error
/// [`diff`] can return.
pub fn diff_encoded(
    before: &[u8],
    after: &[u8],
    config: &DiffConfig,
) -> Result<Vec<Square>, DiffError> {
    config.validate()?;
    let before = decode::decode_frame(before, FrameRole::Before)?;
    let after = decode::decode_frame(after, FrameRole::After)?;
    diff(&before, &after, config)
}

/// Run the same computation as [`diff`], keeping every intermediate
/// image and per-stage diagnostics.
///
/// # Errors
///
/// Same as [`diff`].
pub fn diff_staged(
    before: &RgbImage,
    after: &RgbImage,
    config: &DiffConfig,
) -> Result<StagedDiff, DiffError> {
    config.validate()?;
    let started = Instant::now();

    let (before, before_diagnostics) = run_frame(before, FrameRole::Before, config)?;
    let (after, after_diagnostics) = run_frame(after, FrameRole::After, config)?;
    let (comparison, comparison_diagnostics) =
        compare(&before.board.gray, &after.board.gray, config)?;

    let total_duration = started.elapsed();
    let summary = DiffSummary {
        frame_width: before.oriented.width(),
        frame_height: before.oriented.height(),
        board_width: before.board.gray.width(),
        board_height: before.board.gray.height(),
        region_count: comparison.regions.len(),
        square_count: comparison.squares.len(),
    };
    log::debug!(
        "diff finished in {:.3}ms: {} regions",
        total_duration.as_secs_f64() * 1000.0,
        summary.region_count
    );

    Ok(StagedDiff {
        before,
        after,
        comparison,
        diagnostics: DiffDiagnostics {
            before: before_diagnostics,
            after: after_diagnostics,
            comparison: comparison_diagnostics,
            total_duration,
            summary,
        },
    })
}

/// Compare two already-normalized grayscale boards (stages 6-9).
///
/// # Errors
///
/// Returns [`DiffError::InvalidConfig`] for an unusable configuration,
/// [`DiffError::DimensionMismatch`] when the boards differ in size, and
/// [`DiffError::CellOutOfRange`] if a change maps off the board.
pub fn compare_boards(
    before: &GrayImage,
    after: &GrayImage,
    config: &DiffConfig,
) -> Result<BoardComparison, DiffError> {
    config.validate()?;
    compare(before, after, config).map(|(comparison, _)| comparison)
}

/// Like [`compare_boards`], returning just the changed squares.
///
/// # Errors
///
/// Same as [`compare_boards`].
pub fn diff_boards(
    before: &GrayImage,
    after: &GrayImage,
    config: &DiffConfig,
) -> Result<Vec<Square>, DiffError> {
    compare_boards(before, after, config).map(|comparison| comparison.squares)
}

impl FramePair {
    /// [`diff`] the pair.
    ///
    /// # Errors
    ///
    /// Same as [`diff`].
    pub fn diff(&self, config: &DiffConfig) -> Result<Vec<Square>, DiffError> {
        diff(&self.before, &self.after, config)
    }

    /// [`diff_staged`] the pair.
    ///
    /// # Errors
    ///
    /// Same as [`diff`].
    pub fn diff_staged(&self, config: &DiffConfig) -> Result<StagedDiff, DiffError> {
        diff_staged(&self.before, &self.after, config)
    }
}

/// Stages 1-5 on one capture, keeping only the normalized board.
fn normalize_frame(
    frame: &RgbImage,
    role: FrameRole,
    config: &DiffConfig,
) -> Result<NormalizedBoard, DiffError> {
    Ok(FramePipeline::new(frame, role, config)
        .orient()
        .detect_border_color()
        .locate_border()?
        .rectify()?
        .normalize()
        .into_board())
}

/// Stages 1-5 on one capture, timing each.
fn run_frame(
    frame: &RgbImage,
    role: FrameRole,
    config: &DiffConfig,
) -> Result<(FrameResult, FrameDiagnostics), DiffError> {
    let t = Instant::now();
    let oriented = FramePipeline::new(frame, role, config).orient();
    let orient = record(t, &oriented);

    let t = Instant::now();
    let masked = oriented.detect_border_color();
    let color_mask = record(t, &masked);

    let t = Instant::now();
    let located = masked.locate_border()?;
    let border = record(t, &located);

    let t = Instant::now();
    let rectified = located.rectify()?;
    let rectify = record(t, &rectified);

    let t = Instant::now();
    let normalized = rectified.normalize();
    let normalize = record(t, &normalized);

    Ok((
        normalized.into_result(),
        FrameDiagnostics {
            orient,
            color_mask,
            border,
            rectify,
            normalize,
        },
    ))
}

fn record<S: MeasuredStage>(started: Instant, stage: &S) -> StageDiagnostics {
    StageDiagnostics::since(started, stage.metrics())
}

/// Stages 6-9 on a pair of normalized boards, timing each.
fn compare(
    before: &GrayImage,
    after: &GrayImage,
    config: &DiffConfig,
) -> Result<(BoardComparison, ComparisonDiagnostics), DiffError> {
    let t = Instant::now();
    let maps = change::detect_changes(before, after, config)?;
    let changed_pixel_count = color::count_foreground(&maps.mask);
    let sigma = if config.blur_kernel_size > 1 {
        blur::sigma_for_kernel(config.blur_kernel_size)
    } else {
        0.0
    };
    let change_detection = StageDiagnostics::since(
        t,
        StageMetrics::ChangeDetection {
            sigma,
            threshold: config.diff_threshold,
            changed_pixel_count,
            total_pixel_count: u64::from(maps.mask.width()) * u64::from(maps.mask.height()),
        },
    );
    log::debug!("{changed_pixel_count} changed pixels");

    let t = Instant::now();
    let extraction = cluster::extract_regions(&maps.mask, config.min_region_area);
    let clustering = StageDiagnostics::since(
        t,
        StageMetrics::Clustering {
            min_area: config.min_region_area,
            region_count: extraction.regions.len(),
            rejected_count: extraction.rejected,
        },
    );
    log::debug!(
        "{} change regions kept, {} rejected",
        extraction.regions.len(),
        extraction.rejected
    );

    let t = Instant::now();
    let board = Dimensions::of(&maps.mask);
    let cells: Vec<Cell> = extraction
        .regions
        .iter()
        .map(|region| grid::cell_for(region.centroid, board))
        .collect();
    let squares = notation::encode_cells(&cells)?;
    let grid_mapping = StageDiagnostics::since(
        t,
        StageMetrics::GridMapping {
            squares: squares.clone(),
        },
    );

    Ok((
        BoardComparison {
            difference: maps.difference,
            change_mask: maps.mask,
            regions: extraction.regions,
            rejected_regions: extraction.rejected,
            cells,
            squares,
        },
        ComparisonDiagnostics {
            change_detection,
            clustering,
            grid_mapping,
        },
    ))
}
