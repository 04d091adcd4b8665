//! Diff diagnostics: timing and counts for each stage.
//!
//! These diagnostics are permanent instrumentation for tuning thresholds
//! against real captures. Every call to [`diff_staged`](crate::diff_staged)
//! collects them alongside the intermediate images.
//!
//! Durations are measured with the `web-time` crate, which uses
//! `performance.now()` on WASM and `std::time::Instant` on native, and
//! serialized as fractional seconds (`f64`) since `std::time::Duration`
//! does not implement serde traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::mount::Rotation;
use crate::notation::Square;

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from one before/after diff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffDiagnostics {
    /// Stages 1-5 on the "before" capture.
    pub before: FrameDiagnostics,
    /// Stages 1-5 on the "after" capture.
    pub after: FrameDiagnostics,
    /// Stages 6-9 on the pair of normalized boards.
    pub comparison: ComparisonDiagnostics,
    /// Total wall-clock duration of the diff (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: DiffSummary,
}

/// Per-frame stage diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameDiagnostics {
    /// Mounting correction.
    pub orient: StageDiagnostics,
    /// Border color segmentation (and optional mask cleanup).
    pub color_mask: StageDiagnostics,
    /// Border search and corner ordering.
    pub border: StageDiagnostics,
    /// Perspective warp.
    pub rectify: StageDiagnostics,
    /// Margin crop, resize and grayscale conversion.
    pub normalize: StageDiagnostics,
}

/// Pair stage diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonDiagnostics {
    /// Blur, difference, threshold and morphology.
    pub change_detection: StageDiagnostics,
    /// Region extraction.
    pub clustering: StageDiagnostics,
    /// Grid mapping and notation.
    pub grid_mapping: StageDiagnostics,
}

/// Diagnostics for a single stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics (counts, sizes, etc.).
    pub metrics: StageMetrics,
}

impl StageDiagnostics {
    /// Diagnostics for a stage that started at `started`.
    #[must_use]
    pub fn since(started: web_time::Instant, metrics: StageMetrics) -> Self {
        Self {
            duration: started.elapsed(),
            metrics,
        }
    }
}

/// Stage-specific metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Mounting correction metrics.
    Orient {
        /// Rotation applied.
        rotation: Rotation,
        /// Oriented frame width in pixels.
        width: u32,
        /// Oriented frame height in pixels.
        height: u32,
    },
    /// Border color segmentation metrics.
    ColorMask {
        /// Pixels matching the border color.
        mask_pixel_count: u64,
        /// Total pixel count for computing coverage.
        total_pixel_count: u64,
        /// Whether the close/open cleanup ran.
        cleaned: bool,
    },
    /// Border search metrics.
    Border {
        /// External contours examined.
        contour_count: usize,
        /// Contours that approximated to four vertices.
        quadrilateral_count: usize,
        /// Area of the selected border.
        border_area: f64,
    },
    /// Perspective warp metrics.
    Rectify {
        /// Board width in pixels.
        width: u32,
        /// Board height in pixels.
        height: u32,
    },
    /// Crop normalization metrics.
    Normalize {
        /// Width of the region kept after cropping.
        cropped_width: u32,
        /// Height of the region kept after cropping.
        cropped_height: u32,
        /// Width after resizing back.
        width: u32,
        /// Height after resizing back.
        height: u32,
    },
    /// Change detection metrics.
    ChangeDetection {
        /// Gaussian sigma derived from the blur kernel size.
        sigma: f32,
        /// Binarization threshold.
        threshold: u8,
        /// Changed pixels after morphology.
        changed_pixel_count: u64,
        /// Total pixel count.
        total_pixel_count: u64,
    },
    /// Region extraction metrics.
    Clustering {
        /// Minimum region area.
        min_area: f64,
        /// Regions kept.
        region_count: usize,
        /// Regions discarded as noise.
        rejected_count: usize,
    },
    /// Grid mapping metrics.
    GridMapping {
        /// The changed squares, in region order.
        squares: Vec<Square>,
    },
}

/// High-level summary for the whole diff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffSummary {
    /// Width of the "before" capture in pixels.
    pub frame_width: u32,
    /// Height of the "before" capture in pixels.
    pub frame_height: u32,
    /// Normalized board width in pixels.
    pub board_width: u32,
    /// Normalized board height in pixels.
    pub board_height: u32,
    /// Change regions kept.
    pub region_count: usize,
    /// Changed squares reported.
    pub square_count: usize,
}

impl DiffDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Diff Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Frame: {}x{}  |  Board: {}x{}",
            self.summary.frame_width,
            self.summary.frame_height,
            self.summary.board_width,
            self.summary.board_height,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        for (name, diag) in self.stages() {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Regions: {}  |  Squares: {}",
            self.summary.region_count, self.summary.square_count,
        ));

        lines.join("\n")
    }

    /// Every stage in execution order, labelled.
    #[must_use]
    pub fn stages(&self) -> Vec<(&'static str, &StageDiagnostics)> {
        vec![
            ("Before: Orient", &self.before.orient),
            ("Before: Color Mask", &self.before.color_mask),
            ("Before: Border", &self.before.border),
            ("Before: Rectify", &self.before.rectify),
            ("Before: Normalize", &self.before.normalize),
            ("After: Orient", &self.after.orient),
            ("After: Color Mask", &self.after.color_mask),
            ("After: Border", &self.after.border),
            ("After: Rectify", &self.after.rectify),
            ("After: Normalize", &self.after.normalize),
            ("Change Detection", &self.comparison.change_detection),
            ("Clustering", &self.comparison.clustering),
            ("Grid Mapping", &self.comparison.grid_mapping),
        ]
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

#[allow(clippy::cast_precision_loss)]
fn percent(part: u64, total: u64) -> f64 {
    if total > 0 {
        part as f64 / total as f64 * 100.0
    } else {
        0.0
    }
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Orient {
            rotation,
            width,
            height,
        } => format!("{rotation} -> {width}x{height}"),
        StageMetrics::ColorMask {
            mask_pixel_count,
            total_pixel_count,
            cleaned,
        } => {
            let coverage = percent(*mask_pixel_count, *total_pixel_count);
            let cleanup = if *cleaned { " (cleaned)" } else { "" };
            format!("{mask_pixel_count} px ({coverage:.1}%){cleanup}")
        }
        StageMetrics::Border {
            contour_count,
            quadrilateral_count,
            border_area,
        } => format!(
            "{contour_count} contours, {quadrilateral_count} quads, area={border_area:.0}"
        ),
        StageMetrics::Rectify { width, height } => format!("{width}x{height}"),
        StageMetrics::Normalize {
            cropped_width,
            cropped_height,
            width,
            height,
        } => format!("{cropped_width}x{cropped_height} -> {width}x{height}"),
        StageMetrics::ChangeDetection {
            sigma,
            threshold,
            changed_pixel_count,
            total_pixel_count,
        } => {
            let changed = percent(*changed_pixel_count, *total_pixel_count);
            format!(
                "sigma={sigma:.2} threshold={threshold} changed={changed_pixel_count} ({changed:.1}%)"
            )
        }
        StageMetrics::Clustering {
            min_area,
            region_count,
            rejected_count,
        } => format!("min_area={min_area:.0} kept={region_count} rejected={rejected_count}"),
        StageMetrics::GridMapping { squares } => {
            let names: Vec<String> = squares.iter().map(ToString::to_string).collect();
            format!("[{}]", names.join(" "))
        }
    }
}
