//! Shared types for the movesight vision pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can reference
/// intermediate raster data without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbImage` so downstream crates can reference captured
/// frames and rectified boards without depending on `image` directly.
pub use image::RgbImage;

/// A 2D point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// A sequence of connected points: a traced contour or its polygon
/// approximation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline(Vec<Point>);

impl Polyline {
    /// Create a new polyline from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the polyline has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the polyline.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Consumes the polyline and returns the underlying vector of points.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.0
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Dimensions of an existing image buffer.
    #[must_use]
    pub fn of<P: image::Pixel>(image: &image::ImageBuffer<P, Vec<P::Subpixel>>) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Four corners of the board border in canonical order.
///
/// Index 0 is top-left, 1 top-right, 2 bottom-right, 3 bottom-left.
/// "Top" and "left" follow the coordinate sum/difference heuristic in
/// [`crate::corners::order_corners`], not a general orientation solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quad([Point; 4]);

impl Quad {
    /// Build a quad from corners already in TL, TR, BR, BL order.
    #[must_use]
    pub const fn new(top_left: Point, top_right: Point, bottom_right: Point, bottom_left: Point) -> Self {
        Self([top_left, top_right, bottom_right, bottom_left])
    }

    /// All four corners in TL, TR, BR, BL order.
    #[must_use]
    pub const fn corners(&self) -> [Point; 4] {
        self.0
    }

    #[must_use]
    pub const fn top_left(&self) -> Point {
        self.0[0]
    }

    #[must_use]
    pub const fn top_right(&self) -> Point {
        self.0[1]
    }

    #[must_use]
    pub const fn bottom_right(&self) -> Point {
        self.0[2]
    }

    #[must_use]
    pub const fn bottom_left(&self) -> Point {
        self.0[3]
    }

    /// Enclosed area (absolute shoelace formula).
    #[must_use]
    pub fn area(&self) -> f64 {
        crate::contour::polygon_area(&self.0)
    }

    /// Whether any two corners coincide.
    ///
    /// Happens when the sum/difference heuristic assigns two roles to the
    /// same vertex, typically under extreme rotation or skew.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        (0..4).any(|i| ((i + 1)..4).any(|j| self.0[i] == self.0[j]))
    }
}

/// One board square as a grid index.
///
/// Row 0 is the far rank and column 0 the leftmost file, both as seen in
/// the normalized board image. Values outside `0..8` are representable so
/// that a centroid falling off the grid can be reported rather than
/// clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// Grid row, top to bottom.
    pub row: u32,
    /// Grid column, left to right.
    pub col: u32,
}

impl Cell {
    #[must_use]
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Whether the cell lies inside the 8x8 board.
    #[must_use]
    pub const fn is_on_board(self) -> bool {
        self.row < 8 && self.col < 8
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(row={}, col={})", self.row, self.col)
    }
}

/// A connected region of the change mask that survived area filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRegion {
    /// Area enclosed by the region's outer contour, in square pixels.
    pub area: f64,
    /// Centroid from first-order moments, truncated to whole pixels.
    pub centroid: (u32, u32),
    /// Outer contour of the region, kept for visualization.
    pub contour: Polyline,
}

/// Which of the two captures an operation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameRole {
    /// The capture taken before the move.
    Before,
    /// The capture taken after the move.
    After,
}

impl fmt::Display for FrameRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Before => f.write_str("before"),
            Self::After => f.write_str("after"),
        }
    }
}

/// The two captures bracketing one move.
///
/// Owned by the caller for the duration of a request; the pipeline keeps
/// no frames between calls.
#[derive(Debug, Clone)]
pub struct FramePair {
    /// Capture taken before the move.
    pub before: RgbImage,
    /// Capture taken after the move.
    pub after: RgbImage,
}

impl FramePair {
    #[must_use]
    pub const fn new(before: RgbImage, after: RgbImage) -> Self {
        Self { before, after }
    }

    /// The capture playing `role`.
    #[must_use]
    pub const fn frame(&self, role: FrameRole) -> &RgbImage {
        match role {
            FrameRole::Before => &self.before,
            FrameRole::After => &self.after,
        }
    }
}

/// Errors that can occur while diffing two captures.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// The encoded image bytes for a frame were empty.
    #[error("{frame} image data is empty")]
    EmptyInput {
        /// Which capture was empty.
        frame: FrameRole,
    },

    /// Failed to decode the encoded image for a frame.
    #[error("failed to decode {frame} image: {source}")]
    ImageDecode {
        /// Which capture failed to decode.
        frame: FrameRole,
        /// Underlying decoder error.
        #[source]
        source: image::ImageError,
    },

    /// No four-sided border of sufficient area was found in a frame.
    ///
    /// The board is not visible, the marker is occluded, or the
    /// lighting washes the border color out.
    #[error("board border not detected in {frame} frame ({contours} contours examined)")]
    BorderNotFound {
        /// Which capture failed.
        frame: FrameRole,
        /// How many external contours of the color mask were examined.
        contours: usize,
    },

    /// The detected border could not be mapped to a square.
    ///
    /// Corner ordering collapsed two corners onto one vertex, so no
    /// perspective transform exists.
    #[error("board border in {frame} frame is too skewed to rectify")]
    DegenerateBorder {
        /// Which capture failed.
        frame: FrameRole,
    },

    /// The normalized before/after boards differ in size.
    #[error("board dimensions differ: before {before}, after {after}")]
    DimensionMismatch {
        /// Size of the normalized "before" board.
        before: Dimensions,
        /// Size of the normalized "after" board.
        after: Dimensions,
    },

    /// A change centroid mapped outside the 8x8 grid.
    #[error("changed region maps outside the board at {cell}")]
    CellOutOfRange {
        /// The offending grid index.
        cell: Cell,
    },

    /// Pipeline configuration is invalid.
    #[error("invalid diff configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance_squared(b) - 25.0).abs() < f64::EPSILON);
        assert!((a.distance(b) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn polyline_accessors() {
        let points = vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)];
        let pl = Polyline::new(points.clone());
        assert_eq!(pl.len(), 2);
        assert!(!pl.is_empty());
        assert_eq!(pl.points(), points.as_slice());
        assert_eq!(pl.into_points(), points);
    }

    #[test]
    fn dimensions_of_image() {
        let img = GrayImage::new(17, 31);
        assert_eq!(
            Dimensions::of(&img),
            Dimensions {
                width: 17,
                height: 31
            }
        );
        assert_eq!(Dimensions::of(&img).to_string(), "17x31");
    }

    #[test]
    fn quad_area_of_axis_aligned_square() {
        let quad = Quad::new(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        );
        assert!((quad.area() - 100.0).abs() < 1e-9);
        assert!(!quad.is_degenerate());
    }

    #[test]
    fn quad_with_repeated_corner_is_degenerate() {
        let p = Point::new(5.0, 5.0);
        let quad = Quad::new(p, Point::new(10.0, 0.0), Point::new(10.0, 10.0), p);
        assert!(quad.is_degenerate());
    }

    #[test]
    fn cell_on_board_bounds() {
        assert!(Cell::new(0, 0).is_on_board());
        assert!(Cell::new(7, 7).is_on_board());
        assert!(!Cell::new(8, 0).is_on_board());
        assert!(!Cell::new(0, 8).is_on_board());
    }

    #[test]
    fn error_messages_name_the_frame() {
        let err = DiffError::BorderNotFound {
            frame: FrameRole::After,
            contours: 3,
        };
        assert_eq!(
            err.to_string(),
            "board border not detected in after frame (3 contours examined)"
        );

        let err = DiffError::DegenerateBorder {
            frame: FrameRole::Before,
        };
        assert_eq!(
            err.to_string(),
            "board border in before frame is too skewed to rectify"
        );
    }

    #[test]
    fn dimension_mismatch_display() {
        let err = DiffError::DimensionMismatch {
            before: Dimensions {
                width: 800,
                height: 800,
            },
            after: Dimensions {
                width: 800,
                height: 799,
            },
        };
        assert_eq!(
            err.to_string(),
            "board dimensions differ: before 800x800, after 800x799"
        );
    }

    #[test]
    fn frame_pair_selects_by_role() {
        let pair = FramePair::new(RgbImage::new(3, 2), RgbImage::new(5, 4));
        assert_eq!(pair.frame(FrameRole::Before).dimensions(), (3, 2));
        assert_eq!(pair.frame(FrameRole::After).dimensions(), (5, 4));
    }

    #[test]
    fn quad_serde_round_trip() {
        let quad = Quad::new(
            Point::new(1.0, 2.0),
            Point::new(30.0, 2.5),
            Point::new(31.0, 40.0),
            Point::new(0.5, 39.0),
        );
        let json = serde_json::to_string(&quad).unwrap();
        let back: Quad = serde_json::from_str(&json).unwrap();
        assert_eq!(quad, back);
    }
}
