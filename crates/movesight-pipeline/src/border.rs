//! Border location: find the quadrilateral framing the board.
//!
//! Every external contour of the color mask is approximated with a
//! polygon at a tolerance proportional to its own perimeter. Only
//! approximations with exactly four vertices are candidates; the one
//! enclosing the largest area wins. Smaller quadrilaterals and
//! non-quadrilateral blobs (stray red objects, sensor noise) are
//! ignored rather than merged.

use crate::config::DiffConfig;
use crate::contour::{external_contours, polygon_area};
use crate::simplify::{approximate_polygon, arc_length};
use crate::types::{DiffError, FrameRole, GrayImage, Point};

/// The winning border quadrilateral, vertices still unordered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderCandidate {
    /// Vertices in contour order.
    pub vertices: [Point; 4],
    /// Area enclosed by the approximated polygon.
    pub area: f64,
}

/// Outcome of scanning a color mask for border candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct BorderSearch {
    /// External contours examined.
    pub contours: usize,
    /// How many of them approximated to exactly four vertices.
    pub quadrilaterals: usize,
    /// Largest qualifying quadrilateral, if any.
    pub best: Option<BorderCandidate>,
}

/// Scan `mask` for four-sided contours.
///
/// A candidate must enclose strictly more than `min_area`.
#[must_use]
pub fn search_border(mask: &GrayImage, epsilon_factor: f64, min_area: f64) -> BorderSearch {
    let contours = external_contours(mask);

    let mut quadrilaterals = 0;
    let mut best: Option<BorderCandidate> = None;
    let mut best_area = min_area;

    for contour in &contours {
        let points = contour.points();
        let epsilon = epsilon_factor * arc_length(points, true);
        if epsilon <= 0.0 {
            continue;
        }

        let approx = approximate_polygon(points, epsilon);
        let Ok(vertices) = <[Point; 4]>::try_from(approx.points()) else {
            continue;
        };
        quadrilaterals += 1;

        let area = polygon_area(&vertices);
        if area > best_area {
            best_area = area;
            best = Some(BorderCandidate { vertices, area });
        }
    }

    BorderSearch {
        contours: contours.len(),
        quadrilaterals,
        best,
    }
}

/// Locate the board border in one frame's color mask.
///
/// Returns the winning candidate along with the search counts.
///
/// # Errors
///
/// Returns [`DiffError::BorderNotFound`] naming `frame` when no
/// four-vertex contour of sufficient area exists.
pub fn locate_border(
    mask: &GrayImage,
    config: &DiffConfig,
    frame: FrameRole,
) -> Result<(BorderCandidate, BorderSearch), DiffError> {
    let search = search_border(mask, config.approx_epsilon_factor, config.min_border_area);
    log::debug!(
        "{frame}: {} external contours, {} quadrilaterals",
        search.contours,
        search.quadrilaterals
    );

    let candidate = search.require(frame)?;
    Ok((candidate, search))
}

impl BorderSearch {
    /// The winning candidate, or [`DiffError::BorderNotFound`] naming
    /// `frame` when the scan found none.
    ///
    /// # Errors
    ///
    /// Fails when no qualifying quadrilateral was found.
    pub fn require(&self, frame: FrameRole) -> Result<BorderCandidate, DiffError> {
        self.best.ok_or_else(|| {
            log::warn!("{frame}: no board border among {} contours", self.contours);
            DiffError::BorderNotFound {
                frame,
                contours: self.contours,
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_polygon_mut};
    use imageproc::point::Point as IPoint;
    use imageproc::rect::Rect;

    const WHITE: image::Luma<u8> = image::Luma([255]);

    /// A 40 px thick square ring from (50,50) to (349,349).
    fn ring_mask() -> GrayImage {
        let mut mask = GrayImage::new(400, 400);
        draw_filled_rect_mut(&mut mask, Rect::at(50, 50).of_size(300, 300), WHITE);
        draw_filled_rect_mut(&mut mask, Rect::at(90, 90).of_size(220, 220), image::Luma([0]));
        mask
    }

    fn add_noise(mask: &mut GrayImage) {
        draw_filled_circle_mut(mask, (20, 370), 12, WHITE);
        draw_filled_circle_mut(mask, (375, 25), 10, WHITE);
        draw_polygon_mut(
            mask,
            &[IPoint::new(360, 360), IPoint::new(395, 360), IPoint::new(378, 392)],
            WHITE,
        );
    }

    fn sorted(mut pts: Vec<Point>) -> Vec<Point> {
        pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
        pts
    }

    #[test]
    fn finds_ring_corners() {
        let (candidate, search) =
            locate_border(&ring_mask(), &DiffConfig::default(), FrameRole::Before).unwrap();
        assert_eq!(search.contours, 1);
        assert_eq!(search.best, Some(candidate));
        assert_eq!(
            sorted(candidate.vertices.to_vec()),
            vec![
                Point::new(50.0, 50.0),
                Point::new(50.0, 349.0),
                Point::new(349.0, 50.0),
                Point::new(349.0, 349.0),
            ]
        );
        assert!((candidate.area - 299.0 * 299.0).abs() < 1e-9);
    }

    #[test]
    fn noise_blobs_are_ignored_not_merged() {
        let mut mask = ring_mask();
        add_noise(&mut mask);

        let search = search_border(&mask, 0.02, 0.0);
        assert_eq!(search.contours, 4);
        let best = search.best.unwrap();
        assert!((best.area - 299.0 * 299.0).abs() < 1e-9);
    }

    #[test]
    fn largest_quadrilateral_wins() {
        let mut mask = ring_mask();
        draw_filled_rect_mut(&mut mask, Rect::at(360, 10).of_size(30, 30), WHITE);

        let search = search_border(&mask, 0.02, 0.0);
        assert_eq!(search.quadrilaterals, 2);
        assert!((search.best.unwrap().area - 299.0 * 299.0).abs() < 1e-9);
    }

    #[test]
    fn empty_mask_reports_border_not_found() {
        let err = locate_border(
            &GrayImage::new(100, 100),
            &DiffConfig::default(),
            FrameRole::After,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DiffError::BorderNotFound {
                frame: FrameRole::After,
                contours: 0
            }
        ));
    }

    #[test]
    fn mask_without_quadrilaterals_reports_border_not_found() {
        let mut mask = GrayImage::new(400, 400);
        add_noise(&mut mask);
        draw_filled_circle_mut(&mut mask, (200, 200), 80, WHITE);

        let err = locate_border(&mask, &DiffConfig::default(), FrameRole::Before).unwrap_err();
        assert!(matches!(
            err,
            DiffError::BorderNotFound {
                frame: FrameRole::Before,
                contours: 4
            }
        ));
    }

    #[test]
    fn min_area_rejects_small_quadrilaterals() {
        let mut mask = GrayImage::new(100, 100);
        draw_filled_rect_mut(&mut mask, Rect::at(10, 10).of_size(20, 20), WHITE);

        let config = DiffConfig {
            min_border_area: 1000.0,
            ..DiffConfig::default()
        };
        assert!(locate_border(&mask, &config, FrameRole::Before).is_err());

        let config = DiffConfig {
            min_border_area: 100.0,
            ..DiffConfig::default()
        };
        assert!(locate_border(&mask, &config, FrameRole::Before).is_ok());
    }
}
