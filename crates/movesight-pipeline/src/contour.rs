//! Contour tracing and polygon measurements.
//!
//! Both the border locator and the change-region extractor need the
//! outer boundaries of the connected foreground blobs of a binary mask,
//! ignoring holes and anything nested inside another blob. Tracing is
//! done by `imageproc`'s Suzuki-Abe border following; only top-level
//! outer borders are kept.

use image::GrayImage;
use imageproc::contours::BorderType;

use crate::types::{Point, Polyline};

/// Outer boundaries of the top-level foreground components of `mask`.
///
/// Any non-zero pixel is foreground. Hole borders and components nested
/// inside holes are dropped, so a ring yields one contour (its outside)
/// and a blob sitting inside the ring's hole is not reported.
#[must_use = "returns the traced contours"]
pub fn external_contours(mask: &GrayImage) -> Vec<Polyline> {
    imageproc::contours::find_contours::<u32>(mask)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .map(|c| {
            let points = c
                .points
                .into_iter()
                .map(|p| Point::new(f64::from(p.x), f64::from(p.y)))
                .collect();
            Polyline::new(points)
        })
        .collect()
}

/// Raw spatial moments of a closed polygon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    /// Zeroth moment: enclosed area.
    pub m00: f64,
    /// First moment about the y axis (sum of x).
    pub m10: f64,
    /// First moment about the x axis (sum of y).
    pub m01: f64,
}

impl Moments {
    /// Centroid `(m10 / m00, m01 / m00)`, or `None` for zero-area
    /// polygons.
    #[must_use]
    pub fn centroid(&self) -> Option<Point> {
        if self.m00 == 0.0 {
            return None;
        }
        Some(Point::new(self.m10 / self.m00, self.m01 / self.m00))
    }
}

/// Area enclosed by a closed polygon (absolute shoelace formula).
#[must_use]
pub fn polygon_area(points: &[Point]) -> f64 {
    polygon_moments(points).m00
}

/// Moments of a closed polygon via Green's theorem.
///
/// The sign is normalized so that `m00` is non-negative regardless of
/// the winding direction.
#[must_use]
pub fn polygon_moments(points: &[Point]) -> Moments {
    let n = points.len();
    if n < 3 {
        return Moments {
            m00: 0.0,
            m10: 0.0,
            m01: 0.0,
        };
    }

    let mut a = 0.0;
    let mut mx = 0.0;
    let mut my = 0.0;
    for i in 0..n {
        let p = points[i];
        let q = points[(i + 1) % n];
        let cross = p.x.mul_add(q.y, -(q.x * p.y));
        a += cross;
        mx += (p.x + q.x) * cross;
        my += (p.y + q.y) * cross;
    }

    let sign = if a < 0.0 { -1.0 } else { 1.0 };
    Moments {
        m00: sign * a / 2.0,
        m10: sign * mx / 6.0,
        m01: sign * my / 6.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_rect(img: &mut GrayImage, x0: u32, y0: u32, w: u32, h: u32) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                img.put_pixel(x, y, image::Luma([255]));
            }
        }
    }

    fn square(x0: f64, y0: f64, side: f64) -> Vec<Point> {
        vec![
            Point::new(x0, y0),
            Point::new(x0 + side, y0),
            Point::new(x0 + side, y0 + side),
            Point::new(x0, y0 + side),
        ]
    }

    #[test]
    fn empty_mask_has_no_contours() {
        assert!(external_contours(&GrayImage::new(10, 10)).is_empty());
    }

    #[test]
    fn separate_blobs_give_separate_contours() {
        let mut mask = GrayImage::new(40, 20);
        filled_rect(&mut mask, 2, 2, 10, 10);
        filled_rect(&mut mask, 25, 5, 8, 8);
        assert_eq!(external_contours(&mask).len(), 2);
    }

    #[test]
    fn ring_yields_only_its_outer_border() {
        let mut mask = GrayImage::new(40, 40);
        filled_rect(&mut mask, 5, 5, 30, 30);
        for y in 10..30 {
            for x in 10..30 {
                mask.put_pixel(x, y, image::Luma([0]));
            }
        }
        // A blob inside the hole is nested, not top-level.
        filled_rect(&mut mask, 18, 18, 4, 4);

        let contours = external_contours(&mask);
        assert_eq!(contours.len(), 1);
        let area = polygon_area(contours[0].points());
        assert!((area - 29.0 * 29.0).abs() < 1e-9, "got area {area}");
    }

    #[test]
    fn square_area_is_winding_independent() {
        let cw = square(0.0, 0.0, 10.0);
        let mut ccw = cw.clone();
        ccw.reverse();
        assert!((polygon_area(&cw) - 100.0).abs() < 1e-9);
        assert!((polygon_area(&ccw) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn square_centroid_is_its_center() {
        let m = polygon_moments(&square(20.0, 40.0, 10.0));
        let c = m.centroid();
        assert_eq!(c, Some(Point::new(25.0, 45.0)));
    }

    #[test]
    fn reversed_square_has_same_centroid() {
        let mut pts = square(20.0, 40.0, 10.0);
        pts.reverse();
        let c = polygon_moments(&pts).centroid();
        assert_eq!(c, Some(Point::new(25.0, 45.0)));
    }

    #[test]
    fn degenerate_polygon_has_no_centroid() {
        let line = vec![
            Point::new(0.0, 0.0),
            Point::new(5.0, 0.0),
            Point::new(10.0, 0.0),
        ];
        assert!(polygon_moments(&line).centroid().is_none());
        assert!(polygon_moments(&line[..2]).centroid().is_none());
    }
}
