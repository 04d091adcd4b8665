//! Closed-polygon approximation using the Ramer-Douglas-Peucker algorithm.
//!
//! Traced contours of the border marker have hundreds of points and
//! ragged edges. Approximating them with a tolerance proportional to
//! their perimeter collapses a roughly rectangular border into exactly
//! four vertices, while blobs and curves keep more (or fewer).

use crate::types::{Point, Polyline};

/// Total length of a polyline, including the closing segment when
/// `closed` is set.
#[must_use]
pub fn arc_length(points: &[Point], closed: bool) -> f64 {
    let open: f64 = points.windows(2).map(|w| w[0].distance(w[1])).sum();
    match (closed, points.first(), points.last()) {
        (true, Some(&first), Some(&last)) if points.len() > 1 => open + last.distance(first),
        _ => open,
    }
}

/// Approximate a closed contour with fewer vertices.
///
/// The contour is split at two mutually distant vertices, each of the
/// two chains between them is simplified with RDP at `epsilon`, and the
/// surviving vertices are returned in the contour's own order. A contour
/// whose points all coincide collapses to a single vertex; contours with
/// fewer than 3 points are returned unchanged.
#[must_use = "returns the approximated polygon"]
pub fn approximate_polygon(points: &[Point], epsilon: f64) -> Polyline {
    let n = points.len();
    if n < 3 {
        return Polyline::new(points.to_vec());
    }

    let a = farthest_from(points, points[0]);
    let b = farthest_from(points, points[a]);
    if a == b || points[a] == points[b] {
        return Polyline::new(vec![points[a]]);
    }

    let mut kept = vec![false; n];
    kept[a] = true;
    kept[b] = true;

    rdp_recurse(points, &chain(a, b, n), epsilon, &mut kept);
    rdp_recurse(points, &chain(b, a, n), epsilon, &mut kept);

    let vertices = points
        .iter()
        .zip(&kept)
        .filter(|&(_, k)| *k)
        .map(|(&p, _)| p)
        .collect();
    Polyline::new(vertices)
}

/// Index of the point farthest from `from` (first occurrence on ties).
fn farthest_from(points: &[Point], from: Point) -> usize {
    let mut best = 0;
    let mut best_dist = -1.0;
    for (i, &p) in points.iter().enumerate() {
        let d = p.distance_squared(from);
        if d > best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

/// Indices from `start` to `end` inclusive, walking forward and wrapping.
fn chain(start: usize, end: usize, n: usize) -> Vec<usize> {
    let len = (end + n - start) % n + 1;
    (0..len).map(|k| (start + k) % n).collect()
}

/// Recursive step of the Ramer-Douglas-Peucker algorithm over a chain of
/// point indices.
///
/// Finds the chain point farthest from the segment joining the chain's
/// endpoints. If that distance exceeds `tolerance`, the point is kept and
/// both sub-chains are processed recursively.
fn rdp_recurse(points: &[Point], chain: &[usize], tolerance: f64, kept: &mut [bool]) {
    if chain.len() < 3 {
        return;
    }

    let start = points[chain[0]];
    let end = points[chain[chain.len() - 1]];

    let mut max_dist = 0.0;
    let mut max_pos = 0;
    for (pos, &idx) in chain.iter().enumerate().take(chain.len() - 1).skip(1) {
        let d = perpendicular_distance(points[idx], start, end);
        if d > max_dist {
            max_dist = d;
            max_pos = pos;
        }
    }

    if max_dist > tolerance {
        kept[chain[max_pos]] = true;
        rdp_recurse(points, &chain[..=max_pos], tolerance, kept);
        rdp_recurse(points, &chain[max_pos..], tolerance, kept);
    }
}

/// Perpendicular distance from point `p` to the line defined by `a` and `b`.
///
/// Uses the formula: |cross(b-a, p-a)| / |b-a|.
/// When `a` and `b` coincide, returns the distance from `p` to `a`.
fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length_sq = dx.mul_add(dx, dy * dy);

    if length_sq == 0.0 {
        return p.distance(a);
    }

    let cross = dx.mul_add(a.y - p.y, -(dy * (a.x - p.x)));
    cross.abs() / length_sq.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Boundary pixels of an axis-aligned rectangle, walked clockwise
    /// from the top-left corner.
    fn rectangle_contour(x0: i32, y0: i32, x1: i32, y1: i32) -> Vec<Point> {
        let mut pts = Vec::new();
        for x in x0..x1 {
            pts.push(Point::new(f64::from(x), f64::from(y0)));
        }
        for y in y0..y1 {
            pts.push(Point::new(f64::from(x1), f64::from(y)));
        }
        for x in ((x0 + 1)..=x1).rev() {
            pts.push(Point::new(f64::from(x), f64::from(y1)));
        }
        for y in ((y0 + 1)..=y1).rev() {
            pts.push(Point::new(f64::from(x0), f64::from(y)));
        }
        pts
    }

    #[test]
    fn arc_length_open_and_closed() {
        let pts = vec![
            Point::new(0.0, 0.0),
            Point::new(3.0, 0.0),
            Point::new(3.0, 4.0),
        ];
        assert!((arc_length(&pts, false) - 7.0).abs() < 1e-9);
        assert!((arc_length(&pts, true) - 12.0).abs() < 1e-9);
    }

    #[test]
    fn arc_length_of_degenerate_inputs_is_zero() {
        assert!(arc_length(&[], true).abs() < f64::EPSILON);
        assert!(arc_length(&[Point::new(1.0, 1.0)], true).abs() < f64::EPSILON);
    }

    #[test]
    fn rectangle_collapses_to_four_corners() {
        let contour = rectangle_contour(10, 20, 110, 80);
        let eps = 0.02 * arc_length(&contour, true);
        let approx = approximate_polygon(&contour, eps);
        assert_eq!(approx.len(), 4, "got {:?}", approx.points());
        for corner in [
            Point::new(10.0, 20.0),
            Point::new(110.0, 20.0),
            Point::new(110.0, 80.0),
            Point::new(10.0, 80.0),
        ] {
            assert!(approx.points().contains(&corner), "missing {corner:?}");
        }
    }

    #[test]
    fn rotated_start_still_yields_four_corners() {
        let mut contour = rectangle_contour(0, 0, 50, 50);
        contour.rotate_left(17);
        let eps = 0.02 * arc_length(&contour, true);
        assert_eq!(approximate_polygon(&contour, eps).len(), 4);
    }

    #[test]
    fn triangle_keeps_three_vertices() {
        let mut contour = Vec::new();
        for i in 0..40 {
            contour.push(Point::new(f64::from(i), 0.0));
        }
        for i in 0..40 {
            contour.push(Point::new(40.0 - f64::from(i) / 2.0, f64::from(i)));
        }
        for i in 0..40 {
            contour.push(Point::new(20.0 - f64::from(i) / 2.0, 40.0 - f64::from(i)));
        }
        let eps = 0.02 * arc_length(&contour, true);
        assert_eq!(approximate_polygon(&contour, eps).len(), 3);
    }

    #[test]
    fn circle_keeps_many_vertices() {
        let contour: Vec<Point> = (0..120)
            .map(|i| {
                let t = f64::from(i) / 120.0 * std::f64::consts::TAU;
                Point::new(30.0f64.mul_add(t.cos(), 50.0), 30.0f64.mul_add(t.sin(), 50.0))
            })
            .collect();
        let eps = 0.02 * arc_length(&contour, true);
        assert!(approximate_polygon(&contour, eps).len() > 4);
    }

    #[test]
    fn coincident_points_collapse_to_one_vertex() {
        let contour = vec![Point::new(2.0, 2.0); 5];
        assert_eq!(approximate_polygon(&contour, 1.0).len(), 1);
    }

    #[test]
    fn short_contours_unchanged() {
        let contour = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)];
        assert_eq!(approximate_polygon(&contour, 1.0).len(), 2);
    }

    #[test]
    fn perpendicular_distance_to_degenerate_line() {
        let d = perpendicular_distance(Point::new(3.0, 4.0), Point::new(0.0, 0.0), Point::new(0.0, 0.0));
        assert!((d - 5.0).abs() < 1e-9);
    }
}
