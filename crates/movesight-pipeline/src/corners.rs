//! Canonical ordering of the border's four corners.
//!
//! The border locator returns its vertices in whatever order contour
//! tracing produced them. Rectification needs them as top-left,
//! top-right, bottom-right, bottom-left. The ordering here is a bounded
//! heuristic, not a polygon-orientation solver:
//!
//! - top-left has the smallest `x + y`, bottom-right the largest;
//! - top-right has the smallest `y - x`, bottom-left the largest.
//!
//! This holds while the board is photographed close to fronto-parallel
//! with modest rotation. Near 45 degrees of in-plane rotation two roles
//! land on the same vertex and the resulting [`Quad`] is degenerate
//! (see [`Quad::is_degenerate`]); rectification rejects it. Exact ties
//! go to the first vertex in input order.

use crate::types::{Point, Quad};

/// Order four unordered vertices as TL, TR, BR, BL.
#[must_use]
pub fn order_corners(points: [Point; 4]) -> Quad {
    let sum = |p: &Point| p.x + p.y;
    let diff = |p: &Point| p.y - p.x;

    let top_left = pick(&points, sum, Extreme::Min);
    let bottom_right = pick(&points, sum, Extreme::Max);
    let top_right = pick(&points, diff, Extreme::Min);
    let bottom_left = pick(&points, diff, Extreme::Max);

    Quad::new(top_left, top_right, bottom_right, bottom_left)
}

#[derive(Clone, Copy)]
enum Extreme {
    Min,
    Max,
}

/// The point with the extreme key, first occurrence on ties.
fn pick(points: &[Point; 4], key: impl Fn(&Point) -> f64, extreme: Extreme) -> Point {
    let mut best = points[0];
    let mut best_key = key(&best);
    for p in &points[1..] {
        let k = key(p);
        let better = match extreme {
            Extreme::Min => k < best_key,
            Extreme::Max => k > best_key,
        };
        if better {
            best = *p;
            best_key = k;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skewed_board() -> [Point; 4] {
        [
            Point::new(102.0, 95.0),
            Point::new(810.0, 120.0),
            Point::new(790.0, 830.0),
            Point::new(90.0, 800.0),
        ]
    }

    /// All 24 orderings of four items.
    fn permutations(items: [Point; 4]) -> Vec<[Point; 4]> {
        let mut out = Vec::new();
        for a in 0..4 {
            for b in 0..4 {
                for c in 0..4 {
                    for d in 0..4 {
                        let idx = [a, b, c, d];
                        let distinct = (0..4).all(|i| ((i + 1)..4).all(|j| idx[i] != idx[j]));
                        if distinct {
                            out.push([items[a], items[b], items[c], items[d]]);
                        }
                    }
                }
            }
        }
        out
    }

    #[test]
    fn orders_a_skewed_board() {
        let quad = order_corners(skewed_board());
        assert_eq!(quad.top_left(), Point::new(102.0, 95.0));
        assert_eq!(quad.top_right(), Point::new(810.0, 120.0));
        assert_eq!(quad.bottom_right(), Point::new(790.0, 830.0));
        assert_eq!(quad.bottom_left(), Point::new(90.0, 800.0));
        assert!(!quad.is_degenerate());
    }

    #[test]
    fn every_permutation_gives_the_same_quad() {
        let expected = order_corners(skewed_board());
        let perms = permutations(skewed_board());
        assert_eq!(perms.len(), 24);
        for perm in perms {
            assert_eq!(order_corners(perm), expected, "input order {perm:?}");
        }
    }

    #[test]
    fn diamond_collapses_to_degenerate_quad() {
        // A square rotated 45 degrees: the top vertex takes both the
        // top-left and top-right roles.
        let diamond = [
            Point::new(50.0, 0.0),
            Point::new(100.0, 50.0),
            Point::new(50.0, 100.0),
            Point::new(0.0, 50.0),
        ];
        assert!(order_corners(diamond).is_degenerate());
    }

    #[test]
    fn first_vertex_wins_exact_ties() {
        let diamond = [
            Point::new(50.0, 0.0),
            Point::new(100.0, 50.0),
            Point::new(50.0, 100.0),
            Point::new(0.0, 50.0),
        ];
        // Sums 50 and 50 for (50,0) and (0,50): the first one listed wins.
        assert_eq!(order_corners(diamond).top_left(), Point::new(50.0, 0.0));
    }
}
