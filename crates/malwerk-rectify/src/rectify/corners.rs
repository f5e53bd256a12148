// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Corner role assignment for a detected page quadrilateral.
//
// The four vertices are split by x into a west and an east pair, and y decides
// the role inside each pair. No angles are computed. For a page rotated close
// to 45 or 135 degrees the west pair flips between two sides under a few
// pixels of change, so every role shifts by a quarter turn and the page comes
// out rotated by 90 degrees. The bounding size used as the output size also
// assumes a roughly axis-aligned capture; heavily skewed pages rectify with a
// distorted aspect ratio. Both behaviours are kept as is.

use imageproc::point::Point;
use malwerk_core::types::CornerRole;

/// Page corners keyed by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderedCorners {
    pub nw: Point<i32>,
    pub ne: Point<i32>,
    pub se: Point<i32>,
    pub sw: Point<i32>,
}

impl OrderedCorners {
    fn get(&self, role: CornerRole) -> Point<i32> {
        match role {
            CornerRole::NorthWest => self.nw,
            CornerRole::NorthEast => self.ne,
            CornerRole::SouthEast => self.se,
            CornerRole::SouthWest => self.sw,
        }
    }

    /// Corners in `[nw, ne, se, sw]` order.
    pub fn clockwise(&self) -> [Point<i32>; 4] {
        CornerRole::CLOCKWISE.map(|role| self.get(role))
    }

    /// Axis-aligned extent of the corners: `(max_x - min_x, max_y - min_y)`.
    pub fn bounding_size(&self) -> (u32, u32) {
        let pts = self.clockwise();
        let (mut min_x, mut max_x) = (i32::MAX, i32::MIN);
        let (mut min_y, mut max_y) = (i32::MAX, i32::MIN);
        for p in pts {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }
        (max_x.abs_diff(min_x), max_y.abs_diff(min_y))
    }
}

/// Assigns NW/NE/SE/SW roles to four unordered points.
#[derive(Debug, Default, Clone, Copy)]
pub struct CornerOrderer;

impl CornerOrderer {
    pub fn order(&self, points: [Point<i32>; 4]) -> OrderedCorners {
        let mut sorted = points;
        // Ties on x are broken by y so the result does not depend on input order.
        sorted.sort_by_key(|p| (p.x, p.y));

        let (w0, w1) = (sorted[0], sorted[1]);
        let (e0, e1) = (sorted[2], sorted[3]);

        let (nw, sw) = if w0.y <= w1.y { (w0, w1) } else { (w1, w0) };
        let (ne, se) = if e1.y >= e0.y { (e0, e1) } else { (e1, e0) };

        OrderedCorners { nw, ne, se, sw }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn permutations(points: [Point<i32>; 4]) -> Vec<[Point<i32>; 4]> {
        let mut out = Vec::new();
        for a in 0..4 {
            for b in 0..4 {
                for c in 0..4 {
                    for d in 0..4 {
                        let idx = [a, b, c, d];
                        let mut seen = [false; 4];
                        if idx.iter().all(|&i| !std::mem::replace(&mut seen[i], true)) {
                            out.push(idx.map(|i| points[i]));
                        }
                    }
                }
            }
        }
        out
    }

    #[test]
    fn axis_aligned_rectangle() {
        let corners = CornerOrderer.order([
            Point::new(300, 40),
            Point::new(20, 220),
            Point::new(20, 40),
            Point::new(300, 220),
        ]);
        assert_eq!(corners.nw, Point::new(20, 40));
        assert_eq!(corners.ne, Point::new(300, 40));
        assert_eq!(corners.se, Point::new(300, 220));
        assert_eq!(corners.sw, Point::new(20, 220));
        assert_eq!(corners.bounding_size(), (280, 180));
    }

    #[test]
    fn ordering_ignores_input_permutation() {
        let quads = [
            [Point::new(30, 20), Point::new(210, 35), Point::new(200, 170), Point::new(25, 160)],
            [Point::new(60, 10), Point::new(250, 60), Point::new(215, 230), Point::new(30, 190)],
            [Point::new(5, 5), Point::new(95, 5), Point::new(95, 60), Point::new(5, 60)],
        ];
        for quad in quads {
            let expected = CornerOrderer.order(quad);
            for perm in permutations(quad) {
                assert_eq!(CornerOrderer.order(perm), expected, "permutation {perm:?}");
            }
        }
    }

    #[test]
    fn slightly_rotated_page_gets_expected_roles() {
        let corners = CornerOrderer.order([
            Point::new(215, 230),
            Point::new(60, 10),
            Point::new(30, 190),
            Point::new(250, 60),
        ]);
        assert_eq!(corners.nw, Point::new(60, 10));
        assert_eq!(corners.ne, Point::new(250, 60));
        assert_eq!(corners.se, Point::new(215, 230));
        assert_eq!(corners.sw, Point::new(30, 190));
        assert_eq!(corners.clockwise()[0], corners.nw);
    }

    #[test]
    fn diamond_near_45_degrees_flips_a_quarter_turn() {
        // Square rotated by about 45 degrees: top, right, bottom, left.
        let top = Point::new(100, 0);
        let right = Point::new(200, 95);
        let left = Point::new(0, 100);

        let a = CornerOrderer.order([top, right, Point::new(105, 200), left]);
        assert_eq!((a.nw, a.ne, a.sw), (top, right, left));

        // Moving the bottom vertex 10 px to the west swaps it into the west pair.
        let bottom = Point::new(95, 200);
        let b = CornerOrderer.order([top, right, bottom, left]);
        assert_eq!(b.nw, left);
        assert_eq!(b.ne, top);
        assert_eq!(b.se, right);
        assert_eq!(b.sw, bottom);
    }
}
