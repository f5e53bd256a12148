// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page quadrilateral detection from outer contours.

use imageproc::geometry::approximate_polygon_dp;
use imageproc::point::Point;
use tracing::{debug, instrument};

use super::edges::Contour;

/// Four vertices of a detected page outline, in contour order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quadrilateral {
    pub vertices: [Point<i32>; 4],
}

/// Picks the page outline out of a set of contours.
///
/// Contours are walked from longest to shortest perimeter. Anything at least
/// as long as the frame's own perimeter is the frame border and is skipped.
/// Each remaining contour is simplified with a tolerance of
/// `epsilon_ratio * perimeter`; the first one that reduces to exactly four
/// vertices is the page.
#[derive(Debug, Clone, Copy)]
pub struct QuadrilateralDetector {
    epsilon_ratio: f64,
}

impl Default for QuadrilateralDetector {
    fn default() -> Self {
        Self::new(0.02)
    }
}

impl QuadrilateralDetector {
    pub fn new(epsilon_ratio: f64) -> Self {
        Self { epsilon_ratio }
    }

    #[instrument(skip(self, contours), fields(contour_count = contours.len()))]
    pub fn detect(
        &self,
        contours: &[Contour],
        frame_width: u32,
        frame_height: u32,
    ) -> Option<Quadrilateral> {
        let frame_perimeter = 2.0 * (f64::from(frame_width) + f64::from(frame_height));

        let mut ranked: Vec<(f64, &Contour)> =
            contours.iter().map(|c| (c.perimeter(), c)).collect();
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

        for (perimeter, contour) in ranked {
            if perimeter >= frame_perimeter {
                debug!(perimeter, frame_perimeter, "Skipping frame border contour");
                continue;
            }
            let polygon = approximate_closed(&contour.points, self.epsilon_ratio * perimeter);
            if let [a, b, c, d] = polygon[..] {
                debug!(perimeter, "Quadrilateral found");
                return Some(Quadrilateral {
                    vertices: [a, b, c, d],
                });
            }
        }
        None
    }
}

/// Douglas-Peucker simplification of a closed polygon.
///
/// `approximate_polygon_dp` always keeps the first point of the curve it is
/// given, and in closed mode drops the last. Contours here list each corner
/// once, so the ring is cut at two far-apart anchors (the point farthest from
/// the first vertex, then the point farthest from that one) and both open
/// arcs are simplified separately.
fn approximate_closed(points: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    if points.len() < 3 || epsilon <= 0.0 {
        return points.to_vec();
    }

    let first = farthest_from(points, points[0]);
    let second = farthest_from(points, points[first]);
    if first == second {
        return vec![points[first]];
    }
    let (start, split) = (first.min(second), first.max(second));

    // Rotate so the ring starts at one anchor and closes back on it.
    let ring: Vec<Point<i32>> = points[start..].iter().chain(&points[..=start]).copied().collect();
    let split = split - start;

    let mut result = approximate_polygon_dp(&ring[..=split], epsilon, false);
    let tail = approximate_polygon_dp(&ring[split..], epsilon, false);
    result.extend_from_slice(&tail[1..tail.len() - 1]);
    result
}

fn farthest_from(points: &[Point<i32>], origin: Point<i32>) -> usize {
    let mut best = 0;
    let mut best_dist = -1i64;
    for (i, p) in points.iter().enumerate() {
        let dx = i64::from(p.x - origin.x);
        let dy = i64::from(p.y - origin.y);
        let dist = dx * dx + dy * dy;
        if dist > best_dist {
            best_dist = dist;
            best = i;
        }
    }
    best
}
