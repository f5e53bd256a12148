// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Edge map and outer-contour extraction.

use image::{GrayImage, RgbaImage};
use imageproc::contours::{BorderType, find_contours};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometry::arc_length;
use imageproc::morphology::dilate;
use imageproc::point::Point;
use malwerk_core::config::EdgeParams;
use tracing::{debug, instrument};

use crate::scope::{ResourceScope, Tracked};

/// A closed polygon tracing the outer border of a connected edge region.
///
/// Only the points where the border changes direction are kept; the
/// straight runs between them are implied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    pub points: Vec<Point<i32>>,
}

impl Contour {
    pub fn new(points: Vec<Point<i32>>) -> Self {
        Self { points }
    }

    /// Closed perimeter length in pixels.
    pub fn perimeter(&self) -> f64 {
        if self.points.len() < 2 {
            return 0.0;
        }
        arc_length(&self.points, true)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Result of the extraction stage: the binary edge map (kept for
/// diagnostics) and the outer contours found in it.
pub struct EdgeExtraction {
    pub edges: Tracked<GrayImage>,
    pub contours: Tracked<Vec<Contour>>,
}

/// Converts a colour frame into a binary edge map and its outer contours.
#[derive(Debug, Clone, Copy)]
pub struct EdgeContourExtractor {
    params: EdgeParams,
}

impl EdgeContourExtractor {
    pub fn new(params: EdgeParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &EdgeParams {
        &self.params
    }

    /// Grayscale, blur, Canny, optional dilation.
    #[instrument(skip_all, fields(width = frame.width(), height = frame.height()))]
    pub fn edge_map(&self, scope: &ResourceScope, frame: &RgbaImage) -> Tracked<GrayImage> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return scope.track(GrayImage::new(width, height));
        }

        let gray = scope.track(image::imageops::grayscale(frame));
        let blurred = scope.track(gaussian_blur_f32(&*gray, self.params.blur_sigma));
        drop(gray);

        let edges = scope.track(canny(
            &blurred,
            self.params.low_threshold,
            self.params.high_threshold,
        ));
        drop(blurred);

        if self.params.dilate_radius == 0 {
            return edges;
        }
        let dilated = scope.track(dilate(&edges, Norm::LInf, self.params.dilate_radius));
        debug!(radius = self.params.dilate_radius, "Edge map dilated");
        dilated
    }

    /// Outer contours of the foreground regions of `edges`.
    pub fn outer_contours(&self, scope: &ResourceScope, edges: &GrayImage) -> Tracked<Vec<Contour>> {
        if edges.width() == 0 || edges.height() == 0 {
            return scope.track(Vec::new());
        }

        let contours: Vec<Contour> = find_contours::<i32>(edges)
            .into_iter()
            .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
            .map(|c| Contour::new(compress_chain(&c.points)))
            .filter(|c| !c.is_empty())
            .collect();

        debug!(contour_count = contours.len(), "Outer contours extracted");
        scope.track(contours)
    }

    /// Run the whole extraction stage on a captured frame.
    ///
    /// A zero-area or edge-free frame yields an empty contour set.
    pub fn extract(&self, scope: &ResourceScope, frame: &RgbaImage) -> EdgeExtraction {
        let edges = self.edge_map(scope, frame);
        let contours = self.outer_contours(scope, &edges);
        EdgeExtraction { edges, contours }
    }
}

/// Drop the interior points of straight runs in a closed border chain.
fn compress_chain(points: &[Point<i32>]) -> Vec<Point<i32>> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let step = |from: Point<i32>, to: Point<i32>| ((to.x - from.x).signum(), (to.y - from.y).signum());

    let kept: Vec<Point<i32>> = (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            step(prev, points[i]) != step(points[i], next)
        })
        .map(|i| points[i])
        .collect();

    if kept.is_empty() { points.to_vec() } else { kept }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::ResourceLedger;
    use image::Rgba;

    fn page_frame(w: u32, h: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| {
            if (x0..x1).contains(&x) && (y0..y1).contains(&y) {
                Rgba([240, 240, 235, 255])
            } else {
                Rgba([35, 30, 40, 255])
            }
        })
    }

    #[test]
    fn compress_chain_keeps_only_corners() {
        let mut square = Vec::new();
        for x in 0..5 {
            square.push(Point::new(x, 0));
        }
        for y in 1..5 {
            square.push(Point::new(4, y));
        }
        for x in (0..4).rev() {
            square.push(Point::new(x, 4));
        }
        for y in (1..4).rev() {
            square.push(Point::new(0, y));
        }

        let compressed = compress_chain(&square);
        assert_eq!(
            compressed,
            vec![
                Point::new(0, 0),
                Point::new(4, 0),
                Point::new(4, 4),
                Point::new(0, 4)
            ]
        );
    }

    #[test]
    fn compressed_perimeter_matches_chain() {
        let contour = Contour::new(vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 5),
            Point::new(0, 5),
        ]);
        assert!((contour.perimeter() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn blank_frame_has_no_contours() {
        let ledger = ResourceLedger::new();
        let scope = ResourceScope::new(&ledger, "blank");
        let frame = RgbaImage::from_pixel(160, 120, Rgba([180, 180, 180, 255]));

        let extraction = EdgeContourExtractor::new(EdgeParams::default()).extract(&scope, &frame);
        assert!(extraction.contours.is_empty());
        assert!(extraction.edges.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn zero_area_frame_is_empty() {
        let ledger = ResourceLedger::new();
        let scope = ResourceScope::new(&ledger, "empty");
        let extraction =
            EdgeContourExtractor::new(EdgeParams::default()).extract(&scope, &RgbaImage::new(0, 0));
        assert!(extraction.contours.is_empty());
    }

    #[test]
    fn page_outline_is_longest_contour() {
        let ledger = ResourceLedger::new();
        let scope = ResourceScope::new(&ledger, "page");
        let frame = page_frame(200, 160, 40, 30, 160, 130);

        let extraction = EdgeContourExtractor::new(EdgeParams::default()).extract(&scope, &frame);
        let longest = extraction
            .contours
            .iter()
            .map(Contour::perimeter)
            .fold(0.0f64, f64::max);

        // Page outline is 2 * (120 + 100) = 440 px; the dilated band sits a
        // couple of pixels outside it.
        assert!(
            (400.0..500.0).contains(&longest),
            "unexpected outline perimeter {longest}"
        );
    }

    #[test]
    fn intermediates_are_released() {
        let ledger = ResourceLedger::new();
        {
            let scope = ResourceScope::new(&ledger, "release");
            let frame = page_frame(120, 100, 20, 20, 100, 80);
            let extraction =
                EdgeContourExtractor::new(EdgeParams::default()).extract(&scope, &frame);
            assert_eq!(ledger.live(), 2, "only edges and contours outlive the stage");
            drop(extraction);
        }
        assert!(ledger.is_balanced());
        assert_eq!(ledger.allocated(), 5);
    }
}
