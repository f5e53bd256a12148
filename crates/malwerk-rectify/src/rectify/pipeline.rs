// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The synchronous rectification run: edges -> quadrilateral -> corners -> warp.

use image::{GrayImage, RgbaImage};
use imageproc::geometric_transformations::Projection;
use malwerk_core::config::PipelineConfig;
use malwerk_core::error::MalwerkError;
use malwerk_core::types::PipelineStage;
use thiserror::Error;
use tracing::{info, instrument, warn};

use super::corners::{CornerOrderer, OrderedCorners};
use super::diagnostics::Diagnostics;
use super::edges::EdgeContourExtractor;
use super::perspective::PerspectiveRectifier;
use super::quad::QuadrilateralDetector;
use crate::scope::ResourceScope;

/// A successfully rectified page.
#[derive(Debug, Clone)]
pub struct Rectification {
    pub image: RgbaImage,
    pub corners: OrderedCorners,
    /// Destination size taken from the corners' bounding box.
    pub size: (u32, u32),
    /// Maps frame coordinates onto the rectified page.
    pub homography: Projection,
}

/// A failed run, with the diagnostic images when a page could not be found
/// or straightened.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct PipelineFailure {
    pub error: MalwerkError,
    pub diagnostics: Option<Diagnostics>,
}

impl PipelineFailure {
    pub fn with_diagnostics(error: MalwerkError, diagnostics: Diagnostics) -> Self {
        Self {
            error,
            diagnostics: Some(diagnostics),
        }
    }
}

impl From<MalwerkError> for PipelineFailure {
    fn from(error: MalwerkError) -> Self {
        Self {
            error,
            diagnostics: None,
        }
    }
}

/// The rectification pipeline, parameterised by a [`PipelineConfig`].
#[derive(Debug, Clone)]
pub struct Rectifier {
    extractor: EdgeContourExtractor,
    detector: QuadrilateralDetector,
    orderer: CornerOrderer,
    warper: PerspectiveRectifier,
    diagnostic_max_dimension: u32,
}

impl Rectifier {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            extractor: EdgeContourExtractor::new(config.edges),
            detector: QuadrilateralDetector::new(config.approx_epsilon_ratio),
            orderer: CornerOrderer,
            warper: PerspectiveRectifier,
            diagnostic_max_dimension: config.diagnostic_max_dimension,
        }
    }

    /// Rectify the page visible in `frame`.
    ///
    /// `on_stage` is told when detection and rectification start. Every
    /// intermediate is registered with `scope` and released before this
    /// returns; only the rectified image leaves the run.
    #[instrument(skip_all, fields(width = frame.width(), height = frame.height()))]
    pub fn run(
        &self,
        scope: &ResourceScope,
        frame: &RgbaImage,
        mut on_stage: impl FnMut(PipelineStage),
    ) -> Result<Rectification, PipelineFailure> {
        on_stage(PipelineStage::Detecting);
        let extraction = self.extractor.extract(scope, frame);

        let Some(quad) = self
            .detector
            .detect(&extraction.contours, frame.width(), frame.height())
        else {
            warn!(
                contour_count = extraction.contours.len(),
                "No page quadrilateral found"
            );
            return Err(self.failure(MalwerkError::NoQuadrilateralFound, frame, &extraction.edges));
        };

        let corners = self.orderer.order(quad.vertices);
        on_stage(PipelineStage::Rectifying);
        self.rectify_corners(scope, frame, &extraction.edges, corners)
    }

    /// Warp the page bounded by `corners`. A degenerate page fails the same
    /// way a missing one does, diagnostics included.
    fn rectify_corners(
        &self,
        scope: &ResourceScope,
        frame: &RgbaImage,
        edges: &GrayImage,
        corners: OrderedCorners,
    ) -> Result<Rectification, PipelineFailure> {
        let size = corners.bounding_size();
        info!(?corners, width = size.0, height = size.1, "Page corners ordered");

        match self.warper.rectify(scope, frame, &corners, size) {
            Ok((page, homography)) => Ok(Rectification {
                image: page.into_inner(),
                corners,
                size,
                homography,
            }),
            Err(error) => {
                warn!(%error, "Page could not be rectified");
                Err(self.failure(error, frame, edges))
            }
        }
    }

    fn failure(&self, error: MalwerkError, frame: &RgbaImage, edges: &GrayImage) -> PipelineFailure {
        let diagnostics = Diagnostics::new(frame, edges, self.diagnostic_max_dimension);
        PipelineFailure::with_diagnostics(error, diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::ResourceLedger;
    use image::Rgba;
    use imageproc::drawing::draw_polygon_mut;
    use imageproc::point::Point;

    const BACKGROUND: Rgba<u8> = Rgba([40, 38, 45, 255]);
    const PAPER: Rgba<u8> = Rgba([238, 236, 228, 255]);

    fn page_on_table(corners: &[Point<i32>]) -> RgbaImage {
        let mut frame = RgbaImage::from_pixel(320, 240, BACKGROUND);
        draw_polygon_mut(&mut frame, corners, PAPER);
        frame
    }

    #[test]
    fn rotated_page_keeps_bounding_aspect() {
        let quad = [
            Point::new(60, 40),
            Point::new(262, 52),
            Point::new(254, 196),
            Point::new(52, 184),
        ];
        let frame = page_on_table(&quad);

        let ledger = ResourceLedger::new();
        let scope = ResourceScope::new(&ledger, "rotated");
        let mut stages = Vec::new();
        let result = Rectifier::new(&PipelineConfig::default())
            .run(&scope, &frame, |s| stages.push(s))
            .expect("page should rectify");

        assert_eq!(stages, vec![PipelineStage::Detecting, PipelineStage::Rectifying]);
        assert_eq!(result.image.dimensions(), result.size);
        let aspect = f64::from(result.size.0) / f64::from(result.size.1);
        assert!((aspect - 210.0 / 156.0).abs() < 0.1, "aspect {aspect:.3}");

        // The middle of the rectified page is paper.
        let centre = result.image.get_pixel(result.size.0 / 2, result.size.1 / 2);
        assert!(centre.0[0] > 200, "centre pixel {centre:?}");
        drop(scope);
        assert!(ledger.is_balanced());
    }

    #[test]
    fn blank_wall_reports_no_page_with_diagnostics() {
        let frame = RgbaImage::from_pixel(1280, 720, Rgba([200, 200, 196, 255]));
        let ledger = ResourceLedger::new();
        let scope = ResourceScope::new(&ledger, "blank");
        let mut stages = Vec::new();
        let failure = Rectifier::new(&PipelineConfig::default())
            .run(&scope, &frame, |s| stages.push(s))
            .expect_err("blank wall has no page");

        assert!(matches!(failure.error, MalwerkError::NoQuadrilateralFound));
        assert_eq!(stages, vec![PipelineStage::Detecting]);
        let diagnostics = failure.diagnostics.expect("diagnostics");
        assert_eq!(diagnostics.frame.dimensions(), (640, 360));
        assert_eq!(diagnostics.edges.dimensions(), (640, 360));
        drop(scope);
        assert!(ledger.is_balanced());
    }

    #[test]
    fn degenerate_page_still_reports_diagnostics() {
        let frame = RgbaImage::from_pixel(1280, 720, BACKGROUND);
        let edges = GrayImage::new(1280, 720);
        let sliver = OrderedCorners {
            nw: Point::new(100, 100),
            ne: Point::new(400, 250),
            se: Point::new(700, 400),
            sw: Point::new(100, 300),
        };
        let ledger = ResourceLedger::new();
        let scope = ResourceScope::new(&ledger, "degenerate");
        let failure = Rectifier::new(&PipelineConfig::default())
            .rectify_corners(&scope, &frame, &edges, sliver)
            .expect_err("three collinear corners cannot be rectified");

        assert!(matches!(
            failure.error,
            MalwerkError::DegenerateRectification { width: 600, height: 300 }
        ));
        let diagnostics = failure.diagnostics.expect("diagnostics");
        assert_eq!(diagnostics.frame.dimensions(), (640, 360));
        assert_eq!(diagnostics.edges.dimensions(), (640, 360));
        drop(scope);
        assert!(ledger.is_balanced());
    }

    #[test]
    fn mixed_runs_leave_ledger_balanced() {
        let page = page_on_table(&[
            Point::new(40, 30),
            Point::new(280, 30),
            Point::new(280, 210),
            Point::new(40, 210),
        ]);
        let blank = RgbaImage::from_pixel(320, 240, BACKGROUND);
        let rectifier = Rectifier::new(&PipelineConfig::default());
        let ledger = ResourceLedger::new();

        for i in 0..6 {
            let scope = ResourceScope::new(&ledger, format!("run-{i}"));
            let frame = if i % 2 == 0 { &page } else { &blank };
            let outcome = rectifier.run(&scope, frame, |_| {});
            assert_eq!(outcome.is_ok(), i % 2 == 0, "run {i}");
            drop(scope);
            assert!(ledger.is_balanced(), "run {i} leaked {}", ledger.live());
        }
        assert!(ledger.allocated() > 0);
    }
}
