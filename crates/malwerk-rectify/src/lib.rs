// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// malwerk-rectify — Page detection and rectification for the Malwerk colouring engine.
//
// Turns a camera frame into an upright image of the colouring page it shows:
// edge map and outer contours, the longest four-cornered contour that is not
// the frame border, corner ordering, homography, and a bilinear warp. Every
// intermediate buffer is accounted for in a per-run `ResourceScope`.

pub mod raster;
pub mod rectify;
pub mod scope;

// Re-export the primary types so callers can use `malwerk_rectify::Rectifier` etc.
pub use raster::processor::{RasterProcessor, encode_texture};
pub use rectify::corners::{CornerOrderer, OrderedCorners};
pub use rectify::diagnostics::Diagnostics;
pub use rectify::edges::{Contour, EdgeContourExtractor, EdgeExtraction};
pub use rectify::perspective::PerspectiveRectifier;
pub use rectify::pipeline::{PipelineFailure, Rectification, Rectifier};
pub use rectify::quad::{QuadrilateralDetector, Quadrilateral};
pub use scope::{ResourceLedger, ResourceScope, Tracked};
