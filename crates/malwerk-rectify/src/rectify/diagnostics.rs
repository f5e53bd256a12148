// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Display-only images surfaced when no page could be found.

use image::{GrayImage, RgbaImage};
use malwerk_core::error::MalwerkError;

use crate::raster::{RasterProcessor, fit_pow2};

/// The captured frame and its edge map, both shrunk by a power of two so the
/// longer side fits the configured diagnostic size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostics {
    pub frame: RgbaImage,
    pub edges: GrayImage,
}

impl Diagnostics {
    pub fn new(frame: &RgbaImage, edges: &GrayImage, max_dimension: u32) -> Self {
        Self {
            frame: fit_pow2(frame, max_dimension),
            edges: fit_pow2(edges, max_dimension),
        }
    }

    /// PNG encodings of `(frame, edges)` for a host UI or the CLI.
    pub fn to_png_pair(&self) -> Result<(Vec<u8>, Vec<u8>), MalwerkError> {
        let frame = RasterProcessor::from_dynamic(self.frame.clone().into()).to_png_bytes()?;
        let edges = RasterProcessor::from_dynamic(self.edges.clone().into()).to_png_bytes()?;
        Ok((frame, edges))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgba};

    #[test]
    fn large_frame_is_halved_to_fit() {
        let frame = RgbaImage::from_pixel(1920, 1080, Rgba([90, 90, 90, 255]));
        let edges = GrayImage::from_pixel(1920, 1080, Luma([0]));
        let diagnostics = Diagnostics::new(&frame, &edges, 640);
        assert_eq!(diagnostics.frame.dimensions(), (480, 270));
        assert_eq!(diagnostics.edges.dimensions(), (480, 270));
    }

    #[test]
    fn small_frame_is_untouched() {
        let frame = RgbaImage::from_pixel(320, 240, Rgba([1, 2, 3, 255]));
        let edges = GrayImage::new(320, 240);
        let diagnostics = Diagnostics::new(&frame, &edges, 640);
        assert_eq!(diagnostics.frame, frame);
        let (frame_png, edges_png) = diagnostics.to_png_pair().expect("png");
        assert_eq!(&frame_png[1..4], b"PNG");
        assert_eq!(&edges_png[1..4], b"PNG");
    }
}
