// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective rectification of the detected page into an upright image.

use image::{Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use imageproc::point::Point;
use malwerk_core::error::{MalwerkError, Result};
use tracing::{debug, instrument, warn};

use super::corners::OrderedCorners;
use crate::scope::{ResourceScope, Tracked};

/// Fill colour for output pixels that fall outside the captured frame.
const PAPER_WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Twice the smallest triangle area (in square pixels) any three corners may span.
const MIN_TRIANGLE_AREA2: i64 = 2;

/// How far (in pixels) a solved transform may miss a destination corner.
const CORNER_TOLERANCE: f32 = 0.5;

/// Warps the page quadrilateral onto an axis-aligned `width` x `height` image.
#[derive(Debug, Default, Clone, Copy)]
pub struct PerspectiveRectifier;

impl PerspectiveRectifier {
    /// Projection taking `[nw, ne, se, sw]` onto `[(0,0), (w,0), (w,h), (0,h)]`.
    ///
    /// `DegenerateRectification` when a dimension is zero, when three corners
    /// are (nearly) collinear, or when no transform hits all four targets.
    pub fn homography(&self, corners: &OrderedCorners, size: (u32, u32)) -> Result<Projection> {
        let (width, height) = size;
        let degenerate = MalwerkError::DegenerateRectification { width, height };
        if width == 0 || height == 0 {
            return Err(degenerate);
        }

        let clockwise = corners.clockwise();
        if has_collinear_triple(&clockwise) {
            warn!(?corners, "Page corners are collinear");
            return Err(degenerate);
        }

        let src = clockwise.map(|p| (p.x as f32, p.y as f32));
        let (w, h) = (width as f32, height as f32);
        let dst = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];

        let projection = Projection::from_control_points(src, dst).ok_or(degenerate)?;
        let exact = src.iter().zip(dst).all(|(&s, d)| {
            let (x, y) = projection * s;
            (x - d.0).abs() <= CORNER_TOLERANCE && (y - d.1).abs() <= CORNER_TOLERANCE
        });
        if exact {
            Ok(projection)
        } else {
            Err(MalwerkError::DegenerateRectification { width, height })
        }
    }

    /// Resample `frame` through the inverse of the page homography.
    #[instrument(skip(self, scope, frame, corners), fields(width = size.0, height = size.1))]
    pub fn rectify(
        &self,
        scope: &ResourceScope,
        frame: &RgbaImage,
        corners: &OrderedCorners,
        size: (u32, u32),
    ) -> Result<(Tracked<RgbaImage>, Projection)> {
        let projection = scope.track(self.homography(corners, size)?);

        let mut page = scope.track(RgbaImage::new(size.0, size.1));
        warp_into(frame, &projection, Interpolation::Bilinear, PAPER_WHITE, &mut *page);
        debug!(?projection, "Page warped");

        Ok((page, projection.into_inner()))
    }
}

fn has_collinear_triple(points: &[Point<i32>; 4]) -> bool {
    const TRIPLES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
    TRIPLES.iter().any(|&[i, j, k]| {
        let (a, b, c) = (points[i], points[j], points[k]);
        let cross = i64::from(b.x - a.x) * i64::from(c.y - a.y)
            - i64::from(b.y - a.y) * i64::from(c.x - a.x);
        cross.abs() < MIN_TRIANGLE_AREA2
    })
}
