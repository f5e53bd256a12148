// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rectification pipeline — edge/contour extraction, quadrilateral detection,
// corner ordering, homography, and perspective warp.

pub mod corners;
pub mod diagnostics;
pub mod edges;
pub mod perspective;
pub mod pipeline;
pub mod quad;

pub use pipeline::Rectifier;
