// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster helpers — power-of-two downscaling and texture/diagnostic encoding.

pub mod processor;

pub use processor::{RasterProcessor, encode_texture, fit_pow2, pow2_divisor};
