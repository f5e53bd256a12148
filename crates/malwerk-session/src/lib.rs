// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// malwerk-session — Capture orchestration for the Malwerk colouring engine.
//
// Owns the pipeline context (active target, per-model texture slots, recent
// texture cache, counters) and drives capture -> rectify -> bind against the
// collaborator traits from `malwerk-bridge`.

pub mod services;
pub mod state;

pub use services::capture_session::{CaptureOutcome, CaptureSession, PreparedCapture};
pub use services::targets::TargetRegistry;
pub use services::texture_cache::TextureCache;
pub use state::{PipelineContext, Staleness};
