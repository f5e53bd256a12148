// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// malwerk-bridge — Collaborator interfaces for the Malwerk colouring engine.
//
// Defines how the engine reaches the camera and the 3D texture binder, and
// ships a stub camera for builds without a native AR shell plus a file-backed
// pair used by the command-line tool.

pub mod file;
pub mod stub;
pub mod traits;

pub use file::{FileTextureSink, StillImageSource};
pub use stub::StubCamera;
pub use traits::{FrameSource, TextureBinder};

use std::sync::Arc;

/// The live camera of the current build target.
///
/// Native AR shells hand their own `FrameSource` to the session directly;
/// everywhere else this is the stub.
pub fn platform_camera() -> Arc<dyn FrameSource> {
    Arc::new(StubCamera)
}
