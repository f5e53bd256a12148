// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub camera for desktop/CI builds where no AR shell supplies frames.

use image::RgbaImage;
use malwerk_core::error::{MalwerkError, Result};
use tracing::warn;

use crate::traits::FrameSource;

/// Camera of a build without a native AR shell. Every frame request fails
/// with `PlatformUnavailable`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubCamera;

impl FrameSource for StubCamera {
    fn current_frame(&self) -> Result<RgbaImage> {
        warn!("FrameSource::current_frame called on stub camera");
        Err(MalwerkError::PlatformUnavailable)
    }
}
