// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for the engine's collaborators.
//
// The engine consumes camera frames and hands finished textures to whatever
// renders the 3D models. Hosts (a mobile AR shell, the CLI, tests) implement
// these traits; platforms without a capability return
// `MalwerkError::PlatformUnavailable`.

use async_trait::async_trait;
use image::RgbaImage;
use malwerk_core::error::Result;
use malwerk_core::types::{EncodedTexture, ModelId, TextureHandle};

/// Access to the live camera stream.
pub trait FrameSource: Send + Sync {
    /// Copy of the most recent camera frame.
    ///
    /// Fails with `NoFrameAvailable` when no video stream is active.
    fn current_frame(&self) -> Result<RgbaImage>;
}

/// Uploads textures and applies them to 3D models.
#[async_trait]
pub trait TextureBinder: Send + Sync {
    /// Upload `texture` and apply it to `model`.
    ///
    /// The returned handle owns the backing resource until it is passed to
    /// [`TextureBinder::release`]. The binder does not release the model's
    /// previous texture on its own.
    async fn bind(&self, model: &ModelId, texture: &EncodedTexture) -> Result<TextureHandle>;

    /// Free the resource behind `handle`. Called exactly once per handle.
    fn release(&self, handle: TextureHandle);

    /// Put the model's original material back.
    fn restore_original(&self, model: &ModelId) -> Result<()>;
}
