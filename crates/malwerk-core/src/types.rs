// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Malwerk colouring engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a single capture-and-rectify run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an image target reported by the AR tracker (e.g. "turtle").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TargetId(pub String);

impl TargetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of the 3D model a rectified texture is bound to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModelId(pub String);

impl ModelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque handle to a texture uploaded by the texture binder.
///
/// The binder owns the backing GPU memory; whoever holds the handle is
/// responsible for handing it back through `TextureBinder::release`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureHandle(pub u64);

impl std::fmt::Display for TextureHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tex#{}", self.0)
    }
}

/// Logical role of a page corner after ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CornerRole {
    NorthWest,
    NorthEast,
    SouthEast,
    SouthWest,
}

impl CornerRole {
    /// Roles in the order the rectifier consumes them.
    pub const CLOCKWISE: [CornerRole; 4] = [
        CornerRole::NorthWest,
        CornerRole::NorthEast,
        CornerRole::SouthEast,
        CornerRole::SouthWest,
    ];
}

/// Stages of the capture pipeline state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStage {
    /// Nothing running; capture may be triggered.
    Idle,
    /// Grabbing the current camera frame.
    Capturing,
    /// Edge extraction and quadrilateral detection.
    Detecting,
    /// Homography + warp + texture encoding.
    Rectifying,
    /// Waiting for the texture binder to upload the result.
    Binding,
}

impl PipelineStage {
    /// Whether a synchronous part of a run currently owns the pipeline.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Capturing | Self::Detecting | Self::Rectifying)
    }
}

/// Success/failure counters for capture attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureStats {
    pub successful: u64,
    pub failed: u64,
    /// Runs that finished but whose bind was skipped or superseded.
    pub discarded: u64,
}

impl CaptureStats {
    pub fn total(&self) -> u64 {
        self.successful + self.failed + self.discarded
    }
}

/// A rectified page encoded for texture upload.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedTexture {
    /// Compressed raster bytes.
    pub bytes: Vec<u8>,
    /// MIME type of `bytes` (e.g. "image/jpeg").
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
    /// Hex SHA-256 of `bytes`.
    pub digest: String,
}

impl std::fmt::Debug for EncodedTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodedTexture")
            .field("bytes", &self.bytes.len())
            .field("mime_type", &self.mime_type)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("digest", &self.digest)
            .finish()
    }
}

/// Summary of a texture that was bound to a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundTexture {
    pub run_id: RunId,
    pub model: ModelId,
    pub handle: TextureHandle,
    pub width: u32,
    pub height: u32,
    /// Hex SHA-256 of the encoded payload.
    pub digest: String,
    pub bound_at: DateTime<Utc>,
}
