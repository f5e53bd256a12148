// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Malwerk.

use thiserror::Error;

/// Top-level error type for all Malwerk operations.
#[derive(Debug, Error)]
pub enum MalwerkError {
    // -- Capture gating --
    #[error("no active video stream to capture from")]
    NoFrameAvailable,

    #[error("no AR target is currently tracked")]
    NoActiveTarget,

    #[error("unknown AR target: {0}")]
    UnknownTarget(String),

    #[error("a rectification run is already in progress")]
    PipelineBusy,

    // -- Rectification pipeline --
    #[error("no four-cornered page boundary found in the frame")]
    NoQuadrilateralFound,

    #[error("degenerate rectification target: {width}x{height}")]
    DegenerateRectification { width: u32, height: u32 },

    #[error("rectification pipeline fault: {0}")]
    PipelineFault(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Texture hand-off --
    #[error("texture bind failed: {0}")]
    TextureBindFailure(String),

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Platform bridge --
    #[error("feature not available on this platform")]
    PlatformUnavailable,
}

impl MalwerkError {
    /// Whether this failure is an expected outcome of looking at the world
    /// (bad lighting, no page in view) rather than a defect.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NoFrameAvailable
                | Self::NoActiveTarget
                | Self::PipelineBusy
                | Self::NoQuadrilateralFound
                | Self::DegenerateRectification { .. }
                | Self::TextureBindFailure(_)
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, MalwerkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_message_names_dimensions() {
        let err = MalwerkError::DegenerateRectification {
            width: 0,
            height: 120,
        };
        assert_eq!(err.to_string(), "degenerate rectification target: 0x120");
    }

    #[test]
    fn faults_are_not_recoverable() {
        assert!(MalwerkError::NoQuadrilateralFound.is_recoverable());
        assert!(!MalwerkError::PipelineFault("boom".into()).is_recoverable());
        assert!(!MalwerkError::Config("bad".into()).is_recoverable());
    }
}
