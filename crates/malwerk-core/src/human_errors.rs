// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable status messages for children (and the adults helping them).
//
// Every technical error is mapped to plain English with a clear suggestion.
// The severity drives how the host UI presents the message.

use crate::error::MalwerkError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Try again, possibly after moving the camera or page.
    Transient,
    /// User must do something first (point at a target, allow the camera).
    ActionRequired,
    /// Cannot be fixed by retrying: a missing platform feature or bad config.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown in the status banner).
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    /// Whether pressing capture again can succeed.
    pub retriable: bool,
    /// Severity level.
    pub severity: Severity,
}

/// Convert a `MalwerkError` into a `HumanError` fit for the status banner.
pub fn humanize_error(err: &MalwerkError) -> HumanError {
    match err {
        // -- Capture gating --
        MalwerkError::NoFrameAvailable => HumanError {
            message: "Camera not available".into(),
            suggestion: "Allow camera access for this page, then point the camera at your coloring page.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        MalwerkError::NoActiveTarget => HumanError {
            message: "No target detected".into(),
            suggestion: "Point the camera at one of the coloring book pictures until its character appears.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        MalwerkError::UnknownTarget(id) => HumanError {
            message: "This picture isn't part of the coloring book.".into(),
            suggestion: format!("Try one of the other pages. (Target: {id})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        MalwerkError::PipelineBusy => HumanError {
            message: "Still working on the last picture...".into(),
            suggestion: "Wait a moment, then tap capture again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Rectification --
        MalwerkError::NoQuadrilateralFound => HumanError {
            message: "Could not detect coloring page. Make sure it has clear edges and good lighting.".into(),
            suggestion: "Hold the whole page inside the camera view, on a darker surface, and try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        MalwerkError::DegenerateRectification { .. } => HumanError {
            message: "The page looked too thin to straighten out.".into(),
            suggestion: "Hold the camera more directly above the page and try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        MalwerkError::PipelineFault(_) | MalwerkError::ImageError(_) => HumanError {
            message: "Error processing image. Please try again.".into(),
            suggestion: "If this keeps happening, reload the page.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Texture hand-off --
        MalwerkError::TextureBindFailure(_) => HumanError {
            message: "Your coloring couldn't be put on the model.".into(),
            suggestion: "Try capturing the page again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Configuration / persistence --
        MalwerkError::Config(detail) => HumanError {
            message: "The app settings are not valid.".into(),
            suggestion: format!("Reset the settings to their defaults. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        MalwerkError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "Check the path and try again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your device's storage may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        MalwerkError::Serialization(_) => HumanError {
            message: "The app had an internal data problem.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Platform --
        MalwerkError::PlatformUnavailable => HumanError {
            message: "This feature isn't available on your device.".into(),
            suggestion: "Some features need a phone or tablet with a camera.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}
