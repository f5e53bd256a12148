// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{MalwerkError, Result};
use crate::types::{ModelId, TargetId};

/// Edge-detection parameters for the contour extraction stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeParams {
    /// Standard deviation of the Gaussian blur applied before Canny.
    pub blur_sigma: f32,
    /// Canny hysteresis low threshold.
    pub low_threshold: f32,
    /// Canny hysteresis high threshold.
    pub high_threshold: f32,
    /// Chebyshev radius of the dilation that closes gaps in the edge map.
    /// Zero disables dilation.
    pub dilate_radius: u8,
}

impl Default for EdgeParams {
    /// Matches a 5x5 Gaussian, Canny(50, 150) and a 3x3 rectangular dilation.
    fn default() -> Self {
        Self {
            blur_sigma: 1.1,
            low_threshold: 50.0,
            high_threshold: 150.0,
            dilate_radius: 1,
        }
    }
}

impl EdgeParams {
    /// Softer thresholds for pale pages on light tables, with a wider
    /// dilation to bridge the weaker, broken edges they produce.
    pub fn low_contrast() -> Self {
        Self {
            blur_sigma: 1.4,
            low_threshold: 25.0,
            high_threshold: 75.0,
            dilate_radius: 2,
        }
    }
}

/// Mapping from an AR image target to the model it animates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetBinding {
    pub target: TargetId,
    pub model: ModelId,
    /// Name used in status messages ("Turtle detected! Ready to capture.").
    pub display_name: String,
}

impl TargetBinding {
    pub fn new(target: &str, model: &str, display_name: &str) -> Self {
        Self {
            target: TargetId::new(target),
            model: ModelId::new(model),
            display_name: display_name.to_string(),
        }
    }
}

/// Tunables for the capture → rectify → bind pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Edge-detection thresholds.
    pub edges: EdgeParams,
    /// Douglas-Peucker tolerance as a fraction of the contour's arc length.
    pub approx_epsilon_ratio: f64,
    /// Longest side of the encoded texture; larger results are halved until they fit.
    pub texture_max_dimension: u32,
    /// Longest side of the diagnostic images shown when no page is found.
    pub diagnostic_max_dimension: u32,
    /// JPEG quality (1-100) of the texture payload.
    pub jpeg_quality: u8,
    /// Number of recently created textures kept for reuse and debugging.
    pub texture_cache_capacity: usize,
    /// Known AR targets and the models they drive.
    pub targets: Vec<TargetBinding>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            edges: EdgeParams::default(),
            approx_epsilon_ratio: 0.02,
            texture_max_dimension: 1024,
            diagnostic_max_dimension: 640,
            jpeg_quality: 95,
            texture_cache_capacity: 8,
            targets: vec![
                TargetBinding::new("mermaid", "mermaid-model", "Mermaid"),
                TargetBinding::new("turtle", "turtle-model", "Turtle"),
                TargetBinding::new("goku", "goku-model", "Goku"),
            ],
        }
    }
}

impl PipelineConfig {
    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        let edges = &self.edges;
        if !(edges.blur_sigma > 0.0) {
            return Err(MalwerkError::Config(format!(
                "blur_sigma must be positive, got {}",
                edges.blur_sigma
            )));
        }
        if edges.low_threshold < 0.0 || edges.low_threshold > edges.high_threshold {
            return Err(MalwerkError::Config(format!(
                "canny thresholds must satisfy 0 <= low <= high, got {} / {}",
                edges.low_threshold, edges.high_threshold
            )));
        }
        if !(self.approx_epsilon_ratio > 0.0 && self.approx_epsilon_ratio < 1.0) {
            return Err(MalwerkError::Config(format!(
                "approx_epsilon_ratio must be in (0, 1), got {}",
                self.approx_epsilon_ratio
            )));
        }
        if self.texture_max_dimension == 0 || self.diagnostic_max_dimension == 0 {
            return Err(MalwerkError::Config(
                "maximum output dimensions must be non-zero".into(),
            ));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(MalwerkError::Config(format!(
                "jpeg_quality must be 1-100, got {}",
                self.jpeg_quality
            )));
        }
        if self.texture_cache_capacity == 0 {
            return Err(MalwerkError::Config(
                "texture_cache_capacity must be at least 1".into(),
            ));
        }
        for (i, binding) in self.targets.iter().enumerate() {
            if self.targets[..i].iter().any(|b| b.target == binding.target) {
                return Err(MalwerkError::Config(format!(
                    "target {} is configured twice",
                    binding.target
                )));
            }
        }
        Ok(())
    }

    /// Load and validate a configuration from a JSON file.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        info!(path = %path.as_ref().display(), "pipeline config loaded");
        Ok(config)
    }

    /// Load a configuration, falling back to defaults when the file is
    /// missing or invalid.
    pub fn load_or_default(path: impl AsRef<std::path::Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.as_ref().display(), error = %e, "using default pipeline config");
                Self::default()
            }
        }
    }

    /// Persist the configuration as pretty-printed JSON.
    /// Write the configuration as pretty JSON, creating the parent directory.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

}
