use nbis_core::DEFAULT_PPI;

use crate::error::{DetectError, DetectResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tuning for the minutiae detector.
///
/// Distances are expressed for a 500 ppi scan and rescaled per call through
/// [`LfsParams::scaled`]. Block geometry is not rescaled.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LfsParams {
    /// Edge of one block-map cell in pixels.
    pub block_size: usize,
    /// Edge of the analysis window centred on each block.
    pub window_size: usize,
    /// Ridge direction quantization over a half turn.
    pub num_directions: usize,
    /// Window standard deviation below which a block is low contrast.
    pub min_contrast: f64,
    /// Gradient coherence below which a block is low flow.
    pub min_coherence: f64,
    /// Mean neighbour direction difference (degrees) that flags high curvature.
    pub high_curve_degrees: f64,
    /// Half length of the binarization grid along the ridge.
    pub grid_half_length: usize,
    /// Half width of the binarization grid across the ridge.
    pub grid_half_width: usize,
    /// Pixels traced along the skeleton to orient a minutia.
    pub trace_length: usize,
    /// Minutiae closer than this to the image edge are dropped.
    pub border_margin: usize,
    /// Two endings closer than this are a broken ridge or an island.
    pub min_ending_distance: f64,
    /// Two bifurcations closer than this enclose a lake.
    pub min_bifurcation_distance: f64,
    /// An ending this close to a bifurcation is a spur.
    pub spur_distance: f64,
    /// Detections within this radius of an earlier one are duplicates.
    pub duplicate_distance: f64,
    /// Minimum block quality a minutia must sit on.
    pub min_block_quality: i32,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none", default))]
    pub name: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none", default))]
    pub description: Option<String>,
}

impl Default for LfsParams {
    fn default() -> Self {
        Self {
            block_size: 8,
            window_size: 24,
            num_directions: 16,
            min_contrast: 10.0,
            min_coherence: 0.25,
            high_curve_degrees: 40.0,
            grid_half_length: 4,
            grid_half_width: 4,
            trace_length: 10,
            border_margin: 8,
            min_ending_distance: 8.0,
            min_bifurcation_distance: 6.0,
            spur_distance: 8.0,
            duplicate_distance: 4.0,
            min_block_quality: 1,
            name: None,
            description: None,
        }
    }
}

/// Distances after resolution scaling, in pixels of the actual image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledDistances {
    pub trace_length: usize,
    pub border_margin: usize,
    pub min_ending_distance: f64,
    pub min_bifurcation_distance: f64,
    pub spur_distance: f64,
    pub duplicate_distance: f64,
}

impl LfsParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fewer, more conservative detections at lower cost.
    pub fn fast_preset() -> Self {
        Self {
            grid_half_length: 3,
            grid_half_width: 3,
            min_contrast: 14.0,
            min_coherence: 0.35,
            trace_length: 8,
            min_block_quality: 2,
            name: Some("Fast".to_string()),
            description: Some("Smaller binarization grid and stricter block acceptance".to_string()),
            ..Self::default()
        }
    }

    /// Accepts weaker blocks and keeps closer minutiae.
    pub fn sensitive_preset() -> Self {
        Self {
            min_contrast: 6.0,
            min_coherence: 0.15,
            high_curve_degrees: 55.0,
            min_ending_distance: 6.0,
            min_bifurcation_distance: 4.0,
            spur_distance: 6.0,
            duplicate_distance: 3.0,
            name: Some("Sensitive".to_string()),
            description: Some("Recovers minutiae from low-contrast captures".to_string()),
            ..Self::default()
        }
    }

    pub fn with_metadata(mut self, name: &str, description: &str) -> Self {
        self.name = Some(name.to_string());
        self.description = Some(description.to_string());
        self
    }

    /// Smallest image edge the detector will accept.
    pub fn min_image_size(&self) -> usize {
        2 * self.window_size
    }

    /// Rescale pixel distances for an image scanned at `ppi`.
    pub fn scaled(&self, ppi: u32) -> ScaledDistances {
        let s = ppi as f64 / DEFAULT_PPI as f64;
        let px = |v: usize| ((v as f64 * s).round() as usize).max(1);
        ScaledDistances {
            trace_length: px(self.trace_length),
            border_margin: px(self.border_margin),
            min_ending_distance: self.min_ending_distance * s,
            min_bifurcation_distance: self.min_bifurcation_distance * s,
            spur_distance: self.spur_distance * s,
            duplicate_distance: self.duplicate_distance * s,
        }
    }

    pub fn validate(&self) -> DetectResult<()> {
        if self.block_size < 4 {
            return Err(DetectError::InvalidParams(format!(
                "block_size {} must be >= 4",
                self.block_size
            )));
        }
        if self.window_size < self.block_size {
            return Err(DetectError::InvalidParams(format!(
                "window_size {} smaller than block_size {}",
                self.window_size, self.block_size
            )));
        }
        if self.num_directions < 4 {
            return Err(DetectError::InvalidParams(format!(
                "num_directions {} must be >= 4",
                self.num_directions
            )));
        }
        if !(0.0..1.0).contains(&self.min_coherence) {
            return Err(DetectError::InvalidParams(format!(
                "min_coherence {} outside [0, 1)",
                self.min_coherence
            )));
        }
        if self.min_contrast < 0.0 || !self.min_contrast.is_finite() {
            return Err(DetectError::InvalidParams(format!(
                "min_contrast {} must be finite and >= 0",
                self.min_contrast
            )));
        }
        if self.grid_half_length == 0 || self.grid_half_width == 0 {
            return Err(DetectError::InvalidParams(
                "binarization grid must be at least 3x3".into(),
            ));
        }
        if self.trace_length < 2 {
            return Err(DetectError::InvalidParams(format!(
                "trace_length {} must be >= 2",
                self.trace_length
            )));
        }
        if !(0..=4).contains(&self.min_block_quality) {
            return Err(DetectError::InvalidParams(format!(
                "min_block_quality {} outside 0..=4",
                self.min_block_quality
            )));
        }
        Ok(())
    }

    pub fn summary(&self) -> String {
        format!(
            "LfsParams{}: block={}, window={}, directions={}, contrast>={:.1}, coherence>={:.2}, grid={}x{}, trace={}",
            self.name
                .as_deref()
                .map(|n| format!(" [{}]", n))
                .unwrap_or_default(),
            self.block_size,
            self.window_size,
            self.num_directions,
            self.min_contrast,
            self.min_coherence,
            2 * self.grid_half_length + 1,
            2 * self.grid_half_width + 1,
            self.trace_length
        )
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    #[cfg(feature = "serde")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    #[cfg(feature = "serde")]
    pub fn from_toml(toml_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let params: Self = toml::from_str(toml_str)?;
        params.validate()?;
        Ok(params)
    }

    /// Load from a JSON or TOML file, chosen by extension.
    #[cfg(feature = "serde")]
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml(&content),
            _ => Self::from_json(&content),
        }
    }
}
