use crate::detector::LfsDetector;
use crate::error::DetectResult;
use crate::params::LfsParams;

/// Builder for creating an [`LfsDetector`]
#[derive(Debug, Clone, Default)]
pub struct DetectorBuilder {
    params: LfsParams,
}

impl DetectorBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create builder from existing parameters
    pub fn from_params(params: LfsParams) -> Self {
        Self { params }
    }

    /// Set the block-map cell size in pixels
    pub fn block_size(mut self, block_size: usize) -> Self {
        self.params.block_size = block_size;
        self
    }

    /// Set the analysis window around each block
    pub fn window_size(mut self, window_size: usize) -> Self {
        self.params.window_size = window_size;
        self
    }

    /// Set the number of quantized ridge directions
    pub fn directions(mut self, num_directions: usize) -> Self {
        self.params.num_directions = num_directions;
        self
    }

    /// Set the low-contrast threshold (window standard deviation)
    pub fn min_contrast(mut self, min_contrast: f64) -> Self {
        self.params.min_contrast = min_contrast;
        self
    }

    /// Set the low-flow threshold (gradient coherence)
    pub fn min_coherence(mut self, min_coherence: f64) -> Self {
        self.params.min_coherence = min_coherence;
        self
    }

    /// Set the binarization grid half extents
    pub fn grid(mut self, half_length: usize, half_width: usize) -> Self {
        self.params.grid_half_length = half_length;
        self.params.grid_half_width = half_width;
        self
    }

    /// Set how far along the skeleton directions are traced
    pub fn trace_length(mut self, trace_length: usize) -> Self {
        self.params.trace_length = trace_length;
        self
    }

    /// Set the image border inside which minutiae are dropped
    pub fn border_margin(mut self, border_margin: usize) -> Self {
        self.params.border_margin = border_margin;
        self
    }

    /// Set the minimum block quality a minutia may sit on
    pub fn min_block_quality(mut self, quality: i32) -> Self {
        self.params.min_block_quality = quality;
        self
    }

    /// Apply the fast preset
    pub fn preset_fast(mut self) -> Self {
        self.params = LfsParams::fast_preset();
        self
    }

    /// Apply the sensitive preset
    pub fn preset_sensitive(mut self) -> Self {
        self.params = LfsParams::sensitive_preset();
        self
    }

    /// Generate summary of current configuration
    pub fn summary(&self) -> String {
        format!("DetectorBuilder: {}", self.params.summary())
    }

    /// Convert to parameters
    pub fn to_params(self) -> LfsParams {
        self.params
    }

    /// Validate and build the detector
    pub fn build(self) -> DetectResult<LfsDetector> {
        LfsDetector::new(self.params)
    }
}
