use serde::{Deserialize, Serialize};

use crate::minutia::FeatureSet;

/// Marker for blocks with no reliable ridge direction.
pub const INVALID_DIR: i32 = -1;

/// Per-block rasters produced during detection.
///
/// Dimensions are in blocks, not pixels, and are never assumed equal to the
/// source image dimensions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockMaps {
    pub width: usize,
    pub height: usize,
    /// Edge length in source pixels of one block.
    pub block_size: usize,
    /// Ridge direction index, or [`INVALID_DIR`].
    pub direction: Vec<i32>,
    pub low_contrast: Vec<i32>,
    pub low_flow: Vec<i32>,
    pub high_curve: Vec<i32>,
    /// Block quality, 0 (unusable) ..= 4 (best).
    pub quality: Vec<i32>,
}

impl BlockMaps {
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn index(&self, bx: usize, by: usize) -> usize {
        by * self.width + bx
    }

    /// Block coordinates covering a source pixel, clamped to the map.
    pub fn block_of(&self, x: usize, y: usize) -> (usize, usize) {
        let bs = self.block_size.max(1);
        (
            (x / bs).min(self.width.saturating_sub(1)),
            (y / bs).min(self.height.saturating_sub(1)),
        )
    }

    pub fn quality_at_pixel(&self, x: usize, y: usize) -> i32 {
        if self.is_empty() {
            return 0;
        }
        let (bx, by) = self.block_of(x, y);
        self.quality[self.index(bx, by)]
    }

    /// Blocks with a valid direction.
    pub fn foreground_blocks(&self) -> usize {
        self.direction.iter().filter(|&&d| d != INVALID_DIR).count()
    }
}

/// Binarized ridge image. `0` marks ridge pixels, `255` everything else.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinarizedImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl BinarizedImage {
    pub fn ridge_pixels(&self) -> usize {
        self.data.iter().filter(|&&p| p == 0).count()
    }
}

/// Informational rasters; not consumed by matching.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub maps: BlockMaps,
    pub binarized: BinarizedImage,
}

/// Output of a successful detection call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub minutiae: FeatureSet,
    pub diagnostics: Diagnostics,
}
