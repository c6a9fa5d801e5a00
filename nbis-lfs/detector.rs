use nbis_core::{
    BlockMaps, Detection, Detector, Diagnostics, FeatureSet, GrayImage, Minutia, NbisResult,
};
use tracing::{debug, trace};

use crate::binarize::binarize;
use crate::error::{DetectError, DetectResult};
use crate::filter::{
    remove_close_pairs, remove_duplicates, remove_short_traces, remove_unreliable_locations,
};
use crate::maps::{BlockField, compute_maps};
use crate::minutiae::{Candidate, find_candidates};
use crate::params::LfsParams;
use crate::thin::thin;

/// Contrast at which a block's reliability stops improving.
const FULL_CONTRAST: f64 = 64.0;
const MAX_RELIABILITY: f64 = 0.99;

/// Minutiae detector over block maps, binarization and skeleton analysis.
///
/// Holds only immutable parameters; every call allocates its own buffers.
#[derive(Debug, Clone)]
pub struct LfsDetector {
    params: LfsParams,
}

impl Default for LfsDetector {
    fn default() -> Self {
        Self {
            params: LfsParams::default(),
        }
    }
}

impl LfsDetector {
    pub fn new(params: LfsParams) -> DetectResult<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &LfsParams {
        &self.params
    }

    fn check_image(&self, img: &GrayImage) -> DetectResult<()> {
        let (width, height) = img.dimensions();
        let min_size = self.params.min_image_size();
        if width < min_size || height < min_size {
            return Err(DetectError::ImageTooSmall {
                width,
                height,
                min_size,
            });
        }
        Ok(())
    }

    /// Block maps alone, without extracting minutiae.
    pub fn block_maps(&self, img: &GrayImage) -> DetectResult<(BlockMaps, BlockField)> {
        self.check_image(img)?;
        Ok(compute_maps(img, &self.params))
    }

    /// Run the full pipeline on an image scanned at `ppi`.
    pub fn detect_image(&self, img: &GrayImage, ppi: u32) -> DetectResult<Detection> {
        if ppi == 0 {
            return Err(DetectError::InvalidResolution(ppi));
        }
        self.check_image(img)?;
        let (width, height) = img.dimensions();
        let dist = self.params.scaled(ppi);

        let (maps, field) = compute_maps(img, &self.params);
        trace!(
            "block maps {}x{}, {} foreground blocks",
            maps.width,
            maps.height,
            maps.foreground_blocks()
        );

        let binarized = binarize(img, &maps, &self.params);
        let skeleton = thin(&binarized);
        trace!("skeleton has {} pixels", skeleton.pixel_count());

        let raw = find_candidates(&skeleton, dist.trace_length);
        let found = raw.len();
        let candidates = remove_unreliable_locations(
            raw,
            &maps,
            width,
            height,
            dist.border_margin,
            self.params.min_block_quality,
        );
        let candidates = remove_duplicates(candidates, dist.duplicate_distance);
        let candidates = remove_short_traces(candidates, (dist.trace_length / 2).max(2));
        let candidates = remove_close_pairs(candidates, &dist);

        let minutiae: Vec<Minutia> = candidates
            .iter()
            .map(|c| to_minutia(c, &maps, &field))
            .collect();
        debug!(
            "detected {} minutiae ({} candidates) in {}x{} image at {} ppi",
            minutiae.len(),
            found,
            width,
            height,
            ppi
        );

        Ok(Detection {
            minutiae: FeatureSet::new(minutiae),
            diagnostics: Diagnostics { maps, binarized },
        })
    }
}

fn to_minutia(c: &Candidate, maps: &BlockMaps, field: &BlockField) -> Minutia {
    let quality = maps.quality_at_pixel(c.x, c.y).clamp(0, 4) as f64 / 4.0;
    let contrast = (field.contrast_at(c.x, c.y) / FULL_CONTRAST).min(1.0);
    let reliability = (quality * (0.5 + 0.5 * contrast)).clamp(0.0, MAX_RELIABILITY);
    Minutia::new(
        c.x as u32,
        c.y as u32,
        c.direction.round() as u16 % 360,
        c.kind,
        (reliability * 100.0).round() / 100.0,
    )
}

impl Detector for LfsDetector {
    fn detect(&self, image: &GrayImage, ppi: u32) -> NbisResult<Detection> {
        Ok(self.detect_image(image, ppi)?)
    }
}
