use nbis_core::{
    DEFAULT_PPI, GrayImage, NbisError, NbisResult, QualityAssessor, QualityResult, QualityStatus,
};
use nbis_lfs::LfsDetector;
use tracing::{debug, warn};

use crate::classify::classify;
use crate::features::FeatureVector;

/// Prints with fewer minutiae than this are reported as too sparse to grade.
pub const MIN_MINUTIAE: usize = 5;

/// What feature extraction produced for one image.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureOutcome {
    Features(FeatureVector),
    /// The image is degenerate; this result stands in for a class.
    Early(QualityResult),
}

/// Quality assessor over the reference detector's output.
#[derive(Debug, Clone, Default)]
pub struct NfiqAssessor {
    detector: LfsDetector,
}

impl NfiqAssessor {
    pub fn new(detector: LfsDetector) -> Self {
        Self { detector }
    }

    pub fn detector(&self) -> &LfsDetector {
        &self.detector
    }

    /// Feature vector for `img`, or the degenerate result that replaces it.
    pub fn features(&self, img: &GrayImage, ppi: u32) -> NbisResult<FeatureOutcome> {
        if ppi == 0 {
            return Err(NbisError::InvalidInput("ppi must be > 0".into()));
        }
        if ppi != DEFAULT_PPI {
            warn!(
                "quality model is calibrated for {} ppi, image is {} ppi",
                DEFAULT_PPI, ppi
            );
        }

        let raw = img.as_raw();
        if raw.iter().all(|&p| p == raw[0]) {
            return Ok(FeatureOutcome::Early(QualityResult::empty_image()));
        }

        let detection = self
            .detector
            .detect_image(img, ppi)
            .map_err(|e| NbisError::QualityInternalError { status: e.status() })?;
        let maps = &detection.diagnostics.maps;
        if maps.foreground_blocks() == 0 {
            return Ok(FeatureOutcome::Early(QualityResult::empty_image()));
        }
        if detection.minutiae.len() < MIN_MINUTIAE {
            debug!(
                "only {} minutiae, need {} for a quality class",
                detection.minutiae.len(),
                MIN_MINUTIAE
            );
            return Ok(FeatureOutcome::Early(QualityResult::too_few_minutiae()));
        }
        Ok(FeatureOutcome::Features(FeatureVector::extract(
            maps,
            &detection.minutiae,
        )))
    }

    pub fn assess_image(&self, img: &GrayImage, ppi: u32) -> NbisResult<QualityResult> {
        let features = match self.features(img, ppi)? {
            FeatureOutcome::Features(f) => f,
            FeatureOutcome::Early(degenerate) => return Ok(degenerate),
        };
        let (quality, confidence) = classify(&features);
        debug!("quality class {} (confidence {:.3})", quality, confidence);
        Ok(QualityResult {
            quality,
            confidence: confidence as f32,
            status: QualityStatus::Success,
        })
    }
}

impl QualityAssessor for NfiqAssessor {
    fn assess(&self, image: &GrayImage, ppi: u32) -> NbisResult<QualityResult> {
        self.assess_image(image, ppi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_image_is_empty() {
        let a = NfiqAssessor::default();
        let q = a.assess_image(&GrayImage::blank(200, 200, 255).unwrap(), 500).unwrap();
        assert_eq!(q.status, QualityStatus::EmptyImage);
        assert_eq!(q.quality, 5);
        assert_eq!(q.confidence, 1.0);
    }

    #[test]
    fn test_tiny_blank_image_is_still_empty() {
        // Uniform content is reported before any detection runs.
        let a = NfiqAssessor::default();
        let q = a.assess_image(&GrayImage::blank(8, 8, 0).unwrap(), 500).unwrap();
        assert_eq!(q.return_code(), 1);
    }

    #[test]
    fn test_low_contrast_noise_has_no_foreground() {
        let data = (0..100 * 100).map(|i| 120 + (i % 3) as u8).collect();
        let img = GrayImage::new(100, 100, data).unwrap();
        let q = NfiqAssessor::default().assess_image(&img, 500).unwrap();
        assert_eq!(q.status, QualityStatus::EmptyImage);
    }

    #[test]
    fn test_detection_failure_is_internal_error() {
        let data = (0..20 * 20).map(|i| (i % 251) as u8).collect();
        let img = GrayImage::new(20, 20, data).unwrap();
        match NfiqAssessor::default().assess_image(&img, 500) {
            Err(NbisError::QualityInternalError { status }) => assert!(status < 0),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_features_report_early_outcome() {
        let a = NfiqAssessor::default();
        let blank = GrayImage::blank(64, 64, 200).unwrap();
        assert_eq!(
            a.features(&blank, 500).unwrap(),
            FeatureOutcome::Early(QualityResult::empty_image())
        );
    }

    #[test]
    fn test_zero_ppi_rejected() {
        let img = GrayImage::blank(64, 64, 10).unwrap();
        assert!(matches!(
            NfiqAssessor::default().assess_image(&img, 0),
            Err(NbisError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_straight_ridges_are_too_sparse() {
        let (w, h) = (128usize, 128usize);
        let data = (0..h)
            .flat_map(|_| {
                (0..w).map(|x| {
                    let v = (2.0 * std::f64::consts::PI * x as f64 / 9.0).cos();
                    (128.0 + 90.0 * v) as u8
                })
            })
            .collect();
        let img = GrayImage::new(w, h, data).unwrap();
        let q = NfiqAssessor::default().assess_image(&img, 500).unwrap();
        assert_eq!(q.status, QualityStatus::TooFewMinutiae);
        assert_eq!((q.quality, q.confidence), (5, 1.0));
    }
}
