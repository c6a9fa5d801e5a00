use std::fmt;

use nbis_core::{
    BinarizedImage, DEFAULT_PPI, Detection, FeatureSet, GrayImage, NbisError, NbisResult,
    QualityResult, Role,
};
use serde::Serialize;
use tracing::debug;

use crate::engine::Nbis;

/// Coarse reading of a match score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum MatchStrength {
    NoMatch,
    Weak,
    Moderate,
    Good,
    Excellent,
}

impl MatchStrength {
    pub fn from_score(score: i32) -> Self {
        match score {
            s if s >= 100 => MatchStrength::Excellent,
            s if s >= 60 => MatchStrength::Good,
            s if s >= 40 => MatchStrength::Moderate,
            s if s >= 20 => MatchStrength::Weak,
            _ => MatchStrength::NoMatch,
        }
    }

    pub fn confidence(self) -> &'static str {
        match self {
            MatchStrength::Excellent => "Very High",
            MatchStrength::Good => "High",
            MatchStrength::Moderate => "Medium",
            MatchStrength::Weak => "Low",
            MatchStrength::NoMatch => "Very Low",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            MatchStrength::Excellent => "Excellent match (very high confidence)",
            MatchStrength::Good => "Good match (high confidence)",
            MatchStrength::Moderate => "Moderate match (medium confidence)",
            MatchStrength::Weak => "Weak match (low confidence)",
            MatchStrength::NoMatch => "No match (very low confidence)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub score: i32,
    pub probe_minutiae: Option<usize>,
    pub gallery_minutiae: Option<usize>,
    /// Threshold decision, present only when a threshold was supplied.
    pub matched: Option<bool>,
}

impl MatchResult {
    pub fn new(score: i32) -> Self {
        Self {
            score,
            probe_minutiae: None,
            gallery_minutiae: None,
            matched: None,
        }
    }

    pub fn with_counts(mut self, probe: usize, gallery: usize) -> Self {
        self.probe_minutiae = Some(probe);
        self.gallery_minutiae = Some(gallery);
        self
    }

    /// Decide against `threshold`: scores at or above it match.
    pub fn with_threshold(mut self, threshold: i32) -> Self {
        self.matched = Some(self.score >= threshold);
        self
    }

    pub fn strength(&self) -> MatchStrength {
        MatchStrength::from_score(self.score)
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.matched {
            Some(m) => write!(f, "MatchResult(score={}, matched={})", self.score, m),
            None => write!(f, "MatchResult(score={})", self.score),
        }
    }
}

/// A fingerprint image with its lazily computed minutiae and quality.
#[derive(Debug, Clone)]
pub struct Fingerprint {
    image: GrayImage,
    ppi: u32,
    detection: Option<Detection>,
    quality: Option<QualityResult>,
}

impl Fingerprint {
    pub fn new(image: GrayImage, ppi: u32) -> NbisResult<Self> {
        if ppi == 0 {
            return Err(NbisError::InvalidInput("ppi must be > 0".into()));
        }
        Ok(Self {
            image,
            ppi,
            detection: None,
            quality: None,
        })
    }

    /// Fingerprint at the default 500 ppi.
    pub fn from_image(image: GrayImage) -> Self {
        Self {
            image,
            ppi: DEFAULT_PPI,
            detection: None,
            quality: None,
        }
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    pub fn ppi(&self) -> u32 {
        self.ppi
    }

    /// Minutiae, if extraction has run.
    pub fn minutiae(&self) -> Option<&FeatureSet> {
        self.detection.as_ref().map(|d| &d.minutiae)
    }

    /// Binarized image, if extraction has run.
    pub fn binarized(&self) -> Option<&BinarizedImage> {
        self.detection.as_ref().map(|d| &d.diagnostics.binarized)
    }

    pub fn detection(&self) -> Option<&Detection> {
        self.detection.as_ref()
    }

    pub fn quality(&self) -> Option<&QualityResult> {
        self.quality.as_ref()
    }

    /// Run extraction once and cache it.
    pub fn extract_minutiae(&mut self, engine: &Nbis) -> NbisResult<&FeatureSet> {
        let detection = match self.detection.take() {
            Some(d) => d,
            None => engine.extract_minutiae(&self.image, Some(self.ppi))?,
        };
        Ok(&self.detection.insert(detection).minutiae)
    }

    /// Run quality assessment once and cache it.
    pub fn compute_quality(&mut self, engine: &Nbis) -> NbisResult<QualityResult> {
        if let Some(q) = self.quality {
            return Ok(q);
        }
        let q = engine.compute_quality(&self.image, Some(self.ppi))?;
        self.quality = Some(q);
        Ok(q)
    }

    /// Match against `other`, extracting either side's minutiae if needed.
    ///
    /// `self` is the probe. A probe extraction failure is reported before
    /// the gallery is processed.
    pub fn match_with(
        &mut self,
        other: &mut Fingerprint,
        engine: &Nbis,
        threshold: Option<i32>,
    ) -> NbisResult<MatchResult> {
        let probe = self
            .extract_minutiae(engine)
            .map_err(|e| e.with_role(Role::Probe))?
            .clone();
        let gallery = other
            .extract_minutiae(engine)
            .map_err(|e| e.with_role(Role::Gallery))?;
        let mut result = MatchResult::new(engine.match_minutiae(&probe, gallery)?)
            .with_counts(probe.len(), gallery.len());
        if let Some(t) = threshold {
            result = result.with_threshold(t);
            if engine.config().verbosity.threshold {
                debug!("score {} against threshold {}: {:?}", result.score, t, result.matched);
            }
        }
        Ok(result)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (w, h) = self.image.dimensions();
        write!(f, "Fingerprint({}x{}", h, w)?;
        if let Some(m) = self.minutiae() {
            write!(f, ", {} minutiae", m.len())?;
        }
        if let Some(q) = self.quality {
            write!(f, ", quality={}", q.quality)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nbis_core::{NbisConfig, QualityStatus};
    use proptest::prelude::*;

    fn engine() -> Nbis {
        Nbis::new(NbisConfig::default().with_threads(1)).unwrap()
    }

    #[test]
    fn test_strength_bands() {
        assert_eq!(MatchStrength::from_score(250), MatchStrength::Excellent);
        assert_eq!(MatchStrength::from_score(100), MatchStrength::Excellent);
        assert_eq!(MatchStrength::from_score(99), MatchStrength::Good);
        assert_eq!(MatchStrength::from_score(40), MatchStrength::Moderate);
        assert_eq!(MatchStrength::from_score(20), MatchStrength::Weak);
        assert_eq!(MatchStrength::from_score(19), MatchStrength::NoMatch);
        assert_eq!(MatchStrength::from_score(0).confidence(), "Very Low");
    }

    #[test]
    fn test_match_result_threshold() {
        let r = MatchResult::new(42).with_threshold(40);
        assert_eq!(r.matched, Some(true));
        assert_eq!(r.to_string(), "MatchResult(score=42, matched=true)");
        assert_eq!(MatchResult::new(39).with_threshold(40).matched, Some(false));
        assert_eq!(MatchResult::new(7).to_string(), "MatchResult(score=7)");
    }

    #[test]
    fn test_zero_ppi_rejected() {
        let img = GrayImage::blank(64, 64, 0).unwrap();
        assert!(Fingerprint::new(img, 0).is_err());
    }

    #[test]
    fn test_lazy_extraction_and_display() {
        let e = engine();
        let mut fp = Fingerprint::new(GrayImage::blank(96, 64, 255).unwrap(), 500).unwrap();
        assert!(fp.minutiae().is_none());
        assert!(fp.binarized().is_none());
        assert_eq!(fp.to_string(), "Fingerprint(64x96)");

        assert!(fp.extract_minutiae(&e).unwrap().is_empty());
        let bin = fp.binarized().unwrap();
        assert_eq!(bin.data.len(), bin.width * bin.height);

        let q = fp.compute_quality(&e).unwrap();
        assert_eq!(q.status, QualityStatus::EmptyImage);
        assert_eq!(fp.to_string(), "Fingerprint(64x96, 0 minutiae, quality=5)");
    }

    #[test]
    fn test_match_with_reports_probe_failure() {
        let e = engine();
        let mut tiny = Fingerprint::from_image(GrayImage::blank(12, 12, 0).unwrap());
        let mut other = Fingerprint::from_image(GrayImage::blank(12, 12, 0).unwrap());
        match tiny.match_with(&mut other, &e, None) {
            Err(NbisError::DetectionFailed { role, .. }) => assert_eq!(role, Some(Role::Probe)),
            r => panic!("unexpected {:?}", r),
        }
        assert!(other.minutiae().is_none());
    }

    #[test]
    fn test_match_with_blank_prints() {
        let e = engine();
        let mut a = Fingerprint::from_image(GrayImage::blank(96, 96, 255).unwrap());
        let mut b = Fingerprint::from_image(GrayImage::blank(96, 96, 255).unwrap());
        let r = a.match_with(&mut b, &e, Some(40)).unwrap();
        assert_eq!(r.score, 0);
        assert_eq!(r.matched, Some(false));
        assert_eq!((r.probe_minutiae, r.gallery_minutiae), (Some(0), Some(0)));
    }

    proptest! {
        #[test]
        fn prop_strength_never_drops_with_score(a in -1000i32..1000, b in -1000i32..1000) {
            let (lo, hi) = (a.min(b), a.max(b));
            prop_assert!(MatchStrength::from_score(lo) <= MatchStrength::from_score(hi));
        }
    }
}
