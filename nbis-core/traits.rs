use crate::diagnostics::Detection;
use crate::error::NbisResult;
use crate::gray::GrayImage;
use crate::quality::QualityResult;
use crate::xyt::XytRecord;

/// Obtains a feature set from a grayscale image.
///
/// Implementations hold only immutable tuning state and allocate scratch
/// buffers per call, so one instance can serve many threads.
pub trait Detector: Send + Sync {
    /// Fails with `NbisError::DetectionFailed` on any internal failure; no
    /// partial feature set is returned.
    fn detect(&self, image: &GrayImage, ppi: u32) -> NbisResult<Detection>;
}

/// Scores the similarity of two interchange records.
pub trait Matcher: Send + Sync {
    /// Higher is a stronger match. Never fails; degenerate input scores 0.
    ///
    /// Only the first `max_minutiae` rows of each side are compared. The
    /// roles are not interchangeable in general.
    fn score(&self, probe: &XytRecord, gallery: &XytRecord, max_minutiae: usize) -> i32;

    /// Score one probe against each gallery record, in gallery order.
    ///
    /// Implementations may parallelise with rayon; callers choose the pool
    /// by running this inside `ThreadPool::install`.
    fn score_one_to_many(
        &self,
        probe: &XytRecord,
        gallery: &[XytRecord],
        max_minutiae: usize,
    ) -> Vec<i32> {
        gallery
            .iter()
            .map(|g| self.score(probe, g, max_minutiae))
            .collect()
    }
}

/// Produces a scalar quality assessment of a grayscale image.
pub trait QualityAssessor: Send + Sync {
    fn assess(&self, image: &GrayImage, ppi: u32) -> NbisResult<QualityResult>;
}
