use nbis_bozorth::BozorthMatcher;
use nbis_core::{
    Detection, Detector, FeatureSet, GrayImage, Matcher, NbisConfig, NbisResult, QualityAssessor,
    QualityResult, Role, XytRecord, from_dict_list, to_interchange,
};
use nbis_lfs::DetectorBuilder;
use nbis_nfiq::NfiqAssessor;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::EngineResult;
use crate::settings::EngineSettings;

/// One gallery entry's score in an identification run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RankedMatch {
    /// Position in the gallery slice that was searched.
    pub index: usize,
    pub score: i32,
}

/// Fingerprint engine: one configuration context plus the three collaborators.
///
/// Holds no mutable state, so a single engine can be shared across threads.
/// Batch operations run on the engine's own worker pool; the global rayon
/// pool is left alone.
pub struct Nbis {
    config: NbisConfig,
    detector: Box<dyn Detector>,
    matcher: Box<dyn Matcher>,
    quality: Box<dyn QualityAssessor>,
    pool: ThreadPool,
}

impl std::fmt::Debug for Nbis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Nbis")
            .field("config", &self.config)
            .field("threads", &self.pool.current_num_threads())
            .finish_non_exhaustive()
    }
}

impl Nbis {
    /// Engine with the reference detector, matcher and quality assessor.
    pub fn new(config: NbisConfig) -> EngineResult<Self> {
        Self::from_settings(EngineSettings::new(config))
    }

    /// Engine with tuned reference components.
    ///
    /// `min_computable_minutiae` from the configuration context overrides the
    /// matcher parameters' own value.
    pub fn from_settings(settings: EngineSettings) -> EngineResult<Self> {
        let EngineSettings {
            nbis,
            detector,
            matcher,
        } = settings;
        let detector = DetectorBuilder::from_params(detector).build()?;
        let matcher =
            BozorthMatcher::new(matcher.with_min_computable(nbis.matcher.min_computable_minutiae))?;
        let quality = NfiqAssessor::new(detector.clone());
        Self::with_components(
            nbis,
            Box::new(detector),
            Box::new(matcher),
            Box::new(quality),
        )
    }

    /// Engine over caller-supplied collaborators.
    pub fn with_components(
        config: NbisConfig,
        detector: Box<dyn Detector>,
        matcher: Box<dyn Matcher>,
        quality: Box<dyn QualityAssessor>,
    ) -> EngineResult<Self> {
        config.validate()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.n_threads)
            .thread_name(|i| format!("nbis-worker-{}", i))
            .build()?;
        if config.verbosity.main {
            debug!("engine ready: {}", config.summary());
        }
        Ok(Self {
            config,
            detector,
            matcher,
            quality,
            pool,
        })
    }

    pub fn config(&self) -> &NbisConfig {
        &self.config
    }

    /// Detect minutiae. `ppi` falls back to the configured resolution.
    pub fn extract_minutiae(&self, image: &GrayImage, ppi: Option<u32>) -> NbisResult<Detection> {
        let ppi = self.config.resolve_ppi(ppi)?;
        let detection = self.detector.detect(image, ppi)?;
        if self.config.verbosity.main {
            let (w, h) = image.dimensions();
            debug!(
                "{}x{} image at {} ppi: {} minutiae, block maps {}x{}",
                w,
                h,
                ppi,
                detection.minutiae.len(),
                detection.diagnostics.maps.width,
                detection.diagnostics.maps.height
            );
        }
        Ok(detection)
    }

    /// Detect on both images at the configured resolution, then match.
    ///
    /// The probe is processed first; if it fails the gallery is never
    /// touched and the error carries [`Role::Probe`].
    pub fn match_images(&self, probe: &GrayImage, gallery: &GrayImage) -> NbisResult<i32> {
        let probe = self
            .extract_minutiae(probe, None)
            .map_err(|e| e.with_role(Role::Probe))?;
        let gallery = self
            .extract_minutiae(gallery, None)
            .map_err(|e| e.with_role(Role::Gallery))?;
        self.match_minutiae(&probe.minutiae, &gallery.minutiae)
    }

    pub fn compute_quality(&self, image: &GrayImage, ppi: Option<u32>) -> NbisResult<QualityResult> {
        let ppi = self.config.resolve_ppi(ppi)?;
        let result = self.quality.assess(image, ppi)?;
        if self.config.verbosity.main {
            debug!("quality at {} ppi: {}, status {}", ppi, result, result.return_code());
        }
        Ok(result)
    }

    /// Match two lists of loosely-typed minutia records.
    ///
    /// The probe list is parsed first. A malformed record in either list
    /// fails the call before the matcher runs.
    pub fn match_features(&self, probe: &[Value], gallery: &[Value]) -> NbisResult<i32> {
        let capacity = self.config.matcher.capacity;
        let probe = from_dict_list(probe, capacity)?;
        let gallery = from_dict_list(gallery, capacity)?;
        if self.config.verbosity.load {
            debug!("loaded {} probe and {} gallery rows", probe.len(), gallery.len());
        }
        Ok(self.score_records(&probe, &gallery))
    }

    pub fn match_minutiae(&self, probe: &FeatureSet, gallery: &FeatureSet) -> NbisResult<i32> {
        let probe = self.interchange(probe)?;
        let gallery = self.interchange(gallery)?;
        Ok(self.score_records(&probe, &gallery))
    }

    /// Convert a feature set at the configured capacity.
    pub fn interchange(&self, features: &FeatureSet) -> NbisResult<XytRecord> {
        to_interchange(features, self.config.matcher.capacity)
    }

    /// Score two interchange records under the configured row limit.
    pub fn score_records(&self, probe: &XytRecord, gallery: &XytRecord) -> i32 {
        let score = self
            .matcher
            .score(probe, gallery, self.config.matcher.max_minutiae);
        if self.config.verbosity.bozorth {
            debug!(
                "probe {} rows, gallery {} rows, score {}",
                probe.len(),
                gallery.len(),
                score
            );
        }
        score
    }

    /// Detect on every image in parallel. Results keep input order.
    pub fn extract_many(
        &self,
        images: &[GrayImage],
        ppi: Option<u32>,
    ) -> Vec<NbisResult<Detection>> {
        self.pool.install(|| {
            images
                .par_iter()
                .map(|img| self.extract_minutiae(img, ppi))
                .collect()
        })
    }

    /// Score `probe` against every gallery entry and rank the results,
    /// best first. Equal scores keep gallery order.
    ///
    /// With a threshold, entries scoring below it are dropped.
    pub fn identify(
        &self,
        probe: &FeatureSet,
        gallery: &[FeatureSet],
        threshold: Option<i32>,
    ) -> NbisResult<Vec<RankedMatch>> {
        let probe = self.interchange(probe)?;
        let records = gallery
            .iter()
            .map(|g| self.interchange(g))
            .collect::<NbisResult<Vec<_>>>()?;
        let max_minutiae = self.config.matcher.max_minutiae;
        let scores = self
            .pool
            .install(|| self.matcher.score_one_to_many(&probe, &records, max_minutiae));
        if self.config.verbosity.bozorth {
            debug!("probe {} rows against {} gallery records", probe.len(), records.len());
        }
        let mut ranked: Vec<RankedMatch> = scores
            .into_iter()
            .enumerate()
            .map(|(index, score)| RankedMatch { index, score })
            .collect();
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        if let Some(t) = threshold {
            ranked.retain(|m| m.score >= t);
            if self.config.verbosity.threshold {
                debug!("{} of {} gallery entries reach {}", ranked.len(), gallery.len(), t);
            }
        }
        Ok(ranked)
    }
}
