//! High-level fingerprint engine tying together detection, matching and
//! quality assessment behind one immutable configuration.
//!
//! ```no_run
//! use nbis_cli::{Nbis, NbisConfig, utils};
//!
//! let engine = Nbis::new(NbisConfig::default())?;
//! let probe = utils::load_fingerprint("probe.png")?;
//! let gallery = utils::load_fingerprint("gallery.png")?;
//! let score = engine.match_images(&probe, &gallery)?;
//! println!("score {}", score);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod engine;
pub mod fingerprint;
pub mod settings;
pub mod utils;

use thiserror::Error;

pub use engine::{Nbis, RankedMatch};
pub use fingerprint::{Fingerprint, MatchResult, MatchStrength};
pub use settings::EngineSettings;

pub use nbis_core::{
    self, Detection, FeatureSet, GrayImage, Minutia, MinutiaType, NbisConfig, NbisError,
    NbisResult, QualityResult, QualityStatus, XytRecord,
};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Nbis(#[from] NbisError),

    #[error("Detector error: {0}")]
    Detector(#[from] nbis_lfs::DetectError),

    #[error("Matcher parameters: {0}")]
    Matcher(#[from] nbis_bozorth::ParamError),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type EngineResult<T> = Result<T, EngineError>;
