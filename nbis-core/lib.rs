//! Data model, interchange codec and shared configuration for minutiae-based
//! fingerprint processing.
//!
//! Detection, matching and quality assessment are reached through the
//! [`Detector`], [`Matcher`] and [`QualityAssessor`] traits; this crate holds
//! no algorithm of its own beyond the feature-set codec.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod gray;
pub mod minutia;
pub mod quality;
pub mod traits;
pub mod xyt;

pub use config::{
    DEFAULT_BOZORTH_MINUTIAE, MIN_COMPUTABLE_BOZORTH_MINUTIAE, MatcherSettings, NbisConfig,
    Verbosity,
};
pub use diagnostics::{BinarizedImage, BlockMaps, Detection, Diagnostics, INVALID_DIR};
pub use error::{NbisError, NbisResult, Role};
pub use gray::{DEFAULT_PPI, GrayImage};
pub use minutia::{FeatureSet, Minutia, MinutiaType};
pub use quality::{QualityResult, QualityStatus};
pub use traits::{Detector, Matcher, QualityAssessor};
pub use xyt::{MAX_BOZORTH_MINUTIAE, XytRecord, XytRow, from_dict_list, to_interchange};
