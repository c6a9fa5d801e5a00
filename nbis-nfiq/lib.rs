//! Five-class fingerprint image quality.
//!
//! Quality is derived from the detector's block maps and minutiae: an
//! eleven-element feature vector is z-normalised and scored by a fixed
//! linear-softmax model. Class 1 is best, 5 worst. Blank images and prints
//! with too few minutiae get class 5 with full confidence and a non-zero
//! status instead of a model prediction.

pub mod assessor;
pub mod classify;
pub mod features;

pub use assessor::{FeatureOutcome, MIN_MINUTIAE, NfiqAssessor};
pub use classify::{class_probabilities, classify};
pub use features::{FeatureVector, NUM_FEATURES};
