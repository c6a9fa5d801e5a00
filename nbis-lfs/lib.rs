//! Minutiae detection for grayscale fingerprint images.
//!
//! The pipeline runs in fixed stages, each in its own module:
//!
//! 1. [`maps`]: block orientation, contrast, flow, curvature and quality
//! 2. [`binarize`]: ridge/valley separation along the local ridge direction
//! 3. [`thin`]: Zhang-Suen skeletonization
//! 4. [`minutiae`]: crossing-number detection with traced directions
//! 5. [`filter`]: removal of border, island, lake, spur and duplicate minutiae
//!
//! [`LfsDetector`] runs them in order and implements [`nbis_core::Detector`].

pub mod binarize;
pub mod builder;
pub mod detector;
pub mod error;
pub mod filter;
pub mod maps;
pub mod minutiae;
pub mod params;
pub mod thin;

pub use builder::DetectorBuilder;
pub use detector::LfsDetector;
pub use error::{DetectError, DetectResult};
pub use maps::{BlockField, compute_maps};
pub use params::{LfsParams, ScaledDistances};
