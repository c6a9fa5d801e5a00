//! Minutiae matching over rotation- and translation-invariant pair tables.
//!
//! Each print is reduced to a table of minutia pairs (length plus both
//! minutia directions relative to the joining segment). Compatible pairs
//! between two tables vote for a global rotation; associations near the
//! winning rotation are grown into clusters with a one-to-one point mapping,
//! and the score is the size of the largest cluster plus clusters that agree
//! with it.

pub mod cluster;
pub mod compat;
pub mod matcher;
pub mod pairs;
pub mod params;

pub use compat::Association;
pub use matcher::BozorthMatcher;
pub use pairs::{PairEntry, PairTable};
pub use params::{BozorthParams, ParamError};
