use nbis_core::MIN_COMPUTABLE_BOZORTH_MINUTIAE;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid matcher parameters: {0}")]
pub struct ParamError(pub String);

/// Tolerances and limits for pair-table matching.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BozorthParams {
    /// Pairs closer than this are not tabled.
    pub min_distance: f64,
    /// Pairs farther apart than this are not tabled.
    pub max_distance: f64,
    /// Table entries kept per print, shortest first.
    pub max_pairs: usize,
    pub dist_abs_tol: f64,
    /// Relative distance tolerance against the mean of both lengths.
    pub dist_rel_tol: f64,
    /// Degrees allowed between relative minutia angles.
    pub angle_tol: f64,
    /// Width in degrees of one rotation histogram bin.
    pub rotation_bin: f64,
    /// Cluster translations farther apart than this never combine.
    pub translation_tol: f64,
    /// Clusters smaller than this never contribute to the score bonus.
    pub min_bonus_cluster: usize,
    pub max_clusters: usize,
    /// Prints with fewer usable rows than this score 0.
    pub min_computable_minutiae: usize,
}

impl Default for BozorthParams {
    fn default() -> Self {
        Self {
            min_distance: 5.0,
            max_distance: 125.0,
            max_pairs: 20_000,
            dist_abs_tol: 3.0,
            dist_rel_tol: 0.05,
            angle_tol: 11.0,
            rotation_bin: 10.0,
            translation_tol: 12.0,
            min_bonus_cluster: 2,
            max_clusters: 600,
            min_computable_minutiae: MIN_COMPUTABLE_BOZORTH_MINUTIAE,
        }
    }
}

impl BozorthParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_computable(mut self, n: usize) -> Self {
        self.min_computable_minutiae = n;
        self
    }

    pub fn with_angle_tolerance(mut self, degrees: f64) -> Self {
        self.angle_tol = degrees;
        self
    }

    pub fn with_distance_range(mut self, min: f64, max: f64) -> Self {
        self.min_distance = min;
        self.max_distance = max;
        self
    }

    /// Allowed length difference for two pairs of the given lengths.
    #[inline]
    pub fn distance_tolerance(&self, a: f64, b: f64) -> f64 {
        self.dist_abs_tol.max(self.dist_rel_tol * 0.5 * (a + b))
    }

    pub fn validate(&self) -> Result<(), ParamError> {
        if !(self.min_distance >= 0.0 && self.min_distance < self.max_distance) {
            return Err(ParamError(format!(
                "distance range [{}, {}] is empty",
                self.min_distance, self.max_distance
            )));
        }
        if self.max_pairs == 0 || self.max_clusters == 0 {
            return Err(ParamError("max_pairs and max_clusters must be > 0".into()));
        }
        if !(0.0..90.0).contains(&self.angle_tol) {
            return Err(ParamError(format!(
                "angle_tol {} outside [0, 90)",
                self.angle_tol
            )));
        }
        if !(self.rotation_bin > 0.0 && self.rotation_bin <= 90.0) {
            return Err(ParamError(format!(
                "rotation_bin {} outside (0, 90]",
                self.rotation_bin
            )));
        }
        if self.dist_abs_tol < 0.0 || self.dist_rel_tol < 0.0 || self.translation_tol < 0.0 {
            return Err(ParamError("tolerances must be >= 0".into()));
        }
        Ok(())
    }

    pub fn summary(&self) -> String {
        format!(
            "BozorthParams: pairs {}..{}px (max {}), dist tol {}px/{:.0}%, angle tol {} deg, min computable {}",
            self.min_distance,
            self.max_distance,
            self.max_pairs,
            self.dist_abs_tol,
            self.dist_rel_tol * 100.0,
            self.angle_tol,
            self.min_computable_minutiae
        )
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    #[cfg(feature = "serde")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    #[cfg(feature = "serde")]
    pub fn from_toml(toml_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let params: Self = toml::from_str(toml_str)?;
        params.validate()?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        let p = BozorthParams::default();
        assert!(p.validate().is_ok());
        assert_eq!(p.min_computable_minutiae, 10);
    }

    #[test]
    fn test_distance_tolerance_grows_with_length() {
        let p = BozorthParams::default();
        assert_eq!(p.distance_tolerance(10.0, 10.0), 3.0);
        assert!((p.distance_tolerance(100.0, 120.0) - 5.5).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_ranges() {
        assert!(BozorthParams::default().with_distance_range(50.0, 10.0).validate().is_err());
        assert!(BozorthParams::default().with_angle_tolerance(120.0).validate().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_partial_json() {
        let p = BozorthParams::from_json(r#"{"angle_tol": 8.0}"#).unwrap();
        assert_eq!(p.angle_tol, 8.0);
        assert_eq!(p.max_distance, 125.0);
    }
}
