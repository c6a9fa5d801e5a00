use nbis_core::{BlockMaps, FeatureSet};

/// Length of the quality feature vector.
pub const NUM_FEATURES: usize = 11;

/// Reliability cut-offs for the reliable-minutiae counts.
pub const RELIABILITY_THRESHOLDS: [f64; 5] = [0.5, 0.6, 0.75, 0.8, 0.9];

/// Quality inputs, in classifier order:
///
/// | index | feature |
/// |-------|---------|
/// | 0 | foreground blocks |
/// | 1 | minutiae |
/// | 2..=6 | minutiae with reliability above each of [`RELIABILITY_THRESHOLDS`] |
/// | 7..=10 | fraction of foreground blocks at quality 1, 2, 3, 4 |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector(pub [f64; NUM_FEATURES]);

impl FeatureVector {
    pub fn extract(maps: &BlockMaps, minutiae: &FeatureSet) -> Self {
        let mut f = [0.0; NUM_FEATURES];

        let mut zones = [0usize; 4];
        for &q in &maps.quality {
            if (1..=4).contains(&q) {
                zones[(q - 1) as usize] += 1;
            }
        }
        let foreground: usize = zones.iter().sum();
        f[0] = foreground as f64;
        f[1] = minutiae.len() as f64;
        for (i, &t) in RELIABILITY_THRESHOLDS.iter().enumerate() {
            f[2 + i] = minutiae.iter().filter(|m| m.reliability > t).count() as f64;
        }
        if foreground > 0 {
            for (i, &z) in zones.iter().enumerate() {
                f[7 + i] = z as f64 / foreground as f64;
            }
        }
        Self(f)
    }

    pub fn as_array(&self) -> &[f64; NUM_FEATURES] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nbis_core::{INVALID_DIR, Minutia, MinutiaType};

    #[test]
    fn test_extract_counts_and_fractions() {
        let maps = BlockMaps {
            width: 3,
            height: 2,
            block_size: 8,
            direction: vec![1, 1, 1, 1, INVALID_DIR, INVALID_DIR],
            low_contrast: vec![0, 0, 0, 0, 1, 1],
            low_flow: vec![0; 6],
            high_curve: vec![0; 6],
            quality: vec![4, 4, 3, 1, 0, 0],
        };
        let minutiae = FeatureSet::new(vec![
            Minutia::new(1, 1, 0, MinutiaType::RidgeEnding, 0.95),
            Minutia::new(2, 2, 0, MinutiaType::Bifurcation, 0.7),
            Minutia::new(3, 3, 0, MinutiaType::RidgeEnding, 0.3),
        ]);
        let f = FeatureVector::extract(&maps, &minutiae).0;
        assert_eq!(f[0], 4.0);
        assert_eq!(f[1], 3.0);
        assert_eq!(&f[2..7], &[2.0, 2.0, 1.0, 1.0, 1.0]);
        assert_eq!(&f[7..11], &[0.25, 0.0, 0.25, 0.5]);
    }

    #[test]
    fn test_no_foreground_gives_zero_fractions() {
        let maps = BlockMaps::default();
        let f = FeatureVector::extract(&maps, &FeatureSet::default()).0;
        assert!(f.iter().all(|&v| v == 0.0));
    }
}
