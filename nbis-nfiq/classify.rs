//! Fixed linear-softmax quality classifier.

use crate::features::{FeatureVector, NUM_FEATURES};

/// Feature means used for z-normalisation.
pub const ZNORM_MEANS: [f64; NUM_FEATURES] = [
    2000.0, 60.0, 45.0, 40.0, 30.0, 20.0, 10.0, 0.05, 0.10, 0.25, 0.60,
];

/// Feature standard deviations used for z-normalisation.
pub const ZNORM_STDS: [f64; NUM_FEATURES] = [
    700.0, 25.0, 20.0, 20.0, 18.0, 15.0, 10.0, 0.05, 0.08, 0.15, 0.20,
];

/// Contribution of each normalised feature to overall goodness.
const GOODNESS_WEIGHTS: [f64; NUM_FEATURES] = [
    0.3, 0.4, 0.3, 0.3, 0.4, 0.4, 0.3, -0.4, -0.3, -0.1, 0.6,
];

/// Per-class slope and bias over goodness; class 1 first.
const CLASS_SLOPES: [f64; 5] = [2.0, 1.0, 0.0, -1.0, -2.0];
const CLASS_BIASES: [f64; 5] = [-1.5, 0.0, 0.5, 0.0, -1.5];

pub fn znormalize(features: &FeatureVector) -> [f64; NUM_FEATURES] {
    let mut z = [0.0; NUM_FEATURES];
    for (i, v) in features.as_array().iter().enumerate() {
        z[i] = (v - ZNORM_MEANS[i]) / ZNORM_STDS[i];
    }
    z
}

/// Class probabilities, class 1 (best) first. Always sums to 1.
pub fn class_probabilities(features: &FeatureVector) -> [f64; 5] {
    let z = znormalize(features);
    let goodness: f64 = z.iter().zip(GOODNESS_WEIGHTS).map(|(z, w)| z * w).sum();

    let mut logits = [0.0; 5];
    for c in 0..5 {
        logits[c] = CLASS_SLOPES[c] * goodness + CLASS_BIASES[c];
    }
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut probs = [0.0; 5];
    let mut total = 0.0;
    for c in 0..5 {
        probs[c] = (logits[c] - max).exp();
        total += probs[c];
    }
    for p in &mut probs {
        *p /= total;
    }
    probs
}

/// Winning class in `1..=5` and its probability. Ties go to the better class.
pub fn classify(features: &FeatureVector) -> (u8, f64) {
    let probs = class_probabilities(features);
    let mut best = 0;
    for c in 1..5 {
        if probs[c] > probs[best] {
            best = c;
        }
    }
    (best as u8 + 1, probs[best])
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn shifted(sigmas: f64) -> FeatureVector {
        let mut f = [0.0; NUM_FEATURES];
        for i in 0..NUM_FEATURES {
            f[i] = ZNORM_MEANS[i] + sigmas * GOODNESS_WEIGHTS[i].signum() * ZNORM_STDS[i];
        }
        FeatureVector(f)
    }

    #[test]
    fn test_average_print_is_middle_class() {
        assert_eq!(classify(&FeatureVector(ZNORM_MEANS)).0, 3);
    }

    #[test]
    fn test_extremes() {
        let (best, conf) = classify(&shifted(2.0));
        assert_eq!(best, 1);
        assert!(conf > 0.9);
        assert_eq!(classify(&shifted(-2.0)).0, 5);
    }

    #[test]
    fn test_better_features_never_worse_class() {
        let mut last = 5;
        for step in -8..=8 {
            let (class, _) = classify(&shifted(step as f64 * 0.5));
            assert!(class <= last);
            last = class;
        }
    }

    proptest! {
        #[test]
        fn prop_probabilities_are_distribution(values in proptest::array::uniform11(0.0f64..5000.0)) {
            let probs = class_probabilities(&FeatureVector(values));
            let sum: f64 = probs.iter().sum();
            prop_assert!((sum - 1.0).abs() < 1e-9);
            prop_assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
            let (class, conf) = classify(&FeatureVector(values));
            prop_assert!((1..=5).contains(&class));
            prop_assert!(conf >= 0.2 - 1e-12);
        }
    }
}
