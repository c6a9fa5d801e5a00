//! Probe-to-gallery pair compatibility.

use crate::pairs::{PairTable, angle_distance, normalize_degrees};
use crate::params::BozorthParams;

/// A probe pair matched to a gallery pair, with the implied point mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Association {
    /// Probe point indices `(k, j)`.
    pub probe: (u16, u16),
    /// Gallery points corresponding to `probe.0` and `probe.1`.
    pub gallery: (u16, u16),
    /// Rotation taking the probe segment onto the gallery segment, degrees.
    pub rotation: f64,
}

/// All compatible associations, in probe table order.
///
/// For each probe entry the gallery table is entered by binary search on
/// length; gallery pairs are tried in both point orders.
pub fn find_associations(
    probe: &PairTable,
    gallery: &PairTable,
    params: &BozorthParams,
) -> Vec<Association> {
    let mut out = Vec::new();
    let g = gallery.entries();
    let tol = params.angle_tol;

    for p in probe.entries() {
        let window = params.distance_tolerance(p.distance, params.max_distance);
        let start = gallery.lower_bound(p.distance - window);
        for e in &g[start..] {
            if e.distance > p.distance + window {
                break;
            }
            if (p.distance - e.distance).abs() > params.distance_tolerance(p.distance, e.distance) {
                continue;
            }
            if angle_distance(p.beta_k, e.beta_k) <= tol && angle_distance(p.beta_j, e.beta_j) <= tol
            {
                out.push(Association {
                    probe: (p.k, p.j),
                    gallery: (e.k, e.j),
                    rotation: normalize_degrees(e.line - p.line),
                });
            }
            // Reversed gallery segment: its line turns half a circle and the
            // relative angles swap ends.
            if angle_distance(p.beta_k, e.beta_j - 180.0) <= tol
                && angle_distance(p.beta_j, e.beta_k - 180.0) <= tol
            {
                out.push(Association {
                    probe: (p.k, p.j),
                    gallery: (e.j, e.k),
                    rotation: normalize_degrees(e.line + 180.0 - p.line),
                });
            }
        }
    }
    out
}

/// Keep only associations near the most supported global rotation.
///
/// Rotations are histogrammed in `bin`-degree bins; the best window of three
/// adjacent bins wins, earliest bin on ties.
pub fn dominant_rotation(associations: &[Association], bin: f64) -> Vec<Association> {
    if associations.is_empty() {
        return Vec::new();
    }
    let bins = ((360.0 / bin).ceil() as usize).max(1);
    let bin_of = |r: f64| ((r / bin) as usize).min(bins - 1);
    let mut hist = vec![0usize; bins];
    for a in associations {
        hist[bin_of(a.rotation)] += 1;
    }
    let window = |b: usize| hist[(b + bins - 1) % bins] + hist[b] + hist[(b + 1) % bins];
    let mut best = 0;
    for b in 1..bins {
        if window(b) > window(best) {
            best = b;
        }
    }
    associations
        .iter()
        .filter(|a| {
            let b = bin_of(a.rotation);
            b == best || b == (best + 1) % bins || b == (best + bins - 1) % bins
        })
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nbis_core::XytRow;

    fn rows(pts: &[(i32, i32, i32)]) -> Vec<XytRow> {
        pts.iter().map(|&(x, y, theta)| XytRow { x, y, theta }).collect()
    }

    #[test]
    fn test_identical_tables_associate_every_pair() {
        let params = BozorthParams::default();
        let r = rows(&[(10, 10, 0), (40, 12, 45), (25, 50, 200)]);
        let t = PairTable::build(&r, &params);
        let assoc = find_associations(&t, &t, &params);
        for e in t.entries() {
            assert!(assoc.iter().any(|a| a.probe == (e.k, e.j)
                && a.gallery == (e.k, e.j)
                && a.rotation.abs() < 1e-9));
        }
    }

    #[test]
    fn test_reversed_index_order_still_associates() {
        let params = BozorthParams::default();
        let probe = PairTable::build(&rows(&[(0, 0, 30), (30, 0, 100)]), &params);
        let gallery = PairTable::build(&rows(&[(30, 0, 100), (0, 0, 30)]), &params);
        let assoc = find_associations(&probe, &gallery, &params);
        assert_eq!(assoc.len(), 1);
        assert_eq!(assoc[0].gallery, (1, 0));
        assert!(angle_distance(assoc[0].rotation, 0.0) < 1e-9);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let params = BozorthParams::default();
        let probe = PairTable::build(&rows(&[(0, 0, 0), (30, 0, 0)]), &params);
        let gallery = PairTable::build(&rows(&[(0, 0, 0), (40, 0, 0)]), &params);
        assert!(find_associations(&probe, &gallery, &params).is_empty());
    }

    #[test]
    fn test_dominant_rotation_window() {
        let mk = |rotation| Association {
            probe: (0, 1),
            gallery: (0, 1),
            rotation,
        };
        let assoc = vec![mk(31.0), mk(29.0), mk(35.0), mk(180.0), mk(25.0)];
        let kept = dominant_rotation(&assoc, 10.0);
        assert_eq!(kept.len(), 4);
        assert!(kept.iter().all(|a| a.rotation < 40.0));
        assert!(dominant_rotation(&[], 10.0).is_empty());
    }

    #[test]
    fn test_dominant_rotation_wraps_around_zero() {
        let mk = |rotation| Association {
            probe: (0, 1),
            gallery: (0, 1),
            rotation,
        };
        let assoc = vec![mk(355.0), mk(2.0), mk(358.0), mk(90.0)];
        let kept = dominant_rotation(&assoc, 10.0);
        assert_eq!(kept.len(), 3);
    }
}
