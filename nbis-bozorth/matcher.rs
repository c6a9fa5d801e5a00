use nbis_core::{Matcher, XytRecord, XytRow};
use rayon::prelude::*;
use tracing::trace;

use crate::cluster::{combine_clusters, grow_clusters};
use crate::compat::{dominant_rotation, find_associations};
use crate::pairs::PairTable;
use crate::params::{BozorthParams, ParamError};

/// Pair-table matcher.
///
/// Scores are not symmetric: associations are scanned in probe order and
/// conflicts resolve in favour of whichever came first, so swapping probe and
/// gallery can change the result.
#[derive(Debug, Clone, Default)]
pub struct BozorthMatcher {
    params: BozorthParams,
}

impl BozorthMatcher {
    pub fn new(params: BozorthParams) -> Result<Self, ParamError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &BozorthParams {
        &self.params
    }

    fn usable_rows(record: &XytRecord, max_minutiae: usize) -> Vec<XytRow> {
        record.rows().take(max_minutiae).collect()
    }

    /// Pair table for the first `max_minutiae` rows, or `None` if too few
    /// rows remain to compute a score.
    pub fn prepare(&self, record: &XytRecord, max_minutiae: usize) -> Option<PairTable> {
        let rows = Self::usable_rows(record, max_minutiae);
        if rows.len() < self.params.min_computable_minutiae.max(2) {
            return None;
        }
        Some(PairTable::build(&rows, &self.params))
    }

    /// Score two prepared tables.
    pub fn score_tables(&self, probe: &PairTable, gallery: &PairTable) -> i32 {
        let associations = find_associations(probe, gallery, &self.params);
        let aligned = dominant_rotation(&associations, self.params.rotation_bin);
        let clusters = grow_clusters(
            &aligned,
            probe.points().len(),
            gallery.points().len(),
            self.params.max_clusters,
        );
        let n_clusters = clusters.len();
        let score = combine_clusters(clusters, probe.points(), gallery.points(), &self.params);
        trace!(
            "pairs {}/{}, associations {}, aligned {}, clusters {}, score {}",
            probe.len(),
            gallery.len(),
            associations.len(),
            aligned.len(),
            n_clusters,
            score
        );
        i32::try_from(score).unwrap_or(i32::MAX)
    }
}

impl Matcher for BozorthMatcher {
    fn score(&self, probe: &XytRecord, gallery: &XytRecord, max_minutiae: usize) -> i32 {
        match (
            self.prepare(probe, max_minutiae),
            self.prepare(gallery, max_minutiae),
        ) {
            (Some(p), Some(g)) => self.score_tables(&p, &g),
            _ => 0,
        }
    }

    /// Builds the probe table once and scores gallery records in parallel
    /// on the current rayon pool.
    fn score_one_to_many(
        &self,
        probe: &XytRecord,
        gallery: &[XytRecord],
        max_minutiae: usize,
    ) -> Vec<i32> {
        let Some(probe_table) = self.prepare(probe, max_minutiae) else {
            return vec![0; gallery.len()];
        };
        gallery
            .par_iter()
            .map(|g| match self.prepare(g, max_minutiae) {
                Some(t) => self.score_tables(&probe_table, &t),
                None => 0,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nbis_core::MAX_BOZORTH_MINUTIAE;

    /// Deterministic scatter of `n` minutiae over a 300x300 area.
    fn scatter(n: usize, seed: u64) -> Vec<XytRow> {
        let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let mut next = move |m: u64| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 33) % m) as i32
        };
        (0..n)
            .map(|_| XytRow {
                x: 20 + next(300),
                y: 20 + next(300),
                theta: next(360),
            })
            .collect()
    }

    fn record(rows: &[XytRow]) -> XytRecord {
        XytRecord::from_rows(rows.iter().copied(), MAX_BOZORTH_MINUTIAE)
    }

    fn rotate(rows: &[XytRow], degrees: f64, dx: f64, dy: f64) -> Vec<XytRow> {
        // Rotation in the y-up frame, applied to image coordinates.
        let (s, c) = degrees.to_radians().sin_cos();
        rows.iter()
            .map(|r| {
                let (x, y) = (r.x as f64, -(r.y as f64));
                let xr = c * x - s * y + dx;
                let yr = s * x + c * y - dy;
                XytRow {
                    x: xr.round() as i32,
                    y: (-yr).round() as i32,
                    theta: ((r.theta as f64 + degrees).round() as i32).rem_euclid(360),
                }
            })
            .collect()
    }

    #[test]
    fn test_self_match_beats_impostor() {
        let m = BozorthMatcher::default();
        let a = record(&scatter(40, 1));
        let b = record(&scatter(40, 2));
        let genuine = m.score(&a, &a, 150);
        let impostor = m.score(&a, &b, 150);
        assert!(genuine > 100, "genuine {}", genuine);
        assert!(genuine > 5 * impostor.max(1), "genuine {} impostor {}", genuine, impostor);
    }

    #[test]
    fn test_rotated_and_shifted_copy_still_matches() {
        let m = BozorthMatcher::default();
        let rows = scatter(35, 7);
        let a = record(&rows);
        let moved = record(&rotate(&rows, 25.0, 40.0, -15.0));
        let other = record(&scatter(35, 8));
        let genuine = m.score(&a, &moved, 150);
        let impostor = m.score(&a, &other, 150);
        assert!(genuine > 3 * impostor.max(1), "genuine {} impostor {}", genuine, impostor);
        assert!(genuine * 2 > m.score(&a, &a, 150));
    }

    #[test]
    fn test_too_few_minutiae_scores_zero() {
        let m = BozorthMatcher::default();
        let few = record(&scatter(9, 3));
        let many = record(&scatter(40, 3));
        assert_eq!(m.score(&few, &many, 150), 0);
        assert_eq!(m.score(&many, &few, 150), 0);
        assert_eq!(m.score(&XytRecord::empty(), &many, 150), 0);
        // Only the first max_minutiae rows count.
        assert_eq!(m.score(&many, &many, 5), 0);
    }

    #[test]
    fn test_max_minutiae_limits_rows() {
        let m = BozorthMatcher::default();
        let rows = scatter(60, 11);
        let full = record(&rows);
        let head = record(&rows[..20]);
        assert_eq!(m.score(&full, &head, 20), m.score(&head, &head, 150));
    }

    #[test]
    fn test_one_to_many_preserves_order() {
        let m = BozorthMatcher::default();
        let probe = record(&scatter(30, 5));
        let gallery = vec![
            record(&scatter(30, 6)),
            probe.clone(),
            XytRecord::empty(),
        ];
        let scores = m.score_one_to_many(&probe, &gallery, 150);
        assert_eq!(scores.len(), 3);
        assert_eq!(scores[1], m.score(&probe, &probe, 150));
        assert_eq!(scores[2], 0);
        assert!(scores[1] > scores[0]);
    }

    #[test]
    fn test_one_to_many_runs_on_callers_pool() {
        let m = BozorthMatcher::default();
        let probe = record(&scatter(30, 5));
        let gallery: Vec<XytRecord> = (0..6).map(|i| record(&scatter(30, 20 + i))).collect();
        let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        let pooled = pool.install(|| m.score_one_to_many(&probe, &gallery, 150));
        let serial: Vec<i32> = gallery.iter().map(|g| m.score(&probe, g, 150)).collect();
        assert_eq!(pooled, serial);
    }

    /// Rows for a three-point triangle rotated 90 degrees and three
    /// isolated pairs rotated 270 degrees. Each group gathers three
    /// associations, so the rotation vote ties and the earliest bin wins.
    /// The gallery carries one extra point too far away to pair.
    fn split_rotation_prints() -> (XytRecord, XytRecord) {
        let triangle = [(0, 0, 10), (30, 0, 100), (30, 50, 250)];
        let pairs = [
            (300, 0, 0),
            (320, 0, 60),
            (600, 0, 30),
            (600, 40, 170),
            (900, 0, 45),
            (980, 0, 300),
        ];
        let probe: Vec<XytRow> = triangle
            .iter()
            .chain(pairs.iter())
            .map(|&(x, y, theta)| XytRow { x, y, theta })
            .collect();
        // 90 degrees counter-clockwise in the y-up frame: (x, y) -> (y, -x).
        let quarter = triangle.iter().map(|&(x, y, t)| XytRow {
            x: y,
            y: -x,
            theta: (t + 90) % 360,
        });
        // 270 degrees: (x, y) -> (-y, x).
        let three_quarter = pairs.iter().map(|&(x, y, t)| XytRow {
            x: -y,
            y: x,
            theta: (t + 270) % 360,
        });
        let stray = std::iter::once(XytRow {
            x: 2000,
            y: 2000,
            theta: 0,
        });
        let gallery: Vec<XytRow> = quarter.chain(three_quarter).chain(stray).collect();
        (record(&probe), record(&gallery))
    }

    #[test]
    fn test_swapping_roles_changes_score() {
        let m = BozorthMatcher::new(BozorthParams::default().with_min_computable(2)).unwrap();
        let (a, b) = split_rotation_prints();
        assert_eq!((a.len(), b.len()), (9, 10));
        // Forward, the triangle wins the rotation vote and forms one cluster.
        // Swapped, the negated rotations hand the vote to the isolated pairs.
        assert_eq!(m.score(&a, &b, 150), 3);
        assert_eq!(m.score(&b, &a, 150), 1);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = BozorthParams {
            max_pairs: 0,
            ..BozorthParams::default()
        };
        assert!(BozorthMatcher::new(params).is_err());
    }
}
