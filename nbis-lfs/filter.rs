use nbis_core::{BlockMaps, INVALID_DIR, MinutiaType};

use crate::minutiae::Candidate;
use crate::params::ScaledDistances;

#[inline]
fn distance(a: &Candidate, b: &Candidate) -> f64 {
    let dx = a.x as f64 - b.x as f64;
    let dy = a.y as f64 - b.y as f64;
    (dx * dx + dy * dy).sqrt()
}

/// Drop candidates near the image edge, on weak blocks, or next to
/// background blocks.
pub fn remove_unreliable_locations(
    candidates: Vec<Candidate>,
    maps: &BlockMaps,
    width: usize,
    height: usize,
    border_margin: usize,
    min_block_quality: i32,
) -> Vec<Candidate> {
    candidates
        .into_iter()
        .filter(|c| {
            if c.x < border_margin
                || c.y < border_margin
                || c.x + border_margin >= width
                || c.y + border_margin >= height
            {
                return false;
            }
            let (bx, by) = maps.block_of(c.x, c.y);
            if maps.quality[maps.index(bx, by)] < min_block_quality.max(1) {
                return false;
            }
            for ny in by.saturating_sub(1)..=(by + 1).min(maps.height - 1) {
                for nx in bx.saturating_sub(1)..=(bx + 1).min(maps.width - 1) {
                    if maps.direction[maps.index(nx, ny)] == INVALID_DIR {
                        return false;
                    }
                }
            }
            true
        })
        .collect()
}

/// Keep the first of any same-type detections within `radius`.
pub fn remove_duplicates(candidates: Vec<Candidate>, radius: f64) -> Vec<Candidate> {
    let mut kept: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for c in candidates {
        if !kept
            .iter()
            .any(|k| k.kind == c.kind && distance(k, &c) < radius)
        {
            kept.push(c);
        }
    }
    kept
}

/// Remove both members of close pairs: ending pairs (broken ridges and
/// islands), bifurcation pairs (lakes) and ending-bifurcation pairs (spurs).
pub fn remove_close_pairs(candidates: Vec<Candidate>, dist: &ScaledDistances) -> Vec<Candidate> {
    let n = candidates.len();
    let mut drop = vec![false; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let a = &candidates[i];
            let b = &candidates[j];
            let limit = match (a.kind, b.kind) {
                (MinutiaType::RidgeEnding, MinutiaType::RidgeEnding) => dist.min_ending_distance,
                (MinutiaType::Bifurcation, MinutiaType::Bifurcation) => {
                    dist.min_bifurcation_distance
                }
                _ => dist.spur_distance,
            };
            if distance(a, b) < limit {
                drop[i] = true;
                drop[j] = true;
            }
        }
    }
    candidates
        .into_iter()
        .zip(drop)
        .filter_map(|(c, d)| (!d).then_some(c))
        .collect()
}

/// Endings whose ridge ran out almost immediately are skeleton noise.
pub fn remove_short_traces(candidates: Vec<Candidate>, min_trace: usize) -> Vec<Candidate> {
    candidates
        .into_iter()
        .filter(|c| c.kind == MinutiaType::Bifurcation || c.traced >= min_trace)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::LfsParams;

    fn cand(x: usize, y: usize, kind: MinutiaType) -> Candidate {
        Candidate {
            x,
            y,
            kind,
            direction: 0.0,
            traced: 10,
        }
    }

    fn full_maps(w: usize, h: usize) -> BlockMaps {
        let n = w * h;
        BlockMaps {
            width: w,
            height: h,
            block_size: 8,
            direction: vec![4; n],
            low_contrast: vec![0; n],
            low_flow: vec![0; n],
            high_curve: vec![0; n],
            quality: vec![4; n],
        }
    }

    #[test]
    fn test_border_and_background_rejected() {
        let mut maps = full_maps(8, 8);
        let i = maps.index(5, 5);
        maps.direction[i] = INVALID_DIR;
        maps.quality[i] = 0;
        let kept = remove_unreliable_locations(
            vec![
                cand(2, 30, MinutiaType::RidgeEnding),
                cand(20, 20, MinutiaType::RidgeEnding),
                cand(36, 36, MinutiaType::Bifurcation),
            ],
            &maps,
            64,
            64,
            8,
            1,
        );
        assert_eq!(kept.len(), 1);
        assert_eq!((kept[0].x, kept[0].y), (20, 20));
    }

    #[test]
    fn test_duplicates_keep_first() {
        let kept = remove_duplicates(
            vec![
                cand(10, 10, MinutiaType::Bifurcation),
                cand(11, 10, MinutiaType::Bifurcation),
                cand(11, 11, MinutiaType::RidgeEnding),
            ],
            3.0,
        );
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].x, 10);
        assert_eq!(kept[1].kind, MinutiaType::RidgeEnding);
    }

    #[test]
    fn test_close_pairs_removed_together() {
        let dist = LfsParams::default().scaled(500);
        let kept = remove_close_pairs(
            vec![
                cand(10, 10, MinutiaType::RidgeEnding),
                cand(14, 10, MinutiaType::RidgeEnding),
                cand(50, 50, MinutiaType::RidgeEnding),
                cand(80, 80, MinutiaType::Bifurcation),
                cand(84, 82, MinutiaType::RidgeEnding),
            ],
            &dist,
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].x, 50);
    }

    #[test]
    fn test_short_traces_removed() {
        let mut c = cand(10, 10, MinutiaType::RidgeEnding);
        c.traced = 2;
        assert!(remove_short_traces(vec![c], 4).is_empty());
    }
}
