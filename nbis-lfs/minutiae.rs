//! Crossing-number minutiae extraction on the skeleton.
//!
//! Directions are measured counter-clockwise from +x with the y axis pointing
//! up, so image-row offsets are negated before taking the angle.

use nbis_core::MinutiaType;
use rayon::prelude::*;

use crate::thin::{RING, Skeleton, crossing_number};

/// Raw detection before false-minutia removal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub x: usize,
    pub y: usize,
    pub kind: MinutiaType,
    /// Degrees in `[0, 360)`.
    pub direction: f64,
    /// Pixels actually traced, shortest branch for bifurcations.
    pub traced: usize,
}

/// Angle in degrees `[0, 360)` of the image-frame vector `(dx, dy)`.
pub fn angle_degrees(dx: f64, dy: f64) -> f64 {
    (-dy).atan2(dx).to_degrees().rem_euclid(360.0)
}

/// Absolute difference between two angles in degrees, `[0, 180]`.
pub fn angle_difference(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}

/// Start pixel of each run of set neighbours around `(x, y)`, preferring the
/// edge-adjacent pixel of a run.
fn branch_starts(ring: &[bool; 8], x: i64, y: i64) -> Vec<(i64, i64)> {
    let Some(gap) = (0..8).find(|&k| !ring[k]) else {
        return Vec::new();
    };
    let mut starts = Vec::new();
    let mut run: Vec<usize> = Vec::new();
    for step in 1..=8 {
        let k = (gap + step) % 8;
        if ring[k] {
            run.push(k);
        } else if !run.is_empty() {
            let pick = run.iter().copied().find(|k| k % 2 == 0).unwrap_or(run[0]);
            starts.push((x + RING[pick].0, y + RING[pick].1));
            run.clear();
        }
    }
    starts
}

/// Follow the skeleton from `first` for up to `len` pixels, never revisiting
/// `seed` pixels. Stops early at junctions and ridge ends.
fn trace(skel: &Skeleton, first: (i64, i64), seed: &[(i64, i64)], len: usize) -> ((i64, i64), usize) {
    let mut visited: Vec<(i64, i64)> = seed.to_vec();
    visited.push(first);
    let mut cur = first;
    let mut steps = 1;
    while steps < len {
        let ring = skel.ring(cur.0, cur.1);
        if crossing_number(&ring) >= 3 {
            break;
        }
        let next = [0usize, 2, 4, 6, 1, 3, 5, 7]
            .iter()
            .filter(|&&k| ring[k])
            .map(|&k| (cur.0 + RING[k].0, cur.1 + RING[k].1))
            .find(|p| !visited.contains(p));
        match next {
            Some(p) => {
                visited.push(p);
                cur = p;
                steps += 1;
            }
            None => break,
        }
    }
    (cur, steps)
}

fn seed_pixels(ring: &[bool; 8], x: i64, y: i64) -> Vec<(i64, i64)> {
    let mut seed = vec![(x, y)];
    for (k, &(dx, dy)) in RING.iter().enumerate() {
        if ring[k] {
            seed.push((x + dx, y + dy));
        }
    }
    seed
}

fn ending_at(skel: &Skeleton, ring: &[bool; 8], x: i64, y: i64, len: usize) -> Option<Candidate> {
    let starts = branch_starts(ring, x, y);
    let &first = starts.first()?;
    let seed = seed_pixels(ring, x, y);
    let ((qx, qy), traced) = trace(skel, first, &seed, len);
    Some(Candidate {
        x: x as usize,
        y: y as usize,
        kind: MinutiaType::RidgeEnding,
        direction: angle_degrees((x - qx) as f64, (y - qy) as f64),
        traced,
    })
}

fn bifurcation_at(
    skel: &Skeleton,
    ring: &[bool; 8],
    x: i64,
    y: i64,
    len: usize,
) -> Option<Candidate> {
    let starts = branch_starts(ring, x, y);
    if starts.len() != 3 {
        return None;
    }
    let seed = seed_pixels(ring, x, y);
    let mut angles = [0.0f64; 3];
    let mut traced = usize::MAX;
    for (i, &first) in starts.iter().enumerate() {
        let ((qx, qy), n) = trace(skel, first, &seed, len);
        angles[i] = angle_degrees((qx - x) as f64, (qy - y) as f64);
        traced = traced.min(n);
    }

    // The stem is the branch farthest from both others.
    let separation = |i: usize| {
        (0..3)
            .filter(|&j| j != i)
            .map(|j| angle_difference(angles[i], angles[j]))
            .fold(f64::INFINITY, f64::min)
    };
    let stem = (0..3)
        .max_by(|&a, &b| separation(a).total_cmp(&separation(b)))
        .unwrap_or(0);

    Some(Candidate {
        x: x as usize,
        y: y as usize,
        kind: MinutiaType::Bifurcation,
        direction: (angles[stem] + 180.0).rem_euclid(360.0),
        traced,
    })
}

/// Scan the skeleton in raster order for ridge endings (one branch) and
/// bifurcations (three branches).
pub fn find_candidates(skel: &Skeleton, trace_length: usize) -> Vec<Candidate> {
    (1..skel.height.saturating_sub(1))
        .into_par_iter()
        .flat_map_iter(|y| {
            (1..skel.width.saturating_sub(1)).filter_map(move |x| {
                let (x, y) = (x as i64, y as i64);
                if !skel.get(x, y) {
                    return None;
                }
                let ring = skel.ring(x, y);
                match crossing_number(&ring) {
                    1 => ending_at(skel, &ring, x, y, trace_length),
                    3 => bifurcation_at(skel, &ring, x, y, trace_length),
                    _ => None,
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skeleton(w: usize, h: usize, pixels: &[(usize, usize)]) -> Skeleton {
        let mut data = vec![false; w * h];
        for &(x, y) in pixels {
            data[y * w + x] = true;
        }
        Skeleton::from_mask(w, h, data)
    }

    #[test]
    fn test_angle_convention() {
        assert_eq!(angle_degrees(1.0, 0.0), 0.0);
        // One row up in the image is +90 degrees.
        assert!((angle_degrees(0.0, -1.0) - 90.0).abs() < 1e-9);
        assert!((angle_degrees(-1.0, 0.0) - 180.0).abs() < 1e-9);
        assert!((angle_degrees(0.0, 1.0) - 270.0).abs() < 1e-9);
        assert!((angle_difference(350.0, 10.0) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_horizontal_line_has_two_endings() {
        let pixels: Vec<_> = (5..25).map(|x| (x, 10)).collect();
        let skel = skeleton(30, 20, &pixels);
        let cands = find_candidates(&skel, 8);
        assert_eq!(cands.len(), 2);
        assert!(cands.iter().all(|c| c.kind == MinutiaType::RidgeEnding));
        // Left end points left, right end points right.
        assert_eq!((cands[0].x, cands[0].y), (5, 10));
        assert!((cands[0].direction - 180.0).abs() < 1e-9);
        assert_eq!(cands[1].x, 24);
        assert!(cands[1].direction.abs() < 1e-9);
        assert_eq!(cands[0].traced, 8);
    }

    #[test]
    fn test_fork_is_bifurcation_pointing_between_tines() {
        // Stem from the left, tines leaving up-right and down-right.
        let mut pixels: Vec<(usize, usize)> = (2..20).map(|x| (x, 20)).collect();
        for d in 1..15 {
            pixels.push((19 + d, 20 - d));
            pixels.push((19 + d, 20 + d));
        }
        let skel = skeleton(40, 40, &pixels);
        let cands = find_candidates(&skel, 8);
        let bif: Vec<_> = cands
            .iter()
            .filter(|c| c.kind == MinutiaType::Bifurcation)
            .collect();
        assert_eq!(bif.len(), 1);
        assert_eq!((bif[0].x, bif[0].y), (19, 20));
        assert!(angle_difference(bif[0].direction, 0.0) < 1.0);
    }

    #[test]
    fn test_branch_starts_prefers_edge_neighbour() {
        let ring = [true, true, false, false, false, false, false, false];
        assert_eq!(branch_starts(&ring, 5, 5), vec![(5, 4)]);
        assert!(branch_starts(&[true; 8], 5, 5).is_empty());
    }
}
