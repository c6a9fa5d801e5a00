//! Zhang-Suen thinning of the binarized ridge image.

use nbis_core::BinarizedImage;

use crate::binarize::RIDGE;

/// Neighbour offsets clockwise from north: N, NE, E, SE, S, SW, W, NW.
pub const RING: [(i64, i64); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

/// One-pixel-wide ridge skeleton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skeleton {
    pub width: usize,
    pub height: usize,
    data: Vec<bool>,
}

impl Skeleton {
    pub fn from_mask(width: usize, height: usize, data: Vec<bool>) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            width,
            height,
            data,
        }
    }

    /// Out-of-bounds reads are background.
    #[inline]
    pub fn get(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return false;
        }
        self.data[y as usize * self.width + x as usize]
    }

    pub fn ring(&self, x: i64, y: i64) -> [bool; 8] {
        let mut out = [false; 8];
        for (k, &(dx, dy)) in RING.iter().enumerate() {
            out[k] = self.get(x + dx, y + dy);
        }
        out
    }

    pub fn pixel_count(&self) -> usize {
        self.data.iter().filter(|&&p| p).count()
    }

    fn set(&mut self, x: usize, y: usize, v: bool) {
        self.data[y * self.width + x] = v;
    }
}

/// Number of separate runs of set pixels around the ring.
pub fn crossing_number(ring: &[bool; 8]) -> usize {
    (0..8).filter(|&k| !ring[k] && ring[(k + 1) % 8]).count()
}

fn zhang_suen_pass(skel: &Skeleton, first: bool) -> Vec<(usize, usize)> {
    let mut remove = Vec::new();
    for y in 1..skel.height.saturating_sub(1) {
        for x in 1..skel.width.saturating_sub(1) {
            if !skel.get(x as i64, y as i64) {
                continue;
            }
            let r = skel.ring(x as i64, y as i64);
            let b = r.iter().filter(|&&p| p).count();
            if !(2..=6).contains(&b) || crossing_number(&r) != 1 {
                continue;
            }
            let (n, e, s, w) = (r[0], r[2], r[4], r[6]);
            let keep = if first {
                (n && e && s) || (e && s && w)
            } else {
                (n && e && w) || (n && s && w)
            };
            if !keep {
                remove.push((x, y));
            }
        }
    }
    remove
}

/// Thin ridge pixels of `bin` down to a skeleton. The outer image border is
/// always background.
pub fn thin(bin: &BinarizedImage) -> Skeleton {
    let (w, h) = (bin.width, bin.height);
    let mut mask: Vec<bool> = bin.data.iter().map(|&p| p == RIDGE).collect();
    for x in 0..w {
        mask[x] = false;
        mask[(h - 1) * w + x] = false;
    }
    for y in 0..h {
        mask[y * w] = false;
        mask[y * w + w - 1] = false;
    }
    let mut skel = Skeleton::from_mask(w, h, mask);

    loop {
        let mut changed = false;
        for first in [true, false] {
            let remove = zhang_suen_pass(&skel, first);
            changed |= !remove.is_empty();
            for (x, y) in remove {
                skel.set(x, y, false);
            }
        }
        if !changed {
            break;
        }
    }

    // Lone pixels carry no ridge.
    for y in 1..h.saturating_sub(1) {
        for x in 1..w.saturating_sub(1) {
            if skel.get(x as i64, y as i64) && !skel.ring(x as i64, y as i64).contains(&true) {
                skel.set(x, y, false);
            }
        }
    }
    skel
}
