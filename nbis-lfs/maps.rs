//! Per-block ridge orientation, contrast and quality rasters.

use nbis_core::{BlockMaps, GrayImage, INVALID_DIR};
use rayon::prelude::*;
use std::f64::consts::PI;

use crate::params::LfsParams;

/// Continuous per-block measurements behind the integer [`BlockMaps`].
#[derive(Debug, Clone)]
pub struct BlockField {
    pub width: usize,
    pub height: usize,
    pub block_size: usize,
    /// Ridge angle in radians, `[0, PI)`, image frame with y pointing down.
    /// `NaN` where the block is invalid.
    pub theta: Vec<f64>,
    pub coherence: Vec<f64>,
    /// Intensity standard deviation over the block window.
    pub contrast: Vec<f64>,
}

impl BlockField {
    #[inline]
    pub fn index(&self, bx: usize, by: usize) -> usize {
        by * self.width + bx
    }

    /// Ridge angle of the block covering pixel `(x, y)`.
    pub fn theta_at(&self, x: usize, y: usize) -> f64 {
        let bx = (x / self.block_size).min(self.width - 1);
        let by = (y / self.block_size).min(self.height - 1);
        self.theta[self.index(bx, by)]
    }

    pub fn contrast_at(&self, x: usize, y: usize) -> f64 {
        let bx = (x / self.block_size).min(self.width - 1);
        let by = (y / self.block_size).min(self.height - 1);
        self.contrast[self.index(bx, by)]
    }
}

#[derive(Debug, Clone, Copy)]
struct BlockStats {
    theta: f64,
    coherence: f64,
    contrast: f64,
}

/// Sobel gradients, zero on the one-pixel border.
fn gradients(img: &GrayImage) -> (Vec<f32>, Vec<f32>) {
    let (w, h) = img.dimensions();
    let data = img.as_raw();
    let rows: Vec<(Vec<f32>, Vec<f32>)> = (0..h)
        .into_par_iter()
        .map(|y| {
            let mut gx = vec![0.0f32; w];
            let mut gy = vec![0.0f32; w];
            if y == 0 || y + 1 >= h {
                return (gx, gy);
            }
            let p = |xx: usize, yy: usize| data[yy * w + xx] as f32;
            for x in 1..w.saturating_sub(1) {
                gx[x] = (p(x + 1, y - 1) + 2.0 * p(x + 1, y) + p(x + 1, y + 1))
                    - (p(x - 1, y - 1) + 2.0 * p(x - 1, y) + p(x - 1, y + 1));
                gy[x] = (p(x - 1, y + 1) + 2.0 * p(x, y + 1) + p(x + 1, y + 1))
                    - (p(x - 1, y - 1) + 2.0 * p(x, y - 1) + p(x + 1, y - 1));
            }
            (gx, gy)
        })
        .collect();

    let mut gx = Vec::with_capacity(w * h);
    let mut gy = Vec::with_capacity(w * h);
    for (rx, ry) in rows {
        gx.extend(rx);
        gy.extend(ry);
    }
    (gx, gy)
}

fn block_stats(
    img: &GrayImage,
    gx: &[f32],
    gy: &[f32],
    bx: usize,
    by: usize,
    params: &LfsParams,
) -> BlockStats {
    let (w, h) = img.dimensions();
    let data = img.as_raw();
    let bs = params.block_size;
    let half = params.window_size / 2;
    let cx = bx * bs + bs / 2;
    let cy = by * bs + bs / 2;
    let x0 = cx.saturating_sub(half);
    let y0 = cy.saturating_sub(half);
    let x1 = (cx + half).min(w);
    let y1 = (cy + half).min(h);

    let (mut gxx, mut gyy, mut gxy) = (0.0f64, 0.0f64, 0.0f64);
    let (mut sum, mut sum_sq, mut n) = (0.0f64, 0.0f64, 0usize);
    for y in y0..y1 {
        let row = y * w;
        for x in x0..x1 {
            let dx = gx[row + x] as f64;
            let dy = gy[row + x] as f64;
            gxx += dx * dx;
            gyy += dy * dy;
            gxy += dx * dy;
            let v = data[row + x] as f64;
            sum += v;
            sum_sq += v * v;
            n += 1;
        }
    }

    let mean = sum / n.max(1) as f64;
    let contrast = (sum_sq / n.max(1) as f64 - mean * mean).max(0.0).sqrt();
    let energy = gxx + gyy;
    let coherence = if energy > f64::EPSILON {
        ((gxx - gyy).powi(2) + 4.0 * gxy * gxy).sqrt() / energy
    } else {
        0.0
    };
    // Dominant gradient direction, rotated a quarter turn onto the ridge.
    let phi = 0.5 * (2.0 * gxy).atan2(gxx - gyy);
    let theta = (phi + PI / 2.0).rem_euclid(PI);

    BlockStats {
        theta,
        coherence,
        contrast,
    }
}

/// Smallest angle between two undirected orientations, in radians.
pub fn orientation_difference(a: f64, b: f64) -> f64 {
    let d = (a - b).abs().rem_euclid(PI);
    d.min(PI - d)
}

const NEIGHBOURS: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Compute block maps for `img`. The image must be at least one window wide.
pub fn compute_maps(img: &GrayImage, params: &LfsParams) -> (BlockMaps, BlockField) {
    let (w, h) = img.dimensions();
    let bs = params.block_size;
    let mw = w.div_ceil(bs);
    let mh = h.div_ceil(bs);
    let (gx, gy) = gradients(img);
    let (gx, gy) = (gx.as_slice(), gy.as_slice());

    let stats: Vec<BlockStats> = (0..mh)
        .into_par_iter()
        .flat_map_iter(|by| (0..mw).map(move |bx| block_stats(img, gx, gy, bx, by, params)))
        .collect();

    let n = mw * mh;
    let mut low_contrast = vec![0i32; n];
    let mut low_flow = vec![0i32; n];
    let mut valid = vec![false; n];
    for (i, s) in stats.iter().enumerate() {
        if s.contrast < params.min_contrast {
            low_contrast[i] = 1;
        } else if s.coherence < params.min_coherence {
            low_flow[i] = 1;
        } else {
            valid[i] = true;
        }
    }

    let neighbours = |bx: usize, by: usize| {
        NEIGHBOURS.iter().filter_map(move |&(dx, dy)| {
            let nx = bx as i64 + dx;
            let ny = by as i64 + dy;
            (nx >= 0 && ny >= 0 && (nx as usize) < mw && (ny as usize) < mh)
                .then(|| ny as usize * mw + nx as usize)
        })
    };

    // Isolated foreground blocks are noise.
    let snapshot = valid.clone();
    for by in 0..mh {
        for bx in 0..mw {
            let i = by * mw + bx;
            if snapshot[i] && neighbours(bx, by).filter(|&j| snapshot[j]).count() < 2 {
                valid[i] = false;
                low_flow[i] = 1;
            }
        }
    }

    let step = PI / params.num_directions as f64;
    let curve_limit = params.high_curve_degrees.to_radians();
    let mut direction = vec![INVALID_DIR; n];
    let mut high_curve = vec![0i32; n];
    let mut quality = vec![0i32; n];
    let mut theta = vec![f64::NAN; n];

    for by in 0..mh {
        for bx in 0..mw {
            let i = by * mw + bx;
            if !valid[i] {
                continue;
            }
            let t = stats[i].theta;
            theta[i] = t;
            direction[i] = ((t / step).round() as i32).rem_euclid(params.num_directions as i32);

            let mut diff_sum = 0.0;
            let mut diff_n = 0usize;
            let mut touches_invalid = NEIGHBOURS.len() > neighbours(bx, by).count();
            for j in neighbours(bx, by) {
                if valid[j] {
                    diff_sum += orientation_difference(t, stats[j].theta);
                    diff_n += 1;
                } else {
                    touches_invalid = true;
                }
            }
            if diff_n >= 2 && diff_sum / diff_n as f64 > curve_limit {
                high_curve[i] = 1;
            }

            let mut q = 4;
            if high_curve[i] == 1 {
                q = 2;
            } else if touches_invalid {
                q = 3;
            }
            if stats[i].coherence < 2.0 * params.min_coherence {
                q -= 1;
            }
            quality[i] = q.max(1);
        }
    }

    let maps = BlockMaps {
        width: mw,
        height: mh,
        block_size: bs,
        direction,
        low_contrast,
        low_flow,
        high_curve,
        quality,
    };
    let field = BlockField {
        width: mw,
        height: mh,
        block_size: bs,
        theta,
        coherence: stats.iter().map(|s| s.coherence).collect(),
        contrast: stats.iter().map(|s| s.contrast).collect(),
    };
    (maps, field)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stripes(w: usize, h: usize, period: f64, angle: f64) -> GrayImage {
        let (s, c) = angle.sin_cos();
        let data = (0..h)
            .flat_map(|y| {
                (0..w).map(move |x| {
                    let u = x as f64 * c + y as f64 * s;
                    (128.0 + 100.0 * (2.0 * PI * u / period).cos()) as u8
                })
            })
            .collect();
        GrayImage::new(w, h, data).unwrap()
    }

    #[test]
    fn test_blank_image_has_no_foreground() {
        let img = GrayImage::blank(64, 64, 200).unwrap();
        let (maps, _) = compute_maps(&img, &LfsParams::default());
        assert_eq!(maps.width, 8);
        assert_eq!(maps.foreground_blocks(), 0);
        assert!(maps.low_contrast.iter().all(|&v| v == 1));
        assert!(maps.quality.iter().all(|&q| q == 0));
    }

    #[test]
    fn test_map_dimensions_round_up() {
        let img = GrayImage::blank(70, 50, 0).unwrap();
        let (maps, field) = compute_maps(&img, &LfsParams::default());
        assert_eq!((maps.width, maps.height), (9, 7));
        assert_eq!(maps.len(), field.theta.len());
    }

    #[test]
    fn test_vertical_stripes_give_vertical_ridges() {
        // Intensity varies along x, so ridges run along y.
        let img = stripes(96, 96, 9.0, 0.0);
        let params = LfsParams::default();
        let (maps, field) = compute_maps(&img, &params);
        let centre = maps.index(6, 6);
        assert_ne!(maps.direction[centre], INVALID_DIR);
        assert!(orientation_difference(field.theta[centre], PI / 2.0) < 0.1);
        assert_eq!(maps.direction[centre], 8);
        assert_eq!(maps.quality[centre], 4);
    }

    #[test]
    fn test_orientation_difference_wraps() {
        assert!(orientation_difference(0.05, PI - 0.05) < 0.11);
        assert!((orientation_difference(0.0, PI / 2.0) - PI / 2.0).abs() < 1e-12);
    }
}
