//! Direction-aware binarization.
//!
//! Each foreground pixel is compared along the local ridge: a grid of samples
//! is rotated onto the block's quantized direction, and the pixel is ridge
//! when the row through it is darker than the grid as a whole.

use nbis_core::{BinarizedImage, BlockMaps, GrayImage, INVALID_DIR};
use rayon::prelude::*;
use std::f64::consts::PI;

use crate::params::LfsParams;

pub const RIDGE: u8 = 0;
pub const BACKGROUND: u8 = 255;

/// Sample offsets for one direction, one inner `Vec` per grid row.
/// The centre row is at index `half_width`.
#[derive(Debug, Clone)]
pub struct RotatedGrid {
    rows: Vec<Vec<(i64, i64)>>,
    half_width: usize,
}

impl RotatedGrid {
    fn new(theta: f64, half_length: usize, half_width: usize) -> Self {
        let (s, c) = theta.sin_cos();
        let hl = half_length as i64;
        let hw = half_width as i64;
        let rows = (-hw..=hw)
            .map(|k| {
                (-hl..=hl)
                    .map(|t| {
                        let x = t as f64 * c - k as f64 * s;
                        let y = t as f64 * s + k as f64 * c;
                        (x.round() as i64, y.round() as i64)
                    })
                    .collect()
            })
            .collect();
        Self { rows, half_width }
    }

    fn centre_row(&self) -> &[(i64, i64)] {
        &self.rows[self.half_width]
    }
}

/// Rotated grids for every quantized direction.
pub fn build_grids(params: &LfsParams) -> Vec<RotatedGrid> {
    let step = PI / params.num_directions as f64;
    (0..params.num_directions)
        .map(|d| RotatedGrid::new(d as f64 * step, params.grid_half_length, params.grid_half_width))
        .collect()
}

fn classify_pixel(img: &GrayImage, grid: &RotatedGrid, x: usize, y: usize) -> u8 {
    let sample = |&(dx, dy): &(i64, i64)| img.get_clamped(x as i64 + dx, y as i64 + dy) as u32;

    let centre = grid.centre_row();
    let centre_sum: u32 = centre.iter().map(sample).sum();
    let mut grid_sum = 0u32;
    let mut grid_n = 0u32;
    for row in &grid.rows {
        grid_sum += row.iter().map(sample).sum::<u32>();
        grid_n += row.len() as u32;
    }

    // centre_sum / centre.len() < grid_sum / grid_n, without division.
    if (centre_sum as u64) * (grid_n as u64) < (grid_sum as u64) * (centre.len() as u64) {
        RIDGE
    } else {
        BACKGROUND
    }
}

/// Binarize `img` using the directions in `maps`. Pixels in invalid blocks
/// become background.
pub fn binarize(img: &GrayImage, maps: &BlockMaps, params: &LfsParams) -> BinarizedImage {
    let (w, h) = img.dimensions();
    let grids = build_grids(params);
    let grids = grids.as_slice();

    let data: Vec<u8> = (0..h)
        .into_par_iter()
        .flat_map_iter(|y| {
            (0..w).map(move |x| {
                let (bx, by) = maps.block_of(x, y);
                let dir = maps.direction[maps.index(bx, by)];
                if dir == INVALID_DIR {
                    BACKGROUND
                } else {
                    classify_pixel(img, &grids[dir as usize % grids.len()], x, y)
                }
            })
        })
        .collect();

    BinarizedImage {
        width: w,
        height: h,
        data,
    }
}
