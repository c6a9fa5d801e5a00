//! Image helpers around the engine: loading, saving, normalisation,
//! resampling, region of interest and minutiae overlays.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut};
use nbis_core::{BinarizedImage, FeatureSet, GrayImage, MinutiaType, NbisError, NbisResult};
use serde::Serialize;

use crate::EngineResult;

/// Block edge used by [`estimate_roi`].
pub const ROI_BLOCK_SIZE: usize = 16;

const ENDING_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const BIFURCATION_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Load any format `image` can decode, converted to 8-bit luma.
pub fn load_fingerprint<P: AsRef<Path>>(path: P) -> EngineResult<GrayImage> {
    let img = image::open(path)?.to_luma8();
    Ok(img.into())
}

pub fn save_fingerprint<P: AsRef<Path>>(img: &GrayImage, path: P) -> EngineResult<()> {
    image::GrayImage::from(img).save(path)?;
    Ok(())
}

/// Binarized diagnostic raster as a saveable image.
pub fn binarized_to_image(bin: &BinarizedImage) -> NbisResult<GrayImage> {
    GrayImage::new(bin.width, bin.height, bin.data.clone())
}

/// Shift and scale pixel values to the target mean and standard deviation.
///
/// A flat image becomes a uniform image at `target_mean`.
pub fn normalize_image(img: &GrayImage, target_mean: f64, target_std: f64) -> GrayImage {
    let raw = img.as_raw();
    let n = raw.len() as f64;
    let mean = raw.iter().map(|&p| p as f64).sum::<f64>() / n;
    let var = raw.iter().map(|&p| (p as f64 - mean).powi(2)).sum::<f64>() / n;
    let std = var.sqrt();

    let (w, h) = img.dimensions();
    let data = if std < 1e-6 {
        vec![target_mean.clamp(0.0, 255.0) as u8; raw.len()]
    } else {
        raw.iter()
            .map(|&p| ((p as f64 - mean) / std * target_std + target_mean).clamp(0.0, 255.0) as u8)
            .collect()
    };
    GrayImage::from(
        image::GrayImage::from_raw(w as u32, h as u32, data)
            .unwrap_or_else(|| image::GrayImage::new(w as u32, h as u32)),
    )
}

/// Bilinear resample from `source_ppi` to `target_ppi`.
pub fn resize_to_ppi(img: &GrayImage, source_ppi: u32, target_ppi: u32) -> NbisResult<GrayImage> {
    if source_ppi == 0 || target_ppi == 0 {
        return Err(NbisError::InvalidInput("ppi must be > 0".into()));
    }
    if source_ppi == target_ppi {
        return Ok(img.clone());
    }
    let scale = target_ppi as f64 / source_ppi as f64;
    let (w, h) = img.dimensions();
    let nw = ((w as f64 * scale) as u32).max(1);
    let nh = ((h as f64 * scale) as u32).max(1);
    let resized = imageops::resize(&image::GrayImage::from(img), nw, nh, FilterType::Triangle);
    Ok(resized.into())
}

/// Bounding box of the foreground, half-open in both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Roi {
    pub x_min: usize,
    pub y_min: usize,
    pub x_max: usize,
    pub y_max: usize,
}

impl Roi {
    pub fn width(&self) -> usize {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> usize {
        self.y_max - self.y_min
    }
}

/// Bounding box of the blocks whose pixel variance exceeds `threshold`.
/// Falls back to the whole image when no block qualifies.
///
/// Only blocks ending strictly inside the image are scanned, so a block
/// flush with the right or bottom edge never counts.
pub fn estimate_roi(img: &GrayImage, threshold: f64) -> Roi {
    let (w, h) = img.dimensions();
    let b = ROI_BLOCK_SIZE;
    let mut bounds: Option<(usize, usize, usize, usize)> = None;

    for by in 0..h.saturating_sub(1) / b {
        for bx in 0..w.saturating_sub(1) / b {
            let mut sum = 0.0;
            let mut sum_sq = 0.0;
            for y in by * b..(by + 1) * b {
                for x in bx * b..(bx + 1) * b {
                    let v = img.get(x, y) as f64;
                    sum += v;
                    sum_sq += v * v;
                }
            }
            let n = (b * b) as f64;
            let mean = sum / n;
            if sum_sq / n - mean * mean > threshold {
                bounds = Some(match bounds {
                    None => (bx, by, bx, by),
                    Some((x0, y0, x1, y1)) => (x0.min(bx), y0.min(by), x1.max(bx), y1.max(by)),
                });
            }
        }
    }

    match bounds {
        Some((x0, y0, x1, y1)) => Roi {
            x_min: x0 * b,
            y_min: y0 * b,
            x_max: (x1 + 1) * b,
            y_max: (y1 + 1) * b,
        },
        None => Roi {
            x_min: 0,
            y_min: 0,
            x_max: w,
            y_max: h,
        },
    }
}

/// Colour overlay: a circle per minutia with a tick along its direction.
/// Endings are green, bifurcations red.
pub fn visualize_minutiae(img: &GrayImage, minutiae: &FeatureSet, marker_size: u32) -> RgbImage {
    let mut out = image::DynamicImage::ImageLuma8(image::GrayImage::from(img)).into_rgb8();
    let radius = marker_size.max(1) as i32;
    for m in minutiae.iter() {
        let color = match m.kind {
            MinutiaType::RidgeEnding => ENDING_COLOR,
            MinutiaType::Bifurcation => BIFURCATION_COLOR,
        };
        let (x, y) = (m.x as i32, m.y as i32);
        draw_hollow_circle_mut(&mut out, (x, y), radius, color);

        // Directions are counter-clockwise with y up.
        let (s, c) = (m.direction as f32).to_radians().sin_cos();
        let len = 2.0 * radius as f32;
        let start = (x as f32, y as f32);
        let end = (x as f32 + (len * c).round(), y as f32 - (len * s).round());
        draw_line_segment_mut(&mut out, start, end, color);
    }
    out
}
