use nbis_cli::GrayImage;

/// Ridge grating with phase singularities. Each singularity splits or ends
/// a ridge, so it thins to a minutia. Different seeds move the singularities
/// and turn the grating.
pub fn synthetic_print(width: usize, height: usize, singularities: usize, seed: u64) -> GrayImage {
    let mut state = seed
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 33) as f64 / (1u64 << 31) as f64
    };

    let angle = next() * std::f64::consts::PI;
    let (ux, uy) = (angle.cos(), angle.sin());
    let points: Vec<(f64, f64, f64)> = (0..singularities)
        .map(|i| {
            let px = width as f64 * (0.2 + 0.6 * next());
            let py = height as f64 * (0.2 + 0.6 * next());
            (px, py, if i % 2 == 0 { 1.0 } else { -1.0 })
        })
        .collect();
    let points = points.as_slice();

    let data = (0..height)
        .flat_map(|y| {
            (0..width).map(move |x| {
                let (xf, yf) = (x as f64, y as f64);
                let mut phase = 2.0 * std::f64::consts::PI * (ux * xf + uy * yf) / 9.0;
                for &(px, py, s) in points {
                    phase += s * (yf - py).atan2(xf - px);
                }
                (128.0 + 100.0 * phase.cos()) as u8
            })
        })
        .collect();
    GrayImage::new(width, height, data).unwrap()
}
