use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use nbis_core::GrayImage;
use nbis_lfs::binarize::binarize;
use nbis_lfs::thin::thin;
use nbis_lfs::{DetectorBuilder, LfsDetector, LfsParams, compute_maps};

/// Ridge grating with phase singularities, each of which thins to a minutia.
fn create_benchmark_image(width: usize, height: usize, singularities: usize) -> GrayImage {
    let points: Vec<(f64, f64, f64)> = (0..singularities)
        .map(|i| {
            let fx = ((i * 37 + 11) % 97) as f64 / 97.0;
            let fy = ((i * 61 + 29) % 89) as f64 / 89.0;
            let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
            (
                width as f64 * (0.15 + 0.7 * fx),
                height as f64 * (0.15 + 0.7 * fy),
                sign,
            )
        })
        .collect();
    let points = points.as_slice();
    let data = (0..height)
        .flat_map(|y| {
            (0..width).map(move |x| {
                let (xf, yf) = (x as f64, y as f64);
                let mut phase = 2.0 * std::f64::consts::PI * (0.8 * xf + 0.6 * yf) / 9.0;
                for &(px, py, s) in points {
                    phase += s * (yf - py).atan2(xf - px);
                }
                (128.0 + 100.0 * phase.cos()) as u8
            })
        })
        .collect();
    GrayImage::new(width, height, data).unwrap()
}

fn bench_full_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_detection");
    let detector = LfsDetector::default();

    for &size in &[128usize, 256, 512] {
        let img = create_benchmark_image(size, size, 12);
        group.bench_with_input(
            BenchmarkId::new("default", format!("{}x{}", size, size)),
            &img,
            |b, img| b.iter(|| black_box(detector.detect_image(black_box(img), 500).unwrap())),
        );
    }

    group.finish();
}

fn bench_pipeline_stages(c: &mut Criterion) {
    let params = LfsParams::default();
    let img = create_benchmark_image(256, 256, 12);
    let mut group = c.benchmark_group("pipeline_stages");

    group.bench_function("block_maps", |b| {
        b.iter(|| black_box(compute_maps(black_box(&img), &params)))
    });

    let (maps, _) = compute_maps(&img, &params);
    group.bench_function("binarize", |b| {
        b.iter(|| black_box(binarize(black_box(&img), &maps, &params)))
    });

    let bin = binarize(&img, &maps, &params);
    group.bench_function("thin", |b| b.iter(|| black_box(thin(black_box(&bin)))));

    group.finish();
}

fn bench_presets(c: &mut Criterion) {
    let mut group = c.benchmark_group("presets");
    let img = create_benchmark_image(256, 256, 12);

    let presets = [
        ("default", DetectorBuilder::new()),
        ("fast", DetectorBuilder::new().preset_fast()),
        ("sensitive", DetectorBuilder::new().preset_sensitive()),
    ];
    for (name, builder) in presets {
        let detector = builder.build().unwrap();
        group.bench_function(name, |b| {
            b.iter(|| black_box(detector.detect_image(black_box(&img), 500).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_full_detection, bench_pipeline_stages, bench_presets);
criterion_main!(benches);
