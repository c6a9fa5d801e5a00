use criterion::{Criterion, black_box, criterion_group, criterion_main};
use nbis_core::GrayImage;
use nbis_nfiq::{FeatureVector, NfiqAssessor, classify};

fn create_benchmark_image(width: usize, height: usize) -> GrayImage {
    let singularities = [(0.3, 0.3, 1.0), (0.7, 0.4, -1.0), (0.4, 0.7, 1.0), (0.65, 0.75, -1.0)];
    let data = (0..height)
        .flat_map(|y| {
            (0..width).map(move |x| {
                let (xf, yf) = (x as f64, y as f64);
                let mut phase = 2.0 * std::f64::consts::PI * (0.6 * xf + 0.8 * yf) / 9.0;
                for &(fx, fy, s) in &singularities {
                    phase += s * (yf - fy * height as f64).atan2(xf - fx * width as f64);
                }
                (128.0 + 100.0 * phase.cos()) as u8
            })
        })
        .collect();
    GrayImage::new(width, height, data).unwrap()
}

fn bench_quality(c: &mut Criterion) {
    let assessor = NfiqAssessor::default();
    let img = create_benchmark_image(256, 256);
    c.bench_function("assess_256x256", |b| {
        b.iter(|| black_box(assessor.assess_image(black_box(&img), 500).unwrap()))
    });

    let blank = GrayImage::blank(256, 256, 255).unwrap();
    c.bench_function("assess_blank", |b| {
        b.iter(|| black_box(assessor.assess_image(black_box(&blank), 500).unwrap()))
    });

    let features = FeatureVector([1800.0, 55.0, 40.0, 36.0, 25.0, 18.0, 8.0, 0.05, 0.1, 0.3, 0.55]);
    c.bench_function("classify", |b| b.iter(|| black_box(classify(black_box(&features)))));
}

criterion_group!(benches, bench_quality);
criterion_main!(benches);
