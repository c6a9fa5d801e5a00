use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use nbis_bozorth::{BozorthMatcher, BozorthParams, PairTable};
use nbis_core::{MAX_BOZORTH_MINUTIAE, Matcher, XytRecord, XytRow};

fn create_benchmark_record(n: usize, seed: u64) -> XytRecord {
    let mut state = seed;
    let mut next = move |m: u64| {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((state >> 33) % m) as i32
    };
    let rows: Vec<XytRow> = (0..n)
        .map(|_| XytRow {
            x: 16 + next(400),
            y: 16 + next(480),
            theta: next(360),
        })
        .collect();
    XytRecord::from_rows(rows, MAX_BOZORTH_MINUTIAE)
}

fn bench_pair_tables(c: &mut Criterion) {
    let mut group = c.benchmark_group("pair_tables");
    let params = BozorthParams::default();

    for &n in &[40usize, 80, 150] {
        let rec = create_benchmark_record(n, 1);
        let rows: Vec<XytRow> = rec.rows().collect();
        group.bench_with_input(BenchmarkId::new("build", n), &rows, |b, rows| {
            b.iter(|| black_box(PairTable::build(black_box(rows), &params)))
        });
    }

    group.finish();
}

fn bench_scoring(c: &mut Criterion) {
    let mut group = c.benchmark_group("scoring");
    let matcher = BozorthMatcher::default();

    for &n in &[40usize, 80, 150] {
        let probe = create_benchmark_record(n, 1);
        let impostor = create_benchmark_record(n, 2);
        group.bench_with_input(BenchmarkId::new("genuine", n), &probe, |b, probe| {
            b.iter(|| black_box(matcher.score(black_box(probe), black_box(probe), 150)))
        });
        group.bench_with_input(
            BenchmarkId::new("impostor", n),
            &(probe.clone(), impostor),
            |b, (probe, impostor)| {
                b.iter(|| black_box(matcher.score(black_box(probe), black_box(impostor), 150)))
            },
        );
    }

    group.finish();
}

fn bench_one_to_many(c: &mut Criterion) {
    let matcher = BozorthMatcher::default();
    let probe = create_benchmark_record(60, 1);
    let gallery: Vec<XytRecord> = (0..64).map(|i| create_benchmark_record(60, 100 + i)).collect();

    c.bench_function("one_to_many_64", |b| {
        b.iter(|| black_box(matcher.score_one_to_many(black_box(&probe), black_box(&gallery), 150)))
    });
}

criterion_group!(benches, bench_pair_tables, bench_scoring, bench_one_to_many);
criterion_main!(benches);
