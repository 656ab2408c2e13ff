//! Benchmarks for the temporal filter

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use landseq_algorithms::temporal::{filter_stack, filtered, Catalogue, FilterParams};
use landseq_core::{Label, LabelStack, PixelSequence, YearRange};
use landseq_parallel::ProcessingMode;

const CLASSES: [u8; 8] = [3, 4, 11, 12, 15, 19, 33, 21];

fn create_test_stack(size: usize) -> LabelStack {
    let years = YearRange::default();
    let mut stack = LabelStack::filled(size, size, years, Label(12));
    // Stable background with short excursions scattered over pixels and years
    for row in 0..size {
        for col in 0..size {
            let seed = row * 7 + col * 13;
            let start = years.first() + (seed % 30) as i32;
            let width = 1 + seed % 4;
            let class = Label(CLASSES[seed % CLASSES.len()]);
            for year in start..start + width as i32 {
                stack.set(row, col, year, class).unwrap();
            }
        }
    }
    stack
}

fn bench_sequence(c: &mut Criterion) {
    let catalogue = Catalogue::wetlands();
    let mut seq = PixelSequence::filled(YearRange::default(), Label(12));
    seq.set(1990, Label(21)).unwrap();
    seq.set(2001, Label(3)).unwrap();
    seq.set(2002, Label(3)).unwrap();
    c.bench_function("temporal/sequence", |b| {
        b.iter(|| filtered(black_box(&seq), &catalogue).unwrap())
    });
}

fn bench_stack(c: &mut Criterion) {
    let mut group = c.benchmark_group("temporal/stack");
    group.sample_size(10);
    for size in [64, 128, 256] {
        let stack = create_test_stack(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| filter_stack(black_box(&stack), &FilterParams::default()).unwrap())
        });
    }
    group.finish();
}

fn bench_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("temporal/mode");
    group.sample_size(10);
    let stack = create_test_stack(256);
    for (name, mode) in [
        ("sequential", ProcessingMode::Sequential),
        ("parallel", ProcessingMode::Parallel),
    ] {
        let params = FilterParams {
            mode,
            tile_size: 64,
            ..FilterParams::default()
        };
        group.bench_with_input(BenchmarkId::from_parameter(name), &name, |b, _| {
            b.iter(|| filter_stack(black_box(&stack), &params).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_sequence, bench_stack, bench_modes);
criterion_main!(benches);
