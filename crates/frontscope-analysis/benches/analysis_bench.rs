//! Criterion benchmarks for frontscope-analysis hot paths
//!
//! Run with: cargo bench -p frontscope-analysis

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use frontscope_analysis::{CoherenceAnalyzer, DelayEstimator, FilterResponse, correlate_full};

const SAMPLE_RATE: u32 = 16000;

/// Generate white noise
fn generate_noise(size: usize, seed: u32) -> Vec<f32> {
    let mut state = seed;
    (0..size)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state as i32 as f32) / (i32::MAX as f32)
        })
        .collect()
}

fn bench_correlate_full(c: &mut Criterion) {
    let mut group = c.benchmark_group("Correlate_Full");

    for size in [1024, 4096, 32768] {
        let a = generate_noise(size, 0x1234_5678);
        let b = generate_noise(size, 0x9ABC_DEF0);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |bench, _| {
            bench.iter(|| correlate_full(black_box(&a), black_box(&b)));
        });
    }

    group.finish();
}

fn bench_coherence(c: &mut Criterion) {
    let mut group = c.benchmark_group("Coherence");

    // 10 s of capture at the canonical rate
    let x = generate_noise(SAMPLE_RATE as usize * 10, 1);
    let y = generate_noise(SAMPLE_RATE as usize * 10, 2);

    for segment_len in [512, 1536] {
        let analyzer = CoherenceAnalyzer::new(SAMPLE_RATE as f32, segment_len).unwrap();
        group.bench_with_input(
            BenchmarkId::from_parameter(segment_len),
            &segment_len,
            |bench, _| {
                bench.iter(|| analyzer.analyze(black_box(&x), black_box(&y)).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_delay(c: &mut Criterion) {
    let a = generate_noise(SAMPLE_RATE as usize * 5, 3);
    let b = generate_noise(SAMPLE_RATE as usize * 5, 4);
    let estimator = DelayEstimator::new(32768, 16384, SAMPLE_RATE).unwrap();

    c.bench_function("Delay_5s", |bench| {
        bench.iter(|| estimator.analyze(black_box(&a), black_box(&b)).unwrap());
    });
}

fn bench_filter_response(c: &mut Criterion) {
    let taps = generate_noise(3840, 5);

    c.bench_function("Filter_Response_3840", |bench| {
        bench.iter(|| FilterResponse::from_impulse(black_box(&taps), SAMPLE_RATE as f32).unwrap());
    });
}

criterion_group!(
    benches,
    bench_correlate_full,
    bench_coherence,
    bench_delay,
    bench_filter_response
);
criterion_main!(benches);
