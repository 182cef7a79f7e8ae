use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::SeedableRng;
use reid_data::{plan_with_rng, IdentityBalancedSampler, Sample, SampleIndex, Sampler};

/// Benchmarks for building identity-balanced sampling plans.
///
/// This measures:
/// 1. Plan construction alone (`plan_with_rng`) over a prebuilt index
/// 2. A full epoch through the `Sampler` interface, which includes seeding
///
/// To run these, use:
/// ```bash
/// cargo bench --bench sampler_bench
/// ```

/// Dataset sizes; identities hold between 2 and 40 images, like the benchmarks.
const SIZES: [usize; 3] = [10_000, 100_000, 500_000];

/// Helper function to build a skewed index of `size` samples.
fn make_index(size: usize) -> SampleIndex {
    let mut samples = Vec::with_capacity(size);
    let mut identity = 0i64;
    while samples.len() < size {
        let count = 2 + (identity as usize * 7) % 39;
        for _ in 0..count.min(size - samples.len()) {
            let n = samples.len();
            samples.push(Sample::new(format!("{}.jpg", n), identity, (n % 6) as i64));
        }
        identity += 1;
    }
    match SampleIndex::build(&samples) {
        Ok(index) => index,
        Err(err) => panic!("failed to index benchmark samples: {:#}", err),
    }
}

fn bench_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("P x K plan");

    for &size in &SIZES {
        let index = make_index(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("plan_with_rng", size), &index, |b, index| {
            let mut rng = StdRng::seed_from_u64(42);
            b.iter(|| black_box(plan_with_rng(index, 16, 4, &mut rng)).len())
        });

        let sampler = match IdentityBalancedSampler::new(index, 16, 4, 42) {
            Ok(sampler) => sampler,
            Err(err) => panic!("failed to build sampler: {:#}", err),
        };
        group.bench_with_input(BenchmarkId::new("sampler_epoch", size), &sampler, |b, s| {
            let mut epoch = 0;
            b.iter(|| {
                epoch += 1;
                black_box(s.iter(epoch).count())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_plan);
criterion_main!(benches);
