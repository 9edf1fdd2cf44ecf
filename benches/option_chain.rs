//! Benchmarks for option chain generation.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fno_analytics::prelude::*;
use rand::{rngs::StdRng, SeedableRng};

fn bench_build_chain(c: &mut Criterion) {
  let generator = OptionChainGenerator::default();
  let mut rng = StdRng::seed_from_u64(7);

  c.bench_function("build_chain_21_strikes", |b| {
    b.iter(|| {
      let _ = black_box(generator.build(black_box(25_450.0), black_box(14.0), &mut rng));
    })
  });
}

fn bench_window_scaling(c: &mut Criterion) {
  let mut group = c.benchmark_group("chain_window");
  let mut rng = StdRng::seed_from_u64(7);

  for strikes in [5u32, 10, 25, 50].iter() {
    let generator = OptionChainGenerator::new(ChainConfig::default().with_strike_count(*strikes));

    group.bench_with_input(BenchmarkId::new("build", strikes), strikes, |b, _| {
      b.iter(|| {
        let chain = generator.build(black_box(25_450.0), 14.0, &mut rng);
        let _ = black_box(chain.map(|c| c.summary()));
      })
    });
  }

  group.finish();
}

fn bench_seeded_chain(c: &mut Criterion) {
  let seed = AtmSeed::new(
    25_450.0,
    AtmLeg::new(120.0, 50_000.0, 8_000.0, SeedTrend::Bull),
    AtmLeg::new(88.0, 64_000.0, 3_000.0, SeedTrend::Bear),
  );
  let mut rng = StdRng::seed_from_u64(7);

  c.bench_function("build_chain_from_seed", |b| {
    b.iter(|| {
      let _ = black_box(build_option_chain_from_seed(black_box(&seed), 25_470.0, &mut rng));
    })
  });
}

fn bench_parallel_chains(c: &mut Criterion) {
  let generator = OptionChainGenerator::default();
  let requests: Vec<(&str, f64)> = vec![
    ("NIFTY", 25_450.0),
    ("BANKNIFTY", 51_200.0),
    ("FINNIFTY", 23_900.0),
    ("MIDCPNIFTY", 12_850.0),
  ];

  c.bench_function("parallel_chains_4_symbols", |b| {
    b.iter(|| {
      let _ = black_box(build_chains_parallel(&generator, black_box(&requests), 14.0, 7));
    })
  });
}

criterion_group!(
  benches,
  bench_build_chain,
  bench_window_scaling,
  bench_seeded_chain,
  bench_parallel_chains,
);

criterion_main!(benches);
