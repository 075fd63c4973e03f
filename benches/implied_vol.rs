use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use volgrid::implied::{DEFAULT_LOWER_VOL, DEFAULT_UPPER_VOL, ImpliedVolSolver, implied_vol};
use volgrid::pricer::bs_call_price;
use volgrid::types::{ContractTerms, Quote};

fn generate_quotes(n: usize) -> Vec<Quote> {
    (0..n)
        .map(|i| {
            let strike = 70.0 + 60.0 * (i % 40) as f64 / 39.0;
            let expiry = 0.05 + 0.1 * (i / 40) as f64;
            let terms = ContractTerms::new(100.0, strike, expiry, 0.01, 0.0)
                .expect("benchmark terms should be valid");
            Quote::new(terms, Some(terms.call_price(0.25)))
        })
        .collect()
}

fn pricing_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("pricing");

    group.bench_function("bs_call_price_atm", |b| {
        b.iter(|| bs_call_price(black_box(100.0), black_box(100.0), 0.5, 0.01, 0.0, 0.2))
    });

    group.finish();
}

fn inversion_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("inversion");

    let price = bs_call_price(100.0, 110.0, 0.5, 0.01, 0.0, 0.3);
    group.bench_function("implied_vol_otm", |b| {
        b.iter(|| {
            implied_vol(
                black_box(Some(price)),
                100.0,
                110.0,
                0.5,
                0.01,
                0.0,
                (DEFAULT_LOWER_VOL, DEFAULT_UPPER_VOL),
            )
        })
    });

    let solver = ImpliedVolSolver::default();
    let quotes = generate_quotes(480);
    group.bench_function("solve_batch_480", |b| {
        b.iter(|| solver.solve_batch(black_box(&quotes)))
    });

    group.finish();
}

criterion_group!(benches, pricing_benchmarks, inversion_benchmarks);
criterion_main!(benches);
