//! Simulation benchmarks: integration cost versus horizon length, and the
//! reshaping pass over a full-year trajectory.
//!
//! Run with: cargo criterion

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use episim::prelude::*;

fn bench_simulate_horizons(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulate");
    group.sample_size(100);

    let model = SeqiahrModel::new(ModelParameters::default(), ModelVariant::extended())
        .expect("default parameters are valid");
    let initial = SeqiahrState::seeded(1e-6);

    for days in [90_u32, 365, 730] {
        group.bench_with_input(BenchmarkId::new("horizon_days", days), &days, |b, &days| {
            b.iter(|| {
                let trajectory = model
                    .simulate(&initial, TimeRange::new(0, days))
                    .expect("integration succeeds");
                black_box(trajectory.len())
            });
        });
    }

    group.finish();
}

fn bench_reshape_full_year(c: &mut Criterion) {
    let model = SeqiahrModel::new(ModelParameters::default(), ModelVariant::extended())
        .expect("default parameters are valid");
    let trajectory = model
        .simulate(&SeqiahrState::seeded(1e-6), TimeRange::new(0, 365))
        .expect("integration succeeds");
    let labels = LabelMap::default();

    c.bench_function("to_display_table_full_year", |b| {
        b.iter(|| {
            let table = trajectory.to_display_table(&Compartment::ALL, &labels, 102.3e6);
            black_box(table.rows.len())
        });
    });
}

criterion_group!(benches, bench_simulate_horizons, bench_reshape_full_year);
criterion_main!(benches);
