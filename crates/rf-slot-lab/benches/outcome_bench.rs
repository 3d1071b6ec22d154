//! Outcome generation benchmarks

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rf_slot_lab::{MathConfig, PayTable, SlotConfig, SymbolSet, SyntheticOutcomeEngine};

fn bench_outcome_generation(c: &mut Criterion) {
    let config = SlotConfig::default();
    let mut engine = SyntheticOutcomeEngine::with_seed(&config, 42);

    c.bench_function("outcome_5x3", |b| {
        b.iter(|| black_box(engine.spin()))
    });
}

fn bench_center_line_evaluation(c: &mut Criterion) {
    let paytable = PayTable::new(SymbolSet::classic(), MathConfig::default());
    let matrix: Vec<Vec<u32>> = [3, 3, 3, 1, 2].iter().map(|&s| vec![0, s, 9]).collect();

    c.bench_function("evaluate_center_line", |b| {
        b.iter(|| black_box(paytable.evaluate(black_box(&matrix), 1)))
    });
}

criterion_group!(benches, bench_outcome_generation, bench_center_line_evaluation);
criterion_main!(benches);
