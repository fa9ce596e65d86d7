use criterion::{black_box, criterion_group, criterion_main, Criterion};
use plan_core::PlanConfig;
use plan_econ::{analyze_breakeven, sensitivity_sweep, ScenarioCalculator};
use rust_decimal::Decimal;

fn bench_scenarios(c: &mut Criterion) {
    let plan = PlanConfig::default();
    let calc = ScenarioCalculator::from_plan(&plan);
    c.bench_function("compute_year_one", |b| {
        b.iter(|| calc.compute_all(black_box(&plan.scenarios)))
    });

    let rates: Vec<Decimal> = (1..=100).map(|bp| Decimal::new(bp, 2)).collect();
    c.bench_function("sensitivity_sweep_100", |b| {
        b.iter(|| {
            sensitivity_sweep(
                &calc,
                black_box(&plan.sensitivity.base),
                &plan.sensitivity.line,
                &rates,
            )
        })
    });

    let base = calc.compute_scenario(&plan.scenarios[1]);
    c.bench_function("breakeven_curve", |b| {
        b.iter(|| analyze_breakeven(black_box(&base), plan.breakeven.headroom, plan.breakeven.samples))
    });
}

criterion_group!(benches, bench_scenarios);
criterion_main!(benches);
