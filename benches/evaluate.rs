//! Parse and evaluation throughput for typical and long rate formulas.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pricing_engine::{
    evaluate, parse, BindingTable, CostItem, CostingSheet, FormulaCache, PricingVariable,
};

fn long_formula(terms: usize) -> String {
    (0..terms)
        .map(|i| format!("{{v{}}} * {}", i % 10, i + 1))
        .collect::<Vec<_>>()
        .join(" + ")
}

fn bindings() -> BindingTable {
    let mut table = BindingTable::new();
    for i in 0..10 {
        table.insert(&format!("v{i}"), i as f64 + 0.5).unwrap();
    }
    table
}

fn benchmark_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for terms in [1usize, 10, 100] {
        let formula = long_formula(terms);
        group.bench_with_input(BenchmarkId::from_parameter(terms), &formula, |b, f| {
            b.iter(|| parse(black_box(f)).unwrap());
        });
    }
    group.finish();
}

fn benchmark_evaluate(c: &mut Criterion) {
    let table = bindings();
    let mut group = c.benchmark_group("evaluate");
    for terms in [1usize, 10, 100] {
        let expr = parse(&long_formula(terms)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(terms), &expr, |b, e| {
            b.iter(|| evaluate(black_box(e), &table).unwrap());
        });
    }
    group.finish();
}

fn benchmark_cached_evaluate(c: &mut Criterion) {
    let table = bindings();
    let formula = long_formula(10);
    let mut cache = FormulaCache::new();
    c.bench_function("cached_evaluate", |b| {
        b.iter(|| cache.evaluate(black_box(&formula), &table).unwrap());
    });
}

fn benchmark_recompute(c: &mut Criterion) {
    let variables: Vec<PricingVariable> = (0..10)
        .map(|i| {
            PricingVariable::new(format!("{i}"), format!("Var {i}"), format!("v{i}"), i as f64)
        })
        .collect();
    let items: Vec<CostItem> = (0..50)
        .map(|i| CostItem::with_formula(format!("item-{i}"), "", 1.0, long_formula(i % 5 + 1)))
        .collect();
    let mut sheet = CostingSheet::new(variables, items);
    c.bench_function("recompute_50_items", |b| {
        b.iter(|| black_box(sheet.recompute()));
    });
}

criterion_group!(
    benches,
    benchmark_parse,
    benchmark_evaluate,
    benchmark_cached_evaluate,
    benchmark_recompute
);
criterion_main!(benches);
