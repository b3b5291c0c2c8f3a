#[path = "../tests/grammars/mod.rs"]
mod grammars;

use criterion::{criterion_group, criterion_main, Criterion};
use lrtab::{diagnostics::Quiet, grammar::Grammar, Config};

criterion_main!(benches);
criterion_group!(benches, bench_arithmetic, bench_simple, bench_languages);

fn bench_arithmetic(c: &mut Criterion) {
    bench_table_gen(c, "arithmetic", grammars::arithmetic);
    bench_table_gen(c, "arithmetic_prec", grammars::arithmetic_prec);
}

fn bench_simple(c: &mut Criterion) {
    bench_table_gen(c, "g1", grammars::g1);
    bench_table_gen(c, "pointers", grammars::pointers);
    bench_table_gen(c, "dragon", grammars::dragon);
    bench_table_gen(c, "lr1_only", grammars::lr1_only);
}

fn bench_languages(c: &mut Criterion) {
    bench_table_gen(c, "json", grammars::json);
    bench_table_gen(c, "min_caml", grammars::min_caml);
}

fn bench_table_gen(c: &mut Criterion, grammar_name: &str, define: grammars::Define) {
    let grammar = Grammar::define(define).unwrap();

    let mut group = c.benchmark_group(grammar_name);
    group.bench_function("LR0", |b| {
        b.iter(|| Config::new().use_lr0().generate_with(&grammar, &mut Quiet));
    });
    group.bench_function("SLR", |b| {
        b.iter(|| Config::new().use_slr().generate_with(&grammar, &mut Quiet));
    });
    group.bench_function("LALR", |b| {
        b.iter(|| Config::new().use_lalr().generate_with(&grammar, &mut Quiet));
    });
    group.bench_function("LALR on demand", |b| {
        b.iter(|| {
            Config::new()
                .on_demand_lookahead(true)
                .generate_with(&grammar, &mut Quiet)
        });
    });
    group.bench_function("Canonical", |b| {
        b.iter(|| Config::new().use_canonical().generate_with(&grammar, &mut Quiet));
    });
    group.finish();
}
