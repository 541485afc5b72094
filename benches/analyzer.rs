//! Benchmarks for message analysis and reply selection
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use recovery_companion::{MessageAnalyzer, ResponseSelector};

fn bench_analyze(c: &mut Criterion) {
    let analyzer = MessageAnalyzer::new();

    let short = "I'm having cravings";
    let medium = "Work was stressful today and I couldn't sleep, but the group meeting helped a bit. ".repeat(5);
    let long = "Feeling better than yesterday, still tired and anxious about the weekend. ".repeat(60);

    let mut group = c.benchmark_group("analyze");

    group.bench_with_input(BenchmarkId::new("message", "short"), &short, |b, s| {
        b.iter(|| analyzer.analyze(black_box(s)))
    });

    group.bench_with_input(BenchmarkId::new("message", "medium"), &medium, |b, s| {
        b.iter(|| analyzer.analyze(black_box(s)))
    });

    group.bench_with_input(BenchmarkId::new("message", "long"), &long, |b, s| {
        b.iter(|| analyzer.analyze(black_box(s)))
    });

    group.finish();
}

fn bench_select(c: &mut Criterion) {
    let analyzer = MessageAnalyzer::new();
    let selector = ResponseSelector::new();
    let mut rng = StdRng::seed_from_u64(17);

    let text = "I feel good but the urge is strong tonight";
    let analysis = analyzer.analyze(text);

    c.bench_function("select_response", |b| {
        b.iter(|| selector.select_response(black_box(&analysis), black_box(text), &mut rng))
    });
}

criterion_group!(benches, bench_analyze, bench_select);
criterion_main!(benches);
