//! 패턴 매칭 벤치마크
//!
//! 카탈로그 크기와 매칭 방식에 따른 최초 매칭 비용, 라우터 배치 처리량을 측정합니다.

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use logrelay_core::types::{JobContext, LogLine};
use logrelay_router::catalog::{
    ErrorPattern, GLOBAL_PATTERNS_KEY, PatternCatalog, PatternRecord, default_patterns,
};
use logrelay_router::{LogRouterBuilder, MemoryStore};

fn record(pattern: &str, match_type: &str) -> PatternRecord {
    PatternRecord {
        pattern: pattern.to_owned(),
        match_type: Some(match_type.to_owned()),
        ..Default::default()
    }
}

fn catalog_of(size: usize, match_type: &str) -> PatternCatalog {
    let patterns = (0..size)
        .map(|i| {
            let text = match match_type {
                "regex" => format!(r"failure code \d+ in module{i}\b"),
                _ => format!("failure in module{i}"),
            };
            ErrorPattern::from_record(format!("p{i}"), &record(&text, match_type))
        })
        .collect();
    PatternCatalog::from_patterns(patterns)
}

fn bench_find_match_miss(c: &mut Criterion) {
    let mut group = c.benchmark_group("catalog_find_match_miss");
    let message = "Sampling step 12/30, 3.2 it/s, nothing to see here";

    for size in [10, 100, 1000] {
        for match_type in ["contains", "regex"] {
            let catalog = catalog_of(size, match_type);
            group.bench_with_input(
                BenchmarkId::new(match_type, size),
                &catalog,
                |b, catalog| b.iter(|| catalog.find_match(black_box(message))),
            );
        }
    }

    group.finish();
}

fn bench_default_patterns(c: &mut Criterion) {
    let catalog = PatternCatalog::from_patterns(default_patterns());
    let messages = [
        "CUDA error: out of memory",
        "Traceback (most recent call last):",
        "Prompt executed in 4.21 seconds",
    ];

    c.bench_function("default_patterns_mixed", |b| {
        b.iter(|| {
            for message in &messages {
                black_box(catalog.find_match(black_box(message)));
            }
        })
    });
}

fn bench_router_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("router_batch");

    for size in [10, 100] {
        let store = Arc::new(MemoryStore::new());
        store.seed_hash(
            GLOBAL_PATTERNS_KEY,
            "oom",
            r#"{"pattern": "out of memory"}"#,
        );
        let router = LogRouterBuilder::new()
            .store(store)
            .resolver(Arc::new(|| JobContext::new("bench-job", None)))
            .build()
            .expect("router");
        let batch: Vec<LogLine> = (0..size)
            .map(|i| LogLine::at(i as f64, format!("INFO: step {i} done")))
            .collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &batch, |b, batch| {
            b.iter(|| router.process_batch(black_box(batch)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_find_match_miss,
    bench_default_patterns,
    bench_router_batch
);
criterion_main!(benches);
