//! Benchmarks for turning a measurement into an exposition body
//!
//! The speed test itself dominates a real probe; these cover the per-scrape
//! overhead the exporter adds on top of it.

use async_trait::async_trait;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use speedtest_exporter::{
    collector::samples_from,
    exposition::render,
    MeasurementResult, Result, SpeedTester, SpeedtestCollector,
};
use std::{hint::black_box, sync::Arc};

struct InstantTester(MeasurementResult);

#[async_trait]
impl SpeedTester for InstantTester {
    async fn measure(&self) -> Result<MeasurementResult> {
        Ok(self.0.clone())
    }
}

fn sample_result() -> MeasurementResult {
    MeasurementResult::new(94_213_557.3, 11_870_402.9, 12.5, 11_100_000, 36_100_000)
}

fn bench_render(c: &mut Criterion) {
    let samples = samples_from(&sample_result());

    c.bench_function("render_five_samples", |b| {
        b.iter(|| render(black_box(&samples)))
    });
}

fn bench_collect_and_render(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let collector = SpeedtestCollector::new(Arc::new(InstantTester(sample_result())));

    c.bench_function("collect_and_render", |b| {
        b.iter(|| {
            runtime.block_on(async {
                let samples = collector.collect().await.unwrap();
                render(black_box(&samples)).unwrap()
            })
        })
    });
}

fn bench_concurrent_collections(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .build()
        .unwrap();
    let collector = Arc::new(SpeedtestCollector::new(Arc::new(InstantTester(sample_result()))));

    let mut group = c.benchmark_group("concurrent_collections");
    for probes in [1usize, 8, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(probes), &probes, |b, &probes| {
            b.iter(|| {
                runtime.block_on(async {
                    let handles: Vec<_> = (0..probes)
                        .map(|_| {
                            let collector = collector.clone();
                            tokio::spawn(async move {
                                let samples = collector.collect().await.unwrap();
                                render(&samples).unwrap()
                            })
                        })
                        .collect();
                    for handle in handles {
                        black_box(handle.await.unwrap());
                    }
                })
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_render,
    bench_collect_and_render,
    bench_concurrent_collections
);
criterion_main!(benches);
