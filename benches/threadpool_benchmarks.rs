use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use elastic_pool::{
    model::PoolMode,
    pool::{Config as PoolConfig, ThreadPool},
    AnyValue,
    Task,
};
use std::{hint::black_box, sync::Arc, time::Duration};

struct RangeSum {
    from: u64,
    to: u64,
}

impl Task for RangeSum {
    fn run(&self) -> AnyValue {
        AnyValue::new((self.from..self.to).sum::<u64>())
    }
}

fn started_pool(mode: PoolMode, threads: usize) -> ThreadPool {
    let config = PoolConfig::default()
        .with_mode(mode)
        .with_max_threads(threads * 2)
        .with_max_queue_size(100_000)
        .with_idle_timeout(Duration::from_secs(5));
    let pool = ThreadPool::with_config(config);
    pool.start(threads).unwrap();
    pool
}

// Benchmark 1: накладные расходы submit + get
fn bench_submit_overhead(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit_overhead");

    for size in [100, 1000, 10000] {
        group.throughput(Throughput::Elements(size as u64));

        for mode in [PoolMode::Fixed, PoolMode::Cached] {
            let pool = started_pool(mode, num_cpus::get());

            group.bench_with_input(
                BenchmarkId::new(mode.to_string(), size),
                &size,
                |b, &size| {
                    b.iter(|| {
                        let results: Vec<_> = (0..size)
                            .map(|i| pool.submit(move || black_box(i)))
                            .collect();

                        for res in results {
                            black_box(res.get().cast::<i32>().unwrap());
                        }
                    });
                },
            );
        }
    }

    group.finish();
}

// Benchmark 2: CPU-bound задачи разного размера
fn bench_cpu_bound(c: &mut Criterion) {
    let mut group = c.benchmark_group("cpu_bound");
    let pool = started_pool(PoolMode::Fixed, num_cpus::get());

    for work in [1_000u64, 100_000, 1_000_000] {
        group.bench_with_input(BenchmarkId::new("range_sum", work), &work, |b, &work| {
            let task: Arc<dyn Task> = Arc::new(RangeSum { from: 0, to: work });
            b.iter(|| {
                let results: Vec<_> = (0..64).map(|_| pool.submit_task(Arc::clone(&task))).collect();
                for res in results {
                    black_box(res.get().cast::<u64>().unwrap());
                }
            });
        });
    }

    group.finish();
}

// Benchmark 3: тип-стертое значение
fn bench_any_value(c: &mut Criterion) {
    c.bench_function("any_value_roundtrip", |b| {
        b.iter(|| {
            let value = AnyValue::new(black_box(42u64));
            black_box(value.cast::<u64>().unwrap())
        });
    });
}

criterion_group!(benches, bench_submit_overhead, bench_cpu_bound, bench_any_value);
criterion_main!(benches);
