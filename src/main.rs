use elastic_pool::{AnyValue, Config, Task, ThreadPool};
use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};
use tracing_subscriber::EnvFilter;

struct RangeSum {
    from: i64,
    to: i64,
}

impl Task for RangeSum {
    fn run(&self) -> AnyValue {
        let sum: i64 = (self.from..self.to).sum();
        thread::sleep(Duration::from_secs(1));
        AnyValue::new(sum)
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid pool configuration");
            std::process::exit(1);
        }
    };

    let now = Instant::now();
    let pool = ThreadPool::with_config(config);
    if let Err(e) = pool.start_default() {
        tracing::error!(error = %e, "failed to start thread pool");
        std::process::exit(1);
    }

    let task: Arc<dyn Task> = Arc::new(RangeSum { from: 1, to: 10_000 });
    let results: Vec<_> = (0..6).map(|_| pool.submit_task(Arc::clone(&task))).collect();

    let last = pool.submit_task(Arc::clone(&task));
    match last.get().cast::<i64>() {
        Ok(sum) => println!("sum: {}", sum),
        Err(e) => println!("no result: {}", e),
    }

    let total: i64 = results
        .iter()
        .filter_map(|res| res.get().cast::<i64>().ok())
        .sum();
    println!("total of {} results: {}", results.len(), total);

    let metrics = pool.metrics();
    println!(
        "threads: {}, completed: {}, rejected: {}",
        metrics.current_threads, metrics.completed_tasks, metrics.rejected_tasks
    );

    pool.shutdown();
    println!("elapsed: {:?}", now.elapsed());
}
