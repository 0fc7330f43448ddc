//! Пул потоков с ограниченной очередью задач
//!
//! # Features
//! - Режимы `Fixed` и `Cached` (рост под нагрузкой, сжатие после простоя)
//! - Backpressure: отправка ждет место в очереди не дольше `submit_timeout`
//! - Результат задачи через `TaskResult` с блокирующим, ограниченным по
//!   времени и async ожиданием
//! - Значения любого типа через `AnyValue` с проверкой типа при извлечении
//! - Изоляция паник внутри задач и метрики пула

pub mod config;
pub mod errors;
pub mod handle;
pub mod model;
pub mod pool;
pub mod semaphore;
pub mod task;
pub mod value;
pub mod worker;

pub use errors::{PoolError, PoolResult};
pub use handle::TaskResult;
pub use model::{PoolMetrics, PoolMode, WorkerState};
pub use pool::{Config, ThreadPool};
pub use task::Task;
pub use value::AnyValue;
