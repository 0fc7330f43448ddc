use super::{
    errors::{PoolError, PoolResult},
    handle::{ResultSlot, TaskResult},
    model::{PoolMetrics, PoolMode, WorkerState},
    task::{Job, Task},
    value::AnyValue,
    worker::{Worker, WorkerIds},
};
pub use super::config::Config;
use parking_lot::{Condvar, Mutex};
use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::{debug, error, info, warn};


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitReason {
    Shutdown,
    Reclaimed,
}

/// Все, что защищено одной блокировкой очереди
struct PoolState {
    queue: VecDeque<Job>,
    workers: HashMap<usize, Worker>,
    running: bool,
    mode: PoolMode,
    initial_threads: usize,
    max_threads: usize,
    max_queue_size: usize,
    current_threads: usize,
    idle_threads: usize,
    queued_tasks: usize,
    completed_tasks: usize,
    rejected_tasks: usize,
    panicked_tasks: usize,
    reclaimed_workers: usize,
}

impl PoolState {
    fn new(config: &Config) -> Self {
        Self {
            queue: VecDeque::new(),
            workers: HashMap::new(),
            running: false,
            mode: config.mode,
            initial_threads: config.initial_threads,
            max_threads: config.max_threads,
            max_queue_size: config.max_queue_size,
            current_threads: 0,
            idle_threads: 0,
            queued_tasks: 0,
            completed_tasks: 0,
            rejected_tasks: 0,
            panicked_tasks: 0,
            reclaimed_workers: 0,
        }
    }

    #[inline]
    fn is_full(&self) -> bool {
        self.queue.len() >= self.max_queue_size
    }

    #[inline]
    fn has_surplus_threads(&self) -> bool {
        self.mode == PoolMode::Cached && self.current_threads > self.initial_threads
    }

    #[inline]
    fn needs_more_threads(&self) -> bool {
        self.mode == PoolMode::Cached
            && self.queued_tasks > self.idle_threads
            && self.current_threads < self.max_threads
    }

    fn set_worker_state(&mut self, id: usize, state: WorkerState) {
        if let Some(worker) = self.workers.get_mut(&id) {
            worker.set_state(state);
        }
    }
}

struct Shared {
    state: Mutex<PoolState>,
    not_full: Condvar,
    not_empty: Condvar,
    all_exited: Condvar,
    ids: WorkerIds,
    idle_timeout: Duration,
    submit_timeout: Duration,
    poll_interval: Duration,
    thread_name: String,
}

impl Shared {
    /// Регистрирует и запускает нового воркера. Вызывается под блокировкой,
    /// поэтому поток не увидит состояние до того, как счетчики обновлены.
    fn spawn_worker(self: &Arc<Self>, state: &mut PoolState) -> PoolResult<usize> {
        let worker = Worker::new(self.ids.next());
        let id = worker.id();
        let shared = Arc::clone(self);

        if let Err(e) = worker.start(&self.thread_name, move |id| shared.dispatch(id)) {
            error!(worker = id, error = %e, "failed to spawn worker thread");
            return Err(PoolError::Spawn(e.to_string()));
        }

        state.workers.insert(id, worker);
        state.current_threads += 1;
        state.idle_threads += 1;
        debug!(worker = id, threads = state.current_threads, "created worker thread");
        Ok(id)
    }

    /// Цикл воркера: ожидание задачи, выполнение, выход
    fn dispatch(&self, id: usize) {
        debug!(worker = id, "worker started");
        let mut idle_since = Instant::now();

        while let Some(job) = self.next_job(id, idle_since) {
            debug!(worker = id, "worker got a task");
            let succeeded = job.exec();

            let mut state = self.state.lock();
            state.idle_threads += 1;
            if succeeded {
                state.completed_tasks += 1;
            } else {
                state.panicked_tasks += 1;
            }
            state.set_worker_state(id, WorkerState::WaitingForTask);
            drop(state);

            debug!(worker = id, "worker completed a task");
            idle_since = Instant::now();
        }
    }

    /// `None` означает, что воркер снят с учета и должен завершиться
    fn next_job(&self, id: usize, idle_since: Instant) -> Option<Job> {
        let mut state = self.state.lock();

        loop {
            if let Some(job) = state.queue.pop_front() {
                state.idle_threads -= 1;
                state.queued_tasks -= 1;
                state.set_worker_state(id, WorkerState::Executing);

                if !state.queue.is_empty() {
                    self.not_empty.notify_one();
                }
                self.not_full.notify_all();
                return Some(job);
            }

            if !state.running {
                self.retire(&mut state, id, ExitReason::Shutdown);
                return None;
            }

            if state.has_surplus_threads() {
                self.not_empty.wait_for(&mut state, self.poll_interval);

                // Условие перепроверяется: пока поток ждал, другие могли уже
                // уйти, и число потоков не должно опуститься ниже начального.
                if state.queue.is_empty()
                    && state.running
                    && state.has_surplus_threads()
                    && idle_since.elapsed() >= self.idle_timeout
                {
                    self.retire(&mut state, id, ExitReason::Reclaimed);
                    return None;
                }
            } else {
                self.not_empty.wait(&mut state);
            }
        }
    }

    fn snapshot(&self, state: &PoolState) -> Config {
        Config {
            mode: state.mode,
            initial_threads: state.initial_threads,
            max_threads: state.max_threads,
            max_queue_size: state.max_queue_size,
            idle_timeout: self.idle_timeout,
            submit_timeout: self.submit_timeout,
            poll_interval: self.poll_interval,
            thread_name: self.thread_name.clone(),
        }
    }

    fn retire(&self, state: &mut PoolState, id: usize, reason: ExitReason) {
        state.workers.remove(&id);
        state.current_threads -= 1;
        state.idle_threads -= 1;

        match reason {
            ExitReason::Shutdown => {
                debug!(worker = id, state = ?WorkerState::Exited, "worker exit on shutdown");
            }
            ExitReason::Reclaimed => {
                state.reclaimed_workers += 1;
                debug!(
                    worker = id,
                    state = ?WorkerState::Reclaiming,
                    threads = state.current_threads,
                    "worker reclaimed after idle timeout"
                );
            }
        }
        self.all_exited.notify_all();
    }
}

/// Пул потоков с ограниченной очередью.
///
/// В режиме `Fixed` число потоков постоянно. В режиме `Cached` пул добавляет
/// потоки, когда задач в очереди больше, чем свободных потоков, и убирает
/// лишние после `idle_timeout` простоя.
///
/// `shutdown` (и `Drop`) дожидается, пока воркеры выберут все уже принятые
/// задачи из очереди, после чего потоки завершаются. Вызывать `shutdown` или
/// ронять пул изнутри задачи нельзя: поток будет ждать сам себя.
pub struct ThreadPool {
    shared: Arc<Shared>,
    default_threads: usize,
}

impl ThreadPool {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(PoolState::new(&config)),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            all_exited: Condvar::new(),
            ids: WorkerIds::new(),
            idle_timeout: config.idle_timeout,
            submit_timeout: config.submit_timeout,
            poll_interval: config.poll_interval,
            thread_name: config.thread_name,
        });

        Self {
            shared,
            default_threads: config.initial_threads,
        }
    }

    /// Запускает `initial_threads` воркеров. После запуска режим и размер
    /// очереди больше не меняются.
    pub fn start(&self, initial_threads: usize) -> PoolResult<()> {
        if initial_threads == 0 {
            return Err(PoolError::InvalidConfig(
                "initial thread count must be positive".into(),
            ));
        }

        let mut state = self.shared.state.lock();
        if state.running {
            return Err(PoolError::AlreadyRunning);
        }
        self.shared.snapshot(&state).validate()?;
        if state.mode == PoolMode::Cached && initial_threads > state.max_threads {
            return Err(PoolError::InvalidConfig(format!(
                "initial thread count {} exceeds max thread count {}",
                initial_threads, state.max_threads
            )));
        }

        state.running = true;
        state.initial_threads = initial_threads;

        for _ in 0..initial_threads {
            if let Err(e) = self.shared.spawn_worker(&mut state) {
                // Пул продолжает работать с тем, что удалось запустить
                state.initial_threads = state.current_threads;
                state.running = state.current_threads > 0;
                return Err(e);
            }
        }

        info!(
            mode = %state.mode,
            threads = initial_threads,
            max_threads = state.max_threads,
            max_queue_size = state.max_queue_size,
            "thread pool started"
        );
        Ok(())
    }

    pub fn start_default(&self) -> PoolResult<()> {
        self.start(self.default_threads)
    }

    pub fn set_mode(&self, mode: PoolMode) {
        let mut state = self.shared.state.lock();
        if state.running {
            warn!(%mode, "pool is running, mode change ignored");
            return;
        }
        state.mode = mode;
    }

    pub fn set_max_queue_size(&self, n: usize) {
        let mut state = self.shared.state.lock();
        if state.running {
            warn!(max_queue_size = n, "pool is running, queue size change ignored");
            return;
        }
        if n == 0 {
            warn!("max queue size must be positive, change ignored");
            return;
        }
        state.max_queue_size = n;
    }

    pub fn set_max_thread_count(&self, n: usize) {
        let mut state = self.shared.state.lock();
        if state.running {
            warn!(max_threads = n, "pool is running, thread limit change ignored");
            return;
        }
        if n == 0 {
            warn!("max thread count must be positive, change ignored");
            return;
        }
        state.max_threads = n;
    }

    /// Отправляет задачу в очередь. Если места нет дольше `submit_timeout`,
    /// возвращается невалидный `TaskResult`, а сама задача не выполняется.
    pub fn submit_task(&self, task: Arc<dyn Task>) -> TaskResult {
        let shared = &self.shared;
        let mut state = shared.state.lock();

        if !state.running {
            state.rejected_tasks += 1;
            drop(state);
            warn!("thread pool is not running, submit task failed");
            return TaskResult::rejected(task, PoolError::NotRunning);
        }

        match Instant::now().checked_add(shared.submit_timeout) {
            Some(deadline) => {
                while state.is_full() && state.running {
                    if shared.not_full.wait_until(&mut state, deadline).timed_out() {
                        break;
                    }
                }
            }
            // Срок не представим: ждем свободного места без ограничения
            None => {
                while state.is_full() && state.running {
                    shared.not_full.wait(&mut state);
                }
            }
        }

        if !state.running {
            state.rejected_tasks += 1;
            drop(state);
            warn!("thread pool stopped while waiting, submit task failed");
            return TaskResult::rejected(task, PoolError::NotRunning);
        }

        if state.is_full() {
            state.rejected_tasks += 1;
            let queued = state.queue.len();
            drop(state);
            warn!(
                queued,
                timeout = ?shared.submit_timeout,
                "task queue is full, submit task failed"
            );
            return TaskResult::rejected(task, PoolError::QueueSaturated(shared.submit_timeout));
        }

        let slot = Arc::new(ResultSlot::new());
        state
            .queue
            .push_back(Job::new(Arc::clone(&task)).bind(Arc::clone(&slot)));
        state.queued_tasks += 1;
        shared.not_empty.notify_one();
        debug!(queued = state.queued_tasks, "task submitted");

        if state.needs_more_threads() {
            // Ошибка уже залогирована, задача дождется существующих воркеров
            let _ = shared.spawn_worker(&mut state);
        }

        TaskResult::new(task, slot)
    }

    /// Отправляет замыкание, результат упаковывается в [`AnyValue`]
    pub fn submit<F, T>(&self, f: F) -> TaskResult
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Send + 'static,
    {
        self.submit_task(Arc::new(move || AnyValue::new(f())))
    }

    /// Останавливает пул и ждет завершения всех воркеров
    pub fn shutdown(&self) {
        let shared = &self.shared;
        let mut state = shared.state.lock();
        if !state.running && state.current_threads == 0 {
            return;
        }

        state.running = false;
        shared.not_empty.notify_all();
        shared.not_full.notify_all();

        while state.current_threads > 0 {
            shared.all_exited.wait(&mut state);
        }
        info!(completed = state.completed_tasks, "thread pool exit");
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.shared.state.lock().running
    }

    #[inline]
    pub fn mode(&self) -> PoolMode {
        self.shared.state.lock().mode
    }

    #[inline]
    pub fn max_queue_size(&self) -> usize {
        self.shared.state.lock().max_queue_size
    }

    /// Текущие настройки, с учетом изменений через сеттеры
    pub fn config(&self) -> Config {
        let state = self.shared.state.lock();
        self.shared.snapshot(&state)
    }

    pub fn worker_ids(&self) -> Vec<usize> {
        let mut ids: Vec<_> = self.shared.state.lock().workers.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn worker_states(&self) -> Vec<(usize, WorkerState)> {
        let mut states: Vec<_> = self
            .shared
            .state
            .lock()
            .workers
            .values()
            .map(|w| (w.id(), w.state()))
            .collect();
        states.sort_unstable_by_key(|(id, _)| *id);
        states
    }

    pub fn metrics(&self) -> PoolMetrics {
        let state = self.shared.state.lock();
        PoolMetrics {
            mode: state.mode,
            running: state.running,
            current_threads: state.current_threads,
            idle_threads: state.idle_threads,
            queued_tasks: state.queued_tasks,
            completed_tasks: state.completed_tasks,
            rejected_tasks: state.rejected_tasks,
            panicked_tasks: state.panicked_tasks,
            reclaimed_workers: state.reclaimed_workers,
        }
    }
}

impl Default for ThreadPool {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
