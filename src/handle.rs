use super::{
    errors::{PoolError, PoolResult},
    semaphore::Semaphore,
    task::Task,
    value::AnyValue,
};
use parking_lot::Mutex;
use std::{
    fmt,
    sync::Arc,
    time::Duration,
};

/// Общий слот результата: воркер пишет, владелец `TaskResult` читает
pub(crate) struct ResultSlot {
    outcome: Mutex<Option<PoolResult<AnyValue>>>,
    ready: Semaphore,
}

impl ResultSlot {
    pub(crate) fn new() -> Self {
        Self {
            outcome: Mutex::new(None),
            ready: Semaphore::new(0),
        }
    }

    /// Вызывается ровно один раз воркером, выполнившим задачу
    pub(crate) fn set_val(&self, outcome: PoolResult<AnyValue>) {
        *self.outcome.lock() = Some(outcome);
        self.ready.release();
    }

    pub(crate) fn wait_and_take(&self) -> PoolResult<AnyValue> {
        self.ready.acquire();
        self.take()
    }

    fn wait_and_take_timeout(&self, timeout: Duration) -> PoolResult<AnyValue> {
        if !self.ready.acquire_timeout(timeout) {
            return Err(PoolError::Timeout);
        }
        self.take()
    }

    // Разрешение возвращается обратно: повторные чтения не блокируются
    // и видят пустой слот.
    fn take(&self) -> PoolResult<AnyValue> {
        let outcome = self.outcome.lock().take();
        self.ready.release();
        outcome.unwrap_or(Err(PoolError::EmptyValue))
    }

    #[inline]
    fn is_ready(&self) -> bool {
        self.ready.available() > 0
    }
}

/// Handle на результат одной отправленной задачи.
///
/// Результат забирается один раз: первый вызов `get` ждет завершения
/// задачи и возвращает значение, последующие сразу возвращают пустое.
/// Невалидный handle (очередь была переполнена) никогда не блокирует.
pub struct TaskResult {
    task: Arc<dyn Task>,
    slot: Arc<ResultSlot>,
    rejection: Option<PoolError>,
}

impl TaskResult {
    pub(crate) fn new(task: Arc<dyn Task>, slot: Arc<ResultSlot>) -> Self {
        Self {
            task,
            slot,
            rejection: None,
        }
    }

    /// Задача не попала в очередь и выполняться не будет
    pub(crate) fn rejected(task: Arc<dyn Task>, reason: PoolError) -> Self {
        Self {
            task,
            slot: Arc::new(ResultSlot::new()),
            rejection: Some(reason),
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.rejection.is_none()
    }

    /// Причина отказа для невалидного handle
    #[inline]
    pub fn rejection(&self) -> Option<&PoolError> {
        self.rejection.as_ref()
    }

    /// Задача уже выполнена и результат можно забрать без ожидания
    #[inline]
    pub fn is_ready(&self) -> bool {
        !self.is_valid() || self.slot.is_ready()
    }

    #[inline]
    pub fn task(&self) -> &Arc<dyn Task> {
        &self.task
    }

    /// Блокирует до завершения задачи. Пустое значение для невалидного
    /// handle, для упавшей задачи и для повторного вызова.
    pub fn get(&self) -> AnyValue {
        self.get_result().unwrap_or_default()
    }

    pub fn get_result(&self) -> PoolResult<AnyValue> {
        if let Some(reason) = &self.rejection {
            return Err(reason.clone());
        }
        self.slot.wait_and_take()
    }

    /// После `Timeout` результат остается доступным для следующего вызова
    pub fn get_timeout(&self, timeout: Duration) -> PoolResult<AnyValue> {
        if let Some(reason) = &self.rejection {
            return Err(reason.clone());
        }
        self.slot.wait_and_take_timeout(timeout)
    }

    /// Ожидание в блокирующем потоке tokio, не занимает поток рантайма
    pub async fn get_async(self) -> PoolResult<AnyValue> {
        tokio::task::spawn_blocking(move || self.get_result())
            .await
            .unwrap_or_else(|join_err| Err(PoolError::Panic(join_err.to_string())))
    }
}

impl fmt::Debug for TaskResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskResult")
            .field("valid", &self.is_valid())
            .field("ready", &self.slot.is_ready())
            .finish()
    }
}
