use super::{
    errors::PoolError,
    handle::ResultSlot,
    value::AnyValue,
};
use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};
use tracing::error;

/// Пользовательская задача. Все входные данные захватываются при создании,
/// `run` возвращает значение любого типа, упакованное в [`AnyValue`].
pub trait Task: Send + Sync + 'static {
    fn run(&self) -> AnyValue;
}

impl<F> Task for F
where
    F: Fn() -> AnyValue + Send + Sync + 'static,
{
    #[inline]
    fn run(&self) -> AnyValue {
        self()
    }
}

/// Задача в очереди пула вместе со слотом для ее результата
pub(crate) struct Job {
    task: Arc<dyn Task>,
    result: Option<Arc<ResultSlot>>,
}

impl Job {
    pub(crate) fn new(task: Arc<dyn Task>) -> Self {
        Self { task, result: None }
    }

    pub(crate) fn bind(mut self, slot: Arc<ResultSlot>) -> Self {
        debug_assert!(self.result.is_none(), "job result bound twice");
        self.result = Some(slot);
        self
    }

    /// Выполняет задачу и записывает результат в слот, если он привязан.
    /// Паника внутри `run` не выходит за пределы воркера, в этом случае
    /// возвращается `false`.
    pub(crate) fn exec(self) -> bool {
        let task = self.task;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| task.run()))
            .map_err(|payload| PoolError::Panic(panic_message(payload.as_ref())));

        let succeeded = outcome.is_ok();
        if let Err(err) = &outcome {
            error!(error = %err, "task panicked");
        }

        if let Some(slot) = self.result {
            slot.set_val(outcome);
        }
        succeeded
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
