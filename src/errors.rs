use std::time::Duration;

use thiserror::Error;

/// Ошибки пула и извлечения результатов
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// Очередь была заполнена дольше, чем `submit_timeout`
    #[error("task queue is full, submission gave up after {0:?}")]
    QueueSaturated(Duration),

    #[error("type mismatch: expected `{expected}`, found `{found}`")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// Значение отсутствует (результат отклонен или уже забран)
    #[error("value is empty")]
    EmptyValue,

    #[error("task panicked: {0}")]
    Panic(String),

    #[error("timed out waiting for task result")]
    Timeout,

    #[error("pool is already running")]
    AlreadyRunning,

    #[error("pool is not running")]
    NotRunning,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to spawn worker thread: {0}")]
    Spawn(String),
}

impl PoolError {
    #[inline]
    pub fn is_queue_saturated(&self) -> bool {
        matches!(self, PoolError::QueueSaturated(_))
    }

    #[inline]
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, PoolError::TypeMismatch { .. })
    }
}

pub type PoolResult<T> = Result<T, PoolError>;
