use super::errors::{PoolError, PoolResult};
use std::{
    any::{self, Any},
    fmt,
};

const EMPTY: &str = "<empty>";

/// Контейнер для значения произвольного типа.
/// Тип проверяется в рантайме при извлечении, копирование запрещено.
pub struct AnyValue {
    inner: Option<Box<dyn Any + Send>>,
    type_name: &'static str,
}

impl AnyValue {
    pub fn new<T: Send + 'static>(value: T) -> Self {
        Self {
            inner: Some(Box::new(value)),
            type_name: any::type_name::<T>(),
        }
    }

    #[inline]
    pub fn empty() -> Self {
        Self {
            inner: None,
            type_name: EMPTY,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_none()
    }

    #[inline]
    pub fn is<T: 'static>(&self) -> bool {
        self.inner.as_ref().is_some_and(|v| v.is::<T>())
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Забирает значение, если сохраненный тип совпадает с `T`
    pub fn cast<T: 'static>(self) -> PoolResult<T> {
        let found = self.type_name;
        let boxed = self.inner.ok_or(PoolError::EmptyValue)?;
        boxed
            .downcast::<T>()
            .map(|v| *v)
            .map_err(|_| PoolError::TypeMismatch {
                expected: any::type_name::<T>(),
                found,
            })
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.as_ref().and_then(|v| v.downcast_ref::<T>())
    }
}

impl Default for AnyValue {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for AnyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyValue")
            .field("type_name", &self.type_name)
            .finish()
    }
}
