use super::model::WorkerState;
use std::{
    io,
    sync::atomic::{AtomicUsize, Ordering},
    thread,
};

/// Генератор идентификаторов воркеров, принадлежит пулу.
/// Идентификаторы монотонно растут и не переиспользуются.
#[derive(Debug, Default)]
pub struct WorkerIds {
    next: AtomicUsize,
}

impl WorkerIds {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn next(&self) -> usize {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// Запись о воркере в реестре пула
#[derive(Debug)]
pub struct Worker {
    id: usize,
    state: WorkerState,
}

impl Worker {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            state: WorkerState::WaitingForTask,
        }
    }

    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    #[inline]
    pub fn state(&self) -> WorkerState {
        self.state
    }

    #[inline]
    pub(crate) fn set_state(&mut self, state: WorkerState) {
        self.state = state;
    }

    /// Запускает поток с функцией диспетчеризации и отсоединяет его.
    /// Пул не ждет поток напрямую, завершение видно только по счетчикам.
    pub fn start<F>(&self, name_prefix: &str, dispatch: F) -> io::Result<()>
    where
        F: FnOnce(usize) + Send + 'static,
    {
        let id = self.id;
        thread::Builder::new()
            .name(format!("{}-{}", name_prefix, id))
            .spawn(move || dispatch(id))
            .map(drop)
    }
}
