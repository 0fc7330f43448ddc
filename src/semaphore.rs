use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Счетный семафор на Mutex + Condvar
#[derive(Debug)]
pub struct Semaphore {
    permits: Mutex<usize>,
    cond: Condvar,
}

impl Semaphore {
    pub fn new(permits: usize) -> Self {
        Self {
            permits: Mutex::new(permits),
            cond: Condvar::new(),
        }
    }

    pub fn acquire(&self) {
        let mut permits = self.permits.lock();
        while *permits == 0 {
            self.cond.wait(&mut permits);
        }
        *permits -= 1;
    }

    pub fn try_acquire(&self) -> bool {
        let mut permits = self.permits.lock();
        if *permits == 0 {
            return false;
        }
        *permits -= 1;
        true
    }

    /// Возвращает `false`, если разрешение не появилось за `timeout`.
    /// Таймаут, не представимый как `Instant`, означает ожидание без срока.
    pub fn acquire_timeout(&self, timeout: Duration) -> bool {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            self.acquire();
            return true;
        };
        let mut permits = self.permits.lock();
        while *permits == 0 {
            if self.cond.wait_until(&mut permits, deadline).timed_out() {
                break;
            }
        }
        if *permits == 0 {
            return false;
        }
        *permits -= 1;
        true
    }

    pub fn release(&self) {
        let mut permits = self.permits.lock();
        *permits += 1;
        self.cond.notify_all();
    }

    #[inline]
    pub fn available(&self) -> usize {
        *self.permits.lock()
    }
}

impl Default for Semaphore {
    fn default() -> Self {
        Self::new(0)
    }
}
