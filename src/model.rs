use std::{fmt, str::FromStr};

/// Режим работы пула
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PoolMode {
    /// Фиксированное число потоков
    #[default]
    Fixed,
    /// Потоки добавляются под нагрузкой и удаляются после простоя
    Cached,
}

impl fmt::Display for PoolMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolMode::Fixed => f.write_str("fixed"),
            PoolMode::Cached => f.write_str("cached"),
        }
    }
}

impl FromStr for PoolMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(PoolMode::Fixed),
            "cached" => Ok(PoolMode::Cached),
            other => Err(format!("unknown pool mode: {}", other)),
        }
    }
}

/// Состояния цикла воркера
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    WaitingForTask,
    Executing,
    Reclaiming,
    Exited,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolMetrics {
    pub mode: PoolMode,
    pub running: bool,
    pub current_threads: usize,
    pub idle_threads: usize,
    pub queued_tasks: usize,
    pub completed_tasks: usize,
    pub rejected_tasks: usize,
    pub panicked_tasks: usize,
    pub reclaimed_workers: usize,
}

impl PoolMetrics {
    #[inline]
    pub fn busy_threads(&self) -> usize {
        self.current_threads.saturating_sub(self.idle_threads)
    }

    pub fn utilization(&self) -> f64 {
        if self.current_threads == 0 {
            return 0.0;
        }
        self.busy_threads() as f64 / self.current_threads as f64
    }

    pub fn queue_pressure(&self) -> f64 {
        if self.idle_threads == 0 {
            return self.queued_tasks as f64;
        }
        self.queued_tasks as f64 / self.idle_threads as f64
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.completed_tasks + self.panicked_tasks;
        if total == 0 {
            return 1.0;
        }
        self.completed_tasks as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(current: usize, idle: usize) -> PoolMetrics {
        PoolMetrics {
            mode: PoolMode::Cached,
            running: true,
            current_threads: current,
            idle_threads: idle,
            queued_tasks: 6,
            completed_tasks: 3,
            rejected_tasks: 0,
            panicked_tasks: 1,
            reclaimed_workers: 0,
        }
    }

    #[test]
    fn utilization_and_pressure() {
        let m = metrics(4, 1);
        assert_eq!(m.busy_threads(), 3);
        assert_eq!(m.utilization(), 0.75);
        assert_eq!(m.queue_pressure(), 6.0);
        assert_eq!(m.success_rate(), 0.75);
        assert_eq!(metrics(0, 0).utilization(), 0.0);
    }

    #[test]
    fn mode_parsing() {
        assert_eq!("Cached".parse::<PoolMode>(), Ok(PoolMode::Cached));
        assert_eq!(" fixed ".parse::<PoolMode>(), Ok(PoolMode::Fixed));
        assert!("elastic".parse::<PoolMode>().is_err());
        assert_eq!(PoolMode::default(), PoolMode::Fixed);
        assert_eq!(PoolMode::Cached.to_string(), "cached");
    }
}
