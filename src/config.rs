use super::{
    errors::{PoolError, PoolResult},
    model::PoolMode,
};
use std::{str::FromStr, time::Duration};

pub const DEFAULT_MAX_QUEUE_SIZE: usize = 1024;
pub const DEFAULT_MAX_THREADS: usize = 10;
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(1);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Конфигурация пула потоков
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub mode: PoolMode,
    /// Используется `start_default`
    pub initial_threads: usize,
    /// Верхняя граница числа потоков в режиме `Cached`
    pub max_threads: usize,
    pub max_queue_size: usize,
    /// Сколько лишний поток в режиме `Cached` может простаивать
    pub idle_timeout: Duration,
    /// Максимальное время ожидания места в очереди при отправке
    pub submit_timeout: Duration,
    /// Период проверки простоя
    pub poll_interval: Duration,
    pub thread_name: String,
}

impl Default for Config {
    fn default() -> Self {
        let num_cpus = num_cpus::get();
        Self {
            mode: PoolMode::Fixed,
            initial_threads: num_cpus,
            max_threads: DEFAULT_MAX_THREADS.max(num_cpus),
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            submit_timeout: DEFAULT_SUBMIT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            thread_name: "pool-worker".to_string(),
        }
    }
}

impl Config {
    pub fn fixed() -> Self {
        Self::default()
    }

    pub fn cached() -> Self {
        Self {
            mode: PoolMode::Cached,
            ..Default::default()
        }
    }

    pub fn with_mode(mut self, mode: PoolMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_initial_threads(mut self, n: usize) -> Self {
        self.initial_threads = n;
        self
    }

    pub fn with_max_threads(mut self, n: usize) -> Self {
        self.max_threads = n;
        self
    }

    pub fn with_max_queue_size(mut self, n: usize) -> Self {
        self.max_queue_size = n;
        self
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    pub fn validate(&self) -> PoolResult<()> {
        if self.max_queue_size == 0 {
            return Err(PoolError::InvalidConfig("max_queue_size must be positive".into()));
        }
        if self.max_threads == 0 {
            return Err(PoolError::InvalidConfig("max_threads must be positive".into()));
        }
        if self.poll_interval.is_zero() {
            return Err(PoolError::InvalidConfig("poll_interval must be non-zero".into()));
        }
        if self.thread_name.as_bytes().contains(&0) {
            return Err(PoolError::InvalidConfig("thread name must not contain null bytes".into()));
        }
        Ok(())
    }

    /// Читает настройки из переменных окружения поверх значений по умолчанию:
    /// `POOL_MODE`, `POOL_THREADS`, `POOL_MAX_THREADS`, `POOL_MAX_QUEUE_SIZE`,
    /// `POOL_IDLE_TIMEOUT`, `POOL_SUBMIT_TIMEOUT`.
    pub fn from_env() -> PoolResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<L>(lookup: L) -> PoolResult<Self>
    where
        L: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(v) = get("POOL_MODE") {
            config.mode = parse_value("POOL_MODE", &v)?;
        }
        if let Some(v) = get("POOL_THREADS") {
            config.initial_threads = parse_value("POOL_THREADS", &v)?;
        }
        if let Some(v) = get("POOL_MAX_THREADS") {
            config.max_threads = parse_value("POOL_MAX_THREADS", &v)?;
        }
        if let Some(v) = get("POOL_MAX_QUEUE_SIZE") {
            config.max_queue_size = parse_value("POOL_MAX_QUEUE_SIZE", &v)?;
        }
        if let Some(v) = get("POOL_IDLE_TIMEOUT") {
            config.idle_timeout = parse_duration(&v).map_err(|e| invalid("POOL_IDLE_TIMEOUT", &v, e))?;
        }
        if let Some(v) = get("POOL_SUBMIT_TIMEOUT") {
            config.submit_timeout = parse_duration(&v).map_err(|e| invalid("POOL_SUBMIT_TIMEOUT", &v, e))?;
        }

        config.validate()?;
        Ok(config)
    }
}

fn invalid(key: &str, value: &str, error: impl std::fmt::Display) -> PoolError {
    PoolError::InvalidConfig(format!("failed to parse {}='{}': {}", key, value, error))
}

fn parse_value<T>(key: &str, value: &str) -> PoolResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| invalid(key, value, e))
}

/// Разбирает длительность вида `500ms`, `30s`, `2m`, `1h`. Число без
/// единицы считается секундами.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim().to_ascii_lowercase();
    let split = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    let (num_str, unit) = s.split_at(split);

    let num: u64 = num_str
        .parse()
        .map_err(|_| format!("invalid number: {}", num_str))?;

    let secs = match unit {
        "ms" => return Ok(Duration::from_millis(num)),
        "" | "s" => Some(num),
        "m" => num.checked_mul(60),
        "h" => num.checked_mul(3600),
        other => return Err(format!("unknown duration unit: {}", other)),
    };
    secs.map(Duration::from_secs)
        .ok_or_else(|| format!("duration too large: {}", s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.mode, PoolMode::Fixed);
        assert_eq!(config.max_queue_size, 1024);
        assert!(config.max_threads >= 10);
        assert_eq!(config.idle_timeout, Duration::from_secs(60));
        assert_eq!(config.submit_timeout, Duration::from_secs(1));
        assert!(config.validate().is_ok());
        assert_eq!(Config::cached().mode, PoolMode::Cached);
    }

    #[test]
    fn parse_durations() {
        assert_eq!(parse_duration("500ms"), Ok(Duration::from_millis(500)));
        assert_eq!(parse_duration("30s"), Ok(Duration::from_secs(30)));
        assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
        assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
        assert_eq!(parse_duration("15"), Ok(Duration::from_secs(15)));
        assert!(parse_duration("fast").is_err());
        assert!(parse_duration("10d").is_err());
    }

    #[test]
    fn parse_duration_rejects_overflow() {
        assert_eq!(
            parse_duration("99999999999999999h"),
            Err("duration too large: 99999999999999999h".to_string())
        );
        assert!(parse_duration("99999999999999999m").is_err());
        assert!(parse_duration("99999999999999999999s").is_err());
        assert_eq!(
            parse_duration("99999999999999999s"),
            Ok(Duration::from_secs(99_999_999_999_999_999))
        );
    }

    #[test]
    fn from_env_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("POOL_MODE", "cached"),
            ("POOL_MAX_THREADS", "4"),
            ("POOL_MAX_QUEUE_SIZE", "16"),
            ("POOL_IDLE_TIMEOUT", "5s"),
            ("POOL_SUBMIT_TIMEOUT", "250ms"),
            ("POOL_THREADS", ""),
        ]))
        .unwrap();

        assert_eq!(config.mode, PoolMode::Cached);
        assert_eq!(config.max_threads, 4);
        assert_eq!(config.max_queue_size, 16);
        assert_eq!(config.idle_timeout, Duration::from_secs(5));
        assert_eq!(config.submit_timeout, Duration::from_millis(250));
        assert_eq!(config.initial_threads, num_cpus::get());
    }

    #[test]
    fn from_env_rejects_bad_values() {
        let err = Config::from_lookup(lookup(&[("POOL_MAX_QUEUE_SIZE", "many")])).unwrap_err();
        assert!(err.to_string().contains("POOL_MAX_QUEUE_SIZE"));

        let err = Config::from_lookup(lookup(&[("POOL_MAX_QUEUE_SIZE", "0")])).unwrap_err();
        assert!(matches!(err, PoolError::InvalidConfig(_)));

        let err = Config::from_lookup(lookup(&[("POOL_MODE", "elastic")])).unwrap_err();
        assert!(err.to_string().contains("unknown pool mode"));
    }
}
