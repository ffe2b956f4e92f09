//! Logging setup and statement profiling
use crate::config::LoggingConfig;
use crate::core::{DbError, Result};
use std::fs::OpenOptions;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{info, warn, Level};

/// Installs the global tracing subscriber described by `config`.
///
/// Fails if the level is unknown, the log file cannot be opened, or a global
/// subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let level = Level::from_str(&config.level)
        .map_err(|_| DbError::Configuration(format!("unknown log level: {}", config.level)))?;
    let builder = tracing_subscriber::fmt().with_max_level(level);

    let installed = match &config.file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };
    installed.map_err(|e| DbError::Configuration(format!("logging already initialized: {}", e)))?;

    if let Some(path) = &config.file {
        info!("[CREATE] log file {}", path.display());
    }
    Ok(())
}

/// Statements slower than the engine's `slow_query_ms` are reported at WARN level.
pub fn is_slow(elapsed: Duration, threshold: Duration) -> bool {
    elapsed > threshold
}

/// Records how long `sql` took since `start` and returns the elapsed time.
pub fn profiling(start: Instant, sql: &str, threshold: Duration) -> Duration {
    let elapsed = start.elapsed();
    if is_slow(elapsed, threshold) {
        warn!(elapsed_ms = elapsed.as_millis() as u64, slow = true, "[PROFILING] [DB] {:?}: {}", elapsed, sql);
    } else {
        info!(elapsed_ms = elapsed.as_millis() as u64, "[PROFILING] [DB] {:?}: {}", elapsed, sql);
    }
    elapsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_SLOW_QUERY_MS;

    const SLOW_QUERY_THRESHOLD: Duration = Duration::from_millis(DEFAULT_SLOW_QUERY_MS);

    #[test]
    fn test_slow_threshold() {
        assert!(!is_slow(Duration::from_millis(100), SLOW_QUERY_THRESHOLD));
        assert!(is_slow(Duration::from_millis(101), SLOW_QUERY_THRESHOLD));
    }

    #[test]
    fn test_profiling_returns_elapsed() {
        let start = Instant::now();
        let elapsed = profiling(start, "select 1", SLOW_QUERY_THRESHOLD);
        assert!(elapsed <= start.elapsed());
    }

    #[test]
    fn test_init_rejects_unknown_level() {
        let config = LoggingConfig {
            level: "chatty".to_string(),
            file: None,
        };
        assert!(matches!(init(&config), Err(DbError::Configuration(_))));
    }
}
