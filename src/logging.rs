//! Tracing setup.

use std::path::Path;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::error::ConfigError;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

pub const LOG_FILE: &str = "taskflow.log";

/// Install the global subscriber.
///
/// Logs always go to `<log_dir>/taskflow.log`. Console output on stderr is
/// added only when both the config and the caller allow it; the terminal UI
/// passes `allow_console = false` because it owns the screen.
pub fn init_tracing(logging: &LoggingConfig, log_dir: &Path, allow_console: bool) -> Result<(), ConfigError> {
    if !logging.enabled {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(&logging.level).map_err(|_| ConfigError::LogFilter(logging.level.clone()))?,
    };

    std::fs::create_dir_all(log_dir).map_err(|source| ConfigError::Read {
        path: log_dir.display().to_string(),
        source,
    })?;
    let appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);

    let file_layer = tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false);
    let console_layer = (logging.console && allow_console)
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    // A subscriber may already be installed (tests); keep the first one.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_logging_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        let cfg = LoggingConfig { enabled: false, ..Default::default() };
        init_tracing(&cfg, &logs, false).unwrap();
        assert!(!logs.exists());
    }

    #[test]
    fn bad_filter_is_reported() {
        if std::env::var("RUST_LOG").map(|v| !v.trim().is_empty()).unwrap_or(false) {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let cfg = LoggingConfig { level: "taskflow=notalevel".into(), ..Default::default() };
        let err = init_tracing(&cfg, dir.path(), false).unwrap_err();
        assert!(matches!(err, ConfigError::LogFilter(_)));
    }
}
