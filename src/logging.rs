//! Logging setup for applications embedding the loader.
//!
//! The library itself only emits `tracing` events; hosts that want output
//! call one of the initializers here (or install their own subscriber):
//! - Console only, or console plus a non-blocking log file
//! - Filterable via the `RUST_LOG` environment variable (`loadgate=debug`
//!   shows dispatch and completion decisions, `loadgate=trace` adds guard
//!   deferrals)

use std::fs;
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard will flush and close the log file writer, when file
/// output is enabled.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize console-only logging.
///
/// Defaults to INFO when `RUST_LOG` is unset.
pub fn init_logging() -> LoggingGuard {
    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_ansi(true);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(stdout_layer)
        .init();

    LoggingGuard { _file_guard: None }
}

/// Initialize logging to both console and a log file.
///
/// Creates the log directory if needed and clears the previous log file, so
/// each session starts from an empty log.
///
/// # Errors
///
/// Returns error if the log directory cannot be created or the log file
/// cannot be cleared.
pub fn init_logging_with_file(log_dir: &str, log_file: &str) -> Result<LoggingGuard, io::Error> {
    fs::create_dir_all(log_dir)?;

    // Clear the previous log; handles both existing and non-existing files.
    let log_path = Path::new(log_dir).join(log_file);
    fs::write(&log_path, "")?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_ansi(true);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: Some(file_guard),
    })
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn test_log_dir() -> PathBuf {
        // Unique directory per test to avoid conflicts
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("loadgate_logs_{}", timestamp));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_creates_directory_and_clears_file() {
        let log_dir = test_log_dir();
        let log_dir_str = log_dir.to_str().unwrap();

        // init_logging_with_file installs a global subscriber which can only
        // be set once per process, so only the file handling is exercised.
        fs::create_dir_all(log_dir_str).expect("create directory");
        let log_path = log_dir.join("loadgate.log");
        fs::write(&log_path, "old session data").expect("write old data");

        fs::write(&log_path, "").expect("clear log file");

        assert_eq!(fs::read_to_string(&log_path).unwrap(), "");

        fs::remove_dir_all(&log_dir).expect("cleanup");
    }

    #[test]
    fn test_guard_without_file_output() {
        // Console-only guards carry no file writer to flush.
        let guard = LoggingGuard { _file_guard: None };
        drop(guard);
    }
}
