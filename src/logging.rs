//! Structured logging configuration
//!
//! Provides:
//! - Compact, pretty or JSON formatting
//! - Console output on stderr, so the report on stdout stays machine-readable
//! - Daily-rolling log files through `tracing-appender`
//! - `RUST_LOG` taking precedence over the configured level

use crate::config::LoggingConfig;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

const LOG_FILE_NAME: &str = "claude-costs.log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize the logging system.
///
/// The returned guard flushes the file writer on drop and must be held until exit.
pub fn init_logging(config: &LoggingConfig, log_dir: &Path) -> Option<WorkerGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut guard = None;

    if matches!(config.output.as_str(), "console" | "both") {
        layers.push(console_layer(&config.format));
    }

    if matches!(config.output.as_str(), "file" | "both") {
        match std::fs::create_dir_all(log_dir) {
            Ok(()) => {
                let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
                let (non_blocking, worker_guard) = tracing_appender::non_blocking(file_appender);
                layers.push(file_layer(&config.format, non_blocking));
                guard = Some(worker_guard);
            }
            Err(e) => eprintln!(
                "Warning: cannot create log directory {}: {}",
                log_dir.display(),
                e
            ),
        }
    }

    // A subscriber may already be installed (tests, embedding applications).
    let _ = tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init();

    guard
}

fn console_layer(format: &str) -> BoxedLayer {
    let layer = fmt::layer().with_writer(std::io::stderr).with_target(true);
    match format {
        "json" => layer
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        "pretty" => layer.pretty().boxed(),
        _ => layer.compact().boxed(),
    }
}

fn file_layer(format: &str, writer: tracing_appender::non_blocking::NonBlocking) -> BoxedLayer {
    let layer = fmt::layer().with_writer(writer).with_ansi(false);
    match format {
        "json" => layer.json().with_current_span(true).with_span_list(true).boxed(),
        _ => layer.boxed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_logging_creates_directory() {
        let dir = tempdir().unwrap();
        let log_dir = dir.path().join("nested").join("logs");
        let config = LoggingConfig {
            level: "info".to_string(),
            format: "json".to_string(),
            output: "file".to_string(),
        };

        let guard = init_logging(&config, &log_dir);

        assert!(guard.is_some());
        assert!(log_dir.is_dir());
    }

    #[test]
    fn test_console_logging_has_no_guard() {
        let config = LoggingConfig::default();
        assert!(init_logging(&config, Path::new("unused")).is_none());
    }
}
