//! Logging setup for the MDR CLI
//!
//! This module provides:
//! - Structured logging setup with console and file outputs
//! - Request ID generation and tracking
//! - Performance timing spans

use crate::config;
use crate::error::{Error, Result};
use is_terminal::IsTerminal;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::{field, Span};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};
use uuid::Uuid;

/// Global request ID for the current process
static REQUEST_ID: OnceLock<String> = OnceLock::new();

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact format for everyday use
    Compact,
    /// Full format with all details
    Full,
    /// JSON structured format
    Json,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "full" => Ok(LogFormat::Full),
            "json" => Ok(LogFormat::Json),
            other => Err(Error::config(format!("Invalid log format: {}", other))),
        }
    }
}

/// Effective logging settings after flags, config and environment are merged
#[derive(Debug, Clone)]
pub struct LogSettings {
    /// Log level filter directive
    pub level: String,
    /// Console output format
    pub format: LogFormat,
    /// Enable console output
    pub console: bool,
    /// Optional file output path; always written as JSON
    pub file: Option<PathBuf>,
    /// Include thread IDs
    pub thread_ids: bool,
    /// Include file and line numbers
    pub source_location: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
            console: true,
            file: None,
            thread_ids: false,
            source_location: false,
        }
    }
}

impl LogSettings {
    /// Create logging settings from verbosity level
    pub fn from_verbosity(verbosity: u8) -> Self {
        let mut settings = Self::default();

        match verbosity {
            0 => {}
            1 => {
                settings.level = "info".to_string();
            }
            2 => {
                settings.level = "debug".to_string();
                settings.source_location = true;
            }
            _ => {
                settings.level = "trace".to_string();
                settings.format = LogFormat::Full;
                settings.source_location = true;
                settings.thread_ids = true;
            }
        }

        settings
    }

    /// Apply the config file's logging section; explicit `-v` flags keep their level
    pub fn merge_config(&mut self, config: &config::LoggingConfig, verbosity: u8) {
        if verbosity == 0 {
            self.level = config.level.clone();
        }
        match config.format.parse() {
            Ok(format) => self.format = format,
            Err(e) => eprintln!("Warning: ignoring configured log format: {}", e),
        }
        if config.file.is_some() {
            self.file = config.file.clone();
        }
    }

    /// Apply `RUST_LOG`, `MDR_LOG_FORMAT` and `MDR_LOG_FILE`
    pub fn merge_with_env(&mut self) {
        if let Ok(rust_log) = std::env::var("RUST_LOG") {
            self.level = rust_log;
        }

        if let Ok(format) = std::env::var("MDR_LOG_FORMAT") {
            match format.parse() {
                Ok(format) => self.format = format,
                Err(_) => eprintln!("Warning: invalid MDR_LOG_FORMAT '{}', using default", format),
            }
        }

        if let Ok(file) = std::env::var("MDR_LOG_FILE") {
            self.file = Some(PathBuf::from(file));
        }
    }
}

/// Initialize the global logging system
///
/// The returned guard flushes the file writer when dropped and must live
/// until the process exits.
pub fn init_logging(settings: LogSettings) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_new(&settings.level)
        .map_err(|e| Error::config(format!("Invalid log level '{}': {}", settings.level, e)))?;

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    if settings.console {
        let ansi = std::io::stderr().is_terminal();
        let console = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(settings.thread_ids)
            .with_file(settings.source_location)
            .with_line_number(settings.source_location);

        layers.push(match settings.format {
            LogFormat::Compact => console.with_ansi(ansi).compact().boxed(),
            LogFormat::Full => console.with_ansi(ansi).boxed(),
            LogFormat::Json => console.with_ansi(false).json().boxed(),
        });
    }

    let guard = match &settings.file {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            let file_name = path
                .file_name()
                .ok_or_else(|| Error::config(format!("Invalid log file path {}", path.display())))?;

            std::fs::create_dir_all(&directory)?;
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            layers.push(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .json()
                    .boxed(),
            );
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .map_err(|e| Error::other(format!("Failed to initialize logging: {}", e)))?;

    let request_id = generate_request_id();
    REQUEST_ID.set(request_id.clone()).map_err(|_| {
        Error::other("Failed to set request ID - request tracking may not work correctly")
    })?;

    tracing::info!(
        request_id = %request_id,
        level = %settings.level,
        format = ?settings.format,
        "Logging system initialized"
    );

    Ok(guard)
}

/// Generate a unique request ID for this process
pub fn generate_request_id() -> String {
    format!("req_{}", Uuid::new_v4().simple())
}

/// Get the current request ID
pub fn current_request_id() -> Option<&'static str> {
    REQUEST_ID.get().map(|s| s.as_str())
}

/// Create a span with request ID and a slot for the duration
pub fn create_operation_span(operation: &str, details: Option<&str>) -> Span {
    tracing::info_span!(
        "operation",
        operation = operation,
        request_id = current_request_id().unwrap_or("unknown"),
        details = details.unwrap_or(""),
        duration_ms = field::Empty,
    )
}

/// Performance timing utilities
pub mod timing {
    use std::time::Instant;
    use tracing::Span;

    /// A timer that logs its duration when dropped
    pub struct Timer {
        start: Instant,
        span: Span,
        operation: String,
    }

    impl Timer {
        pub fn new(operation: &str) -> Self {
            Self {
                start: Instant::now(),
                span: super::create_operation_span(operation, None),
                operation: operation.to_string(),
            }
        }

        pub fn with_details(operation: &str, details: &str) -> Self {
            Self {
                start: Instant::now(),
                span: super::create_operation_span(operation, Some(details)),
                operation: operation.to_string(),
            }
        }

        /// Get elapsed time without finishing the timer
        pub fn elapsed(&self) -> std::time::Duration {
            self.start.elapsed()
        }
    }

    impl Drop for Timer {
        fn drop(&mut self) {
            let duration = self.start.elapsed();
            self.span.record("duration_ms", duration.as_millis() as u64);

            tracing::debug!(
                operation = %self.operation,
                duration_ms = duration.as_millis() as u64,
                "Operation completed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_verbosity() {
        let settings = LogSettings::from_verbosity(0);
        assert_eq!(settings.level, "warn");
        assert!(!settings.source_location);

        let settings = LogSettings::from_verbosity(2);
        assert_eq!(settings.level, "debug");
        assert!(settings.source_location);

        let settings = LogSettings::from_verbosity(5);
        assert_eq!(settings.level, "trace");
        assert_eq!(settings.format, LogFormat::Full);
        assert!(settings.thread_ids);
    }

    #[test]
    fn test_config_level_applies_without_flags() {
        let section = config::LoggingConfig {
            level: "info".to_string(),
            format: "json".to_string(),
            file: Some(PathBuf::from("mdr.log")),
        };

        let mut quiet = LogSettings::from_verbosity(0);
        quiet.merge_config(&section, 0);
        assert_eq!(quiet.level, "info");
        assert_eq!(quiet.format, LogFormat::Json);
        assert_eq!(quiet.file, Some(PathBuf::from("mdr.log")));

        let mut verbose = LogSettings::from_verbosity(2);
        verbose.merge_config(&section, 2);
        assert_eq!(verbose.level, "debug");
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_request_ids_are_unique() {
        let first = generate_request_id();
        let second = generate_request_id();
        assert!(first.starts_with("req_"));
        assert_eq!(first.len(), "req_".len() + 32);
        assert_ne!(first, second);
    }
}
