//! Logging configuration and initialization
//!
//! Structured logging with tracing: a compact or JSON console layer and an
//! optional non-blocking file layer.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "GESTURE_ORBIT_LOG";
/// Environment variable selecting the output format (`json` or anything else)
pub const LOG_FORMAT_ENV: &str = "GESTURE_ORBIT_LOG_FORMAT";

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub console_enabled: bool,
    /// Also write to this file when set
    pub file_path: Option<PathBuf>,
    pub json_format: bool,
    /// Filter used when neither environment variable is set
    pub default_level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            console_enabled: true,
            file_path: None,
            json_format: false,
            default_level: "info".to_string(),
        }
    }
}

/// JSON output if the environment asks for it, else the config value
fn use_json(env_format: Option<&str>, config: &LogConfig) -> bool {
    match env_format {
        Some(v) => v.eq_ignore_ascii_case("json"),
        None => config.json_format,
    }
}

/// Initialize the global subscriber.
///
/// `GESTURE_ORBIT_LOG` takes precedence over `RUST_LOG`, which takes
/// precedence over `config.default_level`. The returned guard flushes the
/// file writer and must be kept alive until exit.
pub fn init_logging(
    config: &LogConfig,
) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_env("RUST_LOG"))
        .unwrap_or_else(|_| EnvFilter::new(&config.default_level));

    let env_format = std::env::var(LOG_FORMAT_ENV).ok();
    let json = use_json(env_format.as_deref(), config);

    let (file_layer, file_guard) = match &config.file_path {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let (json_layer, console_layer) = match (config.console_enabled, json) {
        (true, true) => (
            Some(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_file(true)
                    .with_line_number(true),
            ),
            None,
        ),
        (true, false) => (
            None,
            Some(fmt::layer().with_target(true).with_thread_ids(false).compact()),
        ),
        (false, _) => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(json_layer)
        .with(console_layer)
        .try_init()?;

    tracing::info!(
        target: "gesture_orbit",
        version = env!("CARGO_PKG_VERSION"),
        json_format = json,
        file = ?config.file_path,
        "Logging initialized"
    );

    Ok(file_guard)
}

// Re-export WorkerGuard so callers can store it
pub use tracing_appender::non_blocking::WorkerGuard as LogGuard;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_default() {
        let config = LogConfig::default();
        assert!(config.console_enabled);
        assert!(config.file_path.is_none());
        assert!(!config.json_format);
        assert_eq!(config.default_level, "info");
    }

    #[test]
    fn test_format_env_overrides_config() {
        let plain = LogConfig::default();
        let json = LogConfig {
            json_format: true,
            ..LogConfig::default()
        };
        assert!(use_json(Some("JSON"), &plain));
        assert!(!use_json(Some("pretty"), &json));
        assert!(use_json(None, &json));
        assert!(!use_json(None, &plain));
    }
}
