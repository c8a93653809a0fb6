use std::path::PathBuf;

use directories::ProjectDirs;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

const LOG_FILE_NAME: &str = "ci-masters.log";

/// Configuration for the logging system
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Log level for console output
    pub console_level: Level,
    /// Log level for file output
    pub file_level: Level,
    /// Log to stderr
    pub console: bool,
    /// Directory where log files should be written; `None` disables file logs
    pub log_dir: Option<PathBuf>,
    /// Whether to enable JSON formatted logs for structured output
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            console_level: Level::INFO,
            file_level: Level::DEBUG,
            console: true,
            log_dir: None,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Get the OS-appropriate default log directory
    pub fn default_log_dir() -> PathBuf {
        if let Some(proj_dirs) = ProjectDirs::from("", "", "ci-masters") {
            proj_dirs.cache_dir().to_path_buf()
        } else {
            PathBuf::from("ci-masters-logs")
        }
    }

    /// Create logging configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(level) = var("CI_MASTERS_LOG_LEVEL").and_then(|l| l.parse::<Level>().ok()) {
            config.console_level = level;
            config.file_level = level;
        }

        // "default" picks the OS cache directory
        if let Some(log_dir) = var("CI_MASTERS_LOG_DIR") {
            config.log_dir = Some(match log_dir.as_str() {
                "default" => Self::default_log_dir(),
                _ => PathBuf::from(log_dir),
            });
        }

        if var("CI_MASTERS_NO_FILE_LOGS").is_some() {
            config.log_dir = None;
        }

        if var("CI_MASTERS_NO_CONSOLE_LOGS").is_some() {
            config.console = false;
        }

        if var("CI_MASTERS_JSON_LOGS").is_some() {
            config.json_format = true;
        }

        config
    }
}

/// Initialize the logging system with the given configuration.
///
/// The returned guard flushes the file writer when dropped; keep it alive for
/// the lifetime of the process.
pub fn init_logging(
    config: LoggingConfig,
) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error + Send + Sync>> {
    let mut layers = vec![];
    let mut guard = None;

    if let Some(log_dir) = &config.log_dir {
        std::fs::create_dir_all(log_dir)?;

        let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
        let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(file_guard);

        let filter = EnvFilter::builder()
            .with_default_directive(config.file_level.into())
            .from_env_lossy();

        let file_layer = if config.json_format {
            fmt::layer().json().with_writer(non_blocking).with_filter(filter).boxed()
        } else {
            fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking)
                .with_filter(filter)
                .boxed()
        };

        layers.push(file_layer);
    }

    if config.console {
        let filter = EnvFilter::builder()
            .with_default_directive(config.console_level.into())
            .from_env_lossy();

        let console_layer = if config.json_format {
            fmt::layer().json().with_writer(std::io::stderr).with_filter(filter).boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_file(false)
                .with_line_number(false)
                .with_writer(std::io::stderr)
                .with_filter(filter)
                .boxed()
        };

        layers.push(console_layer);
    }

    tracing_subscriber::registry().with(layers).try_init()?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> LoggingConfig {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        LoggingConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config, LoggingConfig::default());
        assert!(config.console);
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let config = config_from(&[
            ("CI_MASTERS_LOG_LEVEL", "trace"),
            ("CI_MASTERS_LOG_DIR", "/var/log/ci-masters"),
            ("CI_MASTERS_JSON_LOGS", "1"),
            ("CI_MASTERS_NO_CONSOLE_LOGS", "1"),
        ]);

        assert_eq!(config.console_level, Level::TRACE);
        assert_eq!(config.file_level, Level::TRACE);
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/ci-masters")));
        assert!(config.json_format);
        assert!(!config.console);
    }

    #[test]
    fn test_no_file_logs_wins_over_log_dir() {
        let config = config_from(&[
            ("CI_MASTERS_LOG_DIR", "default"),
            ("CI_MASTERS_NO_FILE_LOGS", "1"),
        ]);
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn test_invalid_level_is_ignored() {
        let config = config_from(&[("CI_MASTERS_LOG_LEVEL", "loud")]);
        assert_eq!(config.console_level, Level::INFO);
    }
}
