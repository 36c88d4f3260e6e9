//! Structured logging utilities

use tracing_subscriber::EnvFilter;

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors (for development)
    Pretty,
    /// Compact format without colors
    Compact,
    /// JSON format (for production)
    Json,
}

impl Default for LogFormat {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            LogFormat::Pretty
        } else {
            LogFormat::Json
        }
    }
}

/// Configuration for logging behavior
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// Output format
    pub format: LogFormat,
    /// Environment filter (e.g. "info,warden=debug"); falls back to
    /// `RUST_LOG`, then to the built-in default.
    pub filter: Option<String>,
    /// Whether to include the target module in log lines
    pub include_target: bool,
}

/// Initialize structured logging. Errors if a global subscriber is
/// already installed.
pub fn init_logging(config: LogConfig) -> anyhow::Result<()> {
    let env_filter = match config.filter {
        Some(filter) => EnvFilter::try_new(filter)?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,warden=debug")),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(config.include_target);

    match config.format {
        LogFormat::Pretty => subscriber
            .pretty()
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to initialize pretty logger: {e}"))?,
        LogFormat::Compact => subscriber
            .compact()
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to initialize compact logger: {e}"))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to initialize json logger: {e}"))?,
    }

    Ok(())
}
