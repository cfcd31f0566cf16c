//! Logging setup for the proximity service
//!
//! Everything logs through `tracing`; this module only installs a
//! subscriber. Libraries never call it, the binary does once at start-up.

use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Variable selecting the logging mode
pub const LOG_MODE_ENV: &str = "AUDIBLE_LOG_MODE";

/// Variable overriding the log filter
pub const LOG_LEVEL_ENV: &str = "AUDIBLE_LOG_LEVEL";

/// Logging mode for different use cases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingMode {
    /// No output
    Silent,
    /// Compact stderr output
    Development,
    /// Verbose diagnostics, including per-tick snapshots
    Debug,
    /// One JSON object per event, for log shippers
    Json,
}

impl LoggingMode {
    /// Parse a mode name as used in `AUDIBLE_LOG_MODE`
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "silent" => Some(Self::Silent),
            "development" | "dev" => Some(Self::Development),
            "debug" => Some(Self::Debug),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    fn default_filter(self) -> &'static str {
        match self {
            Self::Silent => "off",
            Self::Development | Self::Json => "info",
            Self::Debug => "debug",
        }
    }
}

/// Logging configuration error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),

    #[error("Invalid environment variable: {0}")]
    InvalidEnv(String),
}

/// Initialize logging with the specified mode
///
/// # Environment Variables
///
/// - `AUDIBLE_LOG_LEVEL`: filter directive overriding the mode default
///   (e.g. `warn,proximity::snapshot=debug`)
/// - `RUST_LOG`: used when `AUDIBLE_LOG_LEVEL` is not set
pub fn init_logging(mode: LoggingMode) -> Result<(), LoggingError> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    match mode {
        LoggingMode::Silent => Ok(()),
        LoggingMode::Development => {
            let filter = create_env_filter(mode.default_filter())?;

            Registry::default()
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_thread_ids(false)
                        .with_file(false)
                        .with_line_number(false)
                        .with_writer(std::io::stderr)
                        .compact(),
                )
                .with(filter)
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
        LoggingMode::Debug => {
            let filter = create_env_filter(mode.default_filter())?;

            Registry::default()
                .with(
                    fmt::layer()
                        .with_thread_names(true)
                        .with_file(true)
                        .with_line_number(true)
                        .with_writer(std::io::stderr),
                )
                .with(filter)
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
        LoggingMode::Json => {
            let filter = create_env_filter(mode.default_filter())?;

            Registry::default()
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .with(filter)
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
    }
}

/// Initialize logging from `AUDIBLE_LOG_MODE`
///
/// Unset means `Development`; an unknown name is an error.
pub fn init_logging_from_env() -> Result<(), LoggingError> {
    init_logging(mode_from_env(LoggingMode::Development)?)
}

/// Mode named by `AUDIBLE_LOG_MODE`, or `fallback` when unset
pub fn mode_from_env(fallback: LoggingMode) -> Result<LoggingMode, LoggingError> {
    match std::env::var(LOG_MODE_ENV) {
        Ok(name) => LoggingMode::from_name(&name)
            .ok_or_else(|| LoggingError::InvalidEnv(format!("{}={}", LOG_MODE_ENV, name))),
        Err(_) => Ok(fallback),
    }
}

/// First try AUDIBLE_LOG_LEVEL, then RUST_LOG, then the mode default
fn create_env_filter(default_level: &str) -> Result<EnvFilter, LoggingError> {
    if let Ok(level) = std::env::var(LOG_LEVEL_ENV) {
        return EnvFilter::try_new(&level)
            .map_err(|e| LoggingError::InvalidEnv(format!("{}={}: {}", LOG_LEVEL_ENV, level, e)));
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(rust_log) => EnvFilter::new(rust_log),
        Err(_) => EnvFilter::new(default_level),
    };

    Ok(filter)
}
