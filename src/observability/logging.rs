//! Logging configuration.

use std::str::FromStr;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

use crate::errors::{OpenAIError, OpenAIResult};

/// Subscriber settings.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum level captured, in addition to any `RUST_LOG` directives.
    pub level: LogLevel,
    /// Output format.
    pub format: LogFormat,
    /// Whether each line carries a timestamp.
    pub include_timestamps: bool,
    /// Whether each line carries the module target.
    pub include_target: bool,
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Most verbose.
    Trace,
    /// Request dispatch, response status and conversion decisions.
    Debug,
    /// Default.
    Info,
    /// Failed API calls.
    Warn,
    /// Least verbose.
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

impl FromStr for LogLevel {
    type Err = OpenAIError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(OpenAIError::configuration(format!(
                "unknown log level {:?}",
                other
            ))),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-field lines.
    Pretty,
    /// One JSON object per line.
    Json,
    /// Abbreviated single lines.
    Compact,
}

impl FromStr for LogFormat {
    type Err = OpenAIError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            other => Err(OpenAIError::configuration(format!(
                "unknown log format {:?}",
                other
            ))),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Pretty,
            include_timestamps: true,
            include_target: true,
        }
    }
}

impl LoggingConfig {
    /// Creates the default configuration: info level, pretty output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `OPENAI_LOG_LEVEL` and `OPENAI_LOG_FORMAT`, keeping defaults for unset variables.
    pub fn from_env() -> OpenAIResult<Self> {
        let mut config = Self::default();
        if let Ok(level) = std::env::var("OPENAI_LOG_LEVEL") {
            config.level = level.parse()?;
        }
        if let Ok(format) = std::env::var("OPENAI_LOG_FORMAT") {
            config.format = format.parse()?;
        }
        Ok(config)
    }

    /// Sets the log level.
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Sets the log format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets whether to include timestamps.
    pub fn with_timestamps(mut self, include: bool) -> Self {
        self.include_timestamps = include;
        self
    }

    /// Sets whether to include the module target.
    pub fn with_target(mut self, include: bool) -> Self {
        self.include_target = include;
        self
    }

    /// Installs the global subscriber.
    ///
    /// # Errors
    ///
    /// Fails if a global subscriber is already set.
    ///
    /// ```no_run
    /// use openai_transport::observability::{LogFormat, LogLevel, LoggingConfig};
    ///
    /// LoggingConfig::new()
    ///     .with_level(LogLevel::Debug)
    ///     .with_format(LogFormat::Json)
    ///     .init()
    ///     .expect("logging already initialized");
    /// ```
    pub fn init(self) -> OpenAIResult<()> {
        let filter =
            EnvFilter::from_default_env().add_directive(LevelFilter::from(self.level).into());

        tracing_subscriber::registry()
            .with(self.layer())
            .with(filter)
            .try_init()
            .map_err(|e| OpenAIError::configuration(format!("failed to install logger: {}", e)))
    }

    fn layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let base = fmt::layer().with_target(self.include_target);
        match (self.format, self.include_timestamps) {
            (LogFormat::Pretty, true) => base.boxed(),
            (LogFormat::Pretty, false) => base.without_time().boxed(),
            (LogFormat::Json, true) => base.json().boxed(),
            (LogFormat::Json, false) => base.json().without_time().boxed(),
            (LogFormat::Compact, true) => base.compact().boxed(),
            (LogFormat::Compact, false) => base.compact().without_time().boxed(),
        }
    }
}
