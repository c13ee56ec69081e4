use std::sync::Arc;

use reconsider_config::LogLevel;

/// Sink for the messages reconsider and migration operations emit.
pub trait Logger: Send + Sync {
    fn debug(&self, message: &str);
    fn verbose(&self, message: &str);
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);

    /// Dispatch on a runtime level.
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => self.debug(message),
            LogLevel::Verbose => self.verbose(message),
            LogLevel::Info => self.info(message),
            LogLevel::Warn => self.warn(message),
            LogLevel::Error => self.error(message),
        }
    }
}

/// Writes `[level] message` lines to the standard streams.
///
/// `debug`, `verbose` and `info` go to stdout, `warn` and `error` to stderr.
/// Levels below `min_level` are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleLogger {
    min_level: LogLevel,
}

impl ConsoleLogger {
    pub fn new(min_level: LogLevel) -> Self {
        Self { min_level }
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    fn write(&self, level: LogLevel, message: &str) {
        if !level.enabled_at(self.min_level) {
            return;
        }
        match level {
            LogLevel::Warn | LogLevel::Error => eprintln!("[{level}] {message}"),
            _ => println!("[{level}] {message}"),
        }
    }
}

impl Logger for ConsoleLogger {
    fn debug(&self, message: &str) {
        self.write(LogLevel::Debug, message);
    }

    fn verbose(&self, message: &str) {
        self.write(LogLevel::Verbose, message);
    }

    fn info(&self, message: &str) {
        self.write(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.write(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.write(LogLevel::Error, message);
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn debug(&self, _message: &str) {}
    fn verbose(&self, _message: &str) {}
    fn info(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
}

/// Forwards to the `tracing` macros; `verbose` maps to `TRACE`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "reconsider", "{message}");
    }

    fn verbose(&self, message: &str) {
        tracing::trace!(target: "reconsider", "{message}");
    }

    fn info(&self, message: &str) {
        tracing::info!(target: "reconsider", "{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "reconsider", "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "reconsider", "{message}");
    }
}

/// Keeps every message in memory, in emission order.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Default)]
pub struct RecordingLogger {
    records: std::sync::Mutex<Vec<(LogLevel, String)>>,
}

#[cfg(any(test, feature = "test-util"))]
impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(LogLevel, String)> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Messages logged at exactly `level`.
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.records()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }

    fn push(&self, level: LogLevel, message: &str) {
        if let Ok(mut records) = self.records.lock() {
            records.push((level, message.to_string()));
        }
    }
}

#[cfg(any(test, feature = "test-util"))]
impl Logger for RecordingLogger {
    fn debug(&self, message: &str) {
        self.push(LogLevel::Debug, message);
    }

    fn verbose(&self, message: &str) {
        self.push(LogLevel::Verbose, message);
    }

    fn info(&self, message: &str) {
        self.push(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.push(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.push(LogLevel::Error, message);
    }
}

/// How the caller wants reconsider to log.
#[derive(Clone, Default)]
pub enum LoggerSetting {
    /// Console logger filtered at the configured level.
    #[default]
    Default,
    /// Silence every level.
    Disabled,
    Custom(Arc<dyn Logger>),
}

impl LoggerSetting {
    pub fn custom(logger: impl Logger + 'static) -> Self {
        LoggerSetting::Custom(Arc::new(logger))
    }

    /// Produce the logger to use. `min_level` only affects the default console logger.
    pub fn resolve(self, min_level: LogLevel) -> Arc<dyn Logger> {
        match self {
            LoggerSetting::Default => Arc::new(ConsoleLogger::new(min_level)),
            LoggerSetting::Disabled => Arc::new(NoopLogger),
            LoggerSetting::Custom(logger) => logger,
        }
    }
}

impl From<Arc<dyn Logger>> for LoggerSetting {
    fn from(logger: Arc<dyn Logger>) -> Self {
        LoggerSetting::Custom(logger)
    }
}

impl std::fmt::Debug for LoggerSetting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoggerSetting::Default => f.write_str("Default"),
            LoggerSetting::Disabled => f.write_str("Disabled"),
            LoggerSetting::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
