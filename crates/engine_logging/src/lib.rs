#![deny(missing_docs)]
//! Shared logging utilities for the pagescribe workspace.
//!
//! This crate provides the `engine_*` logging macros used across the codebase,
//! the [`LogSink`] interface that run-scoped components write their log lines
//! to, and a minimal test initializer for the global logger.

use std::sync::Mutex;

pub use log::Level;

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Destination for the log lines produced while a run is in progress.
///
/// Fetchers and the run controller receive a sink explicitly instead of
/// patching the global logger, so a front end can show a live log panel by
/// supplying its own implementation.
pub trait LogSink: Send + Sync {
    /// Records one message at the given level.
    fn record(&self, level: Level, message: &str);

    /// Records a debug-level message.
    fn debug(&self, message: &str) {
        self.record(Level::Debug, message);
    }

    /// Records an info-level message.
    fn info(&self, message: &str) {
        self.record(Level::Info, message);
    }

    /// Records a warn-level message.
    fn warn(&self, message: &str) {
        self.record(Level::Warn, message);
    }

    /// Records an error-level message.
    fn error(&self, message: &str) {
        self.record(Level::Error, message);
    }
}

/// Log target of every line recorded through a [`LogSink`].
pub const RUN_TARGET: &str = "pagescribe::run";

/// Forwards every record to the global `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct FacadeSink;

impl LogSink for FacadeSink {
    fn record(&self, level: Level, message: &str) {
        log::log!(target: RUN_TARGET, level, "{message}");
    }
}

/// One captured log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Severity of the line.
    pub level: Level,
    /// Rendered message text.
    pub message: String,
}

/// Keeps records in memory, in arrival order, and forwards them to the facade.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every entry recorded so far.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Returns the messages recorded at exactly `level`.
    pub fn messages_at(&self, level: Level) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.level == level)
            .map(|entry| entry.message)
            .collect()
    }
}

impl LogSink for MemorySink {
    fn record(&self, level: Level, message: &str) {
        log::log!(target: RUN_TARGET, level, "{message}");
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(LogEntry {
                level,
                message: message.to_string(),
            });
        }
    }
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
