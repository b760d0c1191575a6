// Logger
//
// Pipeline logging. An implementor provides a threshold and a sink; the level
// methods drop anything below the threshold before it reaches the sink.

use std::fmt;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn label(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Shared by every pass of a run, including the parallel codegen phase.
pub trait Logger: Send + Sync {
    /// Messages below this level are dropped.
    fn level(&self) -> LogLevel;

    /// Sink for a message that passed the level filter.
    fn log(&self, level: LogLevel, msg: &str);

    fn is_enabled(&self, level: LogLevel) -> bool {
        level >= self.level()
    }

    fn log_at(&self, level: LogLevel, msg: &str) {
        if self.is_enabled(level) {
            self.log(level, msg);
        }
    }

    fn debug(&self, msg: &str) {
        self.log_at(LogLevel::Debug, msg);
    }

    fn info(&self, msg: &str) {
        self.log_at(LogLevel::Info, msg);
    }

    fn warn(&self, msg: &str) {
        self.log_at(LogLevel::Warn, msg);
    }

    fn error(&self, msg: &str) {
        self.log_at(LogLevel::Error, msg);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl NullLogger {
    pub fn new() -> Self {
        Self
    }
}

impl Logger for NullLogger {
    fn level(&self) -> LogLevel {
        LogLevel::Error
    }

    fn log(&self, _level: LogLevel, _msg: &str) {}
}

/// Keeps messages in memory for inspection after a run.
#[derive(Debug)]
pub struct MemoryLogger {
    level: LogLevel,
    messages: Mutex<Vec<(LogLevel, String)>>,
}

impl Default for MemoryLogger {
    fn default() -> Self {
        Self::with_level(LogLevel::Debug)
    }
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(level: LogLevel) -> Self {
        Self {
            level,
            messages: Mutex::new(Vec::new()),
        }
    }

    pub fn messages(&self) -> Vec<(LogLevel, String)> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

impl Logger for MemoryLogger {
    fn level(&self) -> LogLevel {
        self.level
    }

    fn log(&self, level: LogLevel, msg: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push((level, msg.to_string()));
        }
    }
}
