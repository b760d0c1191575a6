// Console Logger
//
// Writes `ngc: <level>: <message>` lines to stderr, next to the formatted
// diagnostics, so stdout stays free for tools that pipe it.

use std::io::Write;

use super::logger::{LogLevel, Logger};

#[derive(Debug, Clone, Copy)]
pub struct ConsoleLogger {
    level: LogLevel,
}

impl ConsoleLogger {
    pub fn new(level: LogLevel) -> Self {
        Self { level }
    }

    /// `trace` lowers the threshold to debug; otherwise warnings and errors only.
    pub fn for_trace(trace: bool) -> Self {
        Self::new(if trace { LogLevel::Debug } else { LogLevel::Warn })
    }
}

impl Logger for ConsoleLogger {
    fn level(&self) -> LogLevel {
        self.level
    }

    fn log(&self, level: LogLevel, msg: &str) {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "ngc: {}: {}", level, msg);
    }
}
