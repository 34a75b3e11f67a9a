//! Logging: tracing subscriber setup and the in-app console buffer

use tracing_subscriber::EnvFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Maximum number of lines kept in the console tab
const CONSOLE_CAPACITY: usize = 500;

/// Initialize tracing to stderr.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` (from config) is used.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true);

    // A second init (tests, re-entry) is harmless
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init();
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn tag(&self) -> &'static str {
        match self {
            LogLevel::Info => "[INFO]",
            LogLevel::Warn => "[WARN]",
            LogLevel::Error => "[ERROR]",
        }
    }
}

/// Timestamped lines shown in the Console tab
#[derive(Debug, Default)]
pub struct ConsoleLog {
    lines: Vec<(LogLevel, String)>,
}

impl ConsoleLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line and forward it to tracing
    pub fn push(&mut self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Info => tracing::info!("{}", message),
            LogLevel::Warn => tracing::warn!("{}", message),
            LogLevel::Error => tracing::error!("{}", message),
        }

        let timestamp = chrono::Local::now().format("%H:%M:%S");
        self.lines
            .push((level, format!("[{}] {} {}", timestamp, level.tag(), message)));
        if self.lines.len() > CONSOLE_CAPACITY {
            let excess = self.lines.len() - CONSOLE_CAPACITY;
            self.lines.drain(..excess);
        }
    }

    pub fn info(&mut self, message: &str) {
        self.push(LogLevel::Info, message);
    }

    pub fn warn(&mut self, message: &str) {
        self.push(LogLevel::Warn, message);
    }

    pub fn error(&mut self, message: &str) {
        self.push(LogLevel::Error, message);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.info("Console cleared");
    }

    pub fn lines(&self) -> impl Iterator<Item = &(LogLevel, String)> {
        self.lines.iter()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_keeps_last_lines() {
        let mut log = ConsoleLog::new();
        for i in 0..(CONSOLE_CAPACITY + 20) {
            log.info(&format!("line {}", i));
        }
        assert_eq!(log.len(), CONSOLE_CAPACITY);
        let (_, first) = log.lines().next().unwrap();
        assert!(first.ends_with("line 20"));
    }

    #[test]
    fn test_console_line_carries_level_tag() {
        let mut log = ConsoleLog::new();
        log.error("movie fetch failed");
        let (level, line) = log.lines().next().unwrap();
        assert_eq!(*level, LogLevel::Error);
        assert!(line.contains("[ERROR] movie fetch failed"));
    }

    #[test]
    fn test_clear_leaves_marker() {
        let mut log = ConsoleLog::new();
        log.warn("one");
        log.warn("two");
        log.clear();
        assert_eq!(log.len(), 1);
    }
}
