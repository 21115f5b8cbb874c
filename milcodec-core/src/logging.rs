//! Structured, subsystem-filtered logging for the receiver pipeline.

use std::fmt;

/// Log level for filtering messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "TRACE"),
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LogLevel,
    pub enable_demod: bool,
    pub enable_sync: bool,
    pub enable_crypto: bool,
    pub max_entries: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            enable_demod: true,
            enable_sync: true,
            enable_crypto: true,
            max_entries: 1_000,
        }
    }
}

impl LogConfig {
    pub fn verbose() -> Self {
        Self {
            level: LogLevel::Debug,
            max_entries: 5_000,
            ..Self::default()
        }
    }

    pub fn quiet() -> Self {
        Self {
            level: LogLevel::Warn,
            enable_demod: false,
            enable_sync: false,
            enable_crypto: false,
            max_entries: 100,
        }
    }

    pub fn disabled() -> Self {
        Self {
            level: LogLevel::Error,
            enable_demod: false,
            enable_sync: false,
            enable_crypto: false,
            max_entries: 0,
        }
    }
}

/// A single log entry.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub subsystem: &'static str,
    pub message: String,
}

/// Logger that collects structured log entries from the decode pipeline.
///
/// Subsystems: `"DEMOD" | "SYNC" | "PAYLOAD" | "CRYPTO" | "PACKET" |
/// "SESSION"`.
#[derive(Debug, Clone)]
pub struct ReceiverLogger {
    config: LogConfig,
    entries: Vec<LogEntry>,
}

impl ReceiverLogger {
    pub fn new(config: LogConfig) -> Self {
        let capacity = config.max_entries.min(1_000);
        Self {
            config,
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn log(&mut self, level: LogLevel, subsystem: &'static str, message: impl fmt::Display) {
        if level < self.config.level {
            return;
        }

        let enabled = match subsystem {
            "DEMOD" => self.config.enable_demod,
            "SYNC" | "PAYLOAD" => self.config.enable_sync,
            "CRYPTO" | "PACKET" => self.config.enable_crypto,
            _ => true,
        };

        if !enabled {
            return;
        }

        let entry = LogEntry {
            level,
            subsystem,
            message: message.to_string(),
        };

        if self.config.max_entries > 0 {
            if self.entries.len() >= self.config.max_entries {
                self.entries.remove(0);
            }
            self.entries.push(entry);
        }

        #[cfg(any(test, debug_assertions))]
        {
            eprintln!("[{}] {}: {}", level, subsystem, message);
        }
    }

    pub fn trace(&mut self, subsystem: &'static str, message: impl fmt::Display) {
        self.log(LogLevel::Trace, subsystem, message);
    }

    pub fn debug(&mut self, subsystem: &'static str, message: impl fmt::Display) {
        self.log(LogLevel::Debug, subsystem, message);
    }

    pub fn info(&mut self, subsystem: &'static str, message: impl fmt::Display) {
        self.log(LogLevel::Info, subsystem, message);
    }

    pub fn warn(&mut self, subsystem: &'static str, message: impl fmt::Display) {
        self.log(LogLevel::Warn, subsystem, message);
    }

    pub fn error(&mut self, subsystem: &'static str, message: impl fmt::Display) {
        self.log(LogLevel::Error, subsystem, message);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for ReceiverLogger {
    fn default() -> Self {
        Self::new(LogConfig::default())
    }
}

impl fmt::Display for ReceiverLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "[{}] {}: {}", entry.level, entry.subsystem, entry.message)?;
        }
        Ok(())
    }
}
