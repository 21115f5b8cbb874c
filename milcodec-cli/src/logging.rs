//! Structured CLI-facing logging: one event per decode attempt, in the
//! caller's chosen output format. This is distinct from
//! `milcodec_core::logging::ReceiverLogger`, which is an internal,
//! subsystem-filtered diagnostic ring buffer the core crate builds up
//! during a single decode; this logger is the CLI's user-facing record
//! of outcomes across a run.

use crate::config::{LogFormat, LogTarget, LoggingConfig};
use chrono::{DateTime, Utc};
use color_eyre::eyre::{eyre, Result};
use milcodec_core::{DecodeStatus, MessageRecord};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufWriter, Write};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogEvent {
    /// A window was decoded into a message (successfully or with an
    /// embedded error record, per `MessageRecord::status`).
    Message(MessageEvent),

    /// General info message.
    Info { message: String },

    /// Warning message.
    Warn { message: String },

    /// Error message.
    Error { message: String, details: Option<String> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEvent {
    pub timestamp: DateTime<Utc>,
    pub content: String,
    pub priority: String,
    pub msg_type: String,
    pub filename: Option<String>,
    pub verified: bool,
    pub status: String,
}

impl MessageEvent {
    pub fn from_record(record: &MessageRecord) -> Self {
        Self {
            timestamp: Utc::now(),
            content: record.content.clone(),
            priority: format!("{:?}", record.priority),
            msg_type: format!("{:?}", record.msg_type),
            filename: record.filename.clone(),
            verified: record.verified,
            status: match record.status {
                DecodeStatus::Ok => "ok".to_string(),
                DecodeStatus::Error => "error".to_string(),
            },
        }
    }
}

pub struct StructuredLogger {
    config: LoggingConfig,
    writer: Box<dyn Write + Send>,
    start_time: DateTime<Utc>,
}

impl StructuredLogger {
    pub fn new(config: LoggingConfig) -> Result<Self> {
        let writer: Box<dyn Write + Send> = match &config.target {
            LogTarget::Stdout => Box::new(io::stdout()),
            LogTarget::Stderr => Box::new(io::stderr()),
            LogTarget::File => {
                let path = config
                    .file_path
                    .as_ref()
                    .ok_or_else(|| eyre!("File path required for file logging"))?;
                Box::new(BufWriter::new(File::create(path)?))
            }
        };

        Ok(Self {
            config,
            writer,
            start_time: Utc::now(),
        })
    }

    pub fn log(&mut self, event: LogEvent) -> Result<()> {
        let output = match self.config.format {
            LogFormat::Json => self.format_json(&event)?,
            LogFormat::Logfmt => self.format_logfmt(&event),
            LogFormat::Pretty => self.format_pretty(&event),
        };

        writeln!(self.writer, "{}", output)?;
        self.writer.flush()?;

        Ok(())
    }

    fn format_json(&self, event: &LogEvent) -> Result<String> {
        Ok(serde_json::to_string(event)?)
    }

    fn format_logfmt(&self, event: &LogEvent) -> String {
        let ts = Utc::now().to_rfc3339();
        match event {
            LogEvent::Message(m) => format!(
                "ts=\"{}\" type=message status={} priority={} msg_type={} verified={} content=\"{}\"",
                ts, m.status, m.priority, m.msg_type, m.verified, m.content
            ),
            LogEvent::Info { message } => format!("ts=\"{}\" level=info msg=\"{}\"", ts, message),
            LogEvent::Warn { message } => format!("ts=\"{}\" level=warn msg=\"{}\"", ts, message),
            LogEvent::Error { message, details } => match details {
                Some(d) => format!("ts=\"{}\" level=error msg=\"{}\" details=\"{}\"", ts, message, d),
                None => format!("ts=\"{}\" level=error msg=\"{}\"", ts, message),
            },
        }
    }

    fn format_pretty(&self, event: &LogEvent) -> String {
        let ts = Utc::now().format("%Y-%m-%d %H:%M:%S%.3f");
        match event {
            LogEvent::Message(m) => format!(
                "[{}] MESSAGE[{}/{}]: {} (verified={}){}",
                ts,
                m.priority,
                m.msg_type,
                m.content,
                m.verified,
                m.filename
                    .as_ref()
                    .map(|f| format!(" file={f}"))
                    .unwrap_or_default()
            ),
            LogEvent::Info { message } => format!("[{}] INFO: {}", ts, message),
            LogEvent::Warn { message } => format!("[{}] WARN: {}", ts, message),
            LogEvent::Error { message, details } => match details {
                Some(d) => format!("[{}] ERROR: {} | {}", ts, message, d),
                None => format!("[{}] ERROR: {}", ts, message),
            },
        }
    }

    pub fn elapsed(&self) -> f64 {
        (Utc::now() - self.start_time).num_milliseconds() as f64 / 1000.0
    }
}
