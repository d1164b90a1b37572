//! Durable JSON-lines logging.
//!
//! Every record passes through the redaction pipeline before it reaches a
//! sink. All levels go to `activity.log`; error records are mirrored to
//! `error.log`. Console output is handled by `tracing` so operators see the
//! (already redacted) message as it happens.

use crate::error::Result;
use crate::redact;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ---------------------------------------------------------------------------
// LogRecord
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warn,
    Error,
}

/// One structured record on its way to the durable sinks.
///
/// `fields` is an arbitrary nested tree; `splat` carries structured
/// interpolation arguments outside that tree and is redacted separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub level: Level,
    pub message: String,
    pub timestamp: String,
    #[serde(default)]
    pub service: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub fields: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub splat: Option<Value>,
}

impl LogRecord {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: Utc::now().format(TIMESTAMP_FORMAT).to_string(),
            service: String::new(),
            fields: Map::new(),
            splat: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Level::Info, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(Level::Warn, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Level::Error, message)
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    pub fn with_splat(mut self, splat: Value) -> Self {
        self.splat = Some(splat);
        self
    }
}

// ---------------------------------------------------------------------------
// FleetLogger
// ---------------------------------------------------------------------------

pub struct FleetLogger {
    service: String,
    activity: Mutex<BufWriter<File>>,
    errors: Mutex<BufWriter<File>>,
}

impl FleetLogger {
    /// Create the log directory and open both sinks in append mode.
    pub fn open(log_dir: &Path, service: &str) -> Result<Self> {
        std::fs::create_dir_all(log_dir)?;
        Ok(Self {
            service: service.to_string(),
            activity: Mutex::new(append_sink(&log_dir.join("activity.log"))?),
            errors: Mutex::new(append_sink(&log_dir.join("error.log"))?),
        })
    }

    /// Redact and persist one record.
    pub fn log(&self, mut record: LogRecord) -> Result<()> {
        if record.service.is_empty() {
            record.service = self.service.clone();
        }
        let redacted = redact::redact(&record);

        match redacted.level {
            Level::Info => tracing::info!("{}", redacted.message),
            Level::Warn => tracing::warn!("{}", redacted.message),
            Level::Error => tracing::error!("{}", redacted.message),
        }

        let line = serde_json::to_string(&redacted)?;
        write_line(&self.activity, &line)?;
        if redacted.level == Level::Error {
            write_line(&self.errors, &line)?;
        }
        Ok(())
    }

    /// Flush both sinks. Called before process exit so no records are lost.
    pub fn flush(&self) -> Result<()> {
        flush_sink(&self.activity)?;
        flush_sink(&self.errors)?;
        Ok(())
    }
}

impl Drop for FleetLogger {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

fn append_sink(path: &Path) -> Result<BufWriter<File>> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(BufWriter::new(file))
}

fn write_line(sink: &Mutex<BufWriter<File>>, line: &str) -> Result<()> {
    let mut sink = sink
        .lock()
        .map_err(|_| std::io::Error::other("log sink poisoned"))?;
    writeln!(sink, "{line}")?;
    Ok(())
}

fn flush_sink(sink: &Mutex<BufWriter<File>>) -> Result<()> {
    let mut sink = sink
        .lock()
        .map_err(|_| std::io::Error::other("log sink poisoned"))?;
    sink.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
