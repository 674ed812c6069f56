//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing every [`AppEvent`] to the `log`
//! facade (UART / USB-CDC in production) and, when configured, appending it
//! to a size-bounded file as `timestamp|LEVEL|message`.
//!
//! An oversized file is deleted before the next entry is written, so the
//! entry that crossed the limit stays readable until then.  File errors are
//! swallowed: logging must never take the loop down.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{error, info, warn};

use crate::app::events::{AppEvent, Severity};
use crate::app::ports::EventSink;
use crate::config::LOG_MAX_BYTES;

/// Append-only log file with rotation by deletion.
#[derive(Debug, Clone)]
pub struct FileLog {
    path: PathBuf,
    max_bytes: u64,
}

impl FileLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_limit(path, LOG_MAX_BYTES)
    }

    pub fn with_limit(path: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self {
            path: path.into(),
            max_bytes,
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Append one entry.  Never fails from the caller's point of view.
    pub fn append(&self, severity: Severity, message: &str) {
        let _ = self.try_append(unix_now(), severity, message);
    }

    fn try_append(&self, timestamp: u64, severity: Severity, message: &str) -> std::io::Result<()> {
        if fs::metadata(&self.path).is_ok_and(|m| m.len() > self.max_bytes) {
            fs::remove_file(&self.path)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}|{}|{}", timestamp, severity.as_str(), message)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

/// Adapter that logs every [`AppEvent`] to the console and, optionally, a file.
pub struct LogEventSink {
    file: Option<FileLog>,
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogEventSink {
    /// Console only.
    pub fn new() -> Self {
        Self { file: None }
    }

    pub fn with_file(file: FileLog) -> Self {
        Self { file: Some(file) }
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        let severity = event.severity();
        match severity {
            Severity::Info => info!("{}", event),
            Severity::Warning => warn!("{}", event),
            Severity::Error => error!("{}", event),
            Severity::Critical => error!("CRITICAL | {}", event),
        }
        if let Some(file) = &self.file {
            file.append(severity, &event.to_string());
        }
    }
}
