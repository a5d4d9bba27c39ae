//! Host log forwarding.
//!
//! Which thread emitted an event matters more here than in most crates: the
//! same bridged call touches the caller, the target context and whichever
//! thread fires the callback. Every [`LogEntry`] therefore records the name
//! of the thread that produced it.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};
use std::thread;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{BridgeError, Result},
    platform::PlatformSendSync,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Lowercase name, as used in `EnvFilter` directives.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One event as handed to a [`LoggerSink`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub timestamp: DateTime<Utc>,
    /// Module path of the emitting code, e.g. `core_dispatch::gate`.
    pub target: String,
    pub message: String,
    /// Name of the emitting thread; `None` for unnamed threads.
    pub thread: Option<String>,
    /// Innermost span active when the event fired.
    pub span: Option<String>,
    pub fields: BTreeMap<String, String>,
}

impl LogEntry {
    /// Create an entry stamped with the current time and thread.
    pub fn new(level: LogLevel, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            timestamp: Utc::now(),
            target: target.into(),
            message: message.into(),
            thread: thread::current().name().map(str::to_string),
            span: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn in_span(mut self, span: impl Into<String>) -> Self {
        self.span = Some(span.into());
        self
    }

    /// Single-line rendering: time, level, thread, target, message, then
    /// `key=value` fields in key order.
    pub fn to_line(&self) -> String {
        let mut line = format!(
            "{} {:>5} [{}] {}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.level.as_str().to_uppercase(),
            self.thread.as_deref().unwrap_or("<unnamed>"),
            self.target,
        );
        if let Some(span) = &self.span {
            line.push(':');
            line.push_str(span);
        }
        line.push_str(": ");
        line.push_str(&self.message);
        for (key, value) in &self.fields {
            line.push_str(&format!(" {}={}", key, value));
        }
        line
    }
}

/// Receives log entries on behalf of the host (platform log, file, console).
///
/// Entries are delivered from a dedicated forwarding thread, never from the
/// thread that emitted them, so an implementation may block or await freely
/// without stalling a privileged wait.
#[async_trait::async_trait]
pub trait LoggerSink: PlatformSendSync {
    async fn log(&self, entry: LogEntry) -> Result<()>;

    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Entries below this level are dropped before they are queued.
    fn min_level(&self) -> LogLevel {
        LogLevel::Info
    }
}

/// Writes entries to stderr with [`LogEntry::to_line`].
#[derive(Debug, Clone)]
pub struct ConsoleLogger {
    pub min_level: LogLevel,
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
        }
    }
}

#[async_trait::async_trait]
impl LoggerSink for ConsoleLogger {
    async fn log(&self, entry: LogEntry) -> Result<()> {
        if entry.level < self.min_level {
            return Ok(());
        }
        writeln!(io::stderr().lock(), "{}", entry.to_line())
            .map_err(|e| BridgeError::Sink(format!("stderr: {}", e)))
    }

    fn min_level(&self) -> LogLevel {
        self.min_level
    }
}
