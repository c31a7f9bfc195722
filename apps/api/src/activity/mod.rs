//! Activity log: leveled events fanned out to tracing, a bounded buffer and
//! live subscribers.
//!
//! The pipeline never reads this back; it is purely for the extension's log
//! panel. Components receive an `Arc<dyn LogSink>` so tests can capture events
//! without a subscriber.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

/// Number of events kept for `GET /api/v1/logs`.
pub const MAX_LOG_LINES: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEvent {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Destination for pipeline log events. Delivery is best-effort.
pub trait LogSink: Send + Sync {
    fn emit(&self, level: LogLevel, message: String);

    fn debug(&self, message: String) {
        self.emit(LogLevel::Debug, message);
    }

    fn info(&self, message: String) {
        self.emit(LogLevel::Info, message);
    }

    fn warn(&self, message: String) {
        self.emit(LogLevel::Warn, message);
    }

    fn error(&self, message: String) {
        self.emit(LogLevel::Error, message);
    }
}

/// The service-wide sink held in `AppState`.
pub struct ActivityLog {
    recent: Mutex<VecDeque<LogEvent>>,
    sender: broadcast::Sender<LogEvent>,
}

impl ActivityLog {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(MAX_LOG_LINES);
        Self {
            recent: Mutex::new(VecDeque::with_capacity(MAX_LOG_LINES)),
            sender,
        }
    }

    /// Live event stream. Slow receivers observe `RecvError::Lagged`.
    pub fn subscribe(&self) -> broadcast::Receiver<LogEvent> {
        self.sender.subscribe()
    }

    /// Buffered events, oldest first.
    pub fn recent(&self) -> Vec<LogEvent> {
        match self.recent.lock() {
            Ok(buffer) => buffer.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
        }
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink for ActivityLog {
    fn emit(&self, level: LogLevel, message: String) {
        match level {
            LogLevel::Debug => tracing::debug!("{message}"),
            LogLevel::Info => tracing::info!("{message}"),
            LogLevel::Warn => tracing::warn!("{message}"),
            LogLevel::Error => tracing::error!("{message}"),
        }

        let event = LogEvent {
            level,
            message,
            timestamp: Utc::now(),
        };

        {
            let mut buffer = match self.recent.lock() {
                Ok(buffer) => buffer,
                Err(poisoned) => poisoned.into_inner(),
            };
            if buffer.len() == MAX_LOG_LINES {
                buffer.pop_front();
            }
            buffer.push_back(event.clone());
        }

        // No subscribers is not an error.
        let _ = self.sender.send(event);
    }
}

/// Collects events in memory; used by tests to assert on log output.
#[cfg(test)]
#[derive(Default)]
pub struct CapturingSink {
    events: Mutex<Vec<(LogLevel, String)>>,
}

#[cfg(test)]
impl CapturingSink {
    pub fn events(&self) -> Vec<(LogLevel, String)> {
        self.events.lock().unwrap().clone()
    }

    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.events()
            .iter()
            .any(|(l, m)| *l == level && m.contains(needle))
    }
}

#[cfg(test)]
impl LogSink for CapturingSink {
    fn emit(&self, level: LogLevel, message: String) {
        self.events.lock().unwrap().push((level, message));
    }
}
