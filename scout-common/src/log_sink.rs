//! Structured log sink for discovery sessions
//!
//! An append-only collector injected into the discovery engine. Every entry
//! is mirrored to `tracing`, kept in memory for offset-based polling
//! (`entries_since`), and broadcast to live subscribers (SSE streams).
//!
//! Cloning a `LogSink` yields another handle onto the same log.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Default broadcast buffer for live subscribers
pub const DEFAULT_CAPACITY: usize = 256;

/// Severity of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Log,
    Error,
}

/// One line of session output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(rename = "type")]
    pub kind: LogKind,
    pub message: String,
    pub time: DateTime<Utc>,
}

#[derive(Clone)]
pub struct LogSink {
    entries: Arc<Mutex<Vec<LogEntry>>>,
    tx: broadcast::Sender<LogEntry>,
}

impl LogSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            tx,
        }
    }

    /// Fresh log whose entries are broadcast on an existing channel.
    ///
    /// Lets several consecutive sessions feed one long-lived stream.
    pub fn with_channel(tx: broadcast::Sender<LogEntry>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            tx,
        }
    }

    /// Append an informational line
    pub fn info(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{}", message);
        self.push(LogKind::Log, message);
    }

    /// Append an error line
    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("{}", message);
        self.push(LogKind::Error, message);
    }

    fn push(&self, kind: LogKind, message: String) {
        let entry = LogEntry {
            kind,
            message,
            time: Utc::now(),
        };
        self.lock().push(entry.clone());
        // No subscribers is fine; the entry is still retained for polling.
        let _ = self.tx.send(entry);
    }

    /// Entries from `offset` onward (empty if offset is past the end)
    pub fn entries_since(&self, offset: usize) -> Vec<LogEntry> {
        self.lock().get(offset..).map(<[LogEntry]>::to_vec).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Receive entries appended after this call
    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.tx.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_since_offset() {
        let sink = LogSink::default();
        sink.info("one");
        sink.error("two");
        sink.info("three");

        assert_eq!(sink.len(), 3);
        let tail = sink.entries_since(1);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].message, "two");
        assert_eq!(tail[0].kind, LogKind::Error);
        assert!(sink.entries_since(3).is_empty());
        assert!(sink.entries_since(100).is_empty());
    }

    #[test]
    fn test_clones_share_log() {
        let sink = LogSink::default();
        let other = sink.clone();
        other.info("from clone");
        assert_eq!(sink.entries_since(0)[0].message, "from clone");
    }

    #[tokio::test]
    async fn test_subscribers_receive_new_entries() {
        let sink = LogSink::new(8);
        sink.info("before subscribe");
        let mut rx = sink.subscribe();
        sink.info("after subscribe");

        let entry = rx.recv().await.unwrap();
        assert_eq!(entry.message, "after subscribe");
    }

    #[tokio::test]
    async fn test_with_channel_keeps_separate_entries() {
        let (tx, mut rx) = broadcast::channel(8);
        let first = LogSink::with_channel(tx.clone());
        let second = LogSink::with_channel(tx);

        first.info("one");
        second.info("two");

        assert_eq!(first.len(), 1);
        assert_eq!(second.entries_since(0)[0].message, "two");
        assert_eq!(rx.recv().await.unwrap().message, "one");
        assert_eq!(rx.recv().await.unwrap().message, "two");
    }

    #[test]
    fn test_entry_json_shape() {
        let sink = LogSink::default();
        sink.error("boom");
        let json = serde_json::to_value(&sink.entries_since(0)[0]).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["message"], "boom");
        assert!(json["time"].is_string());
    }
}
