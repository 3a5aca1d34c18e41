#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions, clippy::multiple_crate_versions)]

//! Operator-facing activity log for the ingestion pipeline.
//!
//! The log keeps a bounded ring of recent records (oldest evicted first) and
//! fans every new record out over a `tokio::broadcast` channel so live
//! consumers can follow along. Each record is mirrored into `tracing` at the
//! matching level so structured logs and the operator view never diverge.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, Receiver, Sender};

/// Identifier assigned to each activity record.
pub type ActivityId = u64;

/// Number of records retained when no explicit capacity is given.
pub const DEFAULT_ACTIVITY_CAPACITY: usize = 200;

/// Message recorded by [`ActivityLog::clear`].
pub const CLEARED_MESSAGE: &str = "Logs cleared";

/// Severity attached to an activity record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Routine progress.
    Info,
    /// A unit of work finished well.
    Success,
    /// Something degraded but the pipeline carried on.
    Warning,
    /// A unit of work failed.
    Error,
}

impl Severity {
    /// Lowercase label used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// Single entry in the activity log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Sequential identifier, unique for the lifetime of the log.
    pub id: ActivityId,
    /// Time the record was created.
    pub timestamp: DateTime<Utc>,
    /// Human readable message.
    pub message: String,
    /// Record severity.
    pub severity: Severity,
}

/// Shared, cloneable activity log.
#[derive(Clone)]
pub struct ActivityLog {
    sender: Sender<ActivityRecord>,
    buffer: Arc<Mutex<VecDeque<ActivityRecord>>>,
    next_id: Arc<AtomicU64>,
    capacity: usize,
}

impl ActivityLog {
    /// Construct a log retaining at most `capacity` records.
    ///
    /// A zero capacity is bumped to one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            buffer: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            next_id: Arc::new(AtomicU64::new(1)),
            capacity,
        }
    }

    /// Construct a log with [`DEFAULT_ACTIVITY_CAPACITY`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_ACTIVITY_CAPACITY)
    }

    /// Append a record and notify live subscribers.
    pub fn record(&self, message: impl Into<String>, severity: Severity) -> ActivityId {
        let message = message.into();
        mirror_to_tracing(&message, severity);

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let record = ActivityRecord {
            id,
            timestamp: Utc::now(),
            message,
            severity,
        };

        {
            let mut buffer = self.lock();
            if buffer.len() == self.capacity {
                buffer.pop_front();
            }
            buffer.push_back(record.clone());
        }

        let _ = self.sender.send(record);
        id
    }

    /// Shorthand for [`Severity::Info`].
    pub fn info(&self, message: impl Into<String>) -> ActivityId {
        self.record(message, Severity::Info)
    }

    /// Shorthand for [`Severity::Success`].
    pub fn success(&self, message: impl Into<String>) -> ActivityId {
        self.record(message, Severity::Success)
    }

    /// Shorthand for [`Severity::Warning`].
    pub fn warning(&self, message: impl Into<String>) -> ActivityId {
        self.record(message, Severity::Warning)
    }

    /// Shorthand for [`Severity::Error`].
    pub fn error(&self, message: impl Into<String>) -> ActivityId {
        self.record(message, Severity::Error)
    }

    /// Retained records, newest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ActivityRecord> {
        self.lock().iter().rev().cloned().collect()
    }

    /// Number of retained records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no records are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every retained record, then record that the log was cleared.
    pub fn clear(&self) -> ActivityId {
        self.lock().clear();
        self.info(CLEARED_MESSAGE)
    }

    /// Follow records created after this call.
    #[must_use]
    pub fn subscribe(&self) -> ActivityStream {
        ActivityStream {
            receiver: self.sender.subscribe(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<ActivityRecord>> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Live view over newly created records.
pub struct ActivityStream {
    receiver: Receiver<ActivityRecord>,
}

impl ActivityStream {
    /// Receive the next record; skips past records lost to lag.
    pub async fn next(&mut self) -> Option<ActivityRecord> {
        loop {
            match self.receiver.recv().await {
                Ok(record) => return Some(record),
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

fn mirror_to_tracing(message: &str, severity: Severity) {
    match severity {
        Severity::Info | Severity::Success => {
            tracing::info!(target: "pdfpress::activity", severity = severity.as_str(), "{message}");
        }
        Severity::Warning => {
            tracing::warn!(target: "pdfpress::activity", "{message}");
        }
        Severity::Error => {
            tracing::error!(target: "pdfpress::activity", "{message}");
        }
    }
}
