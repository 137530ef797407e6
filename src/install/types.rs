//! Execution state shared by the queue, dispatcher and progress table.

use crate::item::InstallationItem;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of one item: `queued → installing → {completed | failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    #[default]
    Queued,
    Installing,
    Completed,
    Failed,
}

impl ExecutionStatus {
    /// Check if the status is final.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionStatus::Queued => write!(f, "queued"),
            ExecutionStatus::Installing => write!(f, "installing"),
            ExecutionStatus::Completed => write!(f, "completed"),
            ExecutionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Mutable state of one item's execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub item: InstallationItem,
    pub batch_id: String,
    pub status: ExecutionStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_seconds: f64,
    /// Captured stdout.
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installed_version: Option<String>,
}

impl ExecutionRecord {
    /// Create a record that has just entered `installing`.
    pub fn started(batch_id: &str, item: InstallationItem) -> Self {
        Self {
            item,
            batch_id: batch_id.to_string(),
            status: ExecutionStatus::Installing,
            started_at: Utc::now(),
            completed_at: None,
            duration_seconds: 0.0,
            output: String::new(),
            error: None,
            installed_version: None,
        }
    }

    /// Move the record into a terminal state.
    pub fn finish(
        &mut self,
        status: ExecutionStatus,
        output: String,
        error: Option<String>,
        installed_version: Option<String>,
    ) {
        debug_assert!(status.is_terminal());
        let now = Utc::now();
        self.status = status;
        self.completed_at = Some(now);
        self.duration_seconds = (now - self.started_at).num_milliseconds().max(0) as f64 / 1000.0;
        self.output = output;
        self.error = error;
        self.installed_version = installed_version;
    }

    /// Key used to reconcile records regardless of completion order.
    pub fn key(&self) -> RecordKey {
        RecordKey::new(&self.batch_id, &self.item.id)
    }
}

/// `(batch_id, item_id)` identity of a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    pub batch_id: String,
    pub item_id: String,
}

impl RecordKey {
    pub fn new(batch_id: &str, item_id: &str) -> Self {
        Self {
            batch_id: batch_id.to_string(),
            item_id: item_id.to_string(),
        }
    }
}

/// Events broadcast while a batch is processed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InstallEvent {
    /// A batch was accepted onto the queue.
    Queued { batch_id: String, items: usize },
    /// An item entered `installing`.
    Started { batch_id: String, item_id: String },
    /// An item reached a terminal state.
    Finished {
        batch_id: String,
        item_id: String,
        success: bool,
    },
}

/// Result of submitting items through the manager.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueOutcome {
    /// `None` when no item passed validation.
    pub batch_id: Option<String>,
    /// `"{name}: {reason}"` for every rejected item.
    pub rejected: Vec<String>,
}
