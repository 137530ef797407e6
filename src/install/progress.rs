//! Concurrently readable table of active, completed and failed records.
//!
//! Every mutation and every snapshot takes one short `std::sync::Mutex`
//! critical section; the lock is never held across an await point.

use super::types::{ExecutionRecord, ExecutionStatus, RecordKey};
use crate::item::InstallationItem;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Tables {
    active: HashMap<RecordKey, ExecutionRecord>,
    completed: HashMap<RecordKey, ExecutionRecord>,
    failed: HashMap<RecordKey, ExecutionRecord>,
}

/// Point-in-time copy of the progress table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub active: Vec<ExecutionRecord>,
    pub completed: Vec<ExecutionRecord>,
    pub failed: Vec<ExecutionRecord>,
    pub queue_depth: usize,
    pub total_active: usize,
    pub total_completed: usize,
    pub total_failed: usize,
}

impl ProgressSnapshot {
    /// Check whether nothing is active or waiting.
    pub fn is_idle(&self) -> bool {
        self.total_active == 0 && self.queue_depth == 0
    }
}

#[derive(Debug, Default)]
pub struct ProgressTable {
    inner: Mutex<Tables>,
}

impl ProgressTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        // A panic while holding the lock cannot leave a map half-updated,
        // so a poisoned guard is still consistent.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record that `item` entered `installing` and return a copy of the new record.
    pub fn start(&self, batch_id: &str, item: InstallationItem) -> ExecutionRecord {
        let record = ExecutionRecord::started(batch_id, item);
        self.lock().active.insert(record.key(), record.clone());
        record
    }

    /// Move a terminal record out of `active` into `completed` or `failed`.
    pub fn finish(&self, record: ExecutionRecord) {
        let key = record.key();
        let mut tables = self.lock();
        tables.active.remove(&key);
        match record.status {
            ExecutionStatus::Completed => {
                tables.completed.insert(key, record);
            }
            _ => {
                tables.failed.insert(key, record);
            }
        }
    }

    /// Fail an active record in place, for when its task died before finishing.
    pub fn fail_active(&self, key: &RecordKey, error: &str) -> Option<ExecutionRecord> {
        let mut tables = self.lock();
        let mut record = tables.active.remove(key)?;
        record.finish(
            ExecutionStatus::Failed,
            String::new(),
            Some(error.to_string()),
            None,
        );
        tables.failed.insert(key.clone(), record.clone());
        Some(record)
    }

    pub fn active_count(&self) -> usize {
        self.lock().active.len()
    }

    /// Copy out the table, optionally restricted to one batch.
    pub fn snapshot(&self, batch_id: Option<&str>, queue_depth: usize) -> ProgressSnapshot {
        let (active, completed, failed) = {
            let tables = self.lock();
            (
                collect(&tables.active, batch_id),
                collect(&tables.completed, batch_id),
                collect(&tables.failed, batch_id),
            )
        };

        ProgressSnapshot {
            total_active: active.len(),
            total_completed: completed.len(),
            total_failed: failed.len(),
            active,
            completed,
            failed,
            queue_depth,
        }
    }
}

fn collect(
    map: &HashMap<RecordKey, ExecutionRecord>,
    batch_id: Option<&str>,
) -> Vec<ExecutionRecord> {
    let mut records: Vec<ExecutionRecord> = map
        .values()
        .filter(|r| batch_id.is_none_or(|b| r.batch_id == b))
        .cloned()
        .collect();
    records.sort_by(|a, b| a.started_at.cmp(&b.started_at).then_with(|| a.key().cmp(&b.key())));
    records
}
