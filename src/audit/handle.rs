//! Async access to the audit log.
//!
//! `AuditLogger` does plain file I/O and may block on a cross-process lock, so
//! async callers go through [`AuditHandle`], which runs each operation on
//! tokio's blocking pool.

use super::{AuditEntry, AuditLogger};
use crate::errors::AuditError;
use std::path::Path;
use std::sync::Arc;

#[derive(Clone)]
pub struct AuditHandle {
    inner: Arc<AuditLogger>,
}

impl AuditHandle {
    pub fn new(logger: AuditLogger) -> Self {
        Self {
            inner: Arc::new(logger),
        }
    }

    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Run a closure against the logger on a blocking thread.
    pub async fn call<F, R>(&self, f: F) -> Result<R, AuditError>
    where
        F: FnOnce(&AuditLogger) -> Result<R, AuditError> + Send + 'static,
        R: Send + 'static,
    {
        let logger = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || f(&logger))
            .await
            .map_err(|e| AuditError::TaskPanicked(e.to_string()))?
    }

    pub async fn append(&self, entry: AuditEntry) -> Result<(), AuditError> {
        self.call(move |logger| logger.append(&entry)).await
    }

    pub async fn history(&self, limit: usize) -> Result<Vec<AuditEntry>, AuditError> {
        self.call(move |logger| logger.history(limit)).await
    }

    pub async fn prune_older_than_days(&self, days: u32) -> Result<usize, AuditError> {
        self.call(move |logger| logger.prune_older_than_days(days)).await
    }
}
