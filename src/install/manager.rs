//! The boundary object collaborators talk to.
//!
//! `InstallationManager` owns the extractor, validator, work queue, progress
//! table, audit log and worker pool. Nothing here is global: construct one per
//! engine and pass it by reference.

use super::dispatcher::{DispatchConfig, Dispatcher, WorkerContext};
use super::progress::{ProgressSnapshot, ProgressTable};
use super::queue::WorkQueue;
use super::runner::{ProcessRunner, TokioProcessRunner};
use super::types::{InstallEvent, QueueOutcome};
use crate::audit::{AuditEntry, AuditHandle, AuditLogger};
use crate::detect::{Extractor, FeedUpdate};
use crate::errors::AuditError;
use crate::item::InstallationItem;
use crate::validate::{CommandValidator, DEFAULT_MAX_NAME_LENGTH};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 256;
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Everything needed to assemble a manager.
#[derive(Debug, Clone)]
pub struct ManagerOptions {
    pub dispatch: DispatchConfig,
    pub audit_log: PathBuf,
    pub include_catalog: bool,
    pub max_name_length: usize,
}

impl ManagerOptions {
    /// Defaults with the audit log at `audit_log`.
    pub fn new(audit_log: impl Into<PathBuf>) -> Self {
        Self {
            dispatch: DispatchConfig::default(),
            audit_log: audit_log.into(),
            include_catalog: true,
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
        }
    }
}

pub struct InstallationManager {
    extractor: Extractor,
    validator: CommandValidator,
    queue: WorkQueue,
    progress: Arc<ProgressTable>,
    audit: AuditHandle,
    events: broadcast::Sender<InstallEvent>,
    dispatcher: Dispatcher,
}

impl InstallationManager {
    /// Start a manager that runs real processes.
    ///
    /// Must be called from within a tokio runtime; the worker pool starts immediately.
    pub fn start(options: ManagerOptions) -> Self {
        Self::with_runner(options, Arc::new(TokioProcessRunner::new()))
    }

    /// Start a manager with a custom process runner.
    pub fn with_runner(options: ManagerOptions, runner: Arc<dyn ProcessRunner>) -> Self {
        let progress = Arc::new(ProgressTable::new());
        let audit = AuditHandle::new(AuditLogger::new(&options.audit_log));
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let queue = WorkQueue::new();

        let ctx = Arc::new(WorkerContext {
            runner,
            progress: Arc::clone(&progress),
            audit: audit.clone(),
            events: events.clone(),
            config: options.dispatch.clone(),
        });
        let dispatcher = Dispatcher::start(ctx, queue.receiver());

        tracing::info!(
            workers = dispatcher.worker_count(),
            audit_log = %audit.path().display(),
            "installation manager started"
        );

        Self {
            extractor: Extractor::new(options.include_catalog),
            validator: CommandValidator::new(options.max_name_length),
            queue,
            progress,
            audit,
            events,
            dispatcher,
        }
    }

    /// Mine feed updates for installable items.
    pub fn detect(&self, updates: &[FeedUpdate]) -> Vec<InstallationItem> {
        self.extractor.extract(updates)
    }

    /// Validate `items` and enqueue the ones that pass.
    ///
    /// Rejected items are reported as `"{name}: {reason}"`. The batch id is
    /// `None` when nothing passed validation.
    pub fn queue(&self, items: Vec<InstallationItem>) -> QueueOutcome {
        let mut accepted = Vec::with_capacity(items.len());
        let mut rejected = Vec::new();

        for mut item in items {
            let validation = self.validator.validate(&item.install_command);
            if validation.ok {
                item.name = self.validator.sanitize(&item.name);
                accepted.push(item);
            } else {
                let reason = validation.reason.unwrap_or_default();
                tracing::warn!(package = %item.name, reason = %reason, "rejected installation");
                rejected.push(format!("{}: {}", item.name, reason));
            }
        }

        if accepted.is_empty() {
            return QueueOutcome {
                batch_id: None,
                rejected,
            };
        }

        let count = accepted.len();
        let batch_id = self.queue.submit(accepted);
        tracing::info!(batch_id = %batch_id, items = count, "queued installations");
        self.events
            .send(InstallEvent::Queued {
                batch_id: batch_id.clone(),
                items: count,
            })
            .ok();

        QueueOutcome {
            batch_id: Some(batch_id),
            rejected,
        }
    }

    /// Snapshot of progress, optionally restricted to one batch.
    pub fn progress(&self, batch_id: Option<&str>) -> ProgressSnapshot {
        self.progress.snapshot(batch_id, self.queue.depth())
    }

    /// Most recent audit entries first.
    pub async fn history(&self, limit: usize) -> Result<Vec<AuditEntry>, AuditError> {
        self.audit.history(limit).await
    }

    /// Drop audit entries older than `retention_days`. Returns how many were removed.
    pub async fn prune(&self, retention_days: u32) -> Result<usize, AuditError> {
        self.audit.prune_older_than_days(retention_days).await
    }

    /// Receive lifecycle events for every batch submitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<InstallEvent> {
        self.events.subscribe()
    }

    /// Resolve once every submitted item has reached a terminal state.
    pub async fn wait_idle(&self) {
        while self.queue.outstanding() > 0 {
            tokio::time::sleep(IDLE_POLL_INTERVAL).await;
        }
    }

    /// Stop dequeuing and wait for in-flight installs to finish.
    pub async fn shutdown(self) {
        self.dispatcher.shutdown().await;
        tracing::info!(
            pending = self.queue.depth(),
            "installation manager stopped"
        );
    }
}
