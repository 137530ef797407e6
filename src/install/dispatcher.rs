//! Fixed-size worker pool draining the work queue.
//!
//! Each worker loops: dequeue → mark installing → run → discover version →
//! append audit entry → move to completed/failed. A worker finishes its
//! current item before looking at the queue again, so at most `workers`
//! items are ever `installing` at once.

use super::progress::ProgressTable;
use super::queue::{Job, JobReceiver};
use super::runner::ProcessRunner;
use super::types::{ExecutionStatus, InstallEvent, RecordKey};
use super::version::discover_version;
use crate::audit::{AuditEntry, AuditHandle};
use crate::errors::RunError;
use crate::item::InstallationItem;
use crate::validate::split_command;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

/// Default number of concurrent installations.
pub const DEFAULT_WORKERS: usize = 3;
/// Default wall-clock limit for one install.
pub const DEFAULT_INSTALL_TIMEOUT: Duration = Duration::from_secs(300);
/// Default wall-clock limit for the post-install version query.
pub const DEFAULT_VERSION_TIMEOUT: Duration = Duration::from_secs(10);

/// Tuning for the worker pool.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub workers: usize,
    pub install_timeout: Duration,
    pub version_timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            install_timeout: DEFAULT_INSTALL_TIMEOUT,
            version_timeout: DEFAULT_VERSION_TIMEOUT,
        }
    }
}

impl DispatchConfig {
    /// Create a config with a specific pool size.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the per-install timeout.
    pub fn with_install_timeout(mut self, timeout: Duration) -> Self {
        self.install_timeout = timeout;
        self
    }

    /// Set the version query timeout.
    pub fn with_version_timeout(mut self, timeout: Duration) -> Self {
        self.version_timeout = timeout;
        self
    }
}

/// Everything a worker needs, shared across the pool.
pub(crate) struct WorkerContext {
    pub runner: Arc<dyn ProcessRunner>,
    pub progress: Arc<ProgressTable>,
    pub audit: AuditHandle,
    pub events: broadcast::Sender<InstallEvent>,
    pub config: DispatchConfig,
}

/// Handle to the running worker pool.
pub struct Dispatcher {
    shutdown_tx: watch::Sender<bool>,
    workers: Vec<JoinHandle<()>>,
}

impl Dispatcher {
    /// Spawn the pool. Must be called from within a tokio runtime.
    pub(crate) fn start(ctx: Arc<WorkerContext>, receiver: JobReceiver) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let count = ctx.config.workers.max(1);

        let workers = (0..count)
            .map(|worker| {
                tokio::spawn(worker_loop(
                    worker,
                    Arc::clone(&ctx),
                    receiver.clone(),
                    shutdown_rx.clone(),
                ))
            })
            .collect();

        tracing::debug!(workers = count, "dispatcher started");
        Self {
            shutdown_tx,
            workers,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Stop taking new jobs and wait for in-flight items to finish.
    pub async fn shutdown(self) {
        self.shutdown_tx.send(true).ok();
        for handle in self.workers {
            handle.await.ok();
        }
        tracing::debug!("dispatcher stopped");
    }
}

async fn worker_loop(
    worker: usize,
    ctx: Arc<WorkerContext>,
    receiver: JobReceiver,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        if *shutdown.borrow() {
            break;
        }

        let job = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            job = receiver.recv() => match job {
                Some(job) => job,
                None => break,
            },
        };

        let key = RecordKey::new(&job.batch_id, &job.item.id);
        let task_ctx = Arc::clone(&ctx);

        // Run the item on its own task so a panic is contained to that item.
        if let Err(e) = tokio::spawn(async move { process_job(&task_ctx, job).await }).await {
            let message = format!("Installation task panicked: {}", e);
            tracing::error!(worker, batch_id = %key.batch_id, item_id = %key.item_id, "{}", message);
            if let Some(record) = ctx.progress.fail_active(&key, &message) {
                if let Err(e) = ctx.audit.append(AuditEntry::from_record(&record)).await {
                    tracing::error!(error = %e, "failed to write audit entry");
                }
                ctx.events
                    .send(InstallEvent::Finished {
                        batch_id: key.batch_id.clone(),
                        item_id: key.item_id.clone(),
                        success: false,
                    })
                    .ok();
            }
        }

        receiver.done();
    }

    tracing::debug!(worker, "worker exiting");
}

/// Outcome of running one install command.
struct Outcome {
    status: ExecutionStatus,
    output: String,
    error: Option<String>,
    installed_version: Option<String>,
}

impl Outcome {
    fn failed(error: impl Into<String>, output: String) -> Self {
        Self {
            status: ExecutionStatus::Failed,
            output,
            error: Some(error.into()),
            installed_version: None,
        }
    }
}

async fn process_job(ctx: &WorkerContext, job: Job) {
    let Job { batch_id, item } = job;
    let mut record = ctx.progress.start(&batch_id, item);
    ctx.events
        .send(InstallEvent::Started {
            batch_id: batch_id.clone(),
            item_id: record.item.id.clone(),
        })
        .ok();

    tracing::info!(
        batch_id = %batch_id,
        item_id = %record.item.id,
        package = %record.item.name,
        manager = %record.item.package_manager,
        "starting installation"
    );

    let outcome = execute(ctx, &record.item).await;
    record.finish(
        outcome.status,
        outcome.output,
        outcome.error,
        outcome.installed_version,
    );

    if record.status.is_success() {
        tracing::info!(
            batch_id = %batch_id,
            item_id = %record.item.id,
            package = %record.item.name,
            duration_secs = record.duration_seconds,
            version = record.installed_version.as_deref().unwrap_or("unknown"),
            "installation completed"
        );
    } else {
        tracing::error!(
            batch_id = %batch_id,
            item_id = %record.item.id,
            package = %record.item.name,
            error = record.error.as_deref().unwrap_or(""),
            "installation failed"
        );
    }

    // An audit failure is a durability gap, not a reason to leave the record active.
    if let Err(e) = ctx.audit.append(AuditEntry::from_record(&record)).await {
        tracing::error!(
            batch_id = %batch_id,
            item_id = %record.item.id,
            error = %e,
            "failed to write audit entry"
        );
    }

    let finished = InstallEvent::Finished {
        batch_id,
        item_id: record.item.id.clone(),
        success: record.status.is_success(),
    };
    ctx.progress.finish(record);
    ctx.events.send(finished).ok();
}

async fn execute(ctx: &WorkerContext, item: &InstallationItem) -> Outcome {
    let argv = match split_command(&item.install_command) {
        Ok(argv) if !argv.is_empty() => argv,
        Ok(_) => return Outcome::failed("Empty command", String::new()),
        Err(e) => return Outcome::failed(format!("Invalid install command: {}", e), String::new()),
    };

    match ctx.runner.run(&argv, ctx.config.install_timeout).await {
        Ok(output) if output.success() => {
            let installed_version = discover_version(
                ctx.runner.as_ref(),
                item,
                &output.stdout,
                ctx.config.version_timeout,
            )
            .await;
            Outcome {
                status: ExecutionStatus::Completed,
                output: output.stdout,
                error: None,
                installed_version,
            }
        }
        Ok(output) => {
            let mut error = match output.exit_code {
                Some(code) => format!("Installation exited with code {}", code),
                None => "Installation terminated by signal".to_string(),
            };
            let stderr = output.stderr.trim();
            if !stderr.is_empty() {
                error.push_str(": ");
                error.push_str(stderr);
            }
            Outcome::failed(error, output.stdout)
        }
        Err(RunError::TimedOut { timeout, .. }) => Outcome::failed(
            format!("Installation timed out after {}s", timeout.as_secs()),
            String::new(),
        ),
        Err(e) => Outcome::failed(e.to_string(), String::new()),
    }
}
