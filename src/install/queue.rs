//! Unbounded work queue feeding the dispatcher.
//!
//! Submission is synchronous and never waits on execution. Workers share one
//! receiver; the queue tracks how many jobs are waiting and how many are still
//! outstanding (waiting or running) so callers can tell when it has drained.

use crate::item::InstallationItem;
use chrono::{SecondsFormat, Utc};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::{Mutex, mpsc};

/// One unit of work: an item tagged with the batch it was submitted in.
#[derive(Debug, Clone)]
pub struct Job {
    pub batch_id: String,
    pub item: InstallationItem,
}

#[derive(Debug, Default)]
struct Counters {
    waiting: AtomicUsize,
    outstanding: AtomicUsize,
}

/// Producer side of the queue, owned by the manager.
pub struct WorkQueue {
    tx: mpsc::UnboundedSender<Job>,
    receiver: JobReceiver,
    counters: Arc<Counters>,
    sequence: AtomicU64,
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let counters = Arc::new(Counters::default());
        Self {
            tx,
            receiver: JobReceiver {
                rx: Arc::new(Mutex::new(rx)),
                counters: Arc::clone(&counters),
            },
            counters,
            sequence: AtomicU64::new(0),
        }
    }

    /// Enqueue `items` under a fresh batch id and return it.
    pub fn submit(&self, items: Vec<InstallationItem>) -> String {
        let batch_id = self.next_batch_id();

        for item in items {
            self.counters.waiting.fetch_add(1, Ordering::SeqCst);
            self.counters.outstanding.fetch_add(1, Ordering::SeqCst);
            let job = Job {
                batch_id: batch_id.clone(),
                item,
            };
            if let Err(mpsc::error::SendError(job)) = self.tx.send(job) {
                self.counters.waiting.fetch_sub(1, Ordering::SeqCst);
                self.counters.outstanding.fetch_sub(1, Ordering::SeqCst);
                tracing::warn!(batch_id = %job.batch_id, item_id = %job.item.id, "queue closed, dropping job");
            }
        }

        batch_id
    }

    /// Jobs submitted but not yet picked up by a worker.
    pub fn depth(&self) -> usize {
        self.counters.waiting.load(Ordering::SeqCst)
    }

    /// Jobs submitted but not yet finished.
    pub fn outstanding(&self) -> usize {
        self.counters.outstanding.load(Ordering::SeqCst)
    }

    /// Consumer handle for workers.
    pub fn receiver(&self) -> JobReceiver {
        self.receiver.clone()
    }

    /// Batch ids are derived from the submission time plus a sequence number,
    /// so two submissions in the same instant still differ.
    fn next_batch_id(&self) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let mut hasher = Sha256::new();
        hasher.update(Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true).as_bytes());
        hasher.update(seq.to_le_bytes());
        format!("{:x}", hasher.finalize())[..12].to_string()
    }
}

/// Shared consumer side of the queue.
#[derive(Clone)]
pub struct JobReceiver {
    rx: Arc<Mutex<mpsc::UnboundedReceiver<Job>>>,
    counters: Arc<Counters>,
}

impl JobReceiver {
    /// Wait for the next job. Cancel-safe: dropping the future loses nothing.
    pub async fn recv(&self) -> Option<Job> {
        let job = self.rx.lock().await.recv().await;
        if job.is_some() {
            self.counters.waiting.fetch_sub(1, Ordering::SeqCst);
        }
        job
    }

    /// Mark a previously received job as finished.
    pub fn done(&self) {
        self.counters.outstanding.fetch_sub(1, Ordering::SeqCst);
    }
}
