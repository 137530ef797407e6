//! Durable, append-only history of terminal installation records.
//!
//! Entries are stored as line-delimited JSON, one object per line, so new
//! entries never require rewriting old ones and a torn final line only costs
//! that single entry.

use crate::install::types::ExecutionRecord;
use crate::item::PackageManager;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Flattened projection of a finished execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub batch_id: String,
    pub item_id: String,
    pub package_name: String,
    pub package_manager: PackageManager,
    pub command: String,
    pub success: bool,
    pub duration_seconds: f64,
    pub installed_version: Option<String>,
    pub error: Option<String>,
}

impl AuditEntry {
    /// Project a terminal record, stamped with the current time.
    pub fn from_record(record: &ExecutionRecord) -> Self {
        Self {
            timestamp: Utc::now(),
            batch_id: record.batch_id.clone(),
            item_id: record.item.id.clone(),
            package_name: record.item.name.clone(),
            package_manager: record.item.package_manager,
            command: record.item.install_command.clone(),
            success: record.status.is_success(),
            duration_seconds: record.duration_seconds,
            installed_version: record.installed_version.clone(),
            error: record.error.clone(),
        }
    }
}

pub mod handle;
pub mod logger;
pub use handle::AuditHandle;
pub use logger::AuditLogger;
