use super::AuditEntry;
use crate::errors::AuditError;
use chrono::{DateTime, TimeDelta, Utc};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Line-delimited JSON audit log.
///
/// Appends are serialized in-process by a mutex and across processes by an
/// exclusive `fs2` lock, so each entry lands as one whole line. The lock is
/// taken on a sidecar `<log>.lock` file rather than the log itself: prune
/// replaces the log by rename, and a lock on the old inode would not exclude
/// a writer that opens the new one.
pub struct AuditLogger {
    path: PathBuf,
    lock_path: PathBuf,
    write_lock: Mutex<()>,
}

impl AuditLogger {
    pub fn new(path: &Path) -> Self {
        let mut lock_name = path.file_name().unwrap_or_default().to_os_string();
        lock_name.push(".lock");
        Self {
            path: path.to_path_buf(),
            lock_path: path.with_file_name(lock_name),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the sidecar lock file and lock it. The lock drops with the handle.
    fn lock_file(&self, exclusive: bool) -> Result<File, AuditError> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)
            .map_err(|e| AuditError::io(&self.lock_path, e))?;
        let locked = if exclusive {
            FileExt::lock_exclusive(&file)
        } else {
            FileExt::lock_shared(&file)
        };
        locked.map_err(|e| AuditError::io(&self.lock_path, e))?;
        Ok(file)
    }

    /// Append one entry as a single line.
    ///
    /// If a previous writer crashed mid-line, the torn line is terminated first
    /// so it cannot swallow this entry.
    pub fn append(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let _guard = self.write_lock.lock().map_err(|_| AuditError::LockPoisoned)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| AuditError::io(parent, e))?;
        }

        let lock = self.lock_file(true)?;

        // Opened only once the lock is held, so this is always the current log.
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&self.path)
            .and_then(|mut file| {
                if !ends_with_newline(&mut file)? {
                    line.insert(0, '\n');
                }
                file.write_all(line.as_bytes())?;
                file.flush()
            });

        let _ = FileExt::unlock(&lock);
        result.map_err(|e| AuditError::io(&self.path, e))
    }

    /// Read up to `limit` entries, most recent first.
    ///
    /// Lines that fail to parse are skipped.
    pub fn history(&self, limit: usize) -> Result<Vec<AuditEntry>, AuditError> {
        let mut entries = self.read_all()?;
        entries.reverse();
        entries.truncate(limit);
        Ok(entries)
    }

    /// Drop every entry older than `cutoff`, returning how many lines were removed.
    ///
    /// The surviving lines are written to a sibling temp file which then
    /// replaces the log, so a crash mid-prune leaves the old log intact.
    /// Unparseable lines are dropped as well.
    pub fn prune(&self, cutoff: DateTime<Utc>) -> Result<usize, AuditError> {
        let _guard = self.write_lock.lock().map_err(|_| AuditError::LockPoisoned)?;

        if !self.path.exists() {
            return Ok(0);
        }

        let lock = self.lock_file(true)?;

        let content = read_lossy(&self.path)?;
        let mut kept = String::new();
        let mut removed = 0;

        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str::<AuditEntry>(line) {
                Ok(entry) if entry.timestamp >= cutoff => {
                    kept.push_str(line);
                    kept.push('\n');
                }
                _ => removed += 1,
            }
        }

        let tmp_path = self.path.with_extension("prune.tmp");
        fs::write(&tmp_path, kept).map_err(|e| AuditError::io(&tmp_path, e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| AuditError::io(&self.path, e))?;

        let _ = FileExt::unlock(&lock);
        tracing::info!(removed, path = %self.path.display(), "pruned audit log");
        Ok(removed)
    }

    /// Prune entries older than `days` days.
    ///
    /// A retention reaching past the earliest representable time prunes nothing.
    pub fn prune_older_than_days(&self, days: u32) -> Result<usize, AuditError> {
        self.prune(retention_cutoff(Utc::now(), days))
    }

    fn read_all(&self) -> Result<Vec<AuditEntry>, AuditError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let lock = self.lock_file(false)?;
        let content = read_lossy(&self.path);
        let _ = FileExt::unlock(&lock);
        let content = content?;

        let mut entries = Vec::new();
        for (number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AuditEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    tracing::debug!(line = number + 1, error = %e, "skipping malformed audit line");
                }
            }
        }
        Ok(entries)
    }
}

fn retention_cutoff(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    TimeDelta::try_days(i64::from(days))
        .and_then(|age| now.checked_sub_signed(age))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn read_lossy(path: &Path) -> Result<String, AuditError> {
    let bytes = fs::read(path).map_err(|e| AuditError::io(path, e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn ends_with_newline(file: &mut File) -> std::io::Result<bool> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
