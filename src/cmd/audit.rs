//! Audit log commands (`installkit history` and `installkit prune`).

use anyhow::{Context, Result};
use std::path::Path;

use installkit::audit::AuditLogger;
use installkit::config::InstallConfig;

pub fn cmd_history(project_dir: &Path, limit: usize, json: bool) -> Result<()> {
    let config = InstallConfig::new(project_dir.to_path_buf())?;
    let logger = AuditLogger::new(&config.audit_log_path());
    let entries = logger.history(limit).context("Failed to read audit log")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!();
    if entries.is_empty() {
        println!("No installations recorded yet.");
        println!();
        return Ok(());
    }

    println!(
        "{:<20} {:<6} {:<6} {:<32} {:<12} {:>9}",
        "Time", "Result", "Via", "Package", "Version", "Duration"
    );
    for entry in &entries {
        let result = if entry.success {
            console::style("ok").green()
        } else {
            console::style("FAIL").red()
        };
        println!(
            "{:<20} {:<6} {:<6} {:<32} {:<12} {:>8.1}s",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            result,
            entry.package_manager,
            entry.package_name,
            entry.installed_version.as_deref().unwrap_or("-"),
            entry.duration_seconds
        );
        if let Some(error) = &entry.error {
            println!("    {}", console::style(error).dim());
        }
    }
    println!();
    Ok(())
}

pub fn cmd_prune(project_dir: &Path, days: Option<u32>) -> Result<()> {
    let config = InstallConfig::new(project_dir.to_path_buf())?;
    let days = days.unwrap_or_else(|| config.retention_days());
    let logger = AuditLogger::new(&config.audit_log_path());

    let removed = logger
        .prune_older_than_days(days)
        .context("Failed to prune audit log")?;
    println!(
        "Removed {} audit entries older than {} days.",
        removed, days
    );
    Ok(())
}
