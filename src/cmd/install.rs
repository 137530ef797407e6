//! Detect-and-install command (`installkit install`).

use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::broadcast::error::RecvError;

use installkit::config::InstallConfig;
use installkit::install::{InstallEvent, InstallationManager};
use installkit::item::InstallationItem;

use super::detect::{load_updates, print_items};

pub async fn cmd_install(
    project_dir: &Path,
    input: &Path,
    selected: &[String],
    all: bool,
    workers: Option<usize>,
) -> Result<()> {
    let config = InstallConfig::with_cli_args(project_dir.to_path_buf(), workers)?;
    for warning in config.validate() {
        println!("{} {}", console::style("Config warning:").yellow(), warning);
    }

    let updates = load_updates(input)?;
    let manager = InstallationManager::start(config.manager_options());
    let detected = manager.detect(&updates);

    let items = match select_items(detected, selected, all) {
        Ok(items) => items,
        Err(e) => {
            manager.shutdown().await;
            return Err(e);
        }
    };

    let names: HashMap<String, String> = items
        .iter()
        .map(|item| (item.id.clone(), item.name.clone()))
        .collect();

    let mut events = manager.subscribe();
    let outcome = manager.queue(items);

    println!();
    for rejection in &outcome.rejected {
        println!("{} {}", console::style("Rejected:").red().bold(), rejection);
    }

    let Some(batch_id) = outcome.batch_id else {
        manager.shutdown().await;
        anyhow::bail!("No items passed validation");
    };

    println!(
        "Batch {} queued ({} workers)",
        console::style(&batch_id).bold(),
        config.workers().max(1)
    );

    loop {
        tokio::select! {
            _ = manager.wait_idle() => break,
            event = events.recv() => match event {
                Ok(event) => print_event(&event, &names),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            },
        }
    }
    while let Ok(event) = events.try_recv() {
        print_event(&event, &names);
    }

    let snapshot = manager.progress(Some(&batch_id));
    manager.shutdown().await;

    println!();
    for record in &snapshot.completed {
        println!(
            "  {} {} {} ({:.1}s)",
            console::style("✓").green(),
            record.item.name,
            record.installed_version.as_deref().unwrap_or(""),
            record.duration_seconds
        );
    }
    for record in &snapshot.failed {
        println!(
            "  {} {}: {}",
            console::style("✗").red(),
            record.item.name,
            record.error.as_deref().unwrap_or("unknown error")
        );
    }
    println!();

    if snapshot.total_failed > 0 {
        anyhow::bail!(
            "{} of {} installations failed",
            snapshot.total_failed,
            snapshot.total_failed + snapshot.total_completed
        );
    }
    println!("All {} installations completed.", snapshot.total_completed);
    Ok(())
}

/// Pick the items to install from what was detected.
fn select_items(
    detected: Vec<InstallationItem>,
    selected: &[String],
    all: bool,
) -> Result<Vec<InstallationItem>> {
    if detected.is_empty() {
        anyhow::bail!("No installable packages found in input");
    }
    if all {
        return Ok(detected);
    }
    if selected.is_empty() {
        println!();
        print_items(&detected);
        println!();
        anyhow::bail!("Select items with --item <ID> or pass --all");
    }

    if let Some(unknown) = selected
        .iter()
        .find(|id| !detected.iter().any(|item| &item.id == *id))
    {
        anyhow::bail!("No detected item with id '{}'", unknown);
    }

    Ok(detected
        .into_iter()
        .filter(|item| selected.contains(&item.id))
        .collect())
}

fn print_event(event: &InstallEvent, names: &HashMap<String, String>) {
    let name = |id: &str| names.get(id).cloned().unwrap_or_else(|| id.to_string());
    match event {
        InstallEvent::Queued { .. } => {}
        InstallEvent::Started { item_id, .. } => {
            println!("  {} {}", console::style("→").cyan(), name(item_id));
        }
        InstallEvent::Finished {
            item_id, success, ..
        } => {
            let mark = if *success {
                console::style("done").green()
            } else {
                console::style("failed").red()
            };
            println!("  {} {}", mark, name(item_id));
        }
    }
}
