//! Feed scanning command (`installkit detect`).

use anyhow::{Context, Result};
use std::path::Path;

use installkit::config::InstallConfig;
use installkit::detect::{self, Extractor, FeedUpdate};
use installkit::item::InstallationItem;

/// Read a JSON array of feed updates. Malformed records are skipped.
pub fn load_updates(input: &Path) -> Result<Vec<FeedUpdate>> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;
    detect::parse_updates(&content)
        .with_context(|| format!("Failed to parse feed updates from {}", input.display()))
}

pub fn cmd_detect(project_dir: &Path, input: &Path, json: bool) -> Result<()> {
    let config = InstallConfig::new(project_dir.to_path_buf())?;
    let updates = load_updates(input)?;
    let items = Extractor::new(config.toml.detection.include_catalog).extract(&updates);

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    println!();
    if items.is_empty() {
        println!("No installable packages found in {} updates.", updates.len());
        println!();
        return Ok(());
    }

    print_items(&items);
    println!();
    println!(
        "{} items detected from {} updates.",
        items.len(),
        updates.len()
    );
    println!();
    Ok(())
}

pub fn print_items(items: &[InstallationItem]) {
    println!(
        "{:<13} {:<6} {:<40} {:<18} Command",
        "ID", "Via", "Package", "Category"
    );
    println!(
        "{:<13} {:<6} {:<40} {:<18} -------",
        "------------", "-----", "-------", "--------"
    );
    for item in items {
        println!(
            "{:<13} {:<6} {:<40} {:<18} {}",
            item.id,
            item.package_manager,
            item.name,
            item.category,
            console::style(&item.install_command).dim()
        );
    }
}
