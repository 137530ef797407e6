//! Configuration view and validation commands (`installkit config`).

use anyhow::{Context, Result};
use std::path::Path;

use installkit::config::{CONFIG_DIR, CONFIG_FILE, InstallConfig, InstallToml};

use super::super::ConfigCommands;

pub fn cmd_config(project_dir: &Path, command: Option<ConfigCommands>) -> Result<()> {
    let config_dir = project_dir.join(CONFIG_DIR);
    let config_path = config_dir.join(CONFIG_FILE);

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Installkit Configuration");
            println!("========================");
            println!();

            let toml = if config_path.exists() {
                println!("Config file: {}", config_path.display());
                InstallToml::load(&config_path)?
            } else {
                println!("No installkit.toml found at {}", config_path.display());
                println!("Using default configuration.");
                InstallToml::default()
            };
            println!();

            println!("[engine]");
            println!("  workers = {}", toml.engine.workers);
            println!("  install_timeout_secs = {}", toml.engine.install_timeout_secs);
            println!("  version_timeout_secs = {}", toml.engine.version_timeout_secs);
            println!();
            println!("[audit]");
            println!("  log_path = \"{}\"", toml.audit.log_path.display());
            println!("  retention_days = {}", toml.audit.retention_days);
            println!();
            println!("[detection]");
            println!("  include_catalog = {}", toml.detection.include_catalog);
            println!();
            println!("[validation]");
            println!("  max_name_length = {}", toml.validation.max_name_length);
            println!();

            // Show effective values (including env overrides)
            let config = InstallConfig::new(project_dir.to_path_buf())?;
            println!("Effective values (with env overrides):");
            println!("  workers = {}", config.workers());
            println!("  audit log = {}", config.audit_log_path().display());
            println!();
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No installkit.toml found. Using defaults (valid).");
                return Ok(());
            }

            let warnings = InstallToml::load(&config_path)?.validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("installkit.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            std::fs::create_dir_all(&config_dir).with_context(|| {
                format!("Failed to create config directory: {}", config_dir.display())
            })?;
            InstallToml::default().save(&config_path)?;

            println!("Created installkit.toml at {}", config_path.display());
        }
    }

    Ok(())
}
