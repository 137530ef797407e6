//! Policy check command (`installkit validate`).

use anyhow::Result;
use std::path::Path;

use installkit::config::InstallConfig;
use installkit::validate::CommandValidator;

pub fn cmd_validate(project_dir: &Path, command: &str) -> Result<()> {
    let config = InstallConfig::new(project_dir.to_path_buf())?;
    let validator = CommandValidator::new(config.toml.validation.max_name_length);

    let validation = validator.validate(command);
    if validation.ok {
        println!("{} {}", console::style("Allowed:").green().bold(), command);
        Ok(())
    } else {
        anyhow::bail!(
            "Rejected: {}",
            validation.reason.unwrap_or_else(|| "unknown reason".to_string())
        )
    }
}
