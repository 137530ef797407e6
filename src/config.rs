//! Configuration loaded from `.installkit/installkit.toml`.
//!
//! Values are layered file → environment → CLI. A missing file means defaults.
//!
//! # Configuration File Format
//!
//! ```toml
//! [engine]
//! workers = 3
//! install_timeout_secs = 300
//! version_timeout_secs = 10
//!
//! [audit]
//! log_path = "logs/installations.log"
//! retention_days = 30
//!
//! [detection]
//! include_catalog = true
//!
//! [validation]
//! max_name_length = 100
//! ```

use crate::install::{DispatchConfig, ManagerOptions};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory under the project root holding config, logs and the audit trail.
pub const CONFIG_DIR: &str = ".installkit";
pub const CONFIG_FILE: &str = "installkit.toml";
const LOG_DIR: &str = "logs";

const WORKERS_ENV: &str = "INSTALLKIT_WORKERS";
const AUDIT_LOG_ENV: &str = "INSTALLKIT_AUDIT_LOG";

/// Worker pool and timeouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSection {
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_install_timeout_secs")]
    pub install_timeout_secs: u64,
    #[serde(default = "default_version_timeout_secs")]
    pub version_timeout_secs: u64,
}

fn default_workers() -> usize {
    3
}

fn default_install_timeout_secs() -> u64 {
    300
}

fn default_version_timeout_secs() -> u64 {
    10
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            install_timeout_secs: default_install_timeout_secs(),
            version_timeout_secs: default_version_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditSection {
    /// Relative paths resolve against the `.installkit` directory.
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

fn default_log_path() -> PathBuf {
    PathBuf::from("logs/installations.log")
}

fn default_retention_days() -> u32 {
    30
}

impl Default for AuditSection {
    fn default() -> Self {
        Self {
            log_path: default_log_path(),
            retention_days: default_retention_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionSection {
    /// Append well-known MCP servers to every detection result.
    #[serde(default = "default_include_catalog")]
    pub include_catalog: bool,
}

fn default_include_catalog() -> bool {
    true
}

impl Default for DetectionSection {
    fn default() -> Self {
        Self {
            include_catalog: default_include_catalog(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSection {
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
}

fn default_max_name_length() -> usize {
    crate::validate::DEFAULT_MAX_NAME_LENGTH
}

impl Default for ValidationSection {
    fn default() -> Self {
        Self {
            max_name_length: default_max_name_length(),
        }
    }
}

/// The complete installkit.toml structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstallToml {
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default)]
    pub audit: AuditSection,
    #[serde(default)]
    pub detection: DetectionSection,
    #[serde(default)]
    pub validation: ValidationSection,
}

impl InstallToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse installkit.toml")
    }

    /// Load `installkit.toml` from `config_dir`, or defaults if it doesn't exist.
    pub fn load_or_default(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize installkit.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.engine.workers == 0 {
            warnings.push("engine.workers is 0; one worker will be used".to_string());
        }
        if self.engine.install_timeout_secs == 0 {
            warnings.push(
                "engine.install_timeout_secs is 0; every install will time out".to_string(),
            );
        }
        if self.engine.version_timeout_secs == 0 {
            warnings.push(
                "engine.version_timeout_secs is 0; versions will only be read from install output"
                    .to_string(),
            );
        }
        if self.audit.retention_days == 0 {
            warnings.push("audit.retention_days is 0; prune will remove every entry".to_string());
        }
        if self.validation.max_name_length == 0 {
            warnings.push(
                "validation.max_name_length is 0; every package name will be emptied".to_string(),
            );
        }

        warnings
    }

    /// Worker count, with `INSTALLKIT_WORKERS` overriding the file.
    pub fn workers(&self) -> usize {
        workers_from(std::env::var(WORKERS_ENV).ok().as_deref(), self.engine.workers)
    }
}

fn workers_from(env_val: Option<&str>, file_val: usize) -> usize {
    match env_val.map(|v| v.trim().parse::<usize>()) {
        Some(Ok(n)) => n,
        Some(Err(_)) => {
            tracing::warn!(var = WORKERS_ENV, "ignoring non-numeric worker count");
            file_val
        }
        None => file_val,
    }
}

/// Resolved configuration for one project.
#[derive(Debug, Clone)]
pub struct InstallConfig {
    pub project_dir: PathBuf,
    /// The `.installkit` directory
    pub config_dir: PathBuf,
    pub toml: InstallToml,
    /// CLI override for the worker count
    pub cli_workers: Option<usize>,
}

impl InstallConfig {
    /// Load the configuration for a project directory.
    pub fn new(project_dir: PathBuf) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;
        let config_dir = project_dir.join(CONFIG_DIR);
        let toml = InstallToml::load_or_default(&config_dir)?;

        Ok(Self {
            project_dir,
            config_dir,
            toml,
            cli_workers: None,
        })
    }

    /// Load the configuration with CLI overrides applied.
    pub fn with_cli_args(project_dir: PathBuf, workers: Option<usize>) -> Result<Self> {
        let mut config = Self::new(project_dir)?;
        config.cli_workers = workers;
        Ok(config)
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    /// Directory for the rolling diagnostic log. Needed before the
    /// configuration is loaded, so it only depends on the project directory.
    pub fn log_dir(project_dir: &Path) -> PathBuf {
        project_dir.join(CONFIG_DIR).join(LOG_DIR)
    }

    /// Worker count (CLI → env → file).
    pub fn workers(&self) -> usize {
        self.cli_workers.unwrap_or_else(|| self.toml.workers())
    }

    /// Audit log location (env → file), relative paths resolved against `.installkit`.
    pub fn audit_log_path(&self) -> PathBuf {
        let env_path = std::env::var_os(AUDIT_LOG_ENV).map(PathBuf::from);
        resolve_audit_path(&self.config_dir, env_path, &self.toml.audit.log_path)
    }

    pub fn retention_days(&self) -> u32 {
        self.toml.audit.retention_days
    }

    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig::default()
            .with_workers(self.workers())
            .with_install_timeout(Duration::from_secs(self.toml.engine.install_timeout_secs))
            .with_version_timeout(Duration::from_secs(self.toml.engine.version_timeout_secs))
    }

    /// Options for building an `InstallationManager`.
    pub fn manager_options(&self) -> ManagerOptions {
        ManagerOptions {
            dispatch: self.dispatch_config(),
            audit_log: self.audit_log_path(),
            include_catalog: self.toml.detection.include_catalog,
            max_name_length: self.toml.validation.max_name_length,
        }
    }

    /// Validate configuration and return warnings.
    pub fn validate(&self) -> Vec<String> {
        self.toml.validate()
    }
}

fn resolve_audit_path(config_dir: &Path, env_path: Option<PathBuf>, file_path: &Path) -> PathBuf {
    let path = env_path.unwrap_or_else(|| file_path.to_path_buf());
    if path.is_absolute() {
        path
    } else {
        config_dir.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_empty_uses_defaults() {
        let toml = InstallToml::parse("").unwrap();
        assert_eq!(toml.engine.workers, 3);
        assert_eq!(toml.engine.install_timeout_secs, 300);
        assert_eq!(toml.engine.version_timeout_secs, 10);
        assert_eq!(toml.audit.log_path, PathBuf::from("logs/installations.log"));
        assert_eq!(toml.audit.retention_days, 30);
        assert!(toml.detection.include_catalog);
        assert_eq!(toml.validation.max_name_length, 100);
        assert!(toml.validate().is_empty());
    }

    #[test]
    fn test_parse_partial_sections() {
        let content = r#"
[engine]
workers = 8

[detection]
include_catalog = false
"#;
        let toml = InstallToml::parse(content).unwrap();
        assert_eq!(toml.engine.workers, 8);
        assert_eq!(toml.engine.install_timeout_secs, 300);
        assert!(!toml.detection.include_catalog);
    }

    #[test]
    fn test_parse_invalid_toml_fails() {
        let err = InstallToml::parse("[engine\nworkers = ").unwrap_err();
        assert!(err.to_string().contains("installkit.toml"));
    }

    #[test]
    fn test_validate_reports_zero_values() {
        let content = r#"
[engine]
workers = 0
install_timeout_secs = 0
"#;
        let warnings = InstallToml::parse(content).unwrap().validate();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("workers"));
        assert!(warnings[1].contains("install_timeout_secs"));
    }

    #[test]
    fn test_workers_env_override() {
        assert_eq!(workers_from(Some("6"), 3), 6);
        assert_eq!(workers_from(Some(" 2 "), 3), 2);
        assert_eq!(workers_from(Some("many"), 3), 3);
        assert_eq!(workers_from(None, 3), 3);
    }

    #[test]
    fn test_resolve_audit_path() {
        let dir = Path::new("/proj/.installkit");
        assert_eq!(
            resolve_audit_path(dir, None, Path::new("logs/installations.log")),
            PathBuf::from("/proj/.installkit/logs/installations.log")
        );
        assert_eq!(
            resolve_audit_path(dir, Some(PathBuf::from("/var/log/a.log")), Path::new("x")),
            PathBuf::from("/var/log/a.log")
        );
    }

    #[test]
    fn test_save_and_load_round_trip_through_project() {
        let dir = TempDir::new().unwrap();
        let config_dir = dir.path().join(CONFIG_DIR);
        std::fs::create_dir_all(&config_dir).unwrap();

        let mut toml = InstallToml::default();
        toml.audit.retention_days = 7;
        toml.save(&config_dir.join(CONFIG_FILE)).unwrap();

        let config = InstallConfig::with_cli_args(dir.path().to_path_buf(), Some(5)).unwrap();
        assert_eq!(config.retention_days(), 7);
        assert_eq!(config.workers(), 5);
        assert_eq!(config.dispatch_config().workers, 5);
        assert!(config.config_file().ends_with(".installkit/installkit.toml"));
    }

    #[test]
    fn test_log_dir_sits_under_config_dir() {
        assert_eq!(
            InstallConfig::log_dir(Path::new("/work/proj")),
            Path::new("/work/proj/.installkit/logs")
        );
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = InstallConfig::new(dir.path().to_path_buf()).unwrap();
        let options = config.manager_options();
        assert!(options.include_catalog);
        assert_eq!(options.max_name_length, 100);
        assert_eq!(options.dispatch.install_timeout, Duration::from_secs(300));
    }
}
