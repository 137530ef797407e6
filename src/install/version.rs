//! Best-effort discovery of the version an install produced.
//!
//! A manager-specific query wins; scanning the install output is the fallback.
//! Failing to find a version is never an error.

use super::runner::ProcessRunner;
use crate::item::{InstallationItem, PackageManager};
use crate::validate::split_command;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

static SEMVER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+\.\d+\.\d+)").unwrap());

static OUTPUT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"(?i)version[:\s]+(\d+\.\d+\.\d+)", r"(?i)v(\d+\.\d+\.\d+)", r"(\d+\.\d+\.\d+)"]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
});

/// A command that reports the installed version, and how to read its stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionQuery {
    pub argv: Vec<String>,
    /// When set, only `package@X.Y.Z` in stdout counts.
    pub package: Option<String>,
}

impl VersionQuery {
    fn parse(&self, stdout: &str) -> Option<String> {
        match &self.package {
            Some(package) => pinned_version(package, stdout),
            None => first_capture(&SEMVER, stdout),
        }
    }
}

/// The query that reports the installed version, if the manager has one.
///
/// npm items whose install target is not a binary of the same name (scoped
/// packages, catalog servers) are looked up with `npm ls -g` instead.
pub fn version_command(item: &InstallationItem) -> Option<VersionQuery> {
    let name = item.name.clone();
    let argv = match item.package_manager {
        PackageManager::Npm => match npm_install_target(item) {
            Some(target) if target != name || target.starts_with('@') => {
                return Some(VersionQuery {
                    argv: vec![
                        "npm".to_string(),
                        "ls".to_string(),
                        "-g".to_string(),
                        target.clone(),
                        "--depth=0".to_string(),
                    ],
                    package: Some(target),
                });
            }
            _ => vec![name, "--version".to_string()],
        },
        PackageManager::Pip | PackageManager::Cargo => vec![name, "--version".to_string()],
        PackageManager::Brew => vec![
            "brew".to_string(),
            "list".to_string(),
            "--versions".to_string(),
            name,
        ],
        PackageManager::Go => return None,
    };
    Some(VersionQuery {
        argv,
        package: None,
    })
}

/// The package an npm install command names, without any `@version` pin.
fn npm_install_target(item: &InstallationItem) -> Option<String> {
    let tokens = split_command(&item.install_command).ok()?;
    let target = tokens
        .iter()
        .skip(2)
        .rev()
        .find(|token| !token.starts_with('-'))?;
    let unpinned = match target.char_indices().skip(1).find(|(_, c)| *c == '@') {
        Some((at, _)) => &target[..at],
        None => target.as_str(),
    };
    Some(unpinned.to_string())
}

/// Find the installed version of `item`.
pub async fn discover_version(
    runner: &dyn ProcessRunner,
    item: &InstallationItem,
    install_output: &str,
    limit: Duration,
) -> Option<String> {
    if let Some(query) = version_command(item) {
        match runner.run(&query.argv, limit).await {
            Ok(output) if output.success() => {
                if let Some(version) = query.parse(&output.stdout) {
                    return Some(version);
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(item_id = %item.id, error = %e, "version query failed");
            }
        }
    }

    version_from_output(&item.name, install_output)
}

/// Scan install output for a semantic-version-shaped token.
///
/// `name@X.Y.Z` is preferred, then `version X.Y.Z`, `vX.Y.Z`, and any bare `X.Y.Z`.
pub fn version_from_output(name: &str, output: &str) -> Option<String> {
    pinned_version(name, output).or_else(|| {
        OUTPUT_PATTERNS
            .iter()
            .find_map(|pattern| first_capture(pattern, output))
    })
}

fn pinned_version(name: &str, output: &str) -> Option<String> {
    let pattern = Regex::new(&format!(r"(?i){}@(\d+\.\d+\.\d+)", regex::escape(name))).ok()?;
    first_capture(&pattern, output)
}

fn first_capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}
