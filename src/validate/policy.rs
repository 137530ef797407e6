//! Allow-list command policy.

use super::tokenize::split_command;
use crate::item::PackageManager;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Default ceiling for sanitized package names.
pub const DEFAULT_MAX_NAME_LENGTH: usize = 100;

/// A class of command that is refused outright, before any tokenising.
struct DangerousPattern {
    class: &'static str,
    regex: Regex,
}

static DANGEROUS_PATTERNS: LazyLock<Vec<DangerousPattern>> = LazyLock::new(|| {
    [
        ("privileged recursive delete of root", r"sudo\s+rm\s+-rf\s*/"),
        ("remote script piped to shell", r"curl.*?\|\s*(?:bash|sh|zsh)"),
        ("remote script piped to shell", r"wget.*?\|\s*(?:bash|sh|zsh)"),
        ("raw disk write", r"dd\s+if=.*of=.*"),
        ("filesystem format", r"mkfs\."),
        ("filesystem format", r"format\s+[cC]:"),
        ("drive wipe", r"del\s+/[qfs]\s+[cC]:"),
        ("recursive delete of home directory", r"rm\s+-rf\s+\$HOME"),
        ("world-writable root", r"chmod\s+777\s+/"),
    ]
    .into_iter()
    .map(|(class, pattern)| DangerousPattern {
        class,
        regex: Regex::new(&format!("(?i){}", pattern)).unwrap(),
    })
    .collect()
});

static UNSAFE_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9\-_@/.]").unwrap());

/// Subcommands each manager may be invoked with.
pub fn allowed_verbs(manager: PackageManager) -> &'static [&'static str] {
    match manager {
        PackageManager::Brew => &["install", "upgrade", "info", "search"],
        PackageManager::Npm => &["install", "update", "info", "search"],
        PackageManager::Pip => &["install", "upgrade", "show", "search"],
        PackageManager::Cargo => &["install", "update", "search"],
        PackageManager::Go => &["install", "get", "mod"],
    }
}

/// Outcome of validating a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Validation {
    pub fn accept() -> Self {
        Self {
            ok: true,
            reason: None,
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            reason: Some(reason.into()),
        }
    }
}

/// Validates install commands and sanitizes package names.
#[derive(Debug, Clone)]
pub struct CommandValidator {
    max_name_length: usize,
}

impl Default for CommandValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_NAME_LENGTH)
    }
}

impl CommandValidator {
    pub fn new(max_name_length: usize) -> Self {
        Self { max_name_length }
    }

    pub fn max_name_length(&self) -> usize {
        self.max_name_length
    }

    /// Decide whether `command` may be executed.
    ///
    /// Checks run in order and the first failure governs:
    /// 1. dangerous pattern deny-list
    /// 2. program must be an approved package manager
    /// 3. subcommand must be on that manager's allow-list
    pub fn validate(&self, command: &str) -> Validation {
        if let Some(pattern) = DANGEROUS_PATTERNS.iter().find(|p| p.regex.is_match(command)) {
            return Validation::reject(format!(
                "Command contains dangerous pattern: {}",
                pattern.class
            ));
        }

        let tokens = match split_command(command) {
            Ok(tokens) => tokens,
            Err(e) => return Validation::reject(format!("Unparseable command: {}", e)),
        };

        let Some(program) = tokens.first() else {
            return Validation::reject("Empty command");
        };

        let Some(manager) = PackageManager::from_program(program) else {
            return Validation::reject(format!(
                "Package manager '{}' not in approved list",
                program
            ));
        };

        match tokens.get(1) {
            None => Validation::reject(format!("Missing action for {}", manager)),
            Some(verb) if !allowed_verbs(manager).contains(&verb.as_str()) => {
                Validation::reject(format!("Action '{}' not allowed for {}", verb, manager))
            }
            Some(_) => Validation::accept(),
        }
    }

    /// Strip every character outside `[A-Za-z0-9-_@/.]` and cap the length.
    pub fn sanitize(&self, name: &str) -> String {
        UNSAFE_NAME_CHARS
            .replace_all(name, "")
            .chars()
            .take(self.max_name_length)
            .collect()
    }
}
