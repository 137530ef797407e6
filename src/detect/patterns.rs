//! Package-name patterns, one group per package manager.
//!
//! Every pattern has exactly one capture group holding the package name and is
//! compiled case-insensitive.

use crate::item::{Category, PackageManager};
use regex::Regex;
use std::sync::LazyLock;

struct ManagerPatterns {
    manager: PackageManager,
    patterns: Vec<Regex>,
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(&format!("(?i){}", p)).unwrap())
        .collect()
}

static PATTERNS: LazyLock<Vec<ManagerPatterns>> = LazyLock::new(|| {
    vec![
        ManagerPatterns {
            manager: PackageManager::Brew,
            patterns: compile(&[
                r"brew install ([a-zA-Z0-9\-_]+)",
                r"(?:using|via|install) Homebrew.*?([a-zA-Z0-9\-_]+)",
                r"(?:^|\s)([a-zA-Z0-9\-_]+)(?:\s+is|\s+can be|\s+available)(?:\s+on|via)?\s+(?:Homebrew|brew)",
            ]),
        },
        ManagerPatterns {
            manager: PackageManager::Npm,
            patterns: compile(&[
                r"npm install (?:-g )?([@a-zA-Z0-9\-_/]+)",
                r"npx ([a-zA-Z0-9\-_]+)",
                r"yarn (?:global )?add ([a-zA-Z0-9\-_]+)",
            ]),
        },
        ManagerPatterns {
            manager: PackageManager::Pip,
            patterns: compile(&[
                r"pip install ([a-zA-Z0-9\-_]+)",
                r"pip3 install ([a-zA-Z0-9\-_]+)",
                r"python -m pip install ([a-zA-Z0-9\-_]+)",
            ]),
        },
        ManagerPatterns {
            manager: PackageManager::Cargo,
            patterns: compile(&[r"cargo install ([a-zA-Z0-9\-_]+)"]),
        },
        ManagerPatterns {
            manager: PackageManager::Go,
            patterns: compile(&[r"go install ([a-zA-Z0-9\-_/.]+)"]),
        },
    ]
});

static MCP_KEYWORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:mcp|model context protocol)\b").unwrap());

static CLI_KEYWORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:cli|command line|terminal|shell)\b").unwrap());

static DEV_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:development|dev tool|developer|coding)\b").unwrap()
});

/// Find every `(manager, name)` candidate in `text`, in pattern order.
///
/// Names are trimmed and empty names dropped; duplicates are left for the
/// caller to resolve.
pub fn find_candidates(text: &str) -> Vec<(PackageManager, String)> {
    let mut found = Vec::new();

    for group in PATTERNS.iter() {
        for pattern in &group.patterns {
            for cap in pattern.captures_iter(text) {
                if let Some(m) = cap.get(1) {
                    let name = m.as_str().trim();
                    if !name.is_empty() {
                        found.push((group.manager, name.to_string()));
                    }
                }
            }
        }
    }

    found
}

/// Classify a package by the text it was found in.
///
/// MCP keywords win over CLI keywords, which win over development keywords;
/// with none present the manager's default category applies.
pub fn categorize(manager: PackageManager, text: &str) -> Category {
    if MCP_KEYWORDS.is_match(text) {
        Category::McpServers
    } else if CLI_KEYWORDS.is_match(text) {
        Category::CliTools
    } else if DEV_KEYWORDS.is_match(text) {
        Category::DevTools
    } else {
        manager.default_category()
    }
}
