//! Turns feed records into deduplicated installation items.

use super::FeedUpdate;
use super::catalog::MCP_SERVERS;
use super::patterns::{categorize, find_candidates};
use crate::item::{InstallationItem, PackageManager};
use std::collections::HashSet;

const MAX_SENTENCE_CHARS: usize = 200;
const MAX_TITLE_CHARS: usize = 100;

/// Extracts installable items from feed updates.
#[derive(Debug, Clone)]
pub struct Extractor {
    include_catalog: bool,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Extractor {
    pub fn new(include_catalog: bool) -> Self {
        Self { include_catalog }
    }

    /// Extract items from `updates`.
    ///
    /// Identity is `(manager, name)`: the first record mentioning a package
    /// supplies its description, category and documentation URL. Records
    /// without a title are skipped.
    pub fn extract(&self, updates: &[FeedUpdate]) -> Vec<InstallationItem> {
        let mut items: Vec<InstallationItem> = Vec::new();
        let mut seen: HashSet<(PackageManager, String)> = HashSet::new();

        for (index, update) in updates.iter().enumerate() {
            let Some(title) = update.title.as_deref() else {
                tracing::debug!(index, url = ?update.url, "skipping feed record without title");
                continue;
            };

            let combined = format!("{} {}", title, update.content);

            for (manager, name) in find_candidates(&combined) {
                if !seen.insert((manager, name.clone())) {
                    continue;
                }
                let item = InstallationItem::new(
                    &name,
                    manager,
                    categorize(manager, &combined),
                    &describe(&name, title, &update.content),
                )
                .with_documentation_url(update.url.clone());
                tracing::debug!(id = %item.id, name = %item.name, %manager, "detected package");
                items.push(item);
            }
        }

        if self.include_catalog {
            for entry in MCP_SERVERS {
                if items.iter().any(|item| entry.is_covered_by(item)) {
                    continue;
                }
                items.push(entry.to_item());
            }
        }

        items
    }
}

/// Pick a description for `name`: the first content sentence mentioning it,
/// else the title, else a generic label.
fn describe(name: &str, title: &str, content: &str) -> String {
    let needle = name.to_lowercase();
    for sentence in content.split('.') {
        if sentence.to_lowercase().contains(&needle) {
            return truncate_chars(sentence.trim(), MAX_SENTENCE_CHARS);
        }
    }

    if !title.trim().is_empty() {
        return truncate_chars(title, MAX_TITLE_CHARS);
    }

    format!("Package: {}", name)
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{Category, item_id};

    fn jq_update() -> FeedUpdate {
        FeedUpdate::new(
            "New CLI tool: jq for JSON processing",
            "Install jq using brew install jq for command-line JSON processing",
            Some("https://github.com/jqlang/jq"),
        )
    }

    #[test]
    fn test_detects_single_brew_item() {
        let extractor = Extractor::new(false);
        let items = extractor.extract(&[FeedUpdate::new(
            "",
            "Install jq using brew install jq",
            None,
        )]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "jq");
        assert_eq!(items[0].package_manager, PackageManager::Brew);
        assert_eq!(items[0].install_command, "brew install jq");
    }

    #[test]
    fn test_item_fields_from_update() {
        let items = Extractor::new(false).extract(&[jq_update()]);
        let jq = &items[0];
        assert_eq!(jq.category, Category::CliTools);
        assert_eq!(
            jq.description,
            "Install jq using brew install jq for command-line JSON processing"
        );
        assert_eq!(jq.documentation_url.as_deref(), Some("https://github.com/jqlang/jq"));
        assert_eq!(jq.id, item_id(PackageManager::Brew, "jq"));
    }

    #[test]
    fn test_detection_is_idempotent() {
        let extractor = Extractor::default();
        let updates = vec![
            jq_update(),
            FeedUpdate::new("Rust tools", "cargo install ripgrep and pip install httpie", None),
        ];
        let mut first: Vec<String> = extractor.extract(&updates).into_iter().map(|i| i.id).collect();
        let mut second: Vec<String> = extractor.extract(&updates).into_iter().map(|i| i.id).collect();
        first.sort();
        second.sort();
        assert_eq!(first, second);
    }

    #[test]
    fn test_same_name_different_manager_is_distinct() {
        let items = Extractor::new(false).extract(&[FeedUpdate::new(
            "black",
            "pip install black or brew install black",
            None,
        )]);
        let managers: Vec<PackageManager> = items.iter().map(|i| i.package_manager).collect();
        assert_eq!(items.len(), 2);
        assert!(managers.contains(&PackageManager::Pip));
        assert!(managers.contains(&PackageManager::Brew));
        assert_ne!(items[0].id, items[1].id);
    }

    #[test]
    fn test_first_match_wins_across_records() {
        let items = Extractor::new(false).extract(&[
            FeedUpdate::new("First", "brew install jq", Some("https://first.example")),
            FeedUpdate::new("Second", "brew install jq", Some("https://second.example")),
        ]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].documentation_url.as_deref(), Some("https://first.example"));
    }

    #[test]
    fn test_record_without_title_is_skipped() {
        let untitled = FeedUpdate {
            title: None,
            content: "brew install wget".to_string(),
            url: None,
        };
        let items = Extractor::new(false).extract(&[untitled, jq_update()]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "jq");
    }

    #[test]
    fn test_empty_feed_yields_catalog() {
        let items = Extractor::new(true).extract(&[]);
        assert_eq!(items.len(), MCP_SERVERS.len());
        assert!(items.iter().all(|i| i.category == Category::McpServers));
    }

    #[test]
    fn test_catalog_not_duplicated_when_detected() {
        let items = Extractor::new(true).extract(&[FeedUpdate::new(
            "MCP",
            "npm install -g @modelcontextprotocol/server-git",
            None,
        )]);
        let git_like = items
            .iter()
            .filter(|i| i.install_command.ends_with("@modelcontextprotocol/server-git"))
            .count();
        assert_eq!(git_like, 1);
        assert_eq!(items.len(), MCP_SERVERS.len());
    }

    #[test]
    fn test_description_falls_back_to_title() {
        assert_eq!(describe("jq", "A title", "nothing relevant"), "A title");
        assert_eq!(describe("jq", "  ", "nothing relevant"), "Package: jq");
    }
}
