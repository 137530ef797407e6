//! Well-known items surfaced regardless of what the feed mentions.

use crate::item::{Category, InstallationItem, PackageManager};

/// A catalog entry: short name, npm package, description.
pub struct CatalogEntry {
    pub name: &'static str,
    pub package: &'static str,
    pub description: &'static str,
}

pub const MCP_SERVERS: &[CatalogEntry] = &[
    CatalogEntry {
        name: "filesystem",
        package: "@modelcontextprotocol/server-filesystem",
        description: "MCP server for filesystem operations",
    },
    CatalogEntry {
        name: "git",
        package: "@modelcontextprotocol/server-git",
        description: "MCP server for Git operations",
    },
    CatalogEntry {
        name: "sqlite",
        package: "@modelcontextprotocol/server-sqlite",
        description: "MCP server for SQLite database operations",
    },
    CatalogEntry {
        name: "postgres",
        package: "@modelcontextprotocol/server-postgres",
        description: "MCP server for PostgreSQL operations",
    },
    CatalogEntry {
        name: "brave-search",
        package: "@modelcontextprotocol/server-brave-search",
        description: "MCP server for Brave Search API",
    },
];

impl CatalogEntry {
    pub fn to_item(&self) -> InstallationItem {
        InstallationItem::new(
            self.name,
            PackageManager::Npm,
            Category::McpServers,
            self.description,
        )
        .with_install_command(PackageManager::Npm.install_command(self.package))
        .with_documentation_url(Some(format!(
            "https://modelcontextprotocol.io/servers/{}",
            self.name
        )))
    }

    /// Whether `item` already covers this entry, by short name or npm package.
    pub fn is_covered_by(&self, item: &InstallationItem) -> bool {
        item.package_manager == PackageManager::Npm
            && (item.name == self.name || item.name == self.package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_items_install_scoped_packages() {
        for entry in MCP_SERVERS {
            let item = entry.to_item();
            assert_eq!(item.package_manager, PackageManager::Npm);
            assert_eq!(item.category, Category::McpServers);
            assert!(item.install_command.starts_with("npm install -g @modelcontextprotocol/"));
        }
    }

    #[test]
    fn test_catalog_coverage_by_package_name() {
        let entry = &MCP_SERVERS[0];
        let detected = InstallationItem::new(
            "@modelcontextprotocol/server-filesystem",
            PackageManager::Npm,
            Category::NodejsPackages,
            "",
        );
        assert!(entry.is_covered_by(&detected));

        let other_manager =
            InstallationItem::new("filesystem", PackageManager::Pip, Category::PythonPackages, "");
        assert!(!entry.is_covered_by(&other_manager));
    }
}
