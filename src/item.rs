//! Installable item types shared by detection, validation and execution.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Package managers the engine knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    Brew,
    Npm,
    Pip,
    Cargo,
    Go,
}

impl PackageManager {
    /// All supported managers, in detection order.
    pub const ALL: [PackageManager; 5] = [
        PackageManager::Brew,
        PackageManager::Npm,
        PackageManager::Pip,
        PackageManager::Cargo,
        PackageManager::Go,
    ];

    /// The program name invoked on the command line.
    pub fn program(&self) -> &'static str {
        match self {
            PackageManager::Brew => "brew",
            PackageManager::Npm => "npm",
            PackageManager::Pip => "pip",
            PackageManager::Cargo => "cargo",
            PackageManager::Go => "go",
        }
    }

    /// Look up a manager by its program name.
    pub fn from_program(program: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.program() == program)
    }

    /// Category used when the source text carries no stronger signal.
    pub fn default_category(&self) -> Category {
        match self {
            PackageManager::Brew => Category::HomebrewFormulae,
            PackageManager::Npm => Category::NodejsPackages,
            PackageManager::Pip => Category::PythonPackages,
            PackageManager::Cargo => Category::RustCrates,
            PackageManager::Go => Category::GoModules,
        }
    }

    /// Build the install invocation for a package name.
    pub fn install_command(&self, name: &str) -> String {
        match self {
            PackageManager::Brew => format!("brew install {}", name),
            PackageManager::Npm => format!("npm install -g {}", name),
            PackageManager::Pip => format!("pip install {}", name),
            PackageManager::Cargo => format!("cargo install {}", name),
            PackageManager::Go => {
                if name.contains('@') {
                    format!("go install {}", name)
                } else {
                    format!("go install {}@latest", name)
                }
            }
        }
    }
}

impl std::fmt::Display for PackageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.program())
    }
}

impl std::str::FromStr for PackageManager {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "brew" | "homebrew" => Ok(PackageManager::Brew),
            "npm" => Ok(PackageManager::Npm),
            "pip" => Ok(PackageManager::Pip),
            "cargo" => Ok(PackageManager::Cargo),
            "go" => Ok(PackageManager::Go),
            _ => anyhow::bail!(
                "Invalid package manager '{}'. Valid values: brew, npm, pip, cargo, go",
                s
            ),
        }
    }
}

/// Classification tag attached to every item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    McpServers,
    CliTools,
    DevTools,
    PythonPackages,
    NodejsPackages,
    HomebrewFormulae,
    RustCrates,
    GoModules,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::McpServers => "mcp_servers",
            Category::CliTools => "cli_tools",
            Category::DevTools => "dev_tools",
            Category::PythonPackages => "python_packages",
            Category::NodejsPackages => "nodejs_packages",
            Category::HomebrewFormulae => "homebrew_formulae",
            Category::RustCrates => "rust_crates",
            Category::GoModules => "go_modules",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// A detected, not-yet-validated install candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallationItem {
    /// Stable identity derived from `(package_manager, name)`.
    pub id: String,
    pub name: String,
    pub package_manager: PackageManager,
    /// Full invocation, e.g. `npm install -g typescript`.
    pub install_command: String,
    pub category: Category,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Advisory only, never resolved.
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_size_mb: Option<u32>,
}

impl InstallationItem {
    /// Create an item with the standard install command for its manager.
    pub fn new(
        name: &str,
        package_manager: PackageManager,
        category: Category,
        description: &str,
    ) -> Self {
        Self {
            id: item_id(package_manager, name),
            name: name.to_string(),
            package_manager,
            install_command: package_manager.install_command(name),
            category,
            description: description.to_string(),
            version: None,
            dependencies: Vec::new(),
            documentation_url: None,
            homepage_url: None,
            estimated_size_mb: None,
        }
    }

    /// Override the install command.
    pub fn with_install_command(mut self, command: impl Into<String>) -> Self {
        self.install_command = command.into();
        self
    }

    /// Set the documentation URL.
    pub fn with_documentation_url(mut self, url: Option<String>) -> Self {
        self.documentation_url = url;
        self
    }
}

/// Compute the stable identity of a package.
///
/// Returns the first 12 hex characters of SHA-256 over `"{manager}:{name}"`.
pub fn item_id(manager: PackageManager, name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{}", manager, name).as_bytes());
    let result = hasher.finalize();
    format!("{:x}", result)[..12].to_string()
}
