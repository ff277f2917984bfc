//! Tool registry: the static catalog of supported tools
//!
//! The catalog is TOML. A built-in copy ships inside the binary and a user
//! file can replace it. Every entry is validated at load time and a single
//! bad entry rejects the whole file.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use simtool_pkg::Platform;
use tracing::debug;

use crate::error::CoreError;

const BUILTIN_REGISTRY: &str = include_str!("../tools.toml");

/// Top-level registry file layout
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegistryFile {
    #[serde(rename = "tool", default)]
    tools: Vec<ToolEntry>,
}

/// One `[[tool]]` table
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ToolEntry {
    id: String,
    display_name: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    depends_on: Vec<String>,
    packages: PlatformPackages,
}

/// `[tool.packages]`; unknown platform keys are rejected
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PlatformPackages {
    linux: Option<PackageIds>,
    windows: Option<PackageIds>,
    #[serde(alias = "darwin")]
    macos: Option<PackageIds>,
}

/// A single package name or a list of them
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PackageIds {
    One(String),
    Many(Vec<String>),
}

impl PackageIds {
    fn into_vec(self) -> Vec<String> {
        match self {
            PackageIds::One(name) => vec![name],
            PackageIds::Many(names) => names,
        }
    }
}

/// Immutable description of a supported tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolDescriptor {
    /// Unique id used on the command line
    pub id: String,
    /// Human-readable name
    pub display_name: String,
    /// One-line description
    pub description: String,
    /// Backend package identifiers per platform
    pub packages: HashMap<Platform, Vec<String>>,
    /// Tool ids that must be installed first, in order
    pub depends_on: Vec<String>,
}

impl ToolDescriptor {
    /// Create a descriptor with no packages or dependencies
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            display_name: id.clone(),
            id,
            description: String::new(),
            packages: HashMap::new(),
            depends_on: Vec::new(),
        }
    }

    /// Set the package identifiers for one platform
    #[must_use]
    pub fn with_packages<I, S>(mut self, platform: Platform, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.packages
            .insert(platform, packages.into_iter().map(Into::into).collect());
        self
    }

    /// Use the same package name on every platform
    #[must_use]
    pub fn with_package_everywhere(mut self, package: &str) -> Self {
        for platform in Platform::ALL {
            self.packages.insert(platform, vec![package.to_string()]);
        }
        self
    }

    /// Set the dependencies
    #[must_use]
    pub fn depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Package identifiers on `platform`; empty when the tool is not offered there
    #[must_use]
    pub fn packages_for(&self, platform: Platform) -> &[String] {
        self.packages.get(&platform).map_or(&[], Vec::as_slice)
    }
}

impl TryFrom<ToolEntry> for ToolDescriptor {
    type Error = CoreError;

    fn try_from(entry: ToolEntry) -> Result<Self, Self::Error> {
        let id = entry.id.trim().to_string();
        if id.is_empty() {
            return Err(CoreError::Config("tool with empty id".to_string()));
        }

        let mut packages = HashMap::new();
        for (platform, ids) in [
            (Platform::Linux, entry.packages.linux),
            (Platform::Windows, entry.packages.windows),
            (Platform::Macos, entry.packages.macos),
        ] {
            let Some(ids) = ids else { continue };
            let ids = ids.into_vec();
            if ids.is_empty() || ids.iter().any(|p| p.trim().is_empty()) {
                return Err(CoreError::Config(format!(
                    "tool '{id}' has an empty package name for {platform}"
                )));
            }
            packages.insert(platform, ids);
        }
        if packages.is_empty() {
            return Err(CoreError::Config(format!(
                "tool '{id}' has no package for any platform"
            )));
        }

        Ok(ToolDescriptor {
            display_name: entry.display_name.unwrap_or_else(|| id.clone()),
            description: entry.description,
            packages,
            depends_on: entry.depends_on,
            id,
        })
    }
}

/// Read-only catalog of tools, in declaration order
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Build a registry, rejecting duplicate ids and dangling dependencies
    ///
    /// Cycles are left for the resolver to report.
    ///
    /// # Errors
    /// Returns `CoreError::Config` describing the first invalid entry
    pub fn from_descriptors(tools: Vec<ToolDescriptor>) -> Result<Self, CoreError> {
        let mut index = HashMap::with_capacity(tools.len());
        for (i, tool) in tools.iter().enumerate() {
            if index.insert(tool.id.clone(), i).is_some() {
                return Err(CoreError::Config(format!("duplicate tool id '{}'", tool.id)));
            }
        }

        for tool in &tools {
            let mut seen = HashSet::new();
            for dep in &tool.depends_on {
                if !index.contains_key(dep) {
                    return Err(CoreError::Config(format!(
                        "tool '{}' depends on unknown tool '{dep}'",
                        tool.id
                    )));
                }
                if !seen.insert(dep.as_str()) {
                    return Err(CoreError::Config(format!(
                        "tool '{}' lists dependency '{dep}' twice",
                        tool.id
                    )));
                }
            }
        }

        debug!(count = tools.len(), "tool registry loaded");
        Ok(Self { tools, index })
    }

    /// Parse a registry from TOML text
    ///
    /// # Errors
    /// Returns `CoreError::Config` on syntax errors, unknown keys, missing
    /// fields or any entry failing validation
    pub fn from_toml_str(content: &str) -> Result<Self, CoreError> {
        let file: RegistryFile =
            toml::from_str(content).map_err(|e| CoreError::Config(e.to_string()))?;
        let tools = file
            .tools
            .into_iter()
            .map(ToolDescriptor::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_descriptors(tools)
    }

    /// Load a registry file
    ///
    /// # Errors
    /// Returns `CoreError::Config` if the file cannot be read or is invalid
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
            .map_err(|e| CoreError::Config(format!("{}: {e}", path.display())))
    }

    /// The catalog compiled into the binary
    ///
    /// # Errors
    /// Only fails if the embedded catalog itself is broken
    pub fn builtin() -> Result<Self, CoreError> {
        Self::from_toml_str(BUILTIN_REGISTRY)
    }

    /// Look up a tool by id
    ///
    /// # Errors
    /// Returns `CoreError::UnknownTool` if no tool has this id
    pub fn lookup(&self, tool_id: &str) -> Result<&ToolDescriptor, CoreError> {
        self.index
            .get(tool_id)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| CoreError::UnknownTool(tool_id.to_string()))
    }

    /// All tools in declaration order
    #[must_use]
    pub fn all(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    /// Tools that list `tool_id` as a direct dependency
    pub fn dependents<'a>(&'a self, tool_id: &'a str) -> impl Iterator<Item = &'a ToolDescriptor> {
        self.tools
            .iter()
            .filter(move |t| t.depends_on.iter().any(|d| d == tool_id))
    }

    /// Number of registered tools
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry has no tools
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
