//! Settings file loading
//!
//! Lookup order: `--config`, `SIMTOOL_CONFIG`, `./simtool.toml`, then
//! `<config dir>/simtool/simtool.toml`. Without any file the defaults apply.

use std::path::{Path, PathBuf};

use eyre::WrapErr;
use serde::{Deserialize, Serialize};
use simtool_pkg::SudoPolicy;

/// User settings for the `simtool` binary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Registry file replacing the built-in catalog
    #[serde(default)]
    pub registry: Option<PathBuf>,
    /// When to run mutating commands through sudo
    #[serde(default)]
    pub sudo: SudoPolicy,
    #[serde(default)]
    pub log: LogSettings,
    /// File the settings were read from
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// `[log]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogSettings {
    /// Default filter when `RUST_LOG` is unset (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Also write logs to this file
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Settings {
    /// Parse settings text
    ///
    /// # Errors
    /// Returns error on invalid TOML or unknown keys
    pub fn from_toml_str(content: &str) -> eyre::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load settings from a file
    ///
    /// A relative `registry` path is taken relative to the settings file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("cannot read settings file {}", path.display()))?;
        let mut settings = Self::from_toml_str(&content)
            .wrap_err_with(|| format!("invalid settings file {}", path.display()))?;

        if let Some(registry) = &settings.registry
            && registry.is_relative()
            && let Some(dir) = path.parent()
        {
            settings.registry = Some(dir.join(registry));
        }
        settings.source = Some(path.to_path_buf());
        Ok(settings)
    }

    /// Load from `explicit`, the environment or the default paths
    ///
    /// # Errors
    /// Returns error if a settings file exists but is invalid
    pub fn load_default(explicit: Option<&Path>) -> eyre::Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        if let Some(path) = std::env::var_os("SIMTOOL_CONFIG") {
            return Self::load(Path::new(&path));
        }

        let mut paths = vec![PathBuf::from("simtool.toml")];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("simtool").join("simtool.toml"));
        }
        Self::load_first(&paths)
    }

    /// Load the first existing file of `paths`, or the defaults with no
    /// `source` when none exists
    ///
    /// # Errors
    /// Returns error if the first existing file is invalid
    pub fn load_first(paths: &[PathBuf]) -> eyre::Result<Self> {
        match paths.iter().find(|path| path.exists()) {
            Some(path) => Self::load(path),
            None => Ok(Settings::default()),
        }
    }

    /// Registry file to use: `--registry`, then `SIMTOOL_REGISTRY`, then settings
    #[must_use]
    pub fn registry_path(&self, flag: Option<&Path>) -> Option<PathBuf> {
        flag.map(Path::to_path_buf)
            .or_else(|| std::env::var_os("SIMTOOL_REGISTRY").map(PathBuf::from))
            .or_else(|| self.registry.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings.sudo, SudoPolicy::Auto);
        assert_eq!(settings.log.level, "warn");
        assert!(settings.registry.is_none());
    }

    #[test]
    fn test_full_file() {
        let settings = Settings::from_toml_str(
            r#"
            registry = "/opt/simtool/tools.toml"
            sudo = "never"

            [log]
            level = "debug"
            file = "simtool.log"
            "#,
        )
        .unwrap();
        assert_eq!(settings.sudo, SudoPolicy::Never);
        assert_eq!(settings.log.level, "debug");
        assert_eq!(settings.log.file, Some(PathBuf::from("simtool.log")));
        assert_eq!(settings.registry_path(Some(Path::new("custom.toml"))), Some(PathBuf::from("custom.toml")));
    }

    #[test]
    fn test_rejects_unknown_keys() {
        assert!(Settings::from_toml_str("sudo_mode = \"never\"").is_err());
        assert!(Settings::from_toml_str("sudo = \"sometimes\"").is_err());
    }

    #[test]
    fn test_relative_registry_follows_settings_file() {
        let dir = std::env::temp_dir().join(format!("simtool-settings-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("simtool.toml");
        std::fs::write(&path, "registry = \"tools.toml\"\n").unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.registry, Some(dir.join("tools.toml")));
        assert_eq!(settings.source, Some(path));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_first_falls_back_to_defaults() {
        let dir = std::env::temp_dir().join(format!("simtool-fallback-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let missing = dir.join("missing.toml");
        let present = dir.join("simtool.toml");

        let settings = Settings::load_first(std::slice::from_ref(&missing)).unwrap();
        assert!(settings.source.is_none());
        assert_eq!(settings.sudo, SudoPolicy::Auto);

        std::fs::write(&present, "sudo = \"always\"\n").unwrap();
        let settings = Settings::load_first(&[missing, present.clone()]).unwrap();
        assert_eq!(settings.source, Some(present));
        assert_eq!(settings.sudo, SudoPolicy::Always);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
