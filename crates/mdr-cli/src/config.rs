//! Configuration management for the CLI
//!
//! Configuration is read from the first file found in this order:
//! - `--config <file>` or `MDR_CONFIG`
//! - `.mdr.toml`, `.mdr.yaml`, `.mdr.json` in the working directory
//! - `<config_dir>/mdr/config.{toml,yaml,json}`
//!
//! and falls back to defaults when none exists.

use crate::error::{Error, Result};
use mdr_core::{ResolverConfig, TranslatorConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the project configuration written by `config init`
pub const PROJECT_CONFIG_FILE: &str = ".mdr.toml";

const PROJECT_CONFIG_NAMES: [&str; 3] = [".mdr.toml", ".mdr.yaml", ".mdr.json"];
const USER_CONFIG_NAMES: [&str; 3] = ["config.toml", "config.yaml", "config.json"];

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Snapshot used when a command does not name one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<PathBuf>,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// Tree resolution and schema compilation settings
    pub resolver: ResolverConfig,

    /// Translation settings
    pub translator: TranslatorConfig,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Use colored output by default
    pub color: bool,

    /// Pretty-print JSON written with `--save-to`
    pub pretty: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level used when neither `-v` nor `RUST_LOG` is given
    pub level: String,

    /// Log format (compact, full, json)
    pub format: String,

    /// Log file path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            color: true,
            pretty: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "compact".to_string(),
            file: None,
        }
    }
}

/// Serialization format of a configuration or data file, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Toml,
    Yaml,
    Json,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => FileFormat::Toml,
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            _ => FileFormat::Json,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;

        let config = match FileFormat::from_path(path) {
            FileFormat::Toml => toml::from_str(&content)?,
            FileFormat::Yaml => serde_yaml::from_str(&content)?,
            FileFormat::Json => serde_json::from_str(&content)?,
        };

        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load configuration from a specific file or the default locations
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        match file {
            Some(path) => Self::from_file(path),
            None => {
                let cwd = std::env::current_dir()?;
                Self::discover(&cwd, dirs::config_dir().as_deref())
            }
        }
    }

    /// Load the first configuration found under a working and a user config directory
    pub fn discover(working_dir: &Path, user_config_dir: Option<&Path>) -> Result<Self> {
        match Self::search_paths(working_dir, user_config_dir)
            .into_iter()
            .find(|path| path.exists())
        {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Candidate configuration files in precedence order
    pub fn search_paths(working_dir: &Path, user_config_dir: Option<&Path>) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = PROJECT_CONFIG_NAMES
            .iter()
            .map(|name| working_dir.join(name))
            .collect();

        if let Some(config_dir) = user_config_dir {
            let mdr_dir = config_dir.join("mdr");
            paths.extend(USER_CONFIG_NAMES.iter().map(|name| mdr_dir.join(name)));
        }

        paths
    }

    /// Path of the user configuration written by `config init --user`
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mdr").join(USER_CONFIG_NAMES[0]))
    }

    /// Snapshot to load: the explicit one, else the configured one
    pub fn snapshot_path(&self, explicit: Option<&Path>) -> Result<PathBuf> {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| self.snapshot.clone())
            .ok_or_else(|| {
                Error::invalid_args("no snapshot given; pass --snapshot or set `snapshot` in the config")
            })
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.logging.format.as_str(), "compact" | "full" | "json") {
            return Err(Error::config(format!(
                "logging.format must be compact, full or json, got '{}'",
                self.logging.format
            )));
        }
        if self.resolver.root_entity_name.trim().is_empty() {
            return Err(Error::config("resolver.root_entity_name must not be empty"));
        }
        if self.resolver.default_expression_language.trim().is_empty() {
            return Err(Error::config(
                "resolver.default_expression_language must not be empty",
            ));
        }
        if let Some(snapshot) = &self.snapshot {
            if !snapshot.exists() {
                return Err(Error::config(format!(
                    "snapshot {} does not exist",
                    snapshot.display()
                )));
            }
        }
        Ok(())
    }

    /// Render the configuration in the format a path's extension implies
    pub fn render(&self, format: FileFormat) -> Result<String> {
        match format {
            FileFormat::Toml => toml::to_string_pretty(self)
                .map_err(|e| Error::config(format!("Failed to serialize as TOML: {}", e))),
            FileFormat::Yaml => Ok(serde_yaml::to_string(self)?),
            FileFormat::Json => Ok(serde_json::to_string_pretty(self)?),
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.render(FileFormat::from_path(path))?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdr_core::SourceValidation;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_when_nothing_is_found() {
        let dir = TempDir::new().unwrap();
        let config = Config::discover(dir.path(), None).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.resolver.root_entity_name, "Person");
    }

    #[test]
    fn test_project_config_wins_over_user_config() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();

        std::fs::create_dir_all(user.path().join("mdr")).unwrap();
        std::fs::write(
            user.path().join("mdr").join("config.toml"),
            "snapshot = \"user.json\"\n",
        )
        .unwrap();

        let config = Config::discover(project.path(), Some(user.path())).unwrap();
        assert_eq!(config.snapshot, Some(PathBuf::from("user.json")));

        std::fs::write(
            project.path().join(".mdr.yaml"),
            "snapshot: project.yaml\ntranslator:\n  source_validation: strict\n",
        )
        .unwrap();

        let config = Config::discover(project.path(), Some(user.path())).unwrap();
        assert_eq!(config.snapshot, Some(PathBuf::from("project.yaml")));
        assert_eq!(config.translator.source_validation, SourceValidation::Strict);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mdr.toml");
        std::fs::write(
            &path,
            "[resolver]\nroot_entity_name = \"Learner\"\n\n[logging]\nformat = \"json\"\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.resolver.root_entity_name, "Learner");
        assert_eq!(config.resolver.generic_link_prefixes, vec!["has", "relevant"]);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "warn");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.translator.group_version = Some("1.2".to_string());

        for name in ["nested/config.toml", "config.yaml", "config.json"] {
            let path = dir.path().join(name);
            config.save(&path).unwrap();
            assert_eq!(Config::from_file(&path).unwrap(), config);
        }
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.snapshot = Some(PathBuf::from("/nonexistent/registry.json"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_snapshot_path_resolution() {
        let mut config = Config::default();
        assert!(matches!(config.snapshot_path(None), Err(Error::InvalidArgs(_))));

        config.snapshot = Some(PathBuf::from("configured.json"));
        assert_eq!(
            config.snapshot_path(Some(Path::new("explicit.yaml"))).unwrap(),
            PathBuf::from("explicit.yaml")
        );
        assert_eq!(config.snapshot_path(None).unwrap(), PathBuf::from("configured.json"));
    }

    #[test]
    fn test_missing_explicit_config() {
        assert!(matches!(
            Config::load_with_file(Some(Path::new("/nonexistent/.mdr.toml"))),
            Err(Error::FileNotFound { .. })
        ));
    }
}
