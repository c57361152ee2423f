//! Configuration handling for the deadline CLI
//!
//! Configuration is layered, later layers overriding earlier ones key by key:
//!
//! 1. built-in defaults
//! 2. global `~/.config/deadline-cli/config.toml` (platform config dir)
//! 3. workspace `.deadline/config.toml`
//! 4. command-line flags and environment (applied by the CLI)

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::OutputFormat;
use crate::domain::{EstimatorConfig, InsightsConfig};

/// Name of the workspace directory
pub const WORKSPACE_DIR: &str = ".deadline";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Contents of a configuration file (global or workspace)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Default output format (text or json)
    pub default_format: OutputFormat,

    pub estimator: EstimatorConfig,

    pub insights: InsightsConfig,
}

/// Effective configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub settings: ConfigFile,
    pub workspace_root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration for the workspace containing the current directory, if any
    pub fn load() -> Result<Self> {
        match Self::find_workspace_root() {
            Some(root) => Self::for_workspace(&root),
            None => Ok(Self {
                settings: Self::merge_layers(vec![Self::read_layer(Self::global_config_path())?])?,
                workspace_root: None,
            }),
        }
    }

    /// Loads configuration for a specific workspace
    pub fn for_workspace(workspace_root: &Path) -> Result<Self> {
        let global = Self::read_layer(Self::global_config_path())?;
        let local = Self::read_layer(Some(
            workspace_root.join(WORKSPACE_DIR).join("config.toml"),
        ))?;

        Ok(Self {
            settings: Self::merge_layers(vec![global, local])?,
            workspace_root: Some(workspace_root.to_path_buf()),
        })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "deadline", "deadline-cli")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    fn global_config_path() -> Option<PathBuf> {
        Self::global_config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Reads one layer; a missing file is an empty layer
    fn read_layer(path: Option<PathBuf>) -> Result<Option<toml::Value>> {
        let path = match path {
            Some(path) if path.exists() => path,
            _ => return Ok(None),
        };

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        let value = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;

        Ok(Some(value))
    }

    /// Merges layers in order and validates the result
    pub fn merge_layers(layers: Vec<Option<toml::Value>>) -> Result<ConfigFile> {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        for layer in layers.into_iter().flatten() {
            merge_value(&mut merged, layer);
        }

        let settings: ConfigFile = merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::Parse(e.to_string()))?;

        settings
            .estimator
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if settings.insights.week_horizon_days < 1 {
            return Err(ConfigError::Invalid(
                "insights.week_horizon_days must be at least 1".to_string(),
            )
            .into());
        }

        Ok(settings)
    }

    /// Finds the workspace root by looking for a `.deadline/` directory
    /// from the current directory upwards
    pub fn find_workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::find_workspace_root_from(&current)
    }

    pub fn find_workspace_root_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            if current.join(WORKSPACE_DIR).is_dir() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Overrides the working-day capacity
    pub fn set_hours_per_day(&mut self, hours: f64) -> Result<()> {
        self.settings.estimator.hours_per_day = hours;
        self.settings
            .estimator
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(())
    }
}

/// Recursively merges `overlay` into `base`; tables merge key by key,
/// everything else is replaced
fn merge_value(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
