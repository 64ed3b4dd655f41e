//! Configuration handling
//!
//! Export options are read from TOML files and layered:
//! built-in defaults, then `~/.config/logseq-md/config.toml` (global), then
//! the nearest `.logseq-md.toml` walking up from the current directory
//! (project), then an explicit `--config` file. CLI flags are applied last by
//! the caller.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ExportOptions;

/// File name of the project-level config
pub const PROJECT_CONFIG_FILE: &str = ".logseq-md.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// On-disk layout of a config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Export settings
    pub export: ExportOptions,
}

/// Effective configuration plus the files it was built from
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub export: ExportOptions,
    pub sources: Vec<PathBuf>,
}

impl Config {
    /// Loads and layers configuration from the default locations and `explicit`
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut candidates = Vec::new();

        if let Some(global) = Self::global_config_path() {
            candidates.push(global);
        }
        if let Some(project) = Self::find_project_config() {
            candidates.push(project);
        }

        let mut sources: Vec<PathBuf> = candidates.into_iter().filter(|p| p.is_file()).collect();

        if let Some(path) = explicit {
            if !path.is_file() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            sources.push(path.to_path_buf());
        }

        Self::from_files(sources)
    }

    /// Layers the given files over the defaults, later files winning
    pub fn from_files(sources: Vec<PathBuf>) -> Result<Self> {
        let mut merged = toml::Value::try_from(ConfigFile::default())
            .context("Failed to serialize default config")?;

        for path in &sources {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;

            let layer: toml::Value = toml::from_str(&content)
                .map_err(|e| ConfigError::Parse(e.to_string()))
                .with_context(|| format!("Failed to parse config: {}", path.display()))?;

            merge(&mut merged, normalize_keys(layer));
        }

        let file: ConfigFile = merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::Parse(e.to_string()))
            .context("Failed to apply config")?;

        validate(&file.export)?;

        Ok(Self {
            export: file.export,
            sources,
        })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "logseq-md", "logseq-md")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns the global config file path
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Finds the nearest project config by walking up from the current directory
    pub fn find_project_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            let candidate = current.join(PROJECT_CONFIG_FILE);
            if candidate.is_file() {
                return Some(candidate);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Renders the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        let file = ConfigFile {
            export: self.export.clone(),
        };
        toml::to_string_pretty(&file).context("Failed to serialize config")
    }

    /// Writes the effective configuration to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
        }

        fs::write(path, self.to_toml()?)
            .with_context(|| format!("Failed to write config: {}", path.display()))
    }

    /// Saves the effective configuration as the global config
    pub fn save_global(&self) -> Result<PathBuf> {
        let path = Self::global_config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        self.save_to(&path)?;
        Ok(path)
    }
}

/// Recursively merges `layer` into `base`; tables merge, everything else replaces
fn merge(base: &mut toml::Value, layer: toml::Value) {
    match (base, layer) {
        (toml::Value::Table(base), toml::Value::Table(layer)) => {
            for (key, value) in layer {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, layer) => *base = layer,
    }
}

/// Rewrites `assetPath` / `asset-path` style keys to `asset_path`
fn normalize_keys(value: toml::Value) -> toml::Value {
    match value {
        toml::Value::Table(table) => toml::Value::Table(
            table
                .into_iter()
                .map(|(key, value)| (snake_case(&key), normalize_keys(value)))
                .collect(),
        ),
        other => other,
    }
}

fn snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else if c == '-' {
            out.push('_');
        } else {
            out.push(c);
        }
    }
    out
}

fn validate(options: &ExportOptions) -> Result<(), ConfigError> {
    if Path::new(options.asset_path.trim()).is_absolute() {
        return Err(ConfigError::Invalid(format!(
            "asset_path must be relative, got '{}'",
            options.asset_path
        )));
    }
    Ok(())
}
