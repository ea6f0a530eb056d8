use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::util::xdg;

const CONFIG_FILE: &str = "config.toml";
const DEFAULT_BUILDER: &str = "virtualenv";

/// User configuration, read from `$XDG_CONFIG_HOME/venvctl/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub builder: BuilderConfig,
    pub packages: PackageConfig,
}

/// The external program that creates environments.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    pub command: String,
    /// Arguments passed before any per-call options.
    pub args: Vec<String>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            command: DEFAULT_BUILDER.to_string(),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PackageConfig {
    /// Default package index for installs.
    pub index_url: Option<String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        toml::from_str(&contents).with_context(|| format!("Failed to parse config file {:?}", path))
    }

    /// Load from an explicit path, or from the default location.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Self::load(&default_config_path()?),
        }
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(xdg::config_dir()?.join(CONFIG_FILE))
}
