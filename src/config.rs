//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.agentboard.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = ".agentboard.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory holding the per-agent status files.
    #[serde(default = "default_status_dir")]
    pub status_dir: PathBuf,

    /// Status board output path.
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            status_dir: default_status_dir(),
            output: default_output(),
        }
    }
}

fn default_status_dir() -> PathBuf {
    PathBuf::from("agent-status")
}

fn default_output() -> PathBuf {
    PathBuf::from("AGENT-STATUS.md")
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Rows shown in the Recent Completions table.
    #[serde(default = "default_recent_completions")]
    pub recent_completions: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            recent_completions: default_recent_completions(),
        }
    }
}

fn default_recent_completions() -> usize {
    5
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.agentboard.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref status_dir) = args.status_dir {
            self.general.status_dir = status_dir.clone();
        }
        if let Some(ref output) = args.output {
            self.general.output = output.clone();
        }
        if let Some(recent) = args.recent {
            self.report.recent_completions = recent;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
