//! CLI configuration management

use anyhow::{Context, Result};
use restbench_common::pagination;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Get the configuration directory path
pub fn config_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("restbench")
    }

    #[cfg(not(target_os = "windows"))]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".restbench")
    }
}

/// Get the config file path
pub fn config_file() -> PathBuf {
    config_dir().join("config.yml")
}

/// Main configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// History server URL (default: http://localhost:3001)
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Entries fetched per history page
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_server_url() -> String {
    "http://localhost:3001".to_string()
}

fn default_page_size() -> u32 {
    pagination::DEFAULT_LIMIT
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            page_size: default_page_size(),
        }
    }
}

impl Config {
    /// Load config from file
    pub fn load() -> Result<Self> {
        let path = config_file();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        Self::parse(&content)
    }

    /// Parse config file contents
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        fs::create_dir_all(config_dir()).context("Failed to create config directory")?;
        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;
        fs::write(config_file(), content).context("Failed to write config file")?;
        Ok(())
    }

    /// Apply a `--server` / `RESTBENCH_SERVER` override
    pub fn with_server_override(mut self, server: Option<String>) -> Self {
        if let Some(url) = server.filter(|s| !s.is_empty()) {
            self.server_url = url;
        }
        self
    }
}
