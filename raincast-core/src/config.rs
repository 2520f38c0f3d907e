use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

/// Base URL used when nothing else is configured.
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";

/// Environment variable that overrides the saved base URL.
pub const API_BASE_ENV: &str = "API_BASE";

/// Top-level configuration stored on disk for the companion CLI.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Base URL of the prediction service, e.g. "http://127.0.0.1:8000".
    pub api_base: Option<String>,
}

impl Config {
    /// Resolve the effective base URL.
    ///
    /// Precedence: explicit flag, then the `API_BASE` environment variable,
    /// then the saved config, then the local default.
    pub fn resolve_api_base(&self, flag: Option<&str>) -> String {
        if let Some(base) = flag {
            return base.to_string();
        }

        if let Ok(base) = std::env::var(API_BASE_ENV) {
            if !base.is_empty() {
                return base;
            }
        }

        self.api_base.clone().unwrap_or_else(|| DEFAULT_API_BASE.to_string())
    }

    pub fn set_api_base(&mut self, base: String) {
        self.api_base = Some(base);
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "raincast", "raincast-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
