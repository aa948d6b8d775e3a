use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use crate::relay::RelayId;

/// Environment variable that overrides the access key from the config file.
pub const ACCESS_KEY_ENV: &str = "WEATHERSTACK_API_KEY";

/// Override for a single relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    pub base_url: String,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Weatherstack access key.
    pub access_key: Option<String>,

    /// Defaults to the public plain-HTTP endpoint.
    pub provider_base_url: Option<String>,

    /// Per-request timeout. Unset means the HTTP client's own behaviour.
    pub timeout_secs: Option<u64>,

    /// Example TOML:
    /// [relays.codetabs]
    /// base_url = "..."
    #[serde(default)]
    pub relays: HashMap<String, RelayConfig>,
}

impl Config {
    /// Access key from the environment, falling back to the config file.
    pub fn access_key(&self) -> Result<String> {
        self.access_key_with_env(std::env::var(ACCESS_KEY_ENV).ok())
    }

    fn access_key_with_env(&self, env_value: Option<String>) -> Result<String> {
        env_value
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.access_key.clone().filter(|k| !k.trim().is_empty()))
            .ok_or_else(|| {
                anyhow!(
                    "No access key configured.\n\
                     Hint: run `weatherstack configure` or set {ACCESS_KEY_ENV}."
                )
            })
    }

    pub fn set_access_key(&mut self, access_key: String) {
        self.access_key = Some(access_key);
    }

    pub fn relay_base_url(&self, id: RelayId) -> Option<&str> {
        self.relays.get(id.as_str()).map(|cfg| cfg.base_url.as_str())
    }

    pub fn upsert_relay_base_url(&mut self, id: RelayId, base_url: String) {
        self.relays.insert(id.as_str().to_string(), RelayConfig { base_url });
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        for name in cfg.relays.keys() {
            RelayId::try_from(name.as_str())
                .with_context(|| format!("Invalid relay table in {}", path.display()))?;
        }

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weatherstack", "weatherstack-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
