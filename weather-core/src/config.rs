use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};

/// Keys that mean "no key": scaffolding placeholders left in env files.
const PLACEHOLDER_KEY: &str = "your-api-key-here";

/// Environment variable that overrides the stored OpenWeatherMap key.
pub const OPENWEATHER_KEY_VAR: &str = "OPENWEATHER_API_KEY";

/// Top-level configuration stored on disk.
///
/// The primary provider needs no credential; the only configurable value is
/// the secondary (OpenWeatherMap) API key. An absent, empty, or placeholder
/// key means the secondary provider is never attempted.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Example TOML:
    /// openweather_api_key = "..."
    pub openweather_api_key: Option<String>,
}

impl Config {
    /// The OpenWeatherMap key, if a usable one is configured.
    pub fn openweather_key(&self) -> Option<&str> {
        self.openweather_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && *key != PLACEHOLDER_KEY)
    }

    pub fn is_openweather_configured(&self) -> bool {
        self.openweather_key().is_some()
    }

    /// Apply the `OPENWEATHER_API_KEY` environment override, if set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = env::var(OPENWEATHER_KEY_VAR) {
            if !key.trim().is_empty() {
                self.openweather_api_key = Some(key);
            }
        }
        self
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
        let dirs = ProjectDirs::from("dev", "weather-dashboard", "weather-server")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
