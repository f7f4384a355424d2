// Global configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::engine::{DEFAULT_FFMPEG, EncodeOptions};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// FFmpeg executable used when a job does not name one
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,

    /// Directory for pass-log files when a job keeps the system temp dir
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,

    /// Override for the platform null sink (`NUL` / `/dev/null`)
    #[serde(default)]
    pub null_sink: Option<String>,

    /// Number of threads used by `batch`
    #[serde(default = "default_max_workers")]
    pub max_workers: u32,

    /// Print plans as JSON unless told otherwise
    #[serde(default)]
    pub json: bool,
}

fn default_ffmpeg() -> String {
    DEFAULT_FFMPEG.to_string()
}

fn default_max_workers() -> u32 {
    4
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            temp_dir: None,
            null_sink: None,
            max_workers: default_max_workers(),
            json: false,
        }
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "macos") {
            dirs::home_dir()
                .context("Could not determine home directory")?
                .join(".config")
                .join("ffplan")
        } else {
            dirs::config_dir()
                .context("Could not determine config directory")?
                .join("ffplan")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from disk, or create default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Config::default();

            // A read-only config dir should not stop planning
            if let Err(e) = config.save() {
                warn!(
                    "Could not create default config file: {:#}. Using built-in defaults; run 'ffplan init-config' to create one.",
                    e
                );
            }

            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save config to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Check if config file exists
    pub fn exists() -> bool {
        Self::config_path().map(|p| p.exists()).unwrap_or(false)
    }

    /// Create a default config file if it doesn't exist
    pub fn ensure_default() -> Result<()> {
        if !Self::exists() {
            let config = Config::default();
            config.save()?;
        }
        Ok(())
    }

    /// Apply config defaults to options that still carry the built-in values
    pub fn fill_defaults(&self, opts: &mut EncodeOptions) {
        if opts.ffmpeg == DEFAULT_FFMPEG {
            opts.ffmpeg = self.defaults.ffmpeg.clone();
        }
        if let Some(temp_dir) = &self.defaults.temp_dir {
            if opts.temp_dir == std::env::temp_dir() {
                opts.temp_dir = temp_dir.clone();
            }
        }
    }

    /// Null sink to inject into plans, honoring the override
    pub fn null_sink(&self) -> String {
        self.defaults
            .null_sink
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| crate::engine::platform::null_sink().to_string())
    }
}
