//! Configuration loading.
//!
//! Mirrors `localgpt::config::Config`'s shape: a TOML tree deserialized with
//! `serde`, every field defaulted so unknown or absent keys never fail a
//! load, resolved XDG paths threaded in separately rather than serialized.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::MemoryCoreError;
use crate::paths::Paths;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Resolved XDG-compliant paths (not serialized).
    #[serde(skip)]
    pub paths: Paths,

    #[serde(default)]
    pub memory: MemoryCoreConfig,

    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: Paths {
                config_dir: Path::new(".").into(),
                storage_dir: Path::new(".").into(),
            },
            memory: MemoryCoreConfig::default(),
            providers: ProvidersConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Tuning knobs for the observation journal pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryCoreConfig {
    /// Approximate session tokens before the Observer is triggered.
    #[serde(default = "default_observer_threshold")]
    pub observer_threshold: usize,

    /// Approximate journal tokens before the Reflector is triggered.
    #[serde(default = "default_reflector_threshold")]
    pub reflector_threshold: usize,

    /// Per-entry sanitizer character budget.
    #[serde(default = "default_max_entry_chars")]
    pub max_entry_chars: usize,

    /// Directory permission bits applied to the storage directory on POSIX.
    #[serde(default = "default_dir_mode")]
    pub dir_mode: u32,
}

impl Default for MemoryCoreConfig {
    fn default() -> Self {
        Self {
            observer_threshold: default_observer_threshold(),
            reflector_threshold: default_reflector_threshold(),
            max_entry_chars: default_max_entry_chars(),
            dir_mode: default_dir_mode(),
        }
    }
}

fn default_observer_threshold() -> usize {
    30_000
}
fn default_reflector_threshold() -> usize {
    40_000
}
fn default_max_entry_chars() -> usize {
    2_000
}
fn default_dir_mode() -> u32 {
    0o700
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub anthropic: Option<ProviderConfig>,
    #[serde(default)]
    pub openai: Option<ProviderConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_base_url() -> String {
    String::new()
}
fn default_model() -> String {
    "claude-haiku-4-5".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from `paths.config_dir/config.toml`, falling back
    /// to defaults when the file does not exist.
    pub fn load(paths: Paths) -> Result<Self> {
        let config_path = paths.config_dir.join("config.toml");

        let mut config: Config = if config_path.exists() {
            let raw = fs::read_to_string(&config_path)?;
            toml::from_str(&raw).map_err(|e| MemoryCoreError::InvalidConfig(config_path.clone(), e.to_string()))?
        } else {
            Config::default()
        };

        config.paths = paths;
        Ok(config)
    }

    pub fn storage_path(&self) -> &Path {
        &self.paths.storage_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_file_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = Paths {
            config_dir: tmp.path().to_path_buf(),
            storage_dir: tmp.path().join("storage"),
        };
        let config = Config::load(paths).unwrap();
        assert_eq!(config.memory.observer_threshold, 30_000);
        assert_eq!(config.memory.reflector_threshold, 40_000);
    }

    #[test]
    fn partial_toml_keeps_unspecified_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            "[memory]\nobserver_threshold = 500\n",
        )
        .unwrap();
        let paths = Paths {
            config_dir: tmp.path().to_path_buf(),
            storage_dir: tmp.path().join("storage"),
        };
        let config = Config::load(paths).unwrap();
        assert_eq!(config.memory.observer_threshold, 500);
        assert_eq!(config.memory.reflector_threshold, 40_000);
    }
}
