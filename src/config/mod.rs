//! Configuration management for Boss
//!
//! `config.toml` lives under the platform config dir unless `--config` or
//! `BOSS_CONFIG` points elsewhere. A missing file means defaults.

pub mod schema;

pub use schema::Config;

use crate::error::{BossError, BossResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Manager for `path`, or for `<config dir>/boss/config.toml`
    pub fn new(path: Option<PathBuf>) -> Self {
        let config_path = path.unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("boss")
                .join("config.toml")
        });
        Self { config_path }
    }

    /// Root of the bare repository mirrors
    pub fn cache_dir(config: &Config) -> PathBuf {
        config.cache.dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("boss")
        })
    }

    pub async fn load(&self) -> BossResult<Config> {
        let path = &self.config_path;
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| BossError::io(format!("reading config from {}", path.display()), e))?;
        toml::from_str(&content).map_err(|e| BossError::ConfigInvalid {
            path: path.clone(),
            reason: e.to_string(),
        })
    }

    /// Write `config`, creating the parent directory first
    pub async fn save(&self, config: &Config) -> BossResult<()> {
        let path = &self.config_path;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| BossError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let content = toml::to_string_pretty(config)?;
        fs::write(path, content)
            .await
            .map_err(|e| BossError::io(format!("writing config to {}", path.display()), e))?;

        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }
}
