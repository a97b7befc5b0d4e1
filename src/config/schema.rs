//! Configuration schema for Boss
//!
//! Configuration is stored at `~/.config/boss/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Git transport settings
    pub git: GitConfig,

    /// Repository cache settings
    pub cache: CacheConfig,

    /// Compiler settings
    pub compiler: CompilerConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Git settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    /// Git executable
    pub binary: String,

    /// Clone every dependency over SSH
    pub prefer_ssh: bool,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            binary: "git".to_string(),
            prefer_ssh: false,
        }
    }
}

/// Cache of bare repository mirrors
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache root (defaults to the OS cache directory)
    pub dir: Option<PathBuf>,
}

/// Delphi compiler settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Build dependencies after install
    pub enabled: bool,

    /// Build driver executable
    pub command: String,

    /// Extra arguments appended to every build
    pub args: Vec<String>,

    /// Target platform, e.g. Win32 or Win64
    pub platform: String,

    /// Build configuration, e.g. Release or Debug
    pub configuration: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: "msbuild".to_string(),
            args: vec![],
            platform: "Win32".to_string(),
            configuration: "Release".to_string(),
        }
    }
}
