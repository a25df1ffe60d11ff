//! Configuration for nnue-eval.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::EvalResult;

/// Main configuration for nnue-eval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Evaluation model settings.
    #[serde(default)]
    pub eval: EvalConfig,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

/// Evaluation model settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvalConfig {
    /// Parameter file loaded at startup.
    #[serde(default = "default_eval_file")]
    pub eval_file: PathBuf,

    /// Destination used when parameters are written back out.
    #[serde(default = "default_save_file")]
    pub save_file: PathBuf,

    /// Report a successful load without reading anything.
    ///
    /// Lets the surrounding system run without a model present.
    #[serde(default)]
    pub skip_loading_eval: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            eval_file: default_eval_file(),
            save_file: default_save_file(),
            skip_loading_eval: false,
        }
    }
}

fn default_eval_file() -> PathBuf {
    PathBuf::from("nn.bin")
}

fn default_save_file() -> PathBuf {
    PathBuf::from("nn.bin")
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> EvalResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> EvalResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Creates default configuration.
    pub fn default_config() -> Self {
        Self {
            general: GeneralConfig::default(),
            eval: EvalConfig::default(),
        }
    }

    /// Tries to load configuration from current directory or uses default.
    pub fn load_or_default() -> Self {
        Self::load("nnue.toml").unwrap_or_else(|_| Self::default_config())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}
