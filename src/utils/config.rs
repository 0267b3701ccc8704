//! Configuration management
//!
//! Provides one file-backed configuration for the model, the runtime
//! device and image sampling.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::model::GanConfig;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Model hyperparameters shared by generator and discriminator
    pub model: GanConfig,
    /// Runtime configuration
    pub runtime: RuntimeConfig,
    /// Sampling configuration
    pub sampling: SamplingConfig,
}

/// Runtime-related configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Device: "cpu" or "cuda"
    pub device: String,
    /// Seed for libtorch's RNG (parameter init and latent sampling)
    pub seed: Option<i64>,
}

/// Image sampling configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Number of images to generate
    pub num_samples: i64,
    /// Images per row in the saved grid
    pub grid_columns: i64,
    /// Output image path
    pub output: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: GanConfig::default(),
            runtime: RuntimeConfig {
                device: "cpu".to_string(),
                seed: None,
            },
            sampling: SamplingConfig {
                num_samples: 64,
                grid_columns: 8,
                output: "samples.png".to_string(),
            },
        }
    }
}

impl Config {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from TOML file
    pub fn from_toml(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_toml(&self, path: &str) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from JSON file
    pub fn from_json(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to JSON file
    pub fn save_json(&self, path: &str) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load from TOML or JSON depending on the file extension
    pub fn load(path: &str) -> anyhow::Result<Self> {
        if path.ends_with(".toml") {
            Self::from_toml(path)
        } else {
            Self::from_json(path)
        }
    }

    /// Save as TOML or JSON depending on the file extension
    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        if path.ends_with(".toml") {
            self.save_toml(path)
        } else {
            self.save_json(path)
        }
    }

    /// Get device from configuration
    pub fn get_device(&self) -> tch::Device {
        match self.runtime.device.to_lowercase().as_str() {
            "cuda" | "gpu" => {
                if tch::Cuda::is_available() {
                    tch::Device::Cuda(0)
                } else {
                    tracing::warn!("CUDA requested but not available, falling back to CPU");
                    tch::Device::Cpu
                }
            }
            _ => tch::Device::Cpu,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        self.model.validate()?;
        if self.sampling.num_samples <= 0 {
            anyhow::bail!("Number of samples must be > 0");
        }
        if self.sampling.grid_columns <= 0 {
            anyhow::bail!("Grid columns must be > 0");
        }
        Ok(())
    }
}

/// Create default configuration file if it doesn't exist
pub fn ensure_config_exists(path: &str) -> anyhow::Result<Config> {
    if Path::new(path).exists() {
        Config::load(path)
    } else {
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }
}
