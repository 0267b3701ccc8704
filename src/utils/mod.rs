//! Utility module with helper functions
//!
//! This module provides:
//! - Configuration handling
//! - Logging setup
//! - Image grid output for generated samples

mod config;
pub mod image;
mod logging;

pub use config::{ensure_config_exists, Config, RuntimeConfig, SamplingConfig};
pub use image::{save_grid, to_grid};
pub use logging::setup_logging;
