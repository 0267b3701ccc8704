//! Shared hyperparameters for the generator and discriminator

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Side length of generated and discriminated images
pub const IMAGE_SIZE: i64 = 32;

/// Number of stride-2 convolutions in the discriminator
const DOWNSAMPLING_STEPS: u32 = 3;

/// Hyperparameters threaded into both network constructors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GanConfig {
    /// Size of the latent noise vector
    pub latent_dim: i64,
    /// Channels of the image tensor (3 for RGB)
    pub image_channels: i64,
    /// Negative slope of the discriminator's leaky ReLU
    pub leak: f64,
    /// Spatial width reaching the discriminator's linear head
    pub bottom_width: i64,
    /// Power iteration rounds per spectral norm update
    pub power_iterations: usize,
}

impl Default for GanConfig {
    fn default() -> Self {
        Self {
            latent_dim: 128,
            image_channels: 3,
            leak: 0.1,
            bottom_width: 4,
            power_iterations: 1,
        }
    }
}

impl GanConfig {
    /// Create a configuration with the given latent size and default everything else
    pub fn with_latent_dim(latent_dim: i64) -> Self {
        Self {
            latent_dim,
            ..Default::default()
        }
    }

    /// Check that the hyperparameters describe a buildable network pair
    pub fn validate(&self) -> Result<()> {
        if self.latent_dim <= 0 {
            return Err(Error::ConfigError(format!(
                "latent_dim must be > 0, got {}",
                self.latent_dim
            )));
        }
        if self.image_channels <= 0 {
            return Err(Error::ConfigError(format!(
                "image_channels must be > 0, got {}",
                self.image_channels
            )));
        }
        if !(0.0..1.0).contains(&self.leak) {
            return Err(Error::ConfigError(format!(
                "leak must be in [0, 1), got {}",
                self.leak
            )));
        }
        let expected_width = IMAGE_SIZE / 2i64.pow(DOWNSAMPLING_STEPS);
        if self.bottom_width != expected_width {
            return Err(Error::ConfigError(format!(
                "bottom_width must be {} for {}x{} images, got {}",
                expected_width, IMAGE_SIZE, IMAGE_SIZE, self.bottom_width
            )));
        }
        if self.power_iterations == 0 {
            return Err(Error::ConfigError(
                "power_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Shape of a single image, without the batch dimension
    pub fn image_shape(&self) -> [i64; 3] {
        [self.image_channels, IMAGE_SIZE, IMAGE_SIZE]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = GanConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.image_shape(), [3, 32, 32]);
    }

    #[test]
    fn test_rejects_inconsistent_bottom_width() {
        let config = GanConfig {
            bottom_width: 8,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_rejects_bad_leak_and_latent() {
        let mut config = GanConfig::with_latent_dim(0);
        assert!(config.validate().is_err());

        config.latent_dim = 64;
        config.leak = 1.5;
        assert!(config.validate().is_err());

        config.leak = 0.2;
        assert!(config.validate().is_ok());
    }
}
