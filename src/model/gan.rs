//! GAN wrapper combining Generator3 and Discriminator
//!
//! Owns one `VarStore` per network so external training code can build a
//! separate optimizer for each side.

use tch::{nn::VarStore, Device, Kind, Tensor};
use tracing::info;

use super::config::GanConfig;
use super::discriminator::Discriminator;
use super::generator::Generator3;
use crate::error::{Error, Result};

/// Generator and discriminator pair
pub struct Gan {
    /// Generator network
    pub generator: Generator3,
    /// Discriminator network
    pub discriminator: Discriminator,
    /// Variable store for generator
    pub gen_vs: VarStore,
    /// Variable store for discriminator
    pub disc_vs: VarStore,
    /// Device (CPU/GPU)
    pub device: Device,
    config: GanConfig,
}

impl Gan {
    /// Create both networks on `device` from one shared configuration
    pub fn new(config: GanConfig, device: Device) -> Result<Self> {
        let gen_vs = VarStore::new(device);
        let disc_vs = VarStore::new(device);

        let generator = Generator3::new(&gen_vs.root(), &config)?;
        let discriminator = Discriminator::new(&disc_vs.root(), &config)?;

        let gan = Self {
            generator,
            discriminator,
            gen_vs,
            disc_vs,
            device,
            config,
        };

        let (gen_params, disc_params) = gan.parameter_counts();
        info!(
            "Created GAN on {:?}: generator {} params, discriminator {} params",
            device, gen_params, disc_params
        );

        Ok(gan)
    }

    /// Create a GAN with default hyperparameters and the given latent size
    pub fn with_latent_dim(latent_dim: i64, device: Device) -> Result<Self> {
        Self::new(GanConfig::with_latent_dim(latent_dim), device)
    }

    /// Generate synthetic images
    ///
    /// # Returns
    ///
    /// Tensor of shape (num_samples, image_channels, 32, 32)
    pub fn generate(&self, num_samples: i64) -> Tensor {
        self.generator.generate_random(num_samples, self.device)
    }

    /// Generate images from specific latent vectors
    pub fn generate_from_noise(&self, noise: &Tensor) -> Result<Tensor> {
        self.generator.try_generate(&noise.to_device(self.device))
    }

    /// Score images with the discriminator (raw logits)
    pub fn score(&self, images: &Tensor) -> Result<Tensor> {
        self.discriminator.try_score(&images.to_device(self.device))
    }

    /// Interpolate between two points in latent space
    ///
    /// # Arguments
    ///
    /// * `z1` - First latent vector
    /// * `z2` - Second latent vector
    /// * `steps` - Number of interpolation steps, endpoints included
    ///
    /// # Returns
    ///
    /// Tensor of shape (steps, image_channels, 32, 32)
    pub fn interpolate(&self, z1: &Tensor, z2: &Tensor, steps: i64) -> Result<Tensor> {
        if steps < 1 {
            return Err(Error::InvalidInput(format!(
                "interpolation needs at least one step, got {}",
                steps
            )));
        }

        let latent_dim = self.latent_dim();
        for z in [z1, z2] {
            if z.numel() as i64 != latent_dim {
                return Err(Error::shape_mismatch(
                    "interpolation endpoint",
                    &[latent_dim],
                    &z.size(),
                ));
            }
        }

        let z1 = z1.view([1, latent_dim]).to_device(self.device);
        let z2 = z2.view([1, latent_dim]).to_device(self.device);
        let alphas = Tensor::linspace(0.0, 1.0, steps, (Kind::Float, self.device)).unsqueeze(1);

        let z = &z1 + (&z2 - &z1) * alphas;
        Ok(self.generator.generate(&z))
    }

    /// Number of trainable parameters as (generator, discriminator)
    pub fn parameter_counts(&self) -> (i64, i64) {
        (count_parameters(&self.gen_vs), count_parameters(&self.disc_vs))
    }

    /// Get latent dimension
    pub fn latent_dim(&self) -> i64 {
        self.config.latent_dim
    }

    /// Get configuration
    pub fn config(&self) -> &GanConfig {
        &self.config
    }
}

fn count_parameters(vs: &VarStore) -> i64 {
    vs.trainable_variables()
        .iter()
        .map(|t| t.numel() as i64)
        .sum()
}
