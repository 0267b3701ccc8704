//! Generator network
//!
//! Turns a latent vector into a 32x32 image. The latent is viewed as a
//! `(latent_dim, 1, 1)` feature map and grown through four resize stages,
//! each followed by channel mixing, batch normalization and ReLU. A final
//! convolution maps to image channels and `tanh` bounds the output to [-1, 1].

use tch::{nn, nn::ModuleT, Device, Kind, Tensor};
use tracing::debug;

use super::config::{GanConfig, IMAGE_SIZE};
use super::interpolate::Interpolate;
use super::residual::ResidualBlock;
use super::stages::{Pipeline, StageShape};
use crate::error::{Error, Result};

/// Channels of the first feature map
const STEM_CHANNELS: i64 = 448;
/// Spatial size of the first feature map
const STEM_SIZE: i64 = 4;

/// (spatial size, requested block output) for stages 2..=4
const BLOCK_SCHEDULE: [(i64, i64); 3] = [(8, 112), (16, 49), (IMAGE_SIZE, 21)];

/// Generator network
///
/// Per-sample shapes:
/// 1. Resize to 4x4, Conv2d -> 448x4x4
/// 2. Resize to 8x8, ResidualBlock(448, 112) -> 196x8x8
/// 3. Resize to 16x16, ResidualBlock(196, 49) -> 85x16x16
/// 4. Resize to 32x32, ResidualBlock(85, 21) -> 36x32x32
/// 5. Conv2d -> image_channels x 32 x 32, tanh
#[derive(Debug)]
pub struct Generator3 {
    model: Pipeline,
    config: GanConfig,
}

impl Generator3 {
    /// Create a new Generator network
    pub fn new(vs: &nn::Path, config: &GanConfig) -> Result<Self> {
        config.validate()?;

        let conv_config = nn::ConvConfig {
            stride: 1,
            padding: 1,
            ..Default::default()
        };

        let mut model = Pipeline::new()
            .add("upsample1", Interpolate::bilinear(STEM_SIZE, STEM_SIZE))
            .add(
                "conv1",
                nn::conv2d(vs / "conv1", config.latent_dim, STEM_CHANNELS, 3, conv_config),
            )
            .add(
                "bn1",
                nn::batch_norm2d(vs / "bn1", STEM_CHANNELS, Default::default()),
            )
            .add_fn("relu1", |xs| xs.relu());

        let mut channels = STEM_CHANNELS;
        for (i, &(size, output_layers)) in BLOCK_SCHEDULE.iter().enumerate() {
            let stage = i + 2;
            let block = ResidualBlock::new(&(vs / format!("block{}", stage)), channels, output_layers)?;
            channels = block.out_channels();

            model = model
                .add(format!("upsample{}", stage), Interpolate::bilinear(size, size))
                .add(format!("block{}", stage), block)
                .add(
                    format!("bn{}", stage),
                    nn::batch_norm2d(vs / format!("bn{}", stage), channels, Default::default()),
                )
                .add_fn(format!("relu{}", stage), |xs| xs.relu());
        }

        let model = model
            .add(
                "to_image",
                nn::conv2d(vs / "to_image", channels, config.image_channels, 3, conv_config),
            )
            .add_fn("tanh", |xs| xs.tanh());

        debug!(
            "Built generator with {} stages (latent_dim={})",
            model.len(),
            config.latent_dim
        );

        Ok(Self {
            model,
            config: config.clone(),
        })
    }

    /// Generate images from latent vectors
    ///
    /// # Arguments
    ///
    /// * `z` - Tensor of shape (batch_size, latent_dim)
    /// * `train` - Whether in training mode (affects batch norm)
    ///
    /// # Returns
    ///
    /// Tensor of shape (batch_size, image_channels, 32, 32) with values in [-1, 1]
    pub fn forward_t(&self, z: &Tensor, train: bool) -> Tensor {
        let z = z.view([-1, self.config.latent_dim, 1, 1]);
        self.model.forward_t(&z, train)
    }

    /// Generate samples (inference mode)
    pub fn generate(&self, z: &Tensor) -> Tensor {
        self.forward_t(z, false)
    }

    /// Generate samples after checking the latent can be viewed as `(-1, latent_dim)`
    pub fn try_generate(&self, z: &Tensor) -> Result<Tensor> {
        let latent_dim = self.config.latent_dim;
        let numel = z.numel() as i64;
        if numel == 0 || numel % latent_dim != 0 {
            return Err(Error::shape_mismatch(
                "generator latent",
                &[-1, latent_dim],
                &z.size(),
            ));
        }
        Ok(self.generate(z))
    }

    /// Generate random samples
    ///
    /// # Arguments
    ///
    /// * `num_samples` - Number of samples to generate
    /// * `device` - Device to create tensors on
    pub fn generate_random(&self, num_samples: i64, device: Device) -> Tensor {
        let z = Tensor::randn([num_samples, self.config.latent_dim], (Kind::Float, device));
        self.generate(&z)
    }

    /// Output shape of every stage for the given latent batch
    pub fn trace(&self, z: &Tensor, train: bool) -> Vec<StageShape> {
        let z = z.view([-1, self.config.latent_dim, 1, 1]);
        self.model.trace(&z, train)
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

impl ModuleT for Generator3 {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Tensor {
        Generator3::forward_t(self, xs, train)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::nn::VarStore;

    fn build(latent_dim: i64) -> (VarStore, Generator3) {
        let vs = VarStore::new(Device::Cpu);
        let gen = Generator3::new(&vs.root(), &GanConfig::with_latent_dim(latent_dim)).unwrap();
        (vs, gen)
    }

    #[test]
    fn test_generator_output_shape_and_range() {
        let (_vs, gen) = build(128);

        let z = Tensor::randn([4, 128], (Kind::Float, Device::Cpu));
        let output = gen.generate(&z);

        assert_eq!(output.size(), vec![4, 3, 32, 32]);
        assert!(output.min().double_value(&[]) >= -1.0);
        assert!(output.max().double_value(&[]) <= 1.0);
    }

    #[test]
    fn test_stage_shapes_follow_schedule() {
        let (_vs, gen) = build(128);

        let z = Tensor::randn([2, 128], (Kind::Float, Device::Cpu));
        let shapes = gen.trace(&z, false);
        let shape_of = |name: &str| {
            shapes
                .iter()
                .find(|s| s.name == name)
                .map(|s| s.shape.clone())
                .unwrap()
        };

        assert_eq!(shape_of("upsample1"), vec![2, 128, 4, 4]);
        assert_eq!(shape_of("relu1"), vec![2, 448, 4, 4]);
        assert_eq!(shape_of("relu2"), vec![2, 196, 8, 8]);
        assert_eq!(shape_of("relu3"), vec![2, 85, 16, 16]);
        assert_eq!(shape_of("relu4"), vec![2, 36, 32, 32]);
        assert_eq!(shape_of("tanh"), vec![2, 3, 32, 32]);
    }

    #[test]
    fn test_inference_is_deterministic() {
        let (_vs, gen) = build(32);

        let z = Tensor::randn([3, 32], (Kind::Float, Device::Cpu));
        let first = gen.generate(&z);
        let second = gen.generate(&z);

        assert!(first.allclose(&second, 1e-6, 1e-6, false));
    }

    #[test]
    fn test_accepts_four_dimensional_latent() {
        let (_vs, gen) = build(16);

        let z = Tensor::randn([2, 16, 1, 1], (Kind::Float, Device::Cpu));
        let output = gen.try_generate(&z).unwrap();

        assert_eq!(output.size(), vec![2, 3, 32, 32]);
    }

    #[test]
    fn test_rejects_mismatched_latent() {
        let (_vs, gen) = build(128);

        let z = Tensor::randn([2, 100], (Kind::Float, Device::Cpu));
        assert!(matches!(
            gen.try_generate(&z),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_generate_random() {
        let (_vs, gen) = build(64);

        let output = gen.generate_random(2, Device::Cpu);
        assert_eq!(output.size(), vec![2, 3, 32, 32]);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let vs = VarStore::new(Device::Cpu);
        let config = GanConfig {
            image_channels: 0,
            ..Default::default()
        };

        assert!(Generator3::new(&vs.root(), &config).is_err());
    }
}
