//! Discriminator network
//!
//! Scores 32x32 images with seven spectrally normalized convolutions and a
//! spectrally normalized linear head. Stride-2 convolutions halve the spatial
//! size three times (32 -> 16 -> 8 -> 4). The score is a raw logit.

use tch::{nn, nn::ModuleT, Tensor};
use tracing::debug;

use super::config::GanConfig;
use super::spectral_norm::{SnConv2d, SnLinear};
use super::stages::StageShape;
use crate::error::{Error, Result};

/// (output channels, kernel size, stride) of each convolution
const CONV_SCHEDULE: [(i64, i64, i64); 7] = [
    (64, 3, 1),
    (64, 4, 2),
    (128, 3, 1),
    (128, 4, 2),
    (256, 3, 1),
    (256, 4, 2),
    (512, 3, 1),
];

fn leaky_relu(xs: &Tensor, slope: f64) -> Tensor {
    xs.clamp_min(0.0) + xs.clamp_max(0.0) * slope
}

/// Discriminator network
///
/// Architecture:
/// 1. Seven SN-Conv2d layers, each followed by LeakyReLU(leak)
/// 2. Flatten to bottom_width * bottom_width * 512 features
/// 3. SN-Linear to a single unbounded score
#[derive(Debug)]
pub struct Discriminator {
    convs: Vec<SnConv2d>,
    fc: SnLinear,
    config: GanConfig,
    flat_features: i64,
}

impl Discriminator {
    /// Create a new Discriminator network
    pub fn new(vs: &nn::Path, config: &GanConfig) -> Result<Self> {
        config.validate()?;

        let mut convs = Vec::with_capacity(CONV_SCHEDULE.len());
        let mut in_channels = config.image_channels;

        for (i, &(out_channels, kernel, stride)) in CONV_SCHEDULE.iter().enumerate() {
            convs.push(SnConv2d::new(
                &(vs / format!("conv{}", i + 1)),
                in_channels,
                out_channels,
                kernel,
                nn::ConvConfig {
                    stride,
                    padding: 1,
                    ..Default::default()
                },
                config.power_iterations,
            ));
            in_channels = out_channels;
        }

        let flat_features = config.bottom_width * config.bottom_width * in_channels;
        let fc = SnLinear::new(&(vs / "fc"), flat_features, 1, config.power_iterations);

        debug!(
            "Built discriminator with {} convolutions ({} flattened features)",
            convs.len(),
            flat_features
        );

        Ok(Self {
            convs,
            fc,
            config: config.clone(),
            flat_features,
        })
    }

    /// Run every stage, handing each named intermediate output to `inspect`
    fn run<F>(&self, input: &Tensor, train: bool, mut inspect: F) -> Tensor
    where
        F: FnMut(&dyn Fn() -> String, &Tensor),
    {
        let mut xs = input.shallow_clone();
        for (i, conv) in self.convs.iter().enumerate() {
            xs = conv.forward_t(&xs, train);
            inspect(&|| format!("conv{}", i + 1), &xs);
            xs = leaky_relu(&xs, self.config.leak);
            inspect(&|| format!("lrelu{}", i + 1), &xs);
        }

        let xs = xs.view([-1, self.flat_features]);
        inspect(&|| "flatten".to_string(), &xs);
        let scores = self.fc.forward_t(&xs, train);
        inspect(&|| "fc".to_string(), &scores);
        scores
    }

    /// Forward pass
    ///
    /// # Arguments
    ///
    /// * `input` - Tensor of shape (batch_size, image_channels, 32, 32)
    /// * `train` - Whether in training mode (updates the spectral norm estimates)
    ///
    /// # Returns
    ///
    /// Tensor of shape (batch_size, 1) with unbounded scores
    pub fn forward_t(&self, input: &Tensor, train: bool) -> Tensor {
        self.run(input, train, |_, _| {})
    }

    /// Score samples (inference mode)
    pub fn score(&self, input: &Tensor) -> Tensor {
        self.forward_t(input, false)
    }

    /// Score samples after checking they are (N, image_channels, 32, 32)
    pub fn try_score(&self, input: &Tensor) -> Result<Tensor> {
        let size = input.size();
        let [channels, height, width] = self.config.image_shape();
        let valid = matches!(
            size.as_slice(),
            [n, c, h, w] if *n > 0 && *c == channels && *h == height && *w == width
        );
        if !valid {
            return Err(Error::shape_mismatch(
                "discriminator input",
                &[-1, channels, height, width],
                &size,
            ));
        }
        Ok(self.score(input))
    }

    /// Output shape of every stage for the given image batch
    pub fn trace(&self, input: &Tensor, train: bool) -> Vec<StageShape> {
        let mut shapes = Vec::with_capacity(2 * self.convs.len() + 2);
        self.run(input, train, |name, xs| {
            shapes.push(StageShape {
                name: name(),
                shape: xs.size(),
            })
        });
        shapes
    }

    /// Current spectral norm estimate of every normalized layer's raw weight
    pub fn sigmas(&self) -> Vec<(String, f64)> {
        self.convs
            .iter()
            .enumerate()
            .map(|(i, conv)| (format!("conv{}", i + 1), conv.sigma()))
            .chain(std::iter::once(("fc".to_string(), self.fc.sigma())))
            .collect()
    }

    /// Number of features entering the linear head
    pub fn flat_features(&self) -> i64 {
        self.flat_features
    }

    /// Get configuration
    pub fn config(&self) -> &GanConfig {
        &self.config
    }
}

impl ModuleT for Discriminator {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Tensor {
        Discriminator::forward_t(self, xs, train)
    }
}
