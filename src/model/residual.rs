//! Multi-kernel convolution block
//!
//! Three parallel convolutions with kernel sizes 3, 5 and 7 look at the same
//! input through different receptive fields. Their outputs are concatenated
//! along the channel dimension, so the spatial size is preserved and the
//! channel count grows to `O + O/2 + O/4` for a requested output `O`.

use tch::{nn, nn::Module, Tensor};

use crate::error::{Error, Result};

/// Kernel size and padding of each branch
const BRANCHES: [(i64, i64); 3] = [(3, 1), (5, 2), (7, 3)];

/// Three same-size convolutions whose outputs are concatenated
#[derive(Debug)]
pub struct ResidualBlock {
    /// Branch convolutions, smallest kernel first
    branches: Vec<nn::Conv2D>,
    in_channels: i64,
    branch_channels: [i64; 3],
}

impl ResidualBlock {
    /// Create a new block
    ///
    /// The branches produce `output_layers`, `output_layers / 2` and
    /// `output_layers / 4` channels respectively (integer division).
    pub fn new(vs: &nn::Path, input_layers: i64, output_layers: i64) -> Result<Self> {
        if input_layers <= 0 {
            return Err(Error::ConfigError(format!(
                "residual block needs input channels > 0, got {}",
                input_layers
            )));
        }
        if output_layers < 4 {
            return Err(Error::ConfigError(format!(
                "residual block needs output_layers >= 4 so every branch has channels, got {}",
                output_layers
            )));
        }

        let branch_channels = [output_layers, output_layers / 2, output_layers / 4];

        let branches = BRANCHES
            .iter()
            .zip(branch_channels.iter())
            .map(|(&(kernel, padding), &channels)| {
                nn::conv2d(
                    vs / format!("conv{}", kernel),
                    input_layers,
                    channels,
                    kernel,
                    nn::ConvConfig {
                        stride: 1,
                        padding,
                        ..Default::default()
                    },
                )
            })
            .collect();

        Ok(Self {
            branches,
            in_channels: input_layers,
            branch_channels,
        })
    }

    /// Output channels of each branch
    pub fn branch_channels(&self) -> [i64; 3] {
        self.branch_channels
    }

    /// Total output channels after concatenation
    pub fn out_channels(&self) -> i64 {
        self.branch_channels.iter().sum()
    }

    /// Expected input channels
    pub fn in_channels(&self) -> i64 {
        self.in_channels
    }
}

impl Module for ResidualBlock {
    fn forward(&self, xs: &Tensor) -> Tensor {
        let outputs: Vec<Tensor> = self.branches.iter().map(|conv| xs.apply(conv)).collect();
        Tensor::cat(&outputs, 1)
    }
}
