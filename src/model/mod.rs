//! Model module containing the GAN architecture components
//!
//! This module provides:
//! - Generator3 turning latent vectors into 32x32 images
//! - Spectrally normalized Discriminator scoring those images
//! - Building blocks: bilinear Interpolate, multi-kernel ResidualBlock,
//!   spectral normalization and a named stage pipeline
//! - Gan wrapper owning both networks

mod config;
mod discriminator;
mod gan;
mod generator;
mod interpolate;
mod residual;
mod spectral_norm;
mod stages;

pub use config::{GanConfig, IMAGE_SIZE};
pub use discriminator::Discriminator;
pub use gan::Gan;
pub use generator::Generator3;
pub use interpolate::Interpolate;
pub use residual::ResidualBlock;
pub use spectral_norm::{SnConv2d, SnLinear, SpectralNorm};
pub use stages::{Pipeline, StageShape};
