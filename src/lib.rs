//! # Spectral GAN for 32x32 Images
//!
//! Generator and spectrally normalized discriminator for an image GAN,
//! built on `tch` (libtorch).
//!
//! ## Modules
//!
//! - `model`: Generator3, Discriminator and their building blocks
//! - `utils`: Configuration files, logging and image grid output
//! - `error`: Error type shared by the library
//!
//! ## Example
//!
//! ```no_run
//! use spectral_gan::{Discriminator, GanConfig, Generator3};
//! use tch::{nn::VarStore, Device, Kind, Tensor};
//!
//! fn main() -> spectral_gan::Result<()> {
//!     let config = GanConfig::default();
//!     let gen_vs = VarStore::new(Device::Cpu);
//!     let disc_vs = VarStore::new(Device::Cpu);
//!
//!     let generator = Generator3::new(&gen_vs.root(), &config)?;
//!     let discriminator = Discriminator::new(&disc_vs.root(), &config)?;
//!
//!     let z = Tensor::randn([2, config.latent_dim], (Kind::Float, Device::Cpu));
//!     let images = generator.try_generate(&z)?; // (2, 3, 32, 32)
//!     let scores = discriminator.try_score(&images)?; // (2, 1)
//!     println!("{:?}", scores.size());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod model;
pub mod utils;

pub use error::{Error, Result};
pub use model::{
    Discriminator, Gan, GanConfig, Generator3, Interpolate, Pipeline, ResidualBlock, SnConv2d,
    SnLinear, SpectralNorm, StageShape,
};
pub use utils::{setup_logging, Config};
