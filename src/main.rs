//! Spectral GAN command line
//!
//! Main entry point providing CLI interface for:
//! - Writing a default configuration
//! - Printing the stage-by-stage shapes of both networks
//! - Sampling an image grid from a freshly initialised generator

use anyhow::Result;
use clap::{Parser, Subcommand};
use tch::{Device, Kind, Tensor};
use tracing::info;

use spectral_gan::{
    model::{Gan, StageShape},
    utils::{save_grid, setup_logging, Config},
};

/// Generator and spectrally normalized discriminator for 32x32 images
#[derive(Parser)]
#[command(name = "spectral_gan")]
#[command(version = "0.1.0")]
#[command(about = "Inspect and sample a spectrally normalized image GAN")]
struct Cli {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Verbosity level
    #[arg(short, long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize default configuration file
    Init {
        /// Output configuration file path
        #[arg(short, long, default_value = "config.toml")]
        output: String,
    },

    /// Log per-stage output shapes and parameter counts
    Summary {
        /// Batch size used for the shape trace
        #[arg(short, long, default_value = "1")]
        batch_size: i64,
    },

    /// Generate images and save them as a grid
    Sample {
        /// Number of images (overrides config)
        #[arg(short, long)]
        num_samples: Option<i64>,

        /// Output image path (overrides config)
        #[arg(short, long)]
        output: Option<String>,

        /// RNG seed (overrides config)
        #[arg(long)]
        seed: Option<i64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.verbosity)?;

    match cli.command {
        Commands::Init { output } => init_config(&output)?,
        Commands::Summary { batch_size } => {
            let config = load_config(&cli.config)?;
            summarize(&config, batch_size)?;
        }
        Commands::Sample {
            num_samples,
            output,
            seed,
        } => {
            let mut config = load_config(&cli.config)?;
            if let Some(n) = num_samples {
                config.sampling.num_samples = n;
            }
            if let Some(path) = output {
                config.sampling.output = path;
            }
            if seed.is_some() {
                config.runtime.seed = seed;
            }
            sample(&config)?;
        }
    }

    Ok(())
}

/// Load the configuration file, falling back to defaults when it is missing
fn load_config(path: &str) -> Result<Config> {
    let config = if std::path::Path::new(path).exists() {
        Config::load(path)?
    } else {
        info!("Config file {} not found, using defaults", path);
        Config::default()
    };
    config.validate()?;
    Ok(config)
}

fn build_gan(config: &Config) -> Result<Gan> {
    if let Some(seed) = config.runtime.seed {
        tch::manual_seed(seed);
    }
    let device = config.get_device();
    info!("Using device: {:?}", device);
    Ok(Gan::new(config.model.clone(), device)?)
}

/// Write the default configuration
fn init_config(output: &str) -> Result<()> {
    let config = Config::default();
    config.save(output)?;
    info!("Wrote default configuration to {}", output);
    Ok(())
}

/// Log the output shape of every stage of both networks
fn summarize(config: &Config, batch_size: i64) -> Result<()> {
    if batch_size <= 0 {
        anyhow::bail!("Batch size must be > 0");
    }

    let gan = build_gan(config)?;
    let device = gan.device;

    let z = Tensor::randn([batch_size, gan.latent_dim()], (Kind::Float, device));
    let images = tch::no_grad(|| gan.generator.generate(&z));

    info!("Generator3 (input {:?}):", z.size());
    log_shapes(&tch::no_grad(|| gan.generator.trace(&z, false)));

    info!("Discriminator (input {:?}):", images.size());
    log_shapes(&tch::no_grad(|| gan.discriminator.trace(&images, false)));

    for (name, sigma) in gan.discriminator.sigmas() {
        info!("  {:<12} sigma {:.4}", name, sigma);
    }

    let (gen_params, disc_params) = gan.parameter_counts();
    info!("Trainable parameters: generator {}, discriminator {}", gen_params, disc_params);

    Ok(())
}

fn log_shapes(shapes: &[StageShape]) {
    for stage in shapes {
        info!("  {:<12} {:?}", stage.name, stage.shape);
    }
}

/// Generate `num_samples` images and save them as one grid image
fn sample(config: &Config) -> Result<()> {
    let gan = build_gan(config)?;

    let num_samples = config.sampling.num_samples;
    info!("Generating {} samples", num_samples);
    let images = tch::no_grad(|| gan.generate(num_samples)).to_device(Device::Cpu);

    let min = images.min().double_value(&[]);
    let max = images.max().double_value(&[]);
    info!("Pixel range: [{:.4}, {:.4}]", min, max);

    save_grid(&images, config.sampling.grid_columns, &config.sampling.output)?;
    info!("Saved image grid to {}", config.sampling.output);

    Ok(())
}
