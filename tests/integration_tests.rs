//! Integration tests for the spectral GAN library.

use std::collections::HashMap;

use spectral_gan::{Discriminator, Gan, GanConfig, Generator3};
use tch::{nn::VarStore, Device, Kind, Tensor};

#[test]
fn test_generator_feeds_discriminator() {
    tch::manual_seed(42);
    let config = GanConfig::with_latent_dim(128);

    let gen_vs = VarStore::new(Device::Cpu);
    let disc_vs = VarStore::new(Device::Cpu);
    let generator = Generator3::new(&gen_vs.root(), &config).unwrap();
    let discriminator = Discriminator::new(&disc_vs.root(), &config).unwrap();

    let z = Tensor::randn([2, 128], (Kind::Float, Device::Cpu));
    let images = generator.try_generate(&z).unwrap();

    assert_eq!(images.size(), vec![2, 3, 32, 32]);
    assert!(images.min().double_value(&[]) >= -1.0);
    assert!(images.max().double_value(&[]) <= 1.0);

    let scores = discriminator.try_score(&images).unwrap();
    assert_eq!(scores.size(), vec![2, 1]);
}

#[test]
fn test_training_mode_forward_produces_gradients_everywhere() {
    tch::manual_seed(0);
    let gan = Gan::with_latent_dim(32, Device::Cpu).unwrap();

    let z = Tensor::randn([2, 32], (Kind::Float, Device::Cpu));
    let images = gan.generator.forward_t(&z, true);
    let loss = gan.discriminator.forward_t(&images, true).mean(Kind::Float);
    loss.backward();

    // Every generator parameter, including all residual block branches,
    // is persistent and receives a gradient.
    for (name, var) in gan.gen_vs.variables() {
        if var.requires_grad() {
            assert!(var.grad().defined(), "no gradient for {}", name);
        }
    }
    for var in gan.disc_vs.trainable_variables() {
        assert!(var.grad().defined());
    }
}

#[test]
fn test_same_seed_same_images() {
    let generate = || {
        tch::manual_seed(1234);
        let gan = Gan::with_latent_dim(16, Device::Cpu).unwrap();
        tch::no_grad(|| gan.generate(2))
    };

    let first = generate();
    let second = generate();
    assert!(first.allclose(&second, 1e-6, 1e-6, false));
}

#[test]
fn test_power_iteration_runs_only_in_training_mode() {
    tch::manual_seed(3);
    let gan = Gan::with_latent_dim(16, Device::Cpu).unwrap();
    let images = Tensor::rand([2, 3, 32, 32], (Kind::Float, Device::Cpu)) * 2.0 - 1.0;

    let buffers = |vs: &VarStore| -> HashMap<String, Tensor> {
        vs.variables()
            .into_iter()
            .filter(|(name, _)| name.ends_with(".u") || name.ends_with(".v"))
            .map(|(name, t)| (name, t.copy()))
            .collect()
    };

    let before = buffers(&gan.disc_vs);
    assert_eq!(before.len(), 16);

    let eval_a = tch::no_grad(|| gan.discriminator.forward_t(&images, false));
    let eval_b = tch::no_grad(|| gan.discriminator.forward_t(&images, false));
    assert!(eval_a.equal(&eval_b));
    assert!(buffers(&gan.disc_vs)
        .iter()
        .all(|(name, t)| before[name].equal(t)));

    // The single-output head is already converged; some estimate must move.
    let _ = tch::no_grad(|| gan.discriminator.forward_t(&images, true));
    let after = buffers(&gan.disc_vs);
    assert!(after.iter().any(|(name, t)| !before[name].equal(t)));
}

#[test]
fn test_invalid_configuration_fails_at_construction() {
    let config = GanConfig {
        bottom_width: 5,
        ..Default::default()
    };

    assert!(Gan::new(config, Device::Cpu).is_err());
}
