//! Spectral normalization for convolution and linear weights
//!
//! Divides a layer's weight by an estimate of its largest singular value so
//! the layer is (approximately) 1-Lipschitz. The estimate comes from power
//! iteration on two persistent vectors `u` and `v` that live in the
//! `VarStore` as non-trainable buffers.
//!
//! The vectors are refined by a few warm-up rounds at construction, so a
//! freshly built layer is already normalized. In training mode every forward
//! pass refines `u` and `v` before normalizing; in inference mode the stored
//! vectors are used as-is, so repeated calls give identical results.

use tch::{nn, nn::ModuleT, Kind, Tensor};

const EPS: f64 = 1e-12;

/// Power-iteration rounds run once when the buffers are created
const WARMUP_ITERATIONS: usize = 15;

fn l2_normalize(xs: &Tensor) -> Tensor {
    xs / (xs.norm() + EPS)
}

/// Power-iteration state for one weight tensor
#[derive(Debug)]
pub struct SpectralNorm {
    /// Left singular vector estimate, length = output dim
    u: Tensor,
    /// Right singular vector estimate, length = fan-in
    v: Tensor,
    power_iterations: usize,
}

impl SpectralNorm {
    /// Register `u` and `v` buffers sized for `weight` under `vs`
    ///
    /// The buffers start from random unit vectors and are refined against
    /// `weight` before returning.
    pub fn new(vs: &nn::Path, weight: &Tensor, power_iterations: usize) -> Self {
        let height = weight.size()[0];
        let width = weight.numel() as i64 / height;
        let device = vs.device();

        let mut u = vs.zeros_no_train("u", &[height]);
        let mut v = vs.zeros_no_train("v", &[width]);
        tch::no_grad(|| {
            u.copy_(&l2_normalize(&Tensor::randn([height], (Kind::Float, device))));
            v.copy_(&l2_normalize(&Tensor::randn([width], (Kind::Float, device))));
        });

        let norm = Self {
            u,
            v,
            power_iterations,
        };
        norm.iterate(&weight.view([height, -1]), WARMUP_ITERATIONS);
        norm
    }

    /// Weight divided by its estimated spectral norm
    ///
    /// Gradients flow through both `weight_bar` and the norm estimate; the
    /// power iteration itself runs without gradient tracking.
    pub fn normalized_weight(&self, weight_bar: &Tensor, train: bool) -> Tensor {
        let height = weight_bar.size()[0];
        let w_mat = weight_bar.view([height, -1]);

        if train {
            self.iterate(&w_mat, self.power_iterations);
        }

        // Copies keep the autograd graph independent of later buffer updates.
        let u = self.u.copy();
        let v = self.v.copy();
        let sigma = u.dot(&w_mat.mv(&v));

        weight_bar / sigma
    }

    /// Current spectral norm estimate of `weight_bar`, without updating buffers
    pub fn sigma(&self, weight_bar: &Tensor) -> f64 {
        tch::no_grad(|| {
            let height = weight_bar.size()[0];
            let w_mat = weight_bar.view([height, -1]);
            self.u.dot(&w_mat.mv(&self.v)).double_value(&[])
        })
    }

    fn iterate(&self, w_mat: &Tensor, steps: usize) {
        tch::no_grad(|| {
            let w = w_mat.detach();
            let mut u = self.u.shallow_clone();
            let mut v = self.v.shallow_clone();
            for _ in 0..steps {
                let next_v = l2_normalize(&w.tr().mv(&u));
                v.copy_(&next_v);
                let next_u = l2_normalize(&w.mv(&v));
                u.copy_(&next_u);
            }
        });
    }
}

/// 2D convolution with a spectrally normalized kernel
#[derive(Debug)]
pub struct SnConv2d {
    conv: nn::Conv2D,
    norm: SpectralNorm,
    config: nn::ConvConfig,
}

impl SnConv2d {
    /// Create a convolution whose kernel is registered under `vs` along with
    /// its `u`/`v` buffers
    pub fn new(
        vs: &nn::Path,
        in_channels: i64,
        out_channels: i64,
        kernel_size: i64,
        config: nn::ConvConfig,
        power_iterations: usize,
    ) -> Self {
        let conv = nn::conv2d(vs, in_channels, out_channels, kernel_size, config);
        let norm = SpectralNorm::new(vs, &conv.ws, power_iterations);
        Self { conv, norm, config }
    }

    /// Estimated spectral norm of the raw kernel
    pub fn sigma(&self) -> f64 {
        self.norm.sigma(&self.conv.ws)
    }

    /// Convolution stride
    pub fn stride(&self) -> i64 {
        self.config.stride
    }
}

impl ModuleT for SnConv2d {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Tensor {
        let weight = self.norm.normalized_weight(&self.conv.ws, train);
        xs.conv2d(
            &weight,
            self.conv.bs.as_ref(),
            [self.config.stride; 2],
            [self.config.padding; 2],
            [self.config.dilation; 2],
            self.config.groups,
        )
    }
}

/// Fully connected layer with a spectrally normalized weight matrix
#[derive(Debug)]
pub struct SnLinear {
    linear: nn::Linear,
    norm: SpectralNorm,
}

impl SnLinear {
    /// Create a linear layer mapping `in_dim` to `out_dim` features
    pub fn new(vs: &nn::Path, in_dim: i64, out_dim: i64, power_iterations: usize) -> Self {
        let linear = nn::linear(vs, in_dim, out_dim, Default::default());
        let norm = SpectralNorm::new(vs, &linear.ws, power_iterations);
        Self { linear, norm }
    }

    /// Estimated spectral norm of the raw weight
    pub fn sigma(&self) -> f64 {
        self.norm.sigma(&self.linear.ws)
    }
}

impl ModuleT for SnLinear {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Tensor {
        let weight = self.norm.normalized_weight(&self.linear.ws, train);
        xs.linear(&weight, self.linear.bs.as_ref())
    }
}
