//! Fixed-size bilinear resampling layer

use tch::{nn::Module, Tensor};

use crate::error::Result;

/// Resizes feature maps to a fixed spatial size with bilinear sampling
///
/// Works for both upsampling and downsampling; the output always has exactly
/// the configured height and width. Holds no parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interpolate {
    size: [i64; 2],
    align_corners: bool,
}

impl Interpolate {
    /// Bilinear resize to `(height, width)` without corner alignment
    pub fn bilinear(height: i64, width: i64) -> Self {
        Self {
            size: [height, width],
            align_corners: false,
        }
    }

    /// Target `(height, width)`
    pub fn size(&self) -> [i64; 2] {
        self.size
    }

    /// Resize, returning the libtorch error for inputs that are not rank 4
    pub fn try_forward(&self, xs: &Tensor) -> Result<Tensor> {
        let out = xs.f_upsample_bilinear2d(self.size, self.align_corners, None, None)?;
        Ok(out)
    }
}

impl Module for Interpolate {
    fn forward(&self, xs: &Tensor) -> Tensor {
        xs.upsample_bilinear2d(self.size, self.align_corners, None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::{Device, Kind};

    #[test]
    fn test_upsample_to_target() {
        let layer = Interpolate::bilinear(8, 8);
        let xs = Tensor::randn([2, 5, 1, 1], (Kind::Float, Device::Cpu));

        assert_eq!(layer.forward(&xs).size(), vec![2, 5, 8, 8]);
    }

    #[test]
    fn test_downsample_to_target() {
        let layer = Interpolate::bilinear(4, 6);
        let xs = Tensor::randn([1, 3, 32, 17], (Kind::Float, Device::Cpu));

        assert_eq!(layer.forward(&xs).size(), vec![1, 3, 4, 6]);
    }

    #[test]
    fn test_constant_map_stays_constant() {
        let layer = Interpolate::bilinear(16, 16);
        let xs = Tensor::full([1, 1, 4, 4], 0.5, (Kind::Float, Device::Cpu));
        let out = layer.forward(&xs);

        let max_diff = (out - 0.5).abs().max().double_value(&[]);
        assert!(max_diff < 1e-6);
    }

    #[test]
    fn test_try_forward_rejects_wrong_rank() {
        let layer = Interpolate::bilinear(4, 4);
        let xs = Tensor::randn([3, 8], (Kind::Float, Device::Cpu));

        assert!(layer.try_forward(&xs).is_err());
    }
}
