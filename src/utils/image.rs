//! Image grid helpers for generated samples

use std::path::Path;

use tch::{Device, Kind, Tensor};

use crate::error::{Error, Result};

/// Pixels between neighbouring images in a grid
const GRID_PADDING: i64 = 2;

/// Tile a batch of images in [-1, 1] into one `u8` image
///
/// # Arguments
///
/// * `images` - Tensor of shape (N, C, H, W)
/// * `columns` - Images per row (clamped to N)
/// * `padding` - Border in pixels around every image
///
/// # Returns
///
/// Tensor of shape (C, rows * (H + padding) + padding, columns * (W + padding) + padding)
pub fn to_grid(images: &Tensor, columns: i64, padding: i64) -> Result<Tensor> {
    let (n, c, h, w) = images.size4()?;
    if n == 0 || columns <= 0 || padding < 0 {
        return Err(Error::InvalidInput(format!(
            "cannot tile {} images into {} columns with padding {}",
            n, columns, padding
        )));
    }

    let columns = columns.min(n);
    let rows = (n + columns - 1) / columns;
    let cell_h = h + padding;
    let cell_w = w + padding;

    let images = images.detach().to_device(Device::Cpu).to_kind(Kind::Float);
    let grid = Tensor::full(
        [c, rows * cell_h + padding, columns * cell_w + padding],
        -1.0,
        (Kind::Float, Device::Cpu),
    );

    for i in 0..n {
        let top = padding + (i / columns) * cell_h;
        let left = padding + (i % columns) * cell_w;
        let mut cell = grid.narrow(1, top, h).narrow(2, left, w);
        cell.copy_(&images.get(i));
    }

    let pixels = ((grid + 1.0) * 127.5).clamp(0.0, 255.0).to_kind(Kind::Uint8);
    Ok(pixels)
}

/// Save a batch of images in [-1, 1] as a single grid image
///
/// The format is taken from the file extension (png, jpg, ...).
pub fn save_grid<P: AsRef<Path>>(images: &Tensor, columns: i64, path: P) -> Result<()> {
    let grid = to_grid(images, columns, GRID_PADDING)?;
    tch::vision::image::save(&grid, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_grid_dimensions() {
        let images = Tensor::zeros([5, 3, 32, 32], (Kind::Float, Device::Cpu));
        let grid = to_grid(&images, 4, 2).unwrap();

        // 2 rows x 4 columns of 34px cells plus the trailing border
        assert_eq!(grid.size(), vec![3, 2 * 34 + 2, 4 * 34 + 2]);
        assert_eq!(grid.kind(), Kind::Uint8);
    }

    #[test]
    fn test_grid_maps_value_range() {
        let images = Tensor::ones([1, 1, 2, 2], (Kind::Float, Device::Cpu));
        let grid = to_grid(&images, 1, 1).unwrap();

        // padding pixels are black, image pixels white
        assert_eq!(grid.int64_value(&[0, 0, 0]), 0);
        assert_eq!(grid.int64_value(&[0, 1, 1]), 255);
    }

    #[test]
    fn test_columns_clamped_to_batch() {
        let images = Tensor::zeros([2, 3, 4, 4], (Kind::Float, Device::Cpu));
        let grid = to_grid(&images, 10, 0).unwrap();

        assert_eq!(grid.size(), vec![3, 4, 8]);
    }

    #[test]
    fn test_rejects_invalid_arguments() {
        let images = Tensor::zeros([2, 3, 4, 4], (Kind::Float, Device::Cpu));
        assert!(to_grid(&images, 0, 2).is_err());

        let flat = Tensor::zeros([2, 3], (Kind::Float, Device::Cpu));
        assert!(to_grid(&flat, 2, 2).is_err());
    }

    #[test]
    fn test_save_grid_writes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("grid.png");

        let images = Tensor::rand([4, 3, 8, 8], (Kind::Float, Device::Cpu)) * 2.0 - 1.0;
        save_grid(&images, 2, &path).unwrap();

        assert!(path.exists());
    }
}
