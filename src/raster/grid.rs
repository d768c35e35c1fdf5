//! Single-band raster grid with a nodata sentinel

use serde::{Deserialize, Serialize};

use crate::core::error::{ResampleError, Result};
use crate::raster::affine::Affine;

/// Row-major single-band raster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterGrid {
    pub width: usize,
    pub height: usize,
    pub transform: Affine,
    /// Sentinel marking cells without data. `None` means every finite cell is valid.
    #[serde(default)]
    pub nodata: Option<f64>,
    data: Vec<f64>,
}

impl RasterGrid {
    pub fn new(
        width: usize,
        height: usize,
        transform: Affine,
        nodata: Option<f64>,
        data: Vec<f64>,
    ) -> Result<Self> {
        let grid = Self {
            width,
            height,
            transform,
            nodata,
            data,
        };
        grid.validate()?;
        Ok(grid)
    }

    /// Grid with every cell set to `value`
    pub fn filled(
        width: usize,
        height: usize,
        transform: Affine,
        nodata: Option<f64>,
        value: f64,
    ) -> Self {
        Self {
            width,
            height,
            transform,
            nodata,
            data: vec![value; width * height],
        }
    }

    /// Check the buffer matches the declared shape. Run after deserializing.
    pub fn validate(&self) -> Result<()> {
        if self.data.len() != self.width * self.height {
            return Err(ResampleError::Schema(format!(
                "raster holds {} values but is declared {}x{}",
                self.data.len(),
                self.width,
                self.height
            )));
        }
        if self.transform.inverse().is_none() {
            return Err(ResampleError::UnsupportedTransform(
                "raster transform is not invertible".into(),
            ));
        }
        Ok(())
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.height && col < self.width {
            Some(self.data[row * self.width + col])
        } else {
            None
        }
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        if row < self.height && col < self.width {
            self.data[row * self.width + col] = value;
        }
    }

    /// NaN is always treated as missing, whatever the sentinel
    #[inline]
    pub fn is_nodata(&self, value: f64) -> bool {
        if value.is_nan() {
            return true;
        }
        match self.nodata {
            Some(sentinel) => value == sentinel,
            None => false,
        }
    }

    /// Value of a cell if it holds data
    #[inline]
    pub fn valid(&self, row: usize, col: usize) -> Option<f64> {
        self.get(row, col).filter(|v| !self.is_nodata(*v))
    }

    /// Pixel size along each axis
    pub fn resolution(&self) -> (f64, f64) {
        self.transform.resolution()
    }

    /// Cell center in world coordinates
    pub fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        self.transform.cell_center(row, col)
    }

    /// Number of cells holding data
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| !self.is_nodata(**v)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> RasterGrid {
        RasterGrid::new(
            3,
            2,
            Affine::north_up(0.0, 2.0, 1.0, 1.0),
            Some(-1.0),
            vec![1.0, -1.0, 3.0, f64::NAN, 5.0, 6.0],
        )
        .unwrap()
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let result = RasterGrid::new(2, 2, Affine::identity(), None, vec![0.0; 3]);
        assert!(matches!(result, Err(ResampleError::Schema(_))));
    }

    #[test]
    fn test_nodata_and_nan_invalid() {
        let g = grid();
        assert_eq!(g.valid(0, 0), Some(1.0));
        assert_eq!(g.valid(0, 1), None);
        assert_eq!(g.valid(1, 0), None);
        assert_eq!(g.valid_count(), 4);
    }
}
