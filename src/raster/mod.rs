//! Raster grid, transform, coarsening and masking

pub mod affine;
pub mod aggregate;
pub mod grid;
pub mod mask;
pub mod source;

pub use affine::Affine;
pub use aggregate::RasterAggregator;
pub use grid::RasterGrid;
pub use mask::{mask_cells, MaskedCell};
pub use source::{RasterFile, RasterSource};
