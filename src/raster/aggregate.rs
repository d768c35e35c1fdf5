//! Mean coarsening of a raster to a target resolution
//!
//! Every valid source cell contributes to the target cell containing its
//! center. Target cells without a valid contribution hold nodata.

use crate::core::config::{Reducer, ResamplerConfig};
use crate::core::error::{ResampleError, Result};
use crate::raster::affine::Affine;
use crate::raster::grid::RasterGrid;
use crate::raster::source::RasterSource;

/// Sentinel written when the source has none but some target cells end up empty
pub const DEFAULT_NODATA: f64 = -99999.0;

/// Relative tolerance when comparing source and target resolutions
const RESOLUTION_EPSILON: f64 = 1e-9;

pub struct RasterAggregator<'a> {
    config: &'a ResamplerConfig,
}

impl<'a> RasterAggregator<'a> {
    pub fn new(config: &'a ResamplerConfig) -> Self {
        Self { config }
    }

    /// Coarsen `source` to the configured resolution.
    ///
    /// Same resolution returns an identical copy. A finer target is an error.
    pub fn aggregate<S: RasterSource + ?Sized>(&self, source: &S) -> Result<RasterGrid> {
        let grid = source.open()?;
        let target = self.config.resolution;

        if !grid.transform.is_north_up() {
            return Err(ResampleError::UnsupportedTransform(format!(
                "{} is rotated or sheared; only north-up rasters can be coarsened",
                source.describe()
            )));
        }

        let (res_x, res_y) = grid.resolution();
        let same_x = (target - res_x).abs() <= RESOLUTION_EPSILON * res_x;
        let same_y = (target - res_y).abs() <= RESOLUTION_EPSILON * res_y;

        if same_x && same_y {
            tracing::debug!(
                "Raster {} already at resolution {}; leaving unchanged",
                source.describe(),
                target
            );
            return Ok(grid.into_owned());
        }

        if (target < res_x && !same_x) || (target < res_y && !same_y) {
            return Err(ResampleError::InvalidResolution {
                current: res_x.min(res_y),
                target,
            });
        }

        let coarsened = match self.config.reducer {
            Reducer::Average => average(&grid, target),
        };

        tracing::info!(
            "Coarsened {} from {}x{} ({} valid) to {}x{} ({} valid) cells at resolution {}",
            source.describe(),
            grid.width,
            grid.height,
            grid.valid_count(),
            coarsened.width,
            coarsened.height,
            coarsened.valid_count(),
            target
        );

        Ok(coarsened)
    }
}

/// Number of target cells needed to cover `cells` source cells
fn target_extent(cells: usize, source_res: f64, target_res: f64) -> usize {
    let span = cells as f64 * source_res / target_res;
    ((span - RESOLUTION_EPSILON).ceil() as usize).max(1)
}

fn average(grid: &RasterGrid, target: f64) -> RasterGrid {
    let (res_x, res_y) = grid.resolution();
    let width = target_extent(grid.width, res_x, target);
    let height = target_extent(grid.height, res_y, target);

    let mut sums = vec![0.0_f64; width * height];
    let mut counts = vec![0_u32; width * height];

    for row in 0..grid.height {
        let target_row = (((row as f64 + 0.5) * res_y / target).floor() as usize).min(height - 1);
        for col in 0..grid.width {
            let Some(value) = grid.valid(row, col) else {
                continue;
            };
            let target_col =
                (((col as f64 + 0.5) * res_x / target).floor() as usize).min(width - 1);
            let idx = target_row * width + target_col;
            sums[idx] += value;
            counts[idx] += 1;
        }
    }

    let any_empty = counts.iter().any(|c| *c == 0);
    let nodata = match grid.nodata {
        Some(sentinel) => Some(sentinel),
        None if any_empty => Some(DEFAULT_NODATA),
        None => None,
    };
    let fill = nodata.unwrap_or(DEFAULT_NODATA);

    let source = grid.transform;
    let transform = Affine::new(
        target * source.a.signum(),
        0.0,
        source.c,
        0.0,
        target * source.e.signum(),
        source.f,
    );

    let mut coarse = RasterGrid::filled(width, height, transform, nodata, fill);
    for (idx, (sum, count)) in sums.iter().zip(&counts).enumerate() {
        if *count > 0 {
            coarse.set(idx / width, idx % width, sum / *count as f64);
        }
    }
    coarse
}
