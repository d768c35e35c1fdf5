//! Spatial join between raster cell centers and boundary polygons
//!
//! Each boundary row is masked on its own. The raster is opened for the row,
//! masked, and released before the next row. Rows are independent, so large
//! tables are processed with rayon.

use std::collections::BTreeSet;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::config::ResamplerConfig;
use crate::core::error::Result;
use crate::core::types::{Attributes, BoundaryId};
use crate::raster::mask::mask_cells;
use crate::raster::source::RasterSource;
use crate::spatial::boundary::BoundaryPolygon;

/// Where a grid point came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PointOrigin {
    /// Center of a raster cell
    Cell { row: usize, col: usize },
    /// Representative point of a boundary without coverage, with values
    /// borrowed from the nearest existing point
    Imputed { donor: BoundaryId, distance: f64 },
}

/// Candidate location for sampling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    pub x: f64,
    pub y: f64,
    /// Raw proxy value of the cell
    pub value: f64,
    /// Proxy-derived quantity, used as the sampling weight
    pub weight: f64,
    pub boundary: BoundaryId,
    pub attributes: Attributes,
    pub origin: PointOrigin,
}

impl GridPoint {
    pub fn is_imputed(&self) -> bool {
        matches!(self.origin, PointOrigin::Imputed { .. })
    }
}

/// Result of associating a raster with a boundary table
#[derive(Debug, Clone, Default)]
pub struct Association {
    /// All boundaries' points, in boundary table order
    pub points: Vec<GridPoint>,
    /// Boundary ids for which no row produced a single cell, first-seen order
    pub exceptions: Vec<BoundaryId>,
}

pub struct GridBoundaryAssociator<'a> {
    config: &'a ResamplerConfig,
}

impl<'a> GridBoundaryAssociator<'a> {
    pub fn new(config: &'a ResamplerConfig) -> Self {
        Self { config }
    }

    pub fn associate<S: RasterSource + ?Sized>(
        &self,
        raster: &S,
        boundaries: &[BoundaryPolygon],
    ) -> Result<Association> {
        let per_boundary: Vec<Vec<GridPoint>> = if boundaries.len() >= self.config.parallel_threshold
        {
            boundaries
                .par_iter()
                .map(|boundary| self.associate_one(raster, boundary))
                .collect::<Result<_>>()?
        } else {
            boundaries
                .iter()
                .map(|boundary| self.associate_one(raster, boundary))
                .collect::<Result<_>>()?
        };

        // An id counts as covered when any of its rows produced cells
        let covered: BTreeSet<&BoundaryId> = boundaries
            .iter()
            .zip(&per_boundary)
            .filter(|(_, points)| !points.is_empty())
            .map(|(boundary, _)| &boundary.id)
            .collect();

        let mut exceptions: Vec<BoundaryId> = Vec::new();
        for boundary in boundaries {
            if !covered.contains(&boundary.id) && !exceptions.contains(&boundary.id) {
                exceptions.push(boundary.id.clone());
            }
        }

        let points: Vec<GridPoint> = per_boundary.into_iter().flatten().collect();

        tracing::info!(
            "Associated {} grid points with {} boundary rows ({} ids without coverage)",
            points.len(),
            boundaries.len(),
            exceptions.len()
        );

        Ok(Association { points, exceptions })
    }

    fn associate_one<S: RasterSource + ?Sized>(
        &self,
        raster: &S,
        boundary: &BoundaryPolygon,
    ) -> Result<Vec<GridPoint>> {
        let cells = {
            let grid = raster.open()?;
            let cells = mask_cells(&grid, &boundary.geometry, self.config.remove_zeros);
            cells
                .into_iter()
                .map(|cell| (cell, grid.cell_center(cell.row, cell.col)))
                .collect::<Vec<_>>()
        };

        if cells.is_empty() {
            tracing::debug!("Boundary {} masked to zero cells", boundary.id);
        }

        Ok(cells
            .into_iter()
            .map(|(cell, (x, y))| GridPoint {
                x,
                y,
                value: cell.value,
                weight: self.config.proxy.apply(cell.value),
                boundary: boundary.id.clone(),
                attributes: boundary.attributes.clone(),
                origin: PointOrigin::Cell {
                    row: cell.row,
                    col: cell.col,
                },
            })
            .collect())
    }
}
