//! Coverage for boundaries the raster mask missed
//!
//! Small boundaries can fall between cell centers at coarse resolutions.
//! Each such boundary gets one synthetic point at its representative point,
//! borrowing proxy values from the nearest existing grid point.

use crate::core::config::ResamplerConfig;
use crate::core::error::{ResampleError, Result};
use crate::core::types::BoundaryId;
use crate::spatial::associate::{GridPoint, PointOrigin};
use crate::spatial::boundary::BoundaryPolygon;
use crate::spatial::nearest::NearestIndex;

/// Imputed points plus the ids that could not be imputed
#[derive(Debug, Clone, Default)]
pub struct CoverageResolution {
    pub points: Vec<GridPoint>,
    /// Ids with no boundary row, or whose geometry has no interior point
    pub unresolved: Vec<BoundaryId>,
}

pub struct CoverageResolver<'a> {
    config: &'a ResamplerConfig,
}

impl<'a> CoverageResolver<'a> {
    pub fn new(config: &'a ResamplerConfig) -> Self {
        Self { config }
    }

    /// One synthetic point per id in `exceptions`.
    ///
    /// Fails with [`ResampleError::UnresolvedBoundary`] when `points` is empty:
    /// there is nothing anywhere to borrow from.
    pub fn resolve(
        &self,
        points: &[GridPoint],
        boundaries: &[BoundaryPolygon],
        exceptions: &[BoundaryId],
    ) -> Result<CoverageResolution> {
        let mut resolution = CoverageResolution::default();
        if exceptions.is_empty() {
            return Ok(resolution);
        }

        let index = NearestIndex::from_grid_points(points, self.config.resolution);
        if index.is_empty() {
            return Err(ResampleError::UnresolvedBoundary {
                boundaries: exceptions.to_vec(),
            });
        }

        for id in exceptions {
            match self.impute(id, points, boundaries, &index) {
                Some(point) => resolution.points.push(point),
                None => {
                    tracing::warn!("Cannot impute a location for boundary {}", id);
                    resolution.unresolved.push(id.clone());
                }
            }
        }

        tracing::info!(
            "Imputed {} of {} boundaries without raster coverage",
            resolution.points.len(),
            exceptions.len()
        );

        Ok(resolution)
    }

    fn impute(
        &self,
        id: &BoundaryId,
        points: &[GridPoint],
        boundaries: &[BoundaryPolygon],
        index: &NearestIndex,
    ) -> Option<GridPoint> {
        // Largest row wins; the first one on equal areas
        let measure = self.config.area_measure;
        let row = boundaries
            .iter()
            .filter(|b| &b.id == id)
            .map(|b| (b, b.area(measure)))
            .fold(None::<(&BoundaryPolygon, f64)>, |best, (b, area)| match best {
                Some((_, best_area)) if best_area >= area => best,
                _ => Some((b, area)),
            })
            .map(|(b, _)| b)?;

        let location = row.representative_point()?;
        let (donor_idx, distance) = index.nearest(location.x(), location.y())?;
        let donor = &points[donor_idx];

        let weight = if donor.weight == 0.0 {
            self.config.weight_floor
        } else {
            donor.weight
        };

        tracing::debug!(
            "Boundary {} imputed at ({:.5}, {:.5}) from boundary {} at distance {:.5}",
            id,
            location.x(),
            location.y(),
            donor.boundary,
            distance
        );

        Some(GridPoint {
            x: location.x(),
            y: location.y(),
            value: donor.value,
            weight,
            boundary: id.clone(),
            attributes: row.attributes.clone(),
            origin: PointOrigin::Imputed {
                donor: donor.boundary.clone(),
                distance,
            },
        })
    }
}
