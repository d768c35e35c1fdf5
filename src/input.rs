//! Load run inputs from JSON files
//!
//! Boundaries and exposure are read fully into memory. The raster is not:
//! it is wrapped in a [`RasterFile`] and opened per boundary.

use std::path::Path;

use crate::core::config::ResamplerConfig;
use crate::core::error::{ResampleError, Result};
use crate::exposure::table::{group_exposure, ExposureAggregate, ExposureRecord};
use crate::raster::source::RasterFile;
use crate::spatial::boundary::{BoundaryPolygon, BoundaryRecord};

fn read_input(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(ResampleError::MissingInput {
            path: path.to_path_buf(),
        });
    }
    Ok(std::fs::read_to_string(path)?)
}

/// Raster handle for a JSON raster document. Fails early if the file is absent.
pub fn load_raster(path: &Path) -> Result<RasterFile> {
    if !path.exists() {
        return Err(ResampleError::MissingInput {
            path: path.to_path_buf(),
        });
    }
    Ok(RasterFile::new(path))
}

/// Parse a boundary table from a JSON string
pub fn boundaries_from_json(json: &str) -> Result<Vec<BoundaryPolygon>> {
    let records: Vec<BoundaryRecord> = serde_json::from_str(json)?;
    records.into_iter().map(BoundaryPolygon::try_from).collect()
}

pub fn load_boundaries(path: &Path) -> Result<Vec<BoundaryPolygon>> {
    let boundaries = boundaries_from_json(&read_input(path)?)?;
    tracing::info!("Loaded {} boundary rows from {}", boundaries.len(), path.display());
    Ok(boundaries)
}

/// Parse exposure rows from a JSON string and group them by boundary and taxonomy
pub fn exposure_from_json(json: &str, config: &ResamplerConfig) -> Result<Vec<ExposureAggregate>> {
    let records: Vec<ExposureRecord> = serde_json::from_str(json)?;
    group_exposure(&records, config)
}

pub fn load_exposure(path: &Path, config: &ResamplerConfig) -> Result<Vec<ExposureAggregate>> {
    let aggregates = exposure_from_json(&read_input(path)?, config)?;
    tracing::info!("Loaded {} exposure aggregates from {}", aggregates.len(), path.display());
    Ok(aggregates)
}
