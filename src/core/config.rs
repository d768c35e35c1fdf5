//! Resampler configuration with documented defaults
//!
//! One immutable value is built per run and handed to every stage at
//! construction. Nothing reads configuration from global state.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{ResampleError, Result};
use crate::core::proxy::ProxyFunction;

/// Output columns written for every sample. Tag and loss names may not reuse them.
pub const RESERVED_COLUMNS: [&str; 4] = ["lon", "lat", "number", "boundary"];

/// How boundary areas are compared when picking the largest part of a
/// repeated boundary identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaMeasure {
    /// Ellipsoidal area, for geographic (lon/lat) coordinates
    Geodesic,
    /// Cartesian area in working units, for projected coordinates
    Planar,
}

/// Raster coarsening reducer. Only mean-style aggregation is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reducer {
    Average,
}

/// Configuration for a disaggregation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResamplerConfig {
    // === RASTER ===
    /// Target cell size of the coarsened proxy raster, in working CRS units
    ///
    /// Must not be finer than the source raster. Larger cells mean fewer
    /// candidate locations per boundary and more boundaries without coverage.
    pub resolution: f64,

    /// Reducer used to coarsen the raster
    pub reducer: Reducer,

    /// Drop cells whose value is exactly zero when building candidates
    pub remove_zeros: bool,

    // === COORDINATES ===
    /// Coordinate reference system of every input and of the output points
    pub crs: String,

    /// Flat projection nominally used for area comparisons.
    ///
    /// Informational: reprojection happens outside this crate, so the
    /// comparison itself is governed by `area_measure`.
    pub area_crs: String,

    /// Area measure used when resolving repeated boundary identifiers
    pub area_measure: AreaMeasure,

    // === SAMPLING ===
    /// Converts a raw proxy cell value into a sampling weight
    pub proxy: ProxyFunction,

    /// Weight assigned to an imputed point that borrowed a zero weight
    pub weight_floor: f64,

    /// Run seed. Each boundary derives its own generator from this and its id.
    pub seed: u64,

    /// Largest driving quantity a single exposure row may carry.
    ///
    /// Every unit of count is one draw, so this bounds the memory and time
    /// spent on a single row.
    pub max_draws: u64,

    // === SCHEMA ===
    /// Tag columns that together form the taxonomy key
    pub retained_tags: Vec<String>,

    /// Loss quantity columns apportioned alongside the count
    pub loss_types: Vec<String>,

    // === CHECKS ===
    /// Maximum relative deviation between input and output totals before a
    /// mass conservation warning is raised (0.001 = 0.1%)
    pub mass_threshold: f64,

    // === PARALLELIZATION ===
    /// Minimum boundary count before boundaries are processed with rayon
    pub parallel_threshold: usize,
}

impl Default for ResamplerConfig {
    fn default() -> Self {
        Self {
            resolution: 0.05,
            reducer: Reducer::Average,
            remove_zeros: false,

            crs: "EPSG:4326".to_string(),
            area_crs: "EPSG:3035".to_string(),
            area_measure: AreaMeasure::Geodesic,

            proxy: ProxyFunction::Threshold { min: 0.35 },
            weight_floor: 0.1,
            seed: 42,
            max_draws: 10_000_000,

            retained_tags: vec!["taxonomy".to_string()],
            loss_types: vec!["structural".to_string(), "night".to_string()],

            mass_threshold: 0.001,

            parallel_threshold: 64,
        }
    }
}

impl ResamplerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document. Missing keys fall back to defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ResampleError::MissingInput {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if !self.resolution.is_finite() || self.resolution <= 0.0 {
            return Err(ResampleError::InvalidConfig(format!(
                "resolution must be positive, got {}",
                self.resolution
            )));
        }

        if !self.weight_floor.is_finite() || self.weight_floor <= 0.0 {
            return Err(ResampleError::InvalidConfig(format!(
                "weight_floor must be positive, got {}",
                self.weight_floor
            )));
        }

        if !self.mass_threshold.is_finite() || self.mass_threshold < 0.0 {
            return Err(ResampleError::InvalidConfig(format!(
                "mass_threshold must be non-negative, got {}",
                self.mass_threshold
            )));
        }

        if self.max_draws == 0 {
            return Err(ResampleError::InvalidConfig(
                "max_draws must be at least 1".into(),
            ));
        }

        self.proxy.validate()?;

        // Tag and loss columns end up side by side in the output table
        let mut seen = HashSet::new();
        for name in self.retained_tags.iter().chain(&self.loss_types) {
            if name.is_empty() {
                return Err(ResampleError::InvalidConfig("empty column name".into()));
            }
            if RESERVED_COLUMNS.contains(&name.as_str()) {
                return Err(ResampleError::InvalidConfig(format!(
                    "column '{}' collides with a fixed output column",
                    name
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(ResampleError::InvalidConfig(format!(
                    "column '{}' listed more than once",
                    name
                )));
            }
        }

        Ok(())
    }
}
