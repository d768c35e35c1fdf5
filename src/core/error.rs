//! Error types for the resampler

use std::path::PathBuf;

use thiserror::Error;

use crate::core::types::BoundaryId;

/// Fatal errors. Anything recoverable per boundary is a
/// [`Diagnostic`](crate::pipeline::Diagnostic) instead.
#[derive(Error, Debug)]
pub enum ResampleError {
    #[error("Missing input: could not find {}", .path.display())]
    MissingInput { path: PathBuf },

    #[error("No grid points available to impute coverage for {boundaries:?}")]
    UnresolvedBoundary { boundaries: Vec<BoundaryId> },

    #[error("Target resolution {target} is finer than source resolution {current}")]
    InvalidResolution { current: f64, target: f64 },

    #[error("Unsupported raster transform: {0}")]
    UnsupportedTransform(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ResampleError>;
