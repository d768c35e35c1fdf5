//! Scoped access to raster data
//!
//! Callers open a source, use the returned handle and let it drop before
//! the next boundary. Handles are never kept across iterations.

use std::borrow::Cow;
use std::path::PathBuf;

use crate::core::error::{ResampleError, Result};
use crate::raster::grid::RasterGrid;

pub trait RasterSource: Sync {
    /// Short description for log messages
    fn describe(&self) -> String;

    /// Acquire the raster. The handle is released when dropped.
    fn open(&self) -> Result<Cow<'_, RasterGrid>>;
}

impl RasterSource for RasterGrid {
    fn describe(&self) -> String {
        format!("in-memory {}x{} raster", self.width, self.height)
    }

    fn open(&self) -> Result<Cow<'_, RasterGrid>> {
        Ok(Cow::Borrowed(self))
    }
}

/// Raster stored as a JSON document on disk, read on every `open`
#[derive(Debug, Clone)]
pub struct RasterFile {
    path: PathBuf,
}

impl RasterFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RasterSource for RasterFile {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn open(&self) -> Result<Cow<'_, RasterGrid>> {
        if !self.path.exists() {
            return Err(ResampleError::MissingInput {
                path: self.path.clone(),
            });
        }
        let content = std::fs::read_to_string(&self.path)?;
        let grid: RasterGrid = serde_json::from_str(&content)?;
        grid.validate()?;
        Ok(Cow::Owned(grid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_reported() {
        let source = RasterFile::new("no/such/raster.json");
        match source.open() {
            Err(ResampleError::MissingInput { path }) => {
                assert_eq!(path, PathBuf::from("no/such/raster.json"))
            }
            other => panic!("expected MissingInput, got {:?}", other),
        }
    }
}
