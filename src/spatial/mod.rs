//! Boundaries, the raster/boundary join and coverage imputation

pub mod associate;
pub mod boundary;
pub mod coverage;
pub mod nearest;
pub mod validation;

pub use associate::{Association, GridBoundaryAssociator, GridPoint, PointOrigin};
pub use boundary::{BoundaryPolygon, BoundaryRecord, BoundaryShape, GeometryRecord};
pub use coverage::{CoverageResolution, CoverageResolver};
pub use nearest::NearestIndex;
pub use validation::{GeometricValidator, ValidationError};
