//! Configuration, errors and record types shared by every stage

pub mod config;
pub mod error;
pub mod proxy;
pub mod types;

pub use config::{AreaMeasure, Reducer, ResamplerConfig};
pub use error::{ResampleError, Result};
pub use proxy::ProxyFunction;
pub use types::{Attributes, BoundaryId, Quantities, TaxonomyKey};
