//! Exposure Resampler - probabilistic spatial disaggregation of exposure data
//!
//! Spreads exposure totals reported per administrative boundary over the
//! cells of a proxy raster, producing point samples whose quantities sum back
//! to the boundary totals.

pub mod core;
pub mod disaggregate;
pub mod exposure;
pub mod input;
pub mod pipeline;
pub mod raster;
pub mod spatial;
