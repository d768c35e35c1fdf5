//! Exposure model input: typed rows grouped by boundary and taxonomy

pub mod table;

pub use table::{check_draw_limit, group_exposure, total_count, ExposureAggregate, ExposureRecord};
