//! Probabilistic disaggregation of boundary totals onto point samples

pub mod outcome;
pub mod sampler;

pub use outcome::{BoundaryOutcome, Sample, SampledBoundary};
pub use sampler::{
    boundary_rng, candidate_probabilities, draw_count, draw_locations, draw_weights, Draw,
    ProbabilisticDisaggregator,
};
