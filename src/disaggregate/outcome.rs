//! Samples and per-boundary outcomes

use serde::{Deserialize, Serialize};

use crate::core::types::{BoundaryId, Quantities, TaxonomyKey};

/// Located share of a boundary's exposure for one taxonomy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    pub taxonomy: TaxonomyKey,
    pub boundary: BoundaryId,
    pub quantities: Quantities,
}

/// Boundary that produced samples
#[derive(Debug, Clone, PartialEq)]
pub struct SampledBoundary {
    pub boundary: BoundaryId,
    pub samples: Vec<Sample>,
    /// Draws generated before duplicates were merged
    pub draws: usize,
    /// Every candidate had zero weight, so locations were drawn uniformly
    pub uniform_fallback: bool,
    /// Quantities on rows with a zero count, which cannot be drawn
    pub unplaced: Quantities,
}

/// What happened to one boundary with exposure rows. Table boundaries
/// without any rows are reported as empty by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryOutcome {
    Sampled(SampledBoundary),
    /// Zero total exposure; nothing to place
    Empty { boundary: BoundaryId },
    /// Exposure but no candidate locations at all
    NoCandidates { boundary: BoundaryId, unplaced: f64 },
}

impl BoundaryOutcome {
    pub fn samples(&self) -> &[Sample] {
        match self {
            BoundaryOutcome::Sampled(sampled) => &sampled.samples,
            _ => &[],
        }
    }

    pub fn into_samples(self) -> Vec<Sample> {
        match self {
            BoundaryOutcome::Sampled(sampled) => sampled.samples,
            _ => Vec::new(),
        }
    }
}
