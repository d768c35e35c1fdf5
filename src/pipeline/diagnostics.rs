//! Non-fatal conditions raised during a run
//!
//! Fatal problems are `ResampleError`s. Everything the run can continue past
//! is recorded here, logged once when it is raised, and returned to the
//! caller with the samples.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::types::BoundaryId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Notice,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Boundaries the raster mask missed. Those carrying exposure were
    /// given an imputed point; the rest need none.
    NoCoverage { boundaries: Vec<BoundaryId> },
    /// Output total deviates from the input total beyond the threshold
    MassConservation {
        input_total: f64,
        output_total: f64,
        relative_deviation: f64,
        threshold: f64,
    },
    /// Boundary with zero exposure, skipped
    EmptyBoundary { boundary: BoundaryId },
    /// Exposure or exception id with no usable boundary geometry
    UnknownBoundary { boundary: BoundaryId, count: f64 },
    /// Every candidate weighed zero; locations were drawn uniformly
    ZeroWeightCandidates { boundary: BoundaryId, candidates: usize },
    /// Quantities that could not be attached to any location
    UnplacedExposure {
        boundary: BoundaryId,
        count: f64,
        losses: Vec<f64>,
    },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::EmptyBoundary { .. } => Severity::Notice,
            _ => Severity::Warning,
        }
    }

    /// Boundary ids this diagnostic refers to
    pub fn boundaries(&self) -> Vec<&BoundaryId> {
        match self {
            Diagnostic::NoCoverage { boundaries } => boundaries.iter().collect(),
            Diagnostic::MassConservation { .. } => Vec::new(),
            Diagnostic::EmptyBoundary { boundary }
            | Diagnostic::UnknownBoundary { boundary, .. }
            | Diagnostic::ZeroWeightCandidates { boundary, .. }
            | Diagnostic::UnplacedExposure { boundary, .. } => vec![boundary],
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::NoCoverage { boundaries } => {
                let ids: Vec<&str> = boundaries.iter().map(|b| b.as_str()).collect();
                write!(
                    f,
                    "{} boundaries without raster coverage: {}",
                    boundaries.len(),
                    ids.join(", ")
                )
            }
            Diagnostic::MassConservation {
                input_total,
                output_total,
                relative_deviation,
                threshold,
            } => write!(
                f,
                "output total {:.6} deviates from input total {:.6} by {:.4}% (threshold {:.4}%)",
                output_total,
                input_total,
                relative_deviation * 100.0,
                threshold * 100.0
            ),
            Diagnostic::EmptyBoundary { boundary } => {
                write!(f, "boundary {} has no exposure", boundary)
            }
            Diagnostic::UnknownBoundary { boundary, count } => write!(
                f,
                "boundary {} has no usable geometry, {} units not placed",
                boundary, count
            ),
            Diagnostic::ZeroWeightCandidates { boundary, candidates } => write!(
                f,
                "boundary {}: all {} candidates have zero weight, sampled uniformly",
                boundary, candidates
            ),
            Diagnostic::UnplacedExposure {
                boundary,
                count,
                losses,
            } => write!(
                f,
                "boundary {}: {} units and losses {:?} could not be placed",
                boundary, count, losses
            ),
        }
    }
}

/// Every diagnostic of one run, in emission order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub diagnostics: Vec<Diagnostic>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and log it
    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity() {
            Severity::Warning => tracing::warn!("{}", diagnostic),
            Severity::Notice => tracing::info!("{}", diagnostic),
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity() == Severity::Warning)
    }

    pub fn has_mass_warning(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::MassConservation { .. }))
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }
}
