//! Weighted sampling of exposure onto candidate locations
//!
//! For each taxonomy row with count `q`, `ceil(q)` locations are drawn with
//! replacement from the candidates' categorical distribution. The last draw
//! carries only the fractional remainder, so draw weights sum to `q`. Every
//! quantity on the row is split across the draws by weight, then draws that
//! hit the same location are merged.

use std::collections::BTreeMap;

use ordered_float::OrderedFloat;
use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::config::ResamplerConfig;
use crate::core::types::{BoundaryId, Quantities, TaxonomyKey};
use crate::disaggregate::outcome::{BoundaryOutcome, Sample, SampledBoundary};
use crate::exposure::ExposureAggregate;
use crate::spatial::associate::GridPoint;

/// One draw: the chosen candidate and the share of the row it carries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Draw {
    pub candidate: usize,
    pub weight: f64,
}

/// Number of draws for a driving quantity: `ceil(q)`, zero for `q <= 0`
pub fn draw_count(quantity: f64) -> usize {
    if quantity.is_finite() && quantity > 0.0 {
        quantity.ceil() as usize
    } else {
        0
    }
}

/// Per-draw weights: all `1.0` except a fractional last draw for non-integer `q`.
///
/// Allocates one weight per draw. Callers bound `quantity` by
/// `ResamplerConfig::max_draws` first.
pub fn draw_weights(quantity: f64) -> Vec<f64> {
    let n = draw_count(quantity);
    let mut weights = vec![1.0; n];
    if let Some(last) = weights.last_mut() {
        let remainder = quantity - (n - 1) as f64;
        if remainder < 1.0 {
            *last = remainder;
        }
    }
    weights
}

/// Categorical probabilities over candidate weights.
///
/// When the weights sum to zero (every cell below the proxy threshold) the
/// distribution falls back to uniform; the flag reports that.
pub fn candidate_probabilities(weights: &[f64]) -> (Vec<f64>, bool) {
    let total: f64 = weights.iter().filter(|w| w.is_finite() && **w > 0.0).sum();
    if total > 0.0 && total.is_finite() {
        let probabilities = weights
            .iter()
            .map(|w| if w.is_finite() && *w > 0.0 { w / total } else { 0.0 })
            .collect();
        (probabilities, false)
    } else {
        let uniform = 1.0 / weights.len().max(1) as f64;
        (vec![uniform; weights.len()], true)
    }
}

/// Draw one candidate per weight, independently and with replacement
pub fn draw_locations<R: Rng + ?Sized>(
    distribution: &WeightedIndex<f64>,
    weights: &[f64],
    rng: &mut R,
) -> Vec<Draw> {
    weights
        .iter()
        .map(|&weight| Draw {
            candidate: distribution.sample(rng),
            weight,
        })
        .collect()
}

/// Generator for one boundary, derived from the run seed and the boundary id.
///
/// Workers never share generator state, and a boundary's draws do not depend
/// on which other boundaries ran or in what order.
pub fn boundary_rng(seed: u64, boundary: &BoundaryId) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed.wrapping_mul(0x9e37_79b9_7f4a_7c15) ^ boundary.stable_hash())
}

pub struct ProbabilisticDisaggregator<'a> {
    config: &'a ResamplerConfig,
}

impl<'a> ProbabilisticDisaggregator<'a> {
    pub fn new(config: &'a ResamplerConfig) -> Self {
        Self { config }
    }

    /// Spread one boundary's exposure over its candidate points.
    ///
    /// `aggregates` are this boundary's rows, one per taxonomy.
    pub fn disaggregate<R: Rng + ?Sized>(
        &self,
        boundary: &BoundaryId,
        candidates: &[&GridPoint],
        aggregates: &[&ExposureAggregate],
        rng: &mut R,
    ) -> BoundaryOutcome {
        if aggregates.iter().all(|a| a.quantities.is_zero()) {
            return BoundaryOutcome::Empty {
                boundary: boundary.clone(),
            };
        }

        if candidates.is_empty() {
            return BoundaryOutcome::NoCandidates {
                boundary: boundary.clone(),
                unplaced: aggregates.iter().map(|a| a.quantities.count).sum(),
            };
        }

        let weights: Vec<f64> = candidates.iter().map(|c| c.weight).collect();
        let (probabilities, uniform_fallback) = candidate_probabilities(&weights);
        let distribution = match WeightedIndex::new(&probabilities) {
            Ok(distribution) => distribution,
            Err(_) => {
                // Only reachable through underflow of tiny weights
                let uniform = vec![1.0; candidates.len()];
                match WeightedIndex::new(&uniform) {
                    Ok(distribution) => distribution,
                    Err(_) => {
                        return BoundaryOutcome::NoCandidates {
                            boundary: boundary.clone(),
                            unplaced: aggregates.iter().map(|a| a.quantities.count).sum(),
                        }
                    }
                }
            }
        };

        let loss_types = self.config.loss_types.len();
        let draw_limit = self.config.max_draws as f64;
        let mut merged: BTreeMap<(TaxonomyKey, OrderedFloat<f64>, OrderedFloat<f64>), Quantities> =
            BTreeMap::new();
        let mut unplaced = Quantities::zeroed(loss_types);
        let mut total_draws = 0;

        for aggregate in aggregates {
            let quantities = &aggregate.quantities;
            if quantities.count.ceil() > draw_limit {
                tracing::warn!(
                    "Boundary {}: count {} of {} exceeds {} draws, not placed",
                    boundary,
                    quantities.count,
                    aggregate.taxonomy,
                    self.config.max_draws
                );
                unplaced.add_assign(quantities);
                continue;
            }
            let draw_weights = draw_weights(quantities.count);
            if draw_weights.is_empty() {
                unplaced.add_assign(quantities);
                continue;
            }

            let total_weight: f64 = draw_weights.iter().sum();
            let draws = draw_locations(&distribution, &draw_weights, rng);
            total_draws += draws.len();

            for draw in draws {
                let candidate = candidates[draw.candidate];
                let share = quantities.apportioned(draw.weight, total_weight);
                merged
                    .entry((
                        aggregate.taxonomy.clone(),
                        OrderedFloat(candidate.x),
                        OrderedFloat(candidate.y),
                    ))
                    .or_insert_with(|| Quantities::zeroed(loss_types))
                    .add_assign(&share);
            }
        }

        let samples: Vec<Sample> = merged
            .into_iter()
            .map(|((taxonomy, x, y), quantities)| Sample {
                x: x.into_inner(),
                y: y.into_inner(),
                taxonomy,
                boundary: boundary.clone(),
                quantities,
            })
            .collect();

        tracing::debug!(
            "Boundary {}: {} draws over {} candidates merged into {} samples",
            boundary,
            total_draws,
            candidates.len(),
            samples.len()
        );

        BoundaryOutcome::Sampled(SampledBoundary {
            boundary: boundary.clone(),
            samples,
            draws: total_draws,
            uniform_fallback,
            unplaced,
        })
    }
}
