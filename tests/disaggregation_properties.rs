//! Properties of per-boundary probabilistic disaggregation

use exposure_resampler::core::config::ResamplerConfig;
use exposure_resampler::core::types::{Attributes, BoundaryId, Quantities, TaxonomyKey};
use exposure_resampler::disaggregate::{
    boundary_rng, draw_weights, BoundaryOutcome, ProbabilisticDisaggregator,
};
use exposure_resampler::exposure::ExposureAggregate;
use exposure_resampler::spatial::{GridPoint, PointOrigin};
use proptest::prelude::*;

fn candidates(weights: &[f64]) -> Vec<GridPoint> {
    weights
        .iter()
        .enumerate()
        .map(|(i, &weight)| GridPoint {
            x: i as f64,
            y: 0.0,
            value: weight,
            weight,
            boundary: BoundaryId::new("B"),
            attributes: Attributes::new(),
            origin: PointOrigin::Cell { row: 0, col: i },
        })
        .collect()
}

fn config() -> ResamplerConfig {
    ResamplerConfig {
        loss_types: vec!["structural".into(), "night".into()],
        ..Default::default()
    }
}

fn run(weights: &[f64], count: f64, losses: Vec<f64>, seed: u64) -> BoundaryOutcome {
    let config = config();
    let points = candidates(weights);
    let refs: Vec<&GridPoint> = points.iter().collect();
    let aggregate = ExposureAggregate::new(
        "B",
        TaxonomyKey::single("taxonomy", "CR"),
        Quantities::new(count, losses),
    );
    let boundary = BoundaryId::new("B");
    ProbabilisticDisaggregator::new(&config).disaggregate(
        &boundary,
        &refs,
        &[&aggregate],
        &mut boundary_rng(seed, &boundary),
    )
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-6 * b.abs().max(1.0)
}

proptest! {
    #[test]
    fn mass_is_conserved(
        weights in prop::collection::vec(0.0f64..10.0, 1..8),
        count in 0.01f64..500.0,
        structural in 0.0f64..1e6,
        night in 0.0f64..100.0,
        seed in any::<u64>(),
    ) {
        let outcome = run(&weights, count, vec![structural, night], seed);
        let samples = outcome.samples();
        let placed: f64 = samples.iter().map(|s| s.quantities.count).sum();
        let placed_structural: f64 = samples.iter().map(|s| s.quantities.losses[0]).sum();
        let placed_night: f64 = samples.iter().map(|s| s.quantities.losses[1]).sum();
        prop_assert!(close(placed, count), "{} vs {}", placed, count);
        prop_assert!(close(placed_structural, structural));
        prop_assert!(close(placed_night, night));
    }

    #[test]
    fn draw_count_is_ceiling(count in 0.001f64..1000.0) {
        let weights = draw_weights(count);
        prop_assert_eq!(weights.len(), count.ceil() as usize);
        prop_assert!(weights.iter().all(|w| *w > 0.0 && *w <= 1.0));
        prop_assert!(close(weights.iter().sum::<f64>(), count));
    }

    #[test]
    fn samples_only_at_candidates(
        weights in prop::collection::vec(0.5f64..5.0, 1..6),
        count in 1.0f64..50.0,
        seed in any::<u64>(),
    ) {
        let outcome = run(&weights, count, vec![0.0, 0.0], seed);
        let BoundaryOutcome::Sampled(sampled) = outcome else {
            return Err(TestCaseError::fail("expected samples"));
        };
        prop_assert_eq!(sampled.draws, count.ceil() as usize);
        for sample in &sampled.samples {
            prop_assert!(sample.x >= 0.0 && (sample.x as usize) < weights.len());
        }
    }
}

#[test]
fn test_zero_quantity_passes_through() {
    let outcome = run(&[1.0, 2.0], 0.0, vec![0.0, 0.0], 1);
    assert!(matches!(outcome, BoundaryOutcome::Empty { .. }));
}

#[test]
fn test_fractional_draws() {
    let weights = draw_weights(5.3);
    assert_eq!(weights.len(), 6);
    assert_eq!(&weights[..5], &[1.0; 5]);
    assert!((weights[5] - 0.3).abs() < 1e-12);
}

#[test]
fn test_weighting_matches_probabilities() {
    // Weights [3, 1]: three quarters of the mass should land on the first cell
    let trials = 2000;
    let mut first = 0.0;
    for seed in 0..trials {
        let outcome = run(&[3.0, 1.0], 10.0, vec![0.0, 0.0], seed);
        first += outcome
            .samples()
            .iter()
            .filter(|s| s.x == 0.0)
            .map(|s| s.quantities.count)
            .sum::<f64>();
    }
    let share = first / (trials as f64 * 10.0);
    assert!((share - 0.75).abs() < 0.02, "share was {}", share);
}

#[test]
fn test_same_boundary_same_seed_same_draws() {
    let a = run(&[1.0, 2.0, 3.0], 41.7, vec![10.0, 1.0], 99);
    let b = run(&[1.0, 2.0, 3.0], 41.7, vec![10.0, 1.0], 99);
    assert_eq!(a, b);
}
