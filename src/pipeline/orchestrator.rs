//! End-to-end run: coarsen, associate, resolve coverage, disaggregate, check

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use rayon::prelude::*;

use crate::core::config::ResamplerConfig;
use crate::core::error::Result;
use crate::core::types::{BoundaryId, Quantities};
use crate::disaggregate::outcome::{BoundaryOutcome, Sample};
use crate::disaggregate::sampler::{boundary_rng, ProbabilisticDisaggregator};
use crate::exposure::table::{check_draw_limit, total_count, ExposureAggregate};
use crate::pipeline::diagnostics::{Diagnostic, RunReport};
use crate::pipeline::output::{ResampleOutput, RunStats};
use crate::raster::aggregate::RasterAggregator;
use crate::raster::source::RasterSource;
use crate::spatial::associate::{GridBoundaryAssociator, GridPoint};
use crate::spatial::boundary::BoundaryPolygon;
use crate::spatial::coverage::CoverageResolver;

/// One boundary's share of the work
struct BoundaryJob<'a> {
    boundary: &'a BoundaryId,
    candidates: Vec<&'a GridPoint>,
    aggregates: Vec<&'a ExposureAggregate>,
}

impl BoundaryJob<'_> {
    fn exposure(&self, loss_types: usize) -> Quantities {
        let mut total = Quantities::zeroed(loss_types);
        for aggregate in &self.aggregates {
            total.add_assign(&aggregate.quantities);
        }
        total
    }
}

pub struct Pipeline {
    config: ResamplerConfig,
}

impl Pipeline {
    pub fn new(config: ResamplerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ResamplerConfig {
        &self.config
    }

    pub fn run<S: RasterSource + ?Sized>(
        &self,
        raster: &S,
        boundaries: &[BoundaryPolygon],
        exposure: &[ExposureAggregate],
    ) -> Result<ResampleOutput> {
        let start = Instant::now();
        let config = &self.config;
        let mut report = RunReport::new();
        check_draw_limit(exposure, config)?;

        tracing::info!(
            "Starting run: {} boundary rows, {} exposure aggregates, resolution {}, seed {}",
            boundaries.len(),
            exposure.len(),
            config.resolution,
            config.seed
        );

        // === RASTER ===
        let grid = RasterAggregator::new(config).aggregate(raster)?;

        // === ASSOCIATION ===
        let association = GridBoundaryAssociator::new(config).associate(&grid, boundaries)?;
        let mut points = association.points;

        let mut by_boundary: BTreeMap<&BoundaryId, Vec<&ExposureAggregate>> = BTreeMap::new();
        for aggregate in exposure {
            by_boundary.entry(&aggregate.boundary).or_default().push(aggregate);
        }

        // === COVERAGE ===
        let mut imputed_points = 0;
        let mut unresolved: BTreeSet<BoundaryId> = BTreeSet::new();
        if !association.exceptions.is_empty() {
            report.push(Diagnostic::NoCoverage {
                boundaries: association.exceptions.clone(),
            });

            // Only boundaries that carry exposure need a location
            let needed: Vec<BoundaryId> = association
                .exceptions
                .iter()
                .filter(|id| by_boundary.contains_key(id))
                .cloned()
                .collect();

            let resolution = CoverageResolver::new(config).resolve(&points, boundaries, &needed)?;
            imputed_points = resolution.points.len();
            points.extend(resolution.points);
            unresolved.extend(resolution.unresolved);
        }

        // === DISAGGREGATION ===
        let mut candidates: BTreeMap<&BoundaryId, Vec<&GridPoint>> = BTreeMap::new();
        for point in &points {
            candidates.entry(&point.boundary).or_default().push(point);
        }

        let known: BTreeSet<&BoundaryId> = boundaries.iter().map(|b| &b.id).collect();
        let loss_types = config.loss_types.len();

        // Table boundaries without a single exposure row are empty results too
        let without_rows: Vec<&BoundaryId> = known
            .iter()
            .copied()
            .filter(|id| !by_boundary.contains_key(id))
            .collect();
        for boundary in &without_rows {
            report.push(Diagnostic::EmptyBoundary {
                boundary: (*boundary).clone(),
            });
        }

        let mut jobs: Vec<BoundaryJob> = Vec::with_capacity(by_boundary.len());
        for (boundary, aggregates) in by_boundary {
            if !known.contains(boundary) || unresolved.contains(boundary) {
                report.push(Diagnostic::UnknownBoundary {
                    boundary: boundary.clone(),
                    count: total_count(aggregates.iter().copied()),
                });
                continue;
            }
            jobs.push(BoundaryJob {
                boundary,
                candidates: candidates.remove(boundary).unwrap_or_default(),
                aggregates,
            });
        }

        let disaggregator = ProbabilisticDisaggregator::new(config);
        let sample_job = |job: &BoundaryJob| {
            let mut rng = boundary_rng(config.seed, job.boundary);
            disaggregator.disaggregate(job.boundary, &job.candidates, &job.aggregates, &mut rng)
        };
        let outcomes: Vec<BoundaryOutcome> = if jobs.len() >= config.parallel_threshold {
            jobs.par_iter().map(sample_job).collect()
        } else {
            jobs.iter().map(sample_job).collect()
        };

        let mut samples: Vec<Sample> = Vec::new();
        let mut draws = 0;
        for (job, outcome) in jobs.iter().zip(outcomes) {
            match outcome {
                BoundaryOutcome::Sampled(sampled) => {
                    if sampled.uniform_fallback {
                        report.push(Diagnostic::ZeroWeightCandidates {
                            boundary: sampled.boundary.clone(),
                            candidates: job.candidates.len(),
                        });
                    }
                    if !sampled.unplaced.is_zero() {
                        report.push(Diagnostic::UnplacedExposure {
                            boundary: sampled.boundary.clone(),
                            count: sampled.unplaced.count,
                            losses: sampled.unplaced.losses.clone(),
                        });
                    }
                    draws += sampled.draws;
                    samples.extend(sampled.samples);
                }
                BoundaryOutcome::Empty { boundary } => {
                    report.push(Diagnostic::EmptyBoundary { boundary });
                }
                BoundaryOutcome::NoCandidates { boundary, unplaced } => {
                    report.push(Diagnostic::UnplacedExposure {
                        boundary,
                        count: unplaced,
                        losses: job.exposure(loss_types).losses,
                    });
                }
            }
        }

        samples.retain(|sample| sample.quantities.count != 0.0);

        // === MASS CHECK ===
        let input_total = total_count(exposure);
        let output_total: f64 = samples.iter().map(|s| s.quantities.count).sum();
        let deviation = relative_deviation(input_total, output_total);
        if deviation > config.mass_threshold {
            report.push(Diagnostic::MassConservation {
                input_total,
                output_total,
                relative_deviation: deviation,
                threshold: config.mass_threshold,
            });
        }

        let statistics = RunStats {
            boundaries: jobs.len() + without_rows.len(),
            grid_points: points.len(),
            imputed_points,
            samples: samples.len(),
            draws,
            input_total,
            output_total,
            elapsed_ms: start.elapsed().as_millis() as u64,
            crs: config.crs.clone(),
        };

        tracing::info!(
            "Run complete: {} samples from {} boundaries in {}ms ({} diagnostics)",
            statistics.samples,
            statistics.boundaries,
            statistics.elapsed_ms,
            report.len()
        );

        Ok(ResampleOutput {
            samples,
            report,
            statistics,
        })
    }
}

/// Deviation relative to the input total; absolute when the input is zero
fn relative_deviation(input_total: f64, output_total: f64) -> f64 {
    let difference = (output_total - input_total).abs();
    if input_total > 0.0 {
        difference / input_total
    } else {
        difference
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::TaxonomyKey;
    use crate::raster::affine::Affine;
    use crate::raster::grid::RasterGrid;
    use geo::polygon;

    fn config() -> ResamplerConfig {
        ResamplerConfig {
            resolution: 1.0,
            loss_types: vec!["structural".into()],
            ..Default::default()
        }
    }

    /// 4x4 grid of unit cells over [0, 4] x [0, 4], all valued 1.0
    fn grid() -> RasterGrid {
        RasterGrid::filled(4, 4, Affine::north_up(0.0, 4.0, 1.0, 1.0), None, 1.0)
    }

    fn square(id: &str, x0: f64, y0: f64, size: f64) -> BoundaryPolygon {
        BoundaryPolygon::new(
            id,
            polygon![
                (x: x0, y: y0),
                (x: x0 + size, y: y0),
                (x: x0 + size, y: y0 + size),
                (x: x0, y: y0 + size),
                (x: x0, y: y0),
            ],
        )
    }

    fn exposure(boundary: &str, count: f64) -> ExposureAggregate {
        ExposureAggregate::new(
            boundary,
            TaxonomyKey::single("taxonomy", "CR"),
            Quantities::new(count, vec![count * 10.0]),
        )
    }

    #[test]
    fn test_relative_deviation() {
        assert_eq!(relative_deviation(10.0, 9.0), 0.1);
        assert_eq!(relative_deviation(0.0, 0.0), 0.0);
        assert_eq!(relative_deviation(0.0, 2.0), 2.0);
    }

    #[test]
    fn test_run_conserves_mass() {
        let pipeline = Pipeline::new(config()).unwrap();
        let output = pipeline
            .run(
                &grid(),
                &[square("A", 0.0, 0.0, 2.0), square("B", 2.0, 2.0, 2.0)],
                &[exposure("A", 7.5), exposure("B", 3.0)],
            )
            .unwrap();

        assert!((output.statistics.output_total - 10.5).abs() < 1e-9);
        assert!(!output.report.has_mass_warning());
        assert_eq!(output.statistics.boundaries, 2);
        assert_eq!(output.statistics.draws, 8 + 3);
        assert!(output.samples.iter().all(|s| s.quantities.count > 0.0));
    }

    #[test]
    fn test_empty_boundary_reported() {
        let pipeline = Pipeline::new(config()).unwrap();
        let output = pipeline
            .run(&grid(), &[square("A", 0.0, 0.0, 2.0)], &[exposure("A", 0.0)])
            .unwrap();
        assert!(output.samples.is_empty());
        assert!(output
            .report
            .diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::EmptyBoundary { .. })));
    }

    #[test]
    fn test_boundary_without_rows_reported_empty() {
        let pipeline = Pipeline::new(config()).unwrap();
        let output = pipeline
            .run(
                &grid(),
                &[square("A", 0.0, 0.0, 2.0), square("B", 2.0, 2.0, 2.0)],
                &[exposure("B", 3.0)],
            )
            .unwrap();

        assert_eq!(
            output.report.diagnostics,
            vec![Diagnostic::EmptyBoundary {
                boundary: BoundaryId::new("A")
            }]
        );
        assert_eq!(output.statistics.boundaries, 2);
        assert!(output.samples.iter().all(|s| s.boundary == BoundaryId::new("B")));
    }

    #[test]
    fn test_count_above_draw_limit_rejected() {
        let pipeline = Pipeline::new(ResamplerConfig {
            max_draws: 1_000,
            ..config()
        })
        .unwrap();
        let result = pipeline.run(
            &grid(),
            &[square("A", 0.0, 0.0, 2.0)],
            &[exposure("A", 1e19)],
        );
        assert!(matches!(result, Err(crate::core::error::ResampleError::Schema(_))));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ResamplerConfig {
            resolution: 0.0,
            ..Default::default()
        };
        assert!(Pipeline::new(config).is_err());
    }
}
