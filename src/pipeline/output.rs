//! Run output and serialization

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::config::ResamplerConfig;
use crate::core::error::Result;
use crate::core::types::BoundaryId;
use crate::disaggregate::outcome::Sample;
use crate::pipeline::diagnostics::RunReport;

/// Complete run output
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResampleOutput {
    pub samples: Vec<Sample>,
    pub report: RunReport,
    pub statistics: RunStats,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub boundaries: usize,
    pub grid_points: usize,
    pub imputed_points: usize,
    pub samples: usize,
    pub draws: usize,
    pub input_total: f64,
    pub output_total: f64,
    pub elapsed_ms: u64,
    /// Coordinate reference system of the sample locations
    pub crs: String,
}

/// One row of the flat output table
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OutputRow {
    pub lon: f64,
    pub lat: f64,
    #[serde(flatten)]
    pub tags: BTreeMap<String, String>,
    pub number: f64,
    #[serde(flatten)]
    pub losses: BTreeMap<String, f64>,
    pub boundary: BoundaryId,
}

impl ResampleOutput {
    /// Flatten samples into output rows, naming loss columns from `config`
    pub fn to_rows(&self, config: &ResamplerConfig) -> Vec<OutputRow> {
        self.samples
            .iter()
            .map(|sample| OutputRow {
                lon: sample.x,
                lat: sample.y,
                tags: sample
                    .taxonomy
                    .tags()
                    .iter()
                    .cloned()
                    .collect(),
                number: sample.quantities.count,
                losses: config
                    .loss_types
                    .iter()
                    .cloned()
                    .zip(sample.quantities.losses.iter().copied())
                    .collect(),
                boundary: sample.boundary.clone(),
            })
            .collect()
    }

    pub fn to_json(&self, config: &ResamplerConfig) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_rows(config))?)
    }

    pub fn report_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.report)?)
    }

    pub fn summary(&self) -> String {
        format!(
            "Resampled {} boundaries in {}ms ({})\n{} grid points ({} imputed), {} draws, {} samples\nTotal {:.3} in, {:.3} out, {} warnings",
            self.statistics.boundaries,
            self.statistics.elapsed_ms,
            self.statistics.crs,
            self.statistics.grid_points,
            self.statistics.imputed_points,
            self.statistics.draws,
            self.statistics.samples,
            self.statistics.input_total,
            self.statistics.output_total,
            self.report.warnings().count(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Quantities, TaxonomyKey};

    fn output() -> ResampleOutput {
        ResampleOutput {
            samples: vec![Sample {
                x: 16.5,
                y: 48.25,
                taxonomy: TaxonomyKey::single("taxonomy", "CR/LFINF"),
                boundary: BoundaryId::new("AT-1"),
                quantities: Quantities::new(3.0, vec![300.0, 12.0]),
            }],
            report: RunReport::new(),
            statistics: RunStats {
                boundaries: 1,
                samples: 1,
                input_total: 3.0,
                output_total: 3.0,
                crs: "EPSG:4326".to_string(),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_rows_are_flat() {
        let config = ResamplerConfig::default();
        let json: serde_json::Value =
            serde_json::from_str(&output().to_json(&config).unwrap()).unwrap();
        let row = &json[0];
        assert_eq!(row["lon"], 16.5);
        assert_eq!(row["lat"], 48.25);
        assert_eq!(row["taxonomy"], "CR/LFINF");
        assert_eq!(row["number"], 3.0);
        assert_eq!(row["structural"], 300.0);
        assert_eq!(row["night"], 12.0);
        assert_eq!(row["boundary"], "AT-1");
    }

    #[test]
    fn test_summary_mentions_totals() {
        let summary = output().summary();
        assert!(summary.contains("Resampled 1 boundaries"));
        assert!(summary.contains("(EPSG:4326)"));
        assert!(summary.contains("0 warnings"));
    }
}
