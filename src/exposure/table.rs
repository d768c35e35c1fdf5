//! Exposure rows and their grouping by boundary and taxonomy

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::config::ResamplerConfig;
use crate::core::error::{ResampleError, Result};
use crate::core::types::{BoundaryId, Quantities, TaxonomyKey};

/// One row of the input exposure table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureRecord {
    pub boundary: BoundaryId,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Driving quantity, usually the number of buildings
    #[serde(alias = "number")]
    pub count: f64,
    #[serde(default)]
    pub losses: BTreeMap<String, f64>,
}

impl ExposureRecord {
    pub fn new(boundary: &str, count: f64) -> Self {
        Self {
            boundary: BoundaryId::new(boundary),
            tags: BTreeMap::new(),
            count,
            losses: BTreeMap::new(),
        }
    }

    pub fn with_tag(mut self, tag: &str, value: &str) -> Self {
        self.tags.insert(tag.to_string(), value.to_string());
        self
    }

    pub fn with_loss(mut self, loss_type: &str, amount: f64) -> Self {
        self.losses.insert(loss_type.to_string(), amount);
        self
    }
}

/// Exposure of one taxonomy within one boundary, after grouping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureAggregate {
    pub boundary: BoundaryId,
    pub taxonomy: TaxonomyKey,
    pub quantities: Quantities,
}

impl ExposureAggregate {
    pub fn new(boundary: &str, taxonomy: TaxonomyKey, quantities: Quantities) -> Self {
        Self {
            boundary: BoundaryId::new(boundary),
            taxonomy,
            quantities,
        }
    }
}

/// Validate records against the configured schema, then sum them by
/// `(boundary, taxonomy)`. Output is sorted by boundary, then taxonomy.
pub fn group_exposure(
    records: &[ExposureRecord],
    config: &ResamplerConfig,
) -> Result<Vec<ExposureAggregate>> {
    let mut groups: BTreeMap<(BoundaryId, TaxonomyKey), Quantities> = BTreeMap::new();

    for (row, record) in records.iter().enumerate() {
        let taxonomy = taxonomy_of(row, record, config)?;
        let quantities = quantities_of(row, record, config)?;
        groups
            .entry((record.boundary.clone(), taxonomy))
            .or_insert_with(|| Quantities::zeroed(config.loss_types.len()))
            .add_assign(&quantities);
    }

    tracing::debug!(
        "Grouped {} exposure rows into {} boundary/taxonomy aggregates",
        records.len(),
        groups.len()
    );

    let aggregates: Vec<ExposureAggregate> = groups
        .into_iter()
        .map(|((boundary, taxonomy), quantities)| ExposureAggregate {
            boundary,
            taxonomy,
            quantities,
        })
        .collect();
    check_draw_limit(&aggregates, config)?;
    Ok(aggregates)
}

/// Reject aggregates whose count needs more draws than `config.max_draws`
pub fn check_draw_limit(aggregates: &[ExposureAggregate], config: &ResamplerConfig) -> Result<()> {
    let limit = config.max_draws as f64;
    match aggregates.iter().find(|a| a.quantities.count.ceil() > limit) {
        Some(aggregate) => Err(ResampleError::Schema(format!(
            "boundary {} taxonomy {} has count {} above the limit of {} draws",
            aggregate.boundary, aggregate.taxonomy, aggregate.quantities.count, config.max_draws
        ))),
        None => Ok(()),
    }
}

fn taxonomy_of(row: usize, record: &ExposureRecord, config: &ResamplerConfig) -> Result<TaxonomyKey> {
    let tags = config
        .retained_tags
        .iter()
        .map(|tag| {
            record
                .tags
                .get(tag)
                .map(|value| (tag.clone(), value.clone()))
                .ok_or_else(|| {
                    ResampleError::Schema(format!(
                        "exposure row {} (boundary {}) is missing tag '{}'",
                        row, record.boundary, tag
                    ))
                })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(TaxonomyKey::new(tags))
}

fn quantities_of(row: usize, record: &ExposureRecord, config: &ResamplerConfig) -> Result<Quantities> {
    let losses = config
        .loss_types
        .iter()
        .map(|loss_type| {
            record.losses.get(loss_type).copied().ok_or_else(|| {
                ResampleError::Schema(format!(
                    "exposure row {} (boundary {}) is missing loss '{}'",
                    row, record.boundary, loss_type
                ))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let quantities = Quantities::new(record.count, losses);
    if quantities.is_invalid() {
        return Err(ResampleError::Schema(format!(
            "exposure row {} (boundary {}) has negative or non-finite quantities",
            row, record.boundary
        )));
    }
    Ok(quantities)
}

/// Sum of the driving quantity
pub fn total_count<'a>(aggregates: impl IntoIterator<Item = &'a ExposureAggregate>) -> f64 {
    aggregates.into_iter().map(|a| a.quantities.count).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ResamplerConfig {
        ResamplerConfig {
            retained_tags: vec!["taxonomy".into()],
            loss_types: vec!["structural".into()],
            ..Default::default()
        }
    }

    #[test]
    fn test_groups_by_boundary_and_taxonomy() {
        let records = vec![
            ExposureRecord::new("B", 2.0).with_tag("taxonomy", "CR").with_loss("structural", 10.0),
            ExposureRecord::new("A", 1.5).with_tag("taxonomy", "MUR").with_loss("structural", 4.0),
            ExposureRecord::new("B", 3.0).with_tag("taxonomy", "CR").with_loss("structural", 5.0),
            ExposureRecord::new("B", 1.0).with_tag("taxonomy", "W").with_loss("structural", 1.0),
        ];
        let grouped = group_exposure(&records, &config()).unwrap();

        assert_eq!(grouped.len(), 3);
        assert_eq!(grouped[0].boundary, BoundaryId::new("A"));
        assert_eq!(grouped[1].taxonomy, TaxonomyKey::single("taxonomy", "CR"));
        assert_eq!(grouped[1].quantities, Quantities::new(5.0, vec![15.0]));
        assert_eq!(total_count(&grouped), 7.5);
    }

    #[test]
    fn test_extra_tags_ignored() {
        let records = vec![ExposureRecord::new("A", 1.0)
            .with_tag("taxonomy", "CR")
            .with_tag("occupancy", "Res")
            .with_loss("structural", 1.0)];
        let grouped = group_exposure(&records, &config()).unwrap();
        assert_eq!(grouped[0].taxonomy.tags().len(), 1);
    }

    #[test]
    fn test_missing_tag_rejected() {
        let records = vec![ExposureRecord::new("A", 1.0).with_loss("structural", 1.0)];
        assert!(matches!(
            group_exposure(&records, &config()),
            Err(ResampleError::Schema(_))
        ));
    }

    #[test]
    fn test_missing_loss_rejected() {
        let records = vec![ExposureRecord::new("A", 1.0).with_tag("taxonomy", "CR")];
        assert!(group_exposure(&records, &config()).is_err());
    }

    #[test]
    fn test_negative_count_rejected() {
        let records = vec![ExposureRecord::new("A", -1.0)
            .with_tag("taxonomy", "CR")
            .with_loss("structural", 1.0)];
        assert!(group_exposure(&records, &config()).is_err());
    }

    #[test]
    fn test_huge_count_rejected() {
        let records = vec![ExposureRecord::new("A", 1e19)
            .with_tag("taxonomy", "CR")
            .with_loss("structural", 1.0)];
        assert!(matches!(
            group_exposure(&records, &config()),
            Err(ResampleError::Schema(_))
        ));
    }

    #[test]
    fn test_draw_limit_applies_to_grouped_total() {
        let config = ResamplerConfig {
            max_draws: 10,
            ..config()
        };
        let row = |count| {
            ExposureRecord::new("A", count)
                .with_tag("taxonomy", "CR")
                .with_loss("structural", 1.0)
        };
        assert!(group_exposure(&[row(6.0), row(4.0)], &config).is_ok());
        assert!(group_exposure(&[row(6.0), row(4.5)], &config).is_err());
    }

    #[test]
    fn test_number_alias() {
        let json = r#"{"boundary": "AT-1", "tags": {"taxonomy": "CR"}, "number": 12.5,
                       "losses": {"structural": 1000.0}}"#;
        let record: ExposureRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.count, 12.5);
    }
}
