//! Administrative boundary polygons

use geo::{Area, GeodesicArea, InteriorPoint, MultiPolygon, Point, Polygon};
use serde::{Deserialize, Serialize};

use crate::core::config::AreaMeasure;
use crate::core::error::{ResampleError, Result};
use crate::core::types::{Attributes, BoundaryId};
use crate::spatial::validation::{GeometricValidator, ValidationError};

/// Geometry of a boundary row as it arrives: one polygon or several parts
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryShape {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

impl BoundaryShape {
    /// Normalize to a collection; a single polygon becomes a one-element collection
    pub fn into_multi(self) -> MultiPolygon<f64> {
        match self {
            BoundaryShape::Polygon(polygon) => MultiPolygon::new(vec![polygon]),
            BoundaryShape::MultiPolygon(multi) => multi,
        }
    }
}

impl From<Polygon<f64>> for BoundaryShape {
    fn from(polygon: Polygon<f64>) -> Self {
        BoundaryShape::Polygon(polygon)
    }
}

impl From<MultiPolygon<f64>> for BoundaryShape {
    fn from(multi: MultiPolygon<f64>) -> Self {
        BoundaryShape::MultiPolygon(multi)
    }
}

/// One row of the boundary table
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryPolygon {
    pub id: BoundaryId,
    /// All parts of this row, masked together as one unit
    pub geometry: MultiPolygon<f64>,
    /// Non-geometry columns, copied onto every grid point of this boundary
    pub attributes: Attributes,
}

impl BoundaryPolygon {
    pub fn new(id: impl Into<BoundaryId>, shape: impl Into<BoundaryShape>) -> Self {
        Self {
            id: id.into(),
            geometry: shape.into().into_multi(),
            attributes: Attributes::new(),
        }
    }

    pub fn with_attribute(mut self, name: &str, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn area(&self, measure: AreaMeasure) -> f64 {
        match measure {
            AreaMeasure::Geodesic => self.geometry.geodesic_area_unsigned(),
            AreaMeasure::Planar => self.geometry.unsigned_area(),
        }
    }

    /// Point guaranteed to lie inside the geometry; `None` when it is empty
    pub fn representative_point(&self) -> Option<Point<f64>> {
        self.geometry.interior_point()
    }
}

// ============================================================================
// INPUT RECORDS
// ============================================================================

/// GeoJSON-style geometry: `{"type": "Polygon", "coordinates": [[[x, y], ...]]}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum GeometryRecord {
    Polygon(Vec<Vec<[f64; 2]>>),
    MultiPolygon(Vec<Vec<Vec<[f64; 2]>>>),
}

/// Boundary row as deserialized from disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryRecord {
    pub id: BoundaryId,
    pub geometry: GeometryRecord,
    #[serde(default)]
    pub attributes: Attributes,
}

impl TryFrom<BoundaryRecord> for BoundaryPolygon {
    type Error = ResampleError;

    fn try_from(record: BoundaryRecord) -> Result<Self> {
        let invalid = |errors: Vec<ValidationError>| {
            let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
            ResampleError::Schema(format!(
                "boundary {} has invalid geometry: {}",
                record.id,
                details.join("; ")
            ))
        };

        let shape = match &record.geometry {
            GeometryRecord::Polygon(rings) => {
                let errors = GeometricValidator::validate_polygon(rings);
                if !errors.is_empty() {
                    return Err(invalid(errors));
                }
                BoundaryShape::Polygon(GeometricValidator::to_geo_polygon(rings))
            }
            GeometryRecord::MultiPolygon(parts) => {
                let errors: Vec<_> = parts
                    .iter()
                    .flat_map(|rings| GeometricValidator::validate_polygon(rings))
                    .collect();
                if !errors.is_empty() {
                    return Err(invalid(errors));
                }
                BoundaryShape::MultiPolygon(MultiPolygon::new(
                    parts
                        .iter()
                        .map(|rings| GeometricValidator::to_geo_polygon(rings))
                        .collect(),
                ))
            }
        };

        Ok(BoundaryPolygon {
            geometry: shape.into_multi(),
            id: record.id,
            attributes: record.attributes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Contains};

    #[test]
    fn test_single_polygon_normalized() {
        let poly = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)];
        let boundary = BoundaryPolygon::new("A", poly);
        assert_eq!(boundary.geometry.0.len(), 1);
    }

    #[test]
    fn test_planar_area() {
        let poly = polygon![(x: 0.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 3.0), (x: 0.0, y: 3.0)];
        let boundary = BoundaryPolygon::new("A", poly);
        assert!((boundary.area(AreaMeasure::Planar) - 6.0).abs() < 1e-12);
        assert!(boundary.area(AreaMeasure::Geodesic) > 0.0);
    }

    #[test]
    fn test_representative_point_inside_concave() {
        // U shape: the centroid falls in the notch
        let poly = polygon![
            (x: 0.0, y: 0.0), (x: 3.0, y: 0.0), (x: 3.0, y: 3.0), (x: 2.0, y: 3.0),
            (x: 2.0, y: 1.0), (x: 1.0, y: 1.0), (x: 1.0, y: 3.0), (x: 0.0, y: 3.0),
        ];
        let boundary = BoundaryPolygon::new("U", poly);
        let point = boundary.representative_point().unwrap();
        assert!(boundary.geometry.contains(&point));
    }

    #[test]
    fn test_record_from_json() {
        let json = r#"{
            "id": "AT-1",
            "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 1]]]},
            "attributes": {"NAME_1": "Burgenland"}
        }"#;
        let record: BoundaryRecord = serde_json::from_str(json).unwrap();
        let boundary = BoundaryPolygon::try_from(record).unwrap();
        assert_eq!(boundary.id, BoundaryId::new("AT-1"));
        assert_eq!(boundary.attributes["NAME_1"], "Burgenland");
    }

    #[test]
    fn test_degenerate_record_rejected() {
        let json = r#"{
            "id": "bad",
            "geometry": {"type": "MultiPolygon", "coordinates": [[[[0, 0], [1, 0]]]]}
        }"#;
        let record: BoundaryRecord = serde_json::from_str(json).unwrap();
        assert!(matches!(
            BoundaryPolygon::try_from(record),
            Err(ResampleError::Schema(_))
        ));
    }
}
