//! Geometric validation of boundary rings at ingestion

use geo_types::{LineString, Polygon};

/// Validation error types
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    InsufficientVertices { count: usize, minimum: usize },
    NonFiniteCoordinate { coordinate: [f64; 2] },
    MissingExterior,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InsufficientVertices { count, minimum } => {
                write!(f, "ring has {} distinct vertices, needs {}", count, minimum)
            }
            ValidationError::NonFiniteCoordinate { coordinate } => {
                write!(f, "non-finite coordinate {:?}", coordinate)
            }
            ValidationError::MissingExterior => write!(f, "polygon has no exterior ring"),
        }
    }
}

pub struct GeometricValidator;

impl GeometricValidator {
    /// Validate a ring represented as a list of [x, y] vertices
    pub fn validate_ring(vertices: &[[f64; 2]]) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        for vertex in vertices {
            if !vertex[0].is_finite() || !vertex[1].is_finite() {
                errors.push(ValidationError::NonFiniteCoordinate {
                    coordinate: *vertex,
                });
            }
        }

        // A closing vertex repeating the first one doesn't count
        let distinct = match (vertices.first(), vertices.last()) {
            (Some(first), Some(last)) if vertices.len() > 1 && first == last => {
                vertices.len() - 1
            }
            _ => vertices.len(),
        };
        if distinct < 3 {
            errors.push(ValidationError::InsufficientVertices {
                count: distinct,
                minimum: 3,
            });
        }

        errors
    }

    /// Validate every ring of a polygon given as `[exterior, holes...]`
    pub fn validate_polygon(rings: &[Vec<[f64; 2]>]) -> Vec<ValidationError> {
        if rings.is_empty() {
            return vec![ValidationError::MissingExterior];
        }
        rings
            .iter()
            .flat_map(|ring| Self::validate_ring(ring))
            .collect()
    }

    /// Build a geo polygon from `[exterior, holes...]`. Rings are closed by geo.
    pub fn to_geo_polygon(rings: &[Vec<[f64; 2]>]) -> Polygon<f64> {
        let to_line = |ring: &Vec<[f64; 2]>| -> LineString<f64> {
            ring.iter().map(|[x, y]| (*x, *y)).collect::<Vec<_>>().into()
        };
        let mut rings = rings.iter();
        let exterior = rings.next().map(to_line).unwrap_or_else(|| LineString::new(vec![]));
        let interiors = rings.map(to_line).collect();
        Polygon::new(exterior, interiors)
    }
}
