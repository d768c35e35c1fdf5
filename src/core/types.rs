//! Core record types shared by every pipeline stage

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of an administrative boundary (the `mapped_field` value)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoundaryId(pub String);

impl BoundaryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Stable 64-bit hash (FNV-1a), used to derive per-boundary RNG seeds.
    ///
    /// Must not depend on process state, so `std::hash` is not used here.
    pub fn stable_hash(&self) -> u64 {
        self.0.bytes().fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
            (hash ^ byte as u64).wrapping_mul(0x0000_0100_0000_01b3)
        })
    }
}

impl fmt::Display for BoundaryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BoundaryId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for BoundaryId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Non-geometry attributes carried from a boundary row onto its grid points
pub type Attributes = BTreeMap<String, serde_json::Value>;

/// Taxonomy of an exposure row: the retained tag values, in configured tag order.
///
/// Derived from the tag values themselves, so two rows with the same tags always
/// map to the same key regardless of grouping order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaxonomyKey(Vec<(String, String)>);

impl TaxonomyKey {
    /// Build a key from `(tag, value)` pairs. Order is preserved as given.
    pub fn new(tags: Vec<(String, String)>) -> Self {
        Self(tags)
    }

    /// Single-tag shorthand, mostly for tests and small scenarios
    pub fn single(tag: &str, value: &str) -> Self {
        Self(vec![(tag.to_string(), value.to_string())])
    }

    pub fn tags(&self) -> &[(String, String)] {
        &self.0
    }

    pub fn get(&self, tag: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| name == tag)
            .map(|(_, value)| value.as_str())
    }

    /// Human-readable label, tag values joined by `/`
    pub fn label(&self) -> String {
        self.0
            .iter()
            .map(|(_, value)| value.as_str())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl fmt::Display for TaxonomyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Named exposure quantities: the driving count plus loss amounts.
///
/// `losses` is positional, aligned with the configured loss type list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Quantities {
    pub count: f64,
    pub losses: Vec<f64>,
}

impl Quantities {
    pub fn new(count: f64, losses: Vec<f64>) -> Self {
        Self { count, losses }
    }

    pub fn zeroed(loss_types: usize) -> Self {
        Self {
            count: 0.0,
            losses: vec![0.0; loss_types],
        }
    }

    /// Every quantity apportioned by `weight / total`.
    ///
    /// Multiplies before dividing so integral weights over integral totals
    /// come out exact.
    pub fn apportioned(&self, weight: f64, total: f64) -> Self {
        Self {
            count: self.count * weight / total,
            losses: self.losses.iter().map(|l| l * weight / total).collect(),
        }
    }

    pub fn add_assign(&mut self, other: &Quantities) {
        self.count += other.count;
        if self.losses.len() < other.losses.len() {
            self.losses.resize(other.losses.len(), 0.0);
        }
        for (mine, theirs) in self.losses.iter_mut().zip(&other.losses) {
            *mine += theirs;
        }
    }

    pub fn is_zero(&self) -> bool {
        self.count == 0.0 && self.losses.iter().all(|l| *l == 0.0)
    }

    /// Any negative or non-finite value
    pub fn is_invalid(&self) -> bool {
        std::iter::once(&self.count)
            .chain(&self.losses)
            .any(|v| !v.is_finite() || *v < 0.0)
    }
}
