//! Sparse hash grid for exact nearest-neighbor queries

use ahash::AHashMap;

use crate::spatial::associate::GridPoint;

/// Read-only index over point positions. Built once, then shared across
/// workers for lookups.
pub struct NearestIndex {
    cell_size: f64,
    cells: AHashMap<(i64, i64), Vec<usize>>,
    positions: Vec<(f64, f64)>,
    min_cell: (i64, i64),
    max_cell: (i64, i64),
}

impl NearestIndex {
    pub fn new(cell_size: f64) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            1.0
        };
        Self {
            cell_size,
            cells: AHashMap::new(),
            positions: Vec::new(),
            min_cell: (i64::MAX, i64::MAX),
            max_cell: (i64::MIN, i64::MIN),
        }
    }

    /// Index every grid point. Point indices match positions in `points`.
    pub fn from_grid_points(points: &[GridPoint], cell_size: f64) -> Self {
        let mut index = Self::new(cell_size);
        for point in points {
            index.insert(point.x, point.y);
        }
        index
    }

    #[inline]
    fn cell_coord(&self, x: f64, y: f64) -> (i64, i64) {
        (
            (x / self.cell_size).floor() as i64,
            (y / self.cell_size).floor() as i64,
        )
    }

    /// Add a position; returns its index
    pub fn insert(&mut self, x: f64, y: f64) -> usize {
        let idx = self.positions.len();
        let coord = self.cell_coord(x, y);
        self.cells.entry(coord).or_default().push(idx);
        self.positions.push((x, y));
        self.min_cell = (self.min_cell.0.min(coord.0), self.min_cell.1.min(coord.1));
        self.max_cell = (self.max_cell.0.max(coord.0), self.max_cell.1.max(coord.1));
        idx
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Index and Euclidean distance of the closest position.
    ///
    /// Searches rings of cells outward from the query cell. A position in
    /// ring `k` is more than `(k - 1) * cell_size` away, which bounds the
    /// search. Equal distances resolve to the lowest index.
    pub fn nearest(&self, x: f64, y: f64) -> Option<(usize, f64)> {
        if self.is_empty() {
            return None;
        }

        let (cx, cy) = self.cell_coord(x, y);
        let max_ring = [
            (cx - self.min_cell.0).abs(),
            (self.max_cell.0 - cx).abs(),
            (cy - self.min_cell.1).abs(),
            (self.max_cell.1 - cy).abs(),
        ]
        .into_iter()
        .max()
        .unwrap_or(0);

        let mut best: Option<(usize, f64)> = None;

        for ring in 0..=max_ring {
            if let Some((_, best_distance)) = best {
                if (ring - 1) as f64 * self.cell_size > best_distance {
                    break;
                }
            }

            for dx in -ring..=ring {
                // Only the ring's perimeter; inner cells were visited already
                let step = if dx.abs() == ring { 1 } else { (2 * ring) as usize };
                for dy in (-ring..=ring).step_by(step) {
                    let Some(bucket) = self.cells.get(&(cx + dx, cy + dy)) else {
                        continue;
                    };
                    for &idx in bucket {
                        let (px, py) = self.positions[idx];
                        let distance = (px - x).hypot(py - y);
                        let closer = match best {
                            None => true,
                            Some((best_idx, best_distance)) => {
                                distance < best_distance
                                    || (distance == best_distance && idx < best_idx)
                            }
                        };
                        if closer {
                            best = Some((idx, distance));
                        }
                    }
                }
            }
        }

        best
    }
}
