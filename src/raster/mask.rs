//! Mask a raster to a boundary geometry
//!
//! The geometry's bounding box is converted to a pixel window first (the
//! crop), then each cell in the window is kept when its center falls inside
//! the geometry.
//!
//! A center lying exactly on an edge belongs to the side a small fixed
//! offset moves it into, so boundaries that share an edge through cell
//! centers each keep those cells exactly once between them.

use geo::{BoundingRect, Contains, Intersects, MultiPolygon, Point};

use crate::raster::grid::RasterGrid;

/// Cell that survived masking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskedCell {
    pub row: usize,
    pub col: usize,
    pub value: f64,
}

/// Pixel window `[row_start, row_end) x [col_start, col_end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    pub row_start: usize,
    pub row_end: usize,
    pub col_start: usize,
    pub col_end: usize,
}

impl PixelWindow {
    pub fn is_empty(&self) -> bool {
        self.row_start >= self.row_end || self.col_start >= self.col_end
    }
}

/// Pixel window covering the bounding box of `geometry`, clipped to the grid
pub fn crop_window(grid: &RasterGrid, geometry: &MultiPolygon<f64>) -> Option<PixelWindow> {
    let rect = geometry.bounding_rect()?;
    let inverse = grid.transform.inverse()?;

    let (min, max) = (rect.min(), rect.max());
    let corners = [
        inverse.apply(min.x, min.y),
        inverse.apply(min.x, max.y),
        inverse.apply(max.x, min.y),
        inverse.apply(max.x, max.y),
    ];

    let (mut col_min, mut col_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut row_min, mut row_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for (col, row) in corners {
        col_min = col_min.min(col);
        col_max = col_max.max(col);
        row_min = row_min.min(row);
        row_max = row_max.max(row);
    }

    let clamp = |v: f64, upper: usize| -> usize { v.max(0.0).min(upper as f64) as usize };
    let window = PixelWindow {
        row_start: clamp(row_min.floor(), grid.height),
        row_end: clamp(row_max.ceil(), grid.height),
        col_start: clamp(col_min.floor(), grid.width),
        col_end: clamp(col_max.ceil(), grid.width),
    };

    (!window.is_empty()).then_some(window)
}

/// Offset, in cells, applied to a center on an edge. The slope is
/// irrational so the offset never runs along an axis-aligned edge.
const EDGE_OFFSET: (f64, f64) = (1e-6, 0.618_033_988_749_895e-6);

/// Whether a cell center belongs to `geometry`, settling edge cases by offset
fn center_inside(geometry: &MultiPolygon<f64>, x: f64, y: f64, offset: (f64, f64)) -> bool {
    let center = Point::new(x, y);
    if geometry.contains(&center) {
        return true;
    }
    if !geometry.intersects(&center) {
        return false;
    }
    geometry.contains(&Point::new(x + offset.0, y + offset.1))
}

/// Valid cells whose centers lie inside `geometry`.
///
/// With `remove_zeros`, cells holding exactly `0.0` are dropped as well.
pub fn mask_cells(
    grid: &RasterGrid,
    geometry: &MultiPolygon<f64>,
    remove_zeros: bool,
) -> Vec<MaskedCell> {
    let Some(window) = crop_window(grid, geometry) else {
        return Vec::new();
    };

    let (res_x, res_y) = grid.resolution();
    let offset = (EDGE_OFFSET.0 * res_x, EDGE_OFFSET.1 * res_y);

    let mut cells = Vec::new();
    for row in window.row_start..window.row_end {
        for col in window.col_start..window.col_end {
            let Some(value) = grid.valid(row, col) else {
                continue;
            };
            if remove_zeros && value == 0.0 {
                continue;
            }
            let (x, y) = grid.cell_center(row, col);
            if center_inside(geometry, x, y, offset) {
                cells.push(MaskedCell { row, col, value });
            }
        }
    }
    cells
}
