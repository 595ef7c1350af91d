//! Corner point extraction from binary occupancy masks
//!
//! Both extractors return the data-area corners in pixel space ordered
//! [UL, UR, LL, LR]. The corner detector tries them in sequence.

use crate::types::{BinaryMask, GeoError, GeoResult, PixelPoint};
use ndarray::{ArrayView1, Axis};
use std::collections::HashSet;

/// Strategy that derives corner points from a binary mask
pub trait BoundaryExtractor {
    /// Short name used in logs and diagnostics
    fn name(&self) -> &'static str;

    /// Corner points ordered [UL, UR, LL, LR].
    ///
    /// With `assert_four_corners` the result must contain exactly four
    /// distinct points, otherwise an error is returned.
    fn extract_corners(&self, mask: &BinaryMask, assert_four_corners: bool) -> GeoResult<Vec<PixelPoint>>;
}

/// Number of distinct points
pub fn count_unique(points: &[PixelPoint]) -> usize {
    points.iter().collect::<HashSet<_>>().len()
}

fn ensure_four_corners(name: &str, corners: Vec<PixelPoint>, assert_four_corners: bool) -> GeoResult<Vec<PixelPoint>> {
    if assert_four_corners && count_unique(&corners) != 4 {
        return Err(GeoError::Extraction(format!(
            "{} extractor found {} distinct corners, expected 4",
            name,
            count_unique(&corners)
        )));
    }
    Ok(corners)
}

fn first_set(lane: &ArrayView1<u8>) -> Option<usize> {
    lane.iter().position(|&v| v != 0)
}

fn last_set(lane: &ArrayView1<u8>) -> Option<usize> {
    lane.iter().rposition(|&v| v != 0)
}

fn empty_mask_error(name: &str) -> GeoError {
    GeoError::Extraction(format!("{} extractor: mask contains no data pixels", name))
}

/// Geometry based extractor.
///
/// Traces the upper and lower outline of the data area column by column,
/// takes the convex hull of the outline and picks the hull vertex closest to
/// each of the four raster corners.
#[derive(Debug, Clone, Copy, Default)]
pub struct HullExtractor;

impl HullExtractor {
    /// Topmost and bottommost data pixel of every column holding data
    fn outline(mask: &BinaryMask) -> Vec<PixelPoint> {
        let mut outline = Vec::new();
        for (col, column) in mask.axis_iter(Axis(1)).enumerate() {
            let top = first_set(&column);
            let bottom = last_set(&column);
            if let (Some(top), Some(bottom)) = (top, bottom) {
                outline.push(PixelPoint::new(top, col));
                if bottom != top {
                    outline.push(PixelPoint::new(bottom, col));
                }
            }
        }
        outline
    }

    /// Andrew's monotone chain; collinear points are dropped.
    fn convex_hull(points: &[PixelPoint]) -> Vec<PixelPoint> {
        let mut pts: Vec<(i64, i64)> = points.iter().map(|p| (p.col as i64, p.row as i64)).collect();
        pts.sort_unstable();
        pts.dedup();
        if pts.len() < 3 {
            return pts.into_iter().map(|(x, y)| PixelPoint::new(y as usize, x as usize)).collect();
        }

        let cross = |o: (i64, i64), a: (i64, i64), b: (i64, i64)| -> i64 {
            (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
        };

        let mut hull: Vec<(i64, i64)> = Vec::with_capacity(2 * pts.len());
        for &p in pts.iter() {
            while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0 {
                hull.pop();
            }
            hull.push(p);
        }
        let lower_len = hull.len() + 1;
        for &p in pts.iter().rev().skip(1) {
            while hull.len() >= lower_len && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0 {
                hull.pop();
            }
            hull.push(p);
        }
        // last point repeats the first
        hull.pop();

        hull.into_iter().map(|(x, y)| PixelPoint::new(y as usize, x as usize)).collect()
    }

    /// Nearest hull vertex per target corner.
    ///
    /// With four or more vertices every corner gets its own vertex, so a data
    /// area rotated by 45 degrees still yields four distinct corners.
    fn assign_corners(hull: &[PixelPoint], targets: &[(usize, usize); 4]) -> Vec<PixelPoint> {
        let distinct = hull.len() >= 4;
        let mut used = vec![false; hull.len()];
        let mut corners = Vec::with_capacity(4);

        for &(row, col) in targets.iter() {
            let dist2 = |p: &PixelPoint| {
                let dr = p.row as i64 - row as i64;
                let dc = p.col as i64 - col as i64;
                dr * dr + dc * dc
            };
            let mut best: Option<usize> = None;
            for (i, p) in hull.iter().enumerate() {
                if distinct && used[i] {
                    continue;
                }
                if best.map_or(true, |b| dist2(p) < dist2(&hull[b])) {
                    best = Some(i);
                }
            }
            if let Some(i) = best {
                used[i] = true;
                corners.push(hull[i]);
            }
        }
        corners
    }
}

impl BoundaryExtractor for HullExtractor {
    fn name(&self) -> &'static str {
        "hull"
    }

    fn extract_corners(&self, mask: &BinaryMask, assert_four_corners: bool) -> GeoResult<Vec<PixelPoint>> {
        let (rows, cols) = mask.dim();
        let outline = Self::outline(mask);
        if outline.is_empty() {
            return Err(empty_mask_error(self.name()));
        }

        let hull = Self::convex_hull(&outline);
        log::debug!("Data outline: {} points, convex hull: {} vertices", outline.len(), hull.len());
        if hull.len() < 3 {
            return Err(GeoError::Extraction(format!(
                "hull extractor: degenerate data polygon with {} vertices",
                hull.len()
            )));
        }

        let targets = [(0, 0), (0, cols - 1), (rows - 1, 0), (rows - 1, cols - 1)];
        let corners = Self::assign_corners(&hull, &targets);
        ensure_four_corners(self.name(), corners, assert_four_corners)
    }
}

/// Pure numeric extractor based on the extreme data rows and columns.
///
/// UL is the leftmost pixel of the first data row, UR the topmost pixel of
/// the last data column, LL the bottommost pixel of the first data column and
/// LR the rightmost pixel of the last data row. For an axis-aligned data area
/// these are its four corners, for a rotated one its four extreme points.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtentExtractor;

impl BoundaryExtractor for ExtentExtractor {
    fn name(&self) -> &'static str {
        "extent"
    }

    fn extract_corners(&self, mask: &BinaryMask, assert_four_corners: bool) -> GeoResult<Vec<PixelPoint>> {
        let rows_with_data: Vec<usize> = mask
            .axis_iter(Axis(0))
            .enumerate()
            .filter(|(_, row)| first_set(row).is_some())
            .map(|(i, _)| i)
            .collect();
        let cols_with_data: Vec<usize> = mask
            .axis_iter(Axis(1))
            .enumerate()
            .filter(|(_, col)| first_set(col).is_some())
            .map(|(i, _)| i)
            .collect();

        let (first_row, last_row, first_col, last_col) = match (
            rows_with_data.first(),
            rows_with_data.last(),
            cols_with_data.first(),
            cols_with_data.last(),
        ) {
            (Some(&fr), Some(&lr), Some(&fc), Some(&lc)) => (fr, lr, fc, lc),
            _ => return Err(empty_mask_error(self.name())),
        };

        let missing = || GeoError::Extraction("extent extractor: inconsistent mask scan".to_string());

        let ul_col = first_set(&mask.row(first_row)).ok_or_else(missing)?;
        let ur_row = first_set(&mask.column(last_col)).ok_or_else(missing)?;
        let ll_row = last_set(&mask.column(first_col)).ok_or_else(missing)?;
        let lr_col = last_set(&mask.row(last_row)).ok_or_else(missing)?;

        let corners = vec![
            PixelPoint::new(first_row, ul_col),
            PixelPoint::new(ur_row, last_col),
            PixelPoint::new(ll_row, first_col),
            PixelPoint::new(last_row, lr_col),
        ];
        log::debug!(
            "Data extent rows {}..={} cols {}..={}",
            first_row,
            last_row,
            first_col,
            last_col
        );
        ensure_four_corners(self.name(), corners, assert_four_corners)
    }
}

/// Default strategy order: geometry based first, numeric second
pub fn default_extractors() -> Vec<Box<dyn BoundaryExtractor>> {
    vec![Box::new(HullExtractor), Box::new(ExtentExtractor)]
}
