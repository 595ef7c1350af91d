use crate::io::RasterReader;
use crate::types::{GeoError, GeoResult, NoDataEstimate, RasterAccessor};
use ndarray::ArrayView2;
use std::path::Path;

/// No-data estimation parameters
#[derive(Debug, Clone)]
pub struct NoDataEstimationParams {
    /// Band to analyse (0-based)
    pub band_index: usize,
    /// Edge length of the square corner windows
    pub window_size: usize,
}

impl Default for NoDataEstimationParams {
    fn default() -> Self {
        Self {
            band_index: 0,
            window_size: 3,
        }
    }
}

/// Mean and population standard deviation of one corner window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerStat {
    pub mean: f64,
    pub std: f64,
    /// Value of a homogeneous window, taken from a pixel so it compares
    /// exactly against band data
    homogeneous_value: Option<f64>,
}

impl CornerStat {
    fn from_window(window: &ArrayView2<f64>) -> Self {
        let mean = window.mean().unwrap_or(f64::NAN);
        let std = window.std(0.0);
        let homogeneous_value = if std == 0.0 {
            window.iter().next().copied()
        } else {
            None
        };
        Self {
            mean,
            std,
            homogeneous_value,
        }
    }

    /// A window is a no-data candidate only if it is perfectly homogeneous
    pub fn is_homogeneous(&self) -> bool {
        self.homogeneous_value.is_some()
    }
}

/// Derives the no-data value from homogeneous corner windows
pub struct NoDataEstimator {
    params: NoDataEstimationParams,
}

impl NoDataEstimator {
    pub fn new() -> Self {
        Self {
            params: NoDataEstimationParams::default(),
        }
    }

    pub fn with_params(params: NoDataEstimationParams) -> Self {
        Self { params }
    }

    /// Statistics of the UL, UR, LR and LL corner windows
    pub fn corner_stats<R: RasterAccessor>(&self, raster: &R) -> GeoResult<[CornerStat; 4]> {
        let (rows, cols, _) = raster.shape();
        let sz = self.params.window_size;
        if sz == 0 {
            return Err(GeoError::InvalidInput("Corner window size must be at least 1".to_string()));
        }
        if rows == 0 || cols == 0 {
            return Err(GeoError::InvalidInput(format!(
                "Cannot estimate no-data value of an empty {}x{} raster",
                rows, cols
            )));
        }

        // windows are clipped to the raster when sz exceeds a dimension
        let top = 0..sz.min(rows);
        let bottom = rows.saturating_sub(sz)..rows;
        let left = 0..sz.min(cols);
        let right = cols.saturating_sub(sz)..cols;
        let band = self.params.band_index;

        let ul = raster.window(top.clone(), left.clone(), band)?;
        let ur = raster.window(top, right.clone(), band)?;
        let lr = raster.window(bottom.clone(), right, band)?;
        let ll = raster.window(bottom, left, band)?;

        Ok([
            CornerStat::from_window(&ul),
            CornerStat::from_window(&ur),
            CornerStat::from_window(&lr),
            CornerStat::from_window(&ll),
        ])
    }

    pub fn estimate<R: RasterAccessor>(&self, raster: &R) -> GeoResult<NoDataEstimate> {
        log::debug!("No-data estimation parameters: {:?}", self.params);
        let stats = self.corner_stats(raster)?;

        let candidates: Vec<f64> = stats.iter().filter_map(|s| s.homogeneous_value).collect();
        log::debug!("Homogeneous corner windows: {} of 4 ({:?})", candidates.len(), candidates);

        let estimate = match candidates.first() {
            None => NoDataEstimate::None,
            Some(&first) if candidates.iter().all(|&v| v == first) => NoDataEstimate::Value(first),
            Some(_) => NoDataEstimate::Unclear,
        };

        log::info!("Estimated no-data value: {}", estimate);
        Ok(estimate)
    }
}

impl Default for NoDataEstimator {
    fn default() -> Self {
        Self::new()
    }
}

/// Estimate the no-data value of a raster from its corner windows
pub fn find_nodata_value<R: RasterAccessor>(
    raster: &R,
    band_index: usize,
    window_size: usize,
) -> GeoResult<NoDataEstimate> {
    NoDataEstimator::with_params(NoDataEstimationParams {
        band_index,
        window_size,
    })
    .estimate(raster)
}

/// [`find_nodata_value`] for a raster file
pub fn find_nodata_value_from_path<P: AsRef<Path>>(
    path: P,
    band_index: usize,
    window_size: usize,
) -> GeoResult<NoDataEstimate> {
    let raster = RasterReader::read(path)?;
    find_nodata_value(&raster, band_index, window_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GeoRaster;
    use ndarray::Array2;

    fn raster_from(band: Array2<f64>) -> GeoRaster {
        GeoRaster::from_band(band, None, None)
    }

    /// Varying interior values that never equal 5 or 7
    fn textured(rows: usize, cols: usize) -> Array2<f64> {
        Array2::from_shape_fn((rows, cols), |(i, j)| 10.0 + (i * cols + j) as f64 * 0.37)
    }

    fn fill_corner(band: &mut Array2<f64>, corner: usize, sz: usize, value: f64) {
        let (rows, cols) = band.dim();
        let (r0, c0) = match corner {
            0 => (0, 0),
            1 => (0, cols - sz),
            2 => (rows - sz, cols - sz),
            _ => (rows - sz, 0),
        };
        for i in r0..r0 + sz {
            for j in c0..c0 + sz {
                band[[i, j]] = value;
            }
        }
    }

    #[test]
    fn test_all_corners_homogeneous() {
        let mut band = textured(20, 25);
        for corner in 0..4 {
            fill_corner(&mut band, corner, 3, 5.0);
        }
        let estimate = find_nodata_value(&raster_from(band), 0, 3).unwrap();
        assert_eq!(estimate, NoDataEstimate::Value(5.0));
    }

    #[test]
    fn test_no_homogeneous_corner() {
        let estimate = find_nodata_value(&raster_from(textured(20, 25)), 0, 3).unwrap();
        assert_eq!(estimate, NoDataEstimate::None);
    }

    #[test]
    fn test_disagreeing_corners_are_unclear() {
        let mut band = textured(20, 25);
        fill_corner(&mut band, 0, 3, 5.0);
        fill_corner(&mut band, 1, 3, 5.0);
        fill_corner(&mut band, 2, 3, 7.0);
        fill_corner(&mut band, 3, 3, 7.0);
        let estimate = find_nodata_value(&raster_from(band), 0, 3).unwrap();
        assert_eq!(estimate, NoDataEstimate::Unclear);
    }

    #[test]
    fn test_single_homogeneous_corner_is_enough() {
        let mut band = textured(20, 25);
        fill_corner(&mut band, 2, 3, -9999.0);
        let estimate = find_nodata_value(&raster_from(band), 0, 3).unwrap();
        assert_eq!(estimate, NoDataEstimate::Value(-9999.0));
    }

    #[test]
    fn test_value_is_exact_for_non_representable_decimals() {
        let mut band = textured(10, 10);
        fill_corner(&mut band, 0, 3, 0.1);
        let estimate = find_nodata_value(&raster_from(band), 0, 3).unwrap();
        assert_eq!(estimate, NoDataEstimate::Value(0.1));
    }

    #[test]
    fn test_nan_corners_are_not_candidates() {
        let mut band = textured(10, 10);
        for corner in 0..4 {
            fill_corner(&mut band, corner, 3, f64::NAN);
        }
        let estimate = find_nodata_value(&raster_from(band), 0, 3).unwrap();
        assert_eq!(estimate, NoDataEstimate::None);
    }

    #[test]
    fn test_window_larger_than_raster() {
        let band = Array2::from_elem((2, 2), 4.0);
        let estimate = find_nodata_value(&raster_from(band), 0, 3).unwrap();
        assert_eq!(estimate, NoDataEstimate::Value(4.0));
    }

    #[test]
    fn test_corner_stats() {
        let mut band = textured(8, 8);
        fill_corner(&mut band, 3, 3, 2.0);
        let estimator = NoDataEstimator::new();
        let stats = estimator.corner_stats(&raster_from(band)).unwrap();
        assert!(!stats[0].is_homogeneous());
        assert!(stats[0].std > 0.0);
        assert!(stats[3].is_homogeneous());
        assert_eq!(stats[3].mean, 2.0);
        assert_eq!(stats[3].std, 0.0);
    }

    #[test]
    fn test_invalid_inputs() {
        let raster = raster_from(textured(5, 5));
        assert!(find_nodata_value(&raster, 0, 0).is_err());
        assert!(find_nodata_value(&raster, 1, 3).is_err());
    }
}
