//! geocorners: true data-area corners and no-data estimation for rasters
//!
//! Georeferenced rasters are often padded with no-data pixels around the
//! actual scene footprint. This library finds the corners of that footprint
//! in map coordinates and infers the no-data value from the raster corners,
//! as needed when matching windows for image co-registration.

pub mod types;
pub mod io;
pub mod core;

#[cfg(feature = "python")]
mod python;

// Re-export main types and functions for easier access
pub use types::{
    BinaryMask, Diagnostic, DiagnosticKind, GeoError, GeoRaster, GeoResult, GeoTransform, MapPoint,
    NoDataEstimate, NoDataSpec, PixelPoint, RasterAccessor, RasterElement, SampleType,
};

pub use io::RasterReader;

pub use crate::core::{
    angle_to_north, angle_to_north_batch, find_nodata_value, find_nodata_value_from_path,
    get_array_position_from_box, get_gdal_read_inputs_from_box, get_subset_geotransform,
    get_true_corner_map_xy, get_true_corner_map_xy_from_path, CornerDetection, CornerDetectionParams,
    CornerDetector, NoDataEstimationParams, NoDataEstimator,
};
