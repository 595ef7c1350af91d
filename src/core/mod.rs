//! Corner detection, no-data estimation and geometry helpers

pub mod boundary;
pub mod corners;
pub mod geometry;
pub mod nodata;

// Re-export main types
pub use boundary::{BoundaryExtractor, ExtentExtractor, HullExtractor};
pub use corners::{
    get_true_corner_map_xy, get_true_corner_map_xy_from_path, CornerDetection, CornerDetectionParams,
    CornerDetector,
};
pub use geometry::{
    angle_to_north, angle_to_north_batch, get_array_position_from_box, get_gdal_read_inputs_from_box,
    get_subset_geotransform,
};
pub use nodata::{
    find_nodata_value, find_nodata_value_from_path, CornerStat, NoDataEstimationParams, NoDataEstimator,
};
