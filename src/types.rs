use ndarray::{s, Array2, Array3, ArrayView2, Axis};
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Binary occupancy mask of one raster band (1 = data, 0 = no-data)
pub type BinaryMask = Array2<u8>;

/// Pixel position in (row, col) array order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelPoint {
    pub row: usize,
    pub col: usize,
}

impl PixelPoint {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl From<(usize, usize)> for PixelPoint {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

/// Map (world) coordinate in (x, y) order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    pub x: f64,
    pub y: f64,
}

impl MapPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Affine pixel-to-map transformation (GDAL coefficient order)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub rotation_x: f64,
    pub top_left_y: f64,
    pub rotation_y: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Build from the GDAL 6-coefficient array
    pub fn from_gdal(gt: [f64; 6]) -> Self {
        Self {
            top_left_x: gt[0],
            pixel_width: gt[1],
            rotation_x: gt[2],
            top_left_y: gt[3],
            rotation_y: gt[4],
            pixel_height: gt[5],
        }
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.top_left_x,
            self.pixel_width,
            self.rotation_x,
            self.top_left_y,
            self.rotation_y,
            self.pixel_height,
        ]
    }

    /// Map coordinate of the upper-left corner of a pixel.
    ///
    /// Same convention as GDAL's `ApplyGeoTransform`: the pixel is addressed
    /// as (col, row) = (x, y) internally, while callers pass (row, col).
    pub fn pixel_to_map(&self, pixel: PixelPoint) -> MapPoint {
        let px = pixel.col as f64;
        let py = pixel.row as f64;
        MapPoint {
            x: self.top_left_x + px * self.pixel_width + py * self.rotation_x,
            y: self.top_left_y + px * self.rotation_y + py * self.pixel_height,
        }
    }
}

/// How the corner detector should treat no-data pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum NoDataSpec {
    /// Every pixel is treated as data
    #[default]
    NoMasking,
    /// Pixels equal to this value are background
    Value(f64),
    /// The no-data value could not be determined automatically
    Undetermined,
}

/// Outcome of no-data estimation from the raster corners
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NoDataEstimate {
    /// No corner is homogeneous, all four contain real data
    None,
    /// All homogeneous corners agree on this value
    Value(f64),
    /// Several corners are homogeneous but disagree
    Unclear,
}

impl From<NoDataEstimate> for NoDataSpec {
    fn from(estimate: NoDataEstimate) -> Self {
        match estimate {
            NoDataEstimate::None => NoDataSpec::NoMasking,
            NoDataEstimate::Value(v) => NoDataSpec::Value(v),
            NoDataEstimate::Unclear => NoDataSpec::Undetermined,
        }
    }
}

impl std::fmt::Display for NoDataEstimate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoDataEstimate::None => write!(f, "None"),
            NoDataEstimate::Value(v) => write!(f, "{}", v),
            NoDataEstimate::Unclear => write!(f, "unclear"),
        }
    }
}

/// Category of a non-fatal event recorded during processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    UndeterminedNoData,
    ExtractorFailed,
    InsufficientCorners,
}

/// Warning returned alongside a result instead of only being logged
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

/// Storage type of the source pixels before they were widened to f64
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SampleType {
    Float32,
    #[default]
    Float64,
    Integer,
}

impl SampleType {
    /// Round a value to the precision the pixels were stored with, so it
    /// compares equal to the widened pixel values.
    pub fn quantize(&self, value: f64) -> f64 {
        match self {
            SampleType::Float32 => value as f32 as f64,
            SampleType::Float64 | SampleType::Integer => value,
        }
    }
}

/// Numeric pixel types a [`GeoRaster`] can be built from
pub trait RasterElement: ToPrimitive {
    const SAMPLE_TYPE: SampleType;
}

macro_rules! impl_raster_element {
    ($sample_type:expr => $($t:ty),*) => {
        $(impl RasterElement for $t {
            const SAMPLE_TYPE: SampleType = $sample_type;
        })*
    };
}

impl_raster_element!(SampleType::Integer => u8, u16, u32, u64, i8, i16, i32, i64);
impl_raster_element!(SampleType::Float32 => f32);
impl_raster_element!(SampleType::Float64 => f64);

/// Read access to a georeferenced raster
pub trait RasterAccessor {
    /// (rows, cols, bands)
    fn shape(&self) -> (usize, usize, usize);

    fn geotransform(&self) -> Option<&GeoTransform>;

    fn projection(&self) -> Option<&str>;

    fn sample_type(&self) -> SampleType {
        SampleType::Float64
    }

    /// Full band, 0-based index
    fn band(&self, band_index: usize) -> GeoResult<ArrayView2<'_, f64>>;

    /// Rectangular window of one band, 0-based index
    fn window(
        &self,
        rows: Range<usize>,
        cols: Range<usize>,
        band_index: usize,
    ) -> GeoResult<ArrayView2<'_, f64>>;
}

/// In-memory raster with optional georeference
#[derive(Debug, Clone)]
pub struct GeoRaster {
    /// Pixel data shaped (rows, cols, bands)
    pub data: Array3<f64>,
    pub geo_transform: Option<GeoTransform>,
    /// Spatial reference as WKT
    pub projection: Option<String>,
    pub sample_type: SampleType,
}

impl GeoRaster {
    pub fn new(
        data: Array3<f64>,
        geo_transform: Option<GeoTransform>,
        projection: Option<String>,
    ) -> Self {
        let projection = projection.filter(|p| !p.trim().is_empty());
        Self {
            data,
            geo_transform,
            projection,
            sample_type: SampleType::Float64,
        }
    }

    pub fn with_sample_type(mut self, sample_type: SampleType) -> Self {
        self.sample_type = sample_type;
        self
    }

    /// Wrap a single band
    pub fn from_band(
        band: Array2<f64>,
        geo_transform: Option<GeoTransform>,
        projection: Option<String>,
    ) -> Self {
        let data = band.insert_axis(Axis(2));
        Self::new(data, geo_transform, projection)
    }

    /// Wrap a (rows, cols, bands) array of any numeric type
    pub fn from_array<T: RasterElement>(
        data: &Array3<T>,
        geo_transform: Option<GeoTransform>,
        projection: Option<String>,
    ) -> GeoResult<Self> {
        let mut converted = Array3::<f64>::zeros(data.raw_dim());
        for (dst, src) in converted.iter_mut().zip(data.iter()) {
            *dst = src.to_f64().ok_or_else(|| {
                GeoError::InvalidInput("Pixel value cannot be represented as f64".to_string())
            })?;
        }
        Ok(Self::new(converted, geo_transform, projection).with_sample_type(T::SAMPLE_TYPE))
    }

    fn check_band(&self, band_index: usize) -> GeoResult<()> {
        let bands = self.data.dim().2;
        if band_index >= bands {
            return Err(GeoError::InvalidInput(format!(
                "Band index {} out of range for raster with {} band(s)",
                band_index, bands
            )));
        }
        Ok(())
    }
}

impl RasterAccessor for GeoRaster {
    fn shape(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    fn geotransform(&self) -> Option<&GeoTransform> {
        self.geo_transform.as_ref()
    }

    fn projection(&self) -> Option<&str> {
        self.projection.as_deref()
    }

    fn sample_type(&self) -> SampleType {
        self.sample_type
    }

    fn band(&self, band_index: usize) -> GeoResult<ArrayView2<'_, f64>> {
        self.check_band(band_index)?;
        Ok(self.data.index_axis(Axis(2), band_index))
    }

    fn window(
        &self,
        rows: Range<usize>,
        cols: Range<usize>,
        band_index: usize,
    ) -> GeoResult<ArrayView2<'_, f64>> {
        self.check_band(band_index)?;
        let (height, width, _) = self.data.dim();
        if rows.start > rows.end || cols.start > cols.end || rows.end > height || cols.end > width {
            return Err(GeoError::InvalidInput(format!(
                "Window rows {:?} cols {:?} outside raster of {}x{}",
                rows, cols, height, width
            )));
        }
        Ok(self.data.slice(s![rows, cols, band_index]))
    }
}

/// Error types for raster geometry processing
#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("Missing georeference: {0}")]
    MissingGeoreference(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Corner extraction error: {0}")]
    Extraction(String),

    #[error("Processing error: {0}")]
    Processing(String),
}

/// Result type for raster geometry operations
pub type GeoResult<T> = Result<T, GeoError>;

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pixel_to_map_with_rotation() {
        let gt = GeoTransform::from_gdal([1000.0, 2.0, 0.5, 5000.0, 0.25, -2.0]);

        let ul = gt.pixel_to_map(PixelPoint::new(0, 0));
        assert_eq!(ul, MapPoint::new(1000.0, 5000.0));

        // UR of a 10x12 raster: only the column terms contribute
        let ur = gt.pixel_to_map(PixelPoint::new(0, 11));
        assert_relative_eq!(ur.x, 1022.0);
        assert_relative_eq!(ur.y, 5002.75);

        // LL: only the row terms contribute
        let ll = gt.pixel_to_map(PixelPoint::new(9, 0));
        assert_relative_eq!(ll.x, 1004.5);
        assert_relative_eq!(ll.y, 4982.0);

        let lr = gt.pixel_to_map(PixelPoint::new(9, 11));
        assert_relative_eq!(lr.x, 1026.5);
        assert_relative_eq!(lr.y, 4984.75);
    }

    #[test]
    fn test_gdal_coefficient_order() {
        let coeffs = [1000.0, 2.0, 0.5, 5000.0, 0.25, -2.0];
        let gt = GeoTransform::from_gdal(coeffs);
        assert_eq!(gt.rotation_x, 0.5);
        assert_eq!(gt.rotation_y, 0.25);
        assert_eq!(gt.to_gdal(), coeffs);
    }

    #[test]
    fn test_float32_quantize() {
        let nodata = -9999.9;
        let stored = nodata as f32;
        assert_ne!(stored as f64, nodata);
        assert_eq!(SampleType::Float32.quantize(nodata), stored as f64);
        assert_eq!(SampleType::Float64.quantize(nodata), nodata);
        assert_eq!(SampleType::Integer.quantize(nodata), nodata);
    }

    #[test]
    fn test_from_array_records_sample_type() {
        let f32_data = Array3::<f32>::zeros((2, 2, 1));
        let raster = GeoRaster::from_array(&f32_data, None, None).unwrap();
        assert_eq!(raster.sample_type(), SampleType::Float32);

        let u8_data = Array3::<u8>::zeros((2, 2, 1));
        let raster = GeoRaster::from_array(&u8_data, None, None).unwrap();
        assert_eq!(raster.sample_type(), SampleType::Integer);

        let raster = GeoRaster::from_band(Array2::zeros((2, 2)), None, Some("  ".to_string()));
        assert_eq!(raster.sample_type(), SampleType::Float64);
        assert!(raster.projection().is_none());
    }
}
