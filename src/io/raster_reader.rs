use crate::types::{GeoError, GeoRaster, GeoResult, GeoTransform, SampleType};
use gdal::raster::{Buffer, GdalDataType};
use gdal::{Dataset, DriverManager};
use ndarray::{Array2, Array3, Axis};
use std::path::Path;

/// GDAL backed loader and writer for [`GeoRaster`]
pub struct RasterReader;

impl RasterReader {
    /// Read all bands of a raster file as f64
    pub fn read<P: AsRef<Path>>(path: P) -> GeoResult<GeoRaster> {
        log::info!("Reading raster from: {}", path.as_ref().display());
        let dataset = Dataset::open(path.as_ref())?;
        GeoRaster::from_dataset(&dataset)
    }

    /// Write a raster as a GeoTIFF, one f64 band per raster band
    pub fn write_geotiff<P: AsRef<Path>>(
        raster: &GeoRaster,
        output_path: P,
        nodata: Option<f64>,
    ) -> GeoResult<()> {
        log::info!("Saving raster as GeoTIFF: {}", output_path.as_ref().display());

        let driver = DriverManager::get_driver_by_name("GTiff")?;
        let (height, width, bands) = raster.data.dim();

        let mut dataset = driver.create_with_band_type::<f64, _>(
            output_path.as_ref(),
            width as isize,
            height as isize,
            bands as isize,
        )?;

        if let Some(gt) = raster.geo_transform {
            dataset.set_geo_transform(&gt.to_gdal())?;
        }
        if let Some(projection) = raster.projection.as_deref() {
            dataset.set_projection(projection)?;
        }

        for band_index in 0..bands {
            let mut rasterband = dataset.rasterband(band_index as isize + 1)?;
            let flat_data: Vec<f64> = raster.data.index_axis(Axis(2), band_index).iter().cloned().collect();
            let buffer = Buffer::new((width, height), flat_data);
            rasterband.write((0, 0), (width, height), &buffer)?;

            if nodata.is_some() {
                rasterband.set_no_data_value(nodata)?;
            }
        }

        log::debug!("Wrote {} band(s) of {}x{} pixels", bands, width, height);
        Ok(())
    }
}

impl GeoRaster {
    /// Load every band of an open GDAL dataset.
    ///
    /// A missing geotransform or an empty projection string are kept as `None`.
    pub fn from_dataset(dataset: &Dataset) -> GeoResult<Self> {
        let (width, height) = dataset.raster_size();
        let band_count = dataset.raster_count().max(0) as usize;
        if band_count == 0 {
            return Err(GeoError::InvalidInput("Dataset contains no raster bands".to_string()));
        }
        log::debug!("Raster size: {}x{} with {} band(s)", width, height, band_count);

        // TODO: read bands concurrently once more than a handful of bands is common
        let mut data = Array3::<f64>::zeros((height, width, band_count));
        let mut sample_types = Vec::with_capacity(band_count);
        for band_index in 0..band_count {
            let rasterband = dataset.rasterband(band_index as isize + 1)?;
            sample_types.push(sample_type_of(rasterband.band_type()));
            let band_data = rasterband.read_as::<f64>((0, 0), (width, height), (width, height), None)?;
            let band = Array2::from_shape_vec((height, width), band_data.data)
                .map_err(|e| GeoError::Processing(format!("Failed to reshape band {}: {}", band_index + 1, e)))?;
            data.index_axis_mut(Axis(2), band_index).assign(&band);
        }

        let geo_transform = match dataset.geo_transform() {
            Ok(gt) => Some(GeoTransform::from_gdal(gt)),
            Err(e) => {
                log::debug!("Raster has no geotransform: {}", e);
                None
            }
        };
        let projection = Some(dataset.projection());
        log::debug!("Raster geotransform: {:?}", geo_transform);

        // mixed band types keep full precision
        let sample_type = match sample_types.split_first() {
            Some((first, rest)) if rest.iter().all(|t| t == first) => *first,
            _ => {
                log::debug!("Bands have mixed data types: {:?}", sample_types);
                SampleType::Float64
            }
        };

        Ok(GeoRaster::new(data, geo_transform, projection).with_sample_type(sample_type))
    }
}

fn sample_type_of(band_type: GdalDataType) -> SampleType {
    match band_type {
        GdalDataType::Float32 => SampleType::Float32,
        GdalDataType::Float64 | GdalDataType::Unknown => SampleType::Float64,
        _ => SampleType::Integer,
    }
}
