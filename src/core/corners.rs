use crate::core::boundary::{count_unique, default_extractors, BoundaryExtractor};
use crate::io::RasterReader;
use crate::types::{
    BinaryMask, Diagnostic, DiagnosticKind, GeoError, GeoResult, MapPoint, NoDataSpec, PixelPoint,
    RasterAccessor,
};
use ndarray::{Array2, Zip};
use std::path::Path;

/// Corner detection parameters
#[derive(Debug, Clone)]
pub struct CornerDetectionParams {
    /// Band used for no-data masking (1-based)
    pub band: usize,
    /// No-data handling
    pub nodata: NoDataSpec,
    /// Log extractor failures and the no-data value in use
    pub verbose: bool,
    /// Do not log the full-extent fallback warning
    pub quiet: bool,
}

impl Default for CornerDetectionParams {
    fn default() -> Self {
        Self {
            band: 1,
            nodata: NoDataSpec::NoMasking,
            verbose: false,
            quiet: false,
        }
    }
}

/// Result of a corner detection run
#[derive(Debug, Clone)]
pub struct CornerDetection {
    /// Map coordinates (x, y) of the data corners
    pub corners: Vec<MapPoint>,
    /// The same corners in pixel space
    pub pixel_corners: Vec<PixelPoint>,
    /// True if the outer raster rectangle replaced the detected corners
    pub fallback_used: bool,
    /// Name of the extractor that produced the candidate corners
    pub extractor: &'static str,
    pub diagnostics: Vec<Diagnostic>,
}

impl CornerDetection {
    pub fn has_diagnostic(&self, kind: DiagnosticKind) -> bool {
        self.diagnostics.iter().any(|d| d.kind == kind)
    }
}

/// Locates the corners of the actual data area of a raster
pub struct CornerDetector {
    params: CornerDetectionParams,
    extractors: Vec<Box<dyn BoundaryExtractor>>,
}

impl CornerDetector {
    pub fn new() -> Self {
        Self::with_params(CornerDetectionParams::default())
    }

    pub fn with_params(params: CornerDetectionParams) -> Self {
        Self {
            params,
            extractors: default_extractors(),
        }
    }

    /// Replace the extractor strategy list; strategies are tried in order
    pub fn with_extractors(mut self, extractors: Vec<Box<dyn BoundaryExtractor>>) -> Self {
        self.extractors = extractors;
        self
    }

    pub fn detect<R: RasterAccessor>(&self, raster: &R) -> GeoResult<CornerDetection> {
        let (rows, cols, _) = raster.shape();
        let gt = match (raster.geotransform(), raster.projection()) {
            (Some(gt), Some(prj)) if !prj.trim().is_empty() => *gt,
            _ => {
                return Err(GeoError::MissingGeoreference(
                    "GeoTransform and projection must be given for calculation of map corner coordinates"
                        .to_string(),
                ))
            }
        };
        if rows == 0 || cols == 0 {
            return Err(GeoError::InvalidInput(format!(
                "Cannot detect corners of an empty {}x{} raster",
                rows, cols
            )));
        }

        let mut diagnostics = Vec::new();
        let mask = self.build_mask(raster, &mut diagnostics)?;
        if self.params.verbose {
            log::info!("Detected no data value: {:?}", self.params.nodata);
        }

        let (mut corners, extractor) = self.extract_corners(&mask, &mut diagnostics)?;

        // extractors yield UL, UR, LL, LR; a closed ring needs UL, UR, LR, LL
        if corners.len() == 4 {
            corners.swap(2, 3);
        }

        let fallback_used = count_unique(&corners) < 3;
        if fallback_used {
            let message = "The algorithm for automatically detecting the actual image coordinates did not \
                           find enough unique corners. Using outer image corner coordinates instead."
                .to_string();
            if !self.params.quiet {
                log::warn!("{}", message);
            }
            diagnostics.push(Diagnostic {
                kind: DiagnosticKind::InsufficientCorners,
                message,
            });
            // kept in UL, UR, LL, LR order
            corners = vec![
                PixelPoint::new(0, 0),
                PixelPoint::new(0, cols - 1),
                PixelPoint::new(rows - 1, 0),
                PixelPoint::new(rows - 1, cols - 1),
            ];
        }

        let map_corners: Vec<MapPoint> = corners.iter().map(|&p| gt.pixel_to_map(p)).collect();

        log::debug!("Pixel corners {:?} -> map corners {:?}", corners, map_corners);

        Ok(CornerDetection {
            corners: map_corners,
            pixel_corners: corners,
            fallback_used,
            extractor,
            diagnostics,
        })
    }

    fn build_mask<R: RasterAccessor>(
        &self,
        raster: &R,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> GeoResult<BinaryMask> {
        let (rows, cols, _) = raster.shape();

        let nodata = match self.params.nodata {
            NoDataSpec::NoMasking => return Ok(Array2::ones((rows, cols))),
            NoDataSpec::Undetermined => {
                let message = "No data value could not be automatically detected. Thus the matching window \
                               used for shift calculation had to be centered in the middle of the overlap \
                               center without respecting no data values. To avoid this provide the correct \
                               no data values for reference and shift image."
                    .to_string();
                log::warn!("{}", message);
                diagnostics.push(Diagnostic {
                    kind: DiagnosticKind::UndeterminedNoData,
                    message,
                });
                return Ok(Array2::ones((rows, cols)));
            }
            NoDataSpec::Value(v) => v,
        };
        // bands are widened to f64, so the value must be rounded the same way
        let nodata = raster.sample_type().quantize(nodata);

        if self.params.band == 0 {
            return Err(GeoError::InvalidInput("Band numbers start at 1".to_string()));
        }
        let band = raster.band(self.params.band - 1)?;

        let mut mask = BinaryMask::zeros((rows, cols));
        let zip = Zip::from(&mut mask).and(&band);
        #[cfg(feature = "parallel")]
        zip.par_for_each(|m, &px| {
            if px != nodata {
                *m = 1;
            }
        });
        #[cfg(not(feature = "parallel"))]
        zip.for_each(|m, &px| {
            if px != nodata {
                *m = 1;
            }
        });

        Ok(mask)
    }

    fn extract_corners(
        &self,
        mask: &BinaryMask,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> GeoResult<(Vec<PixelPoint>, &'static str)> {
        let mut last_error = None;

        for extractor in self.extractors.iter() {
            match extractor.extract_corners(mask, false) {
                Ok(corners) => {
                    log::debug!("Extractor '{}' returned {} corners", extractor.name(), corners.len());
                    return Ok((corners, extractor.name()));
                }
                Err(e) => {
                    let message = format!(
                        "Calculation of corner coordinates failed within algorithm '{}' ({}).",
                        extractor.name(),
                        e
                    );
                    if self.params.verbose {
                        log::warn!("{}", message);
                    } else {
                        log::debug!("{}", message);
                    }
                    diagnostics.push(Diagnostic {
                        kind: DiagnosticKind::ExtractorFailed,
                        message,
                    });
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            GeoError::Processing("No boundary extractor configured".to_string())
        }))
    }
}

impl Default for CornerDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Map coordinates of the true data corners of a raster
pub fn get_true_corner_map_xy<R: RasterAccessor>(
    raster: &R,
    band: usize,
    nodata: NoDataSpec,
    verbose: bool,
    quiet: bool,
) -> GeoResult<Vec<MapPoint>> {
    let params = CornerDetectionParams {
        band,
        nodata,
        verbose,
        quiet,
    };
    Ok(CornerDetector::with_params(params).detect(raster)?.corners)
}

/// [`get_true_corner_map_xy`] for a raster file
pub fn get_true_corner_map_xy_from_path<P: AsRef<Path>>(
    path: P,
    band: usize,
    nodata: NoDataSpec,
    verbose: bool,
    quiet: bool,
) -> GeoResult<Vec<MapPoint>> {
    let raster = RasterReader::read(path)?;
    get_true_corner_map_xy(&raster, band, nodata, verbose, quiet)
}
