//! Raster file I/O

pub mod raster_reader;

pub use raster_reader::RasterReader;
