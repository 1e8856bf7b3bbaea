//! I/O operations for reading and writing geospatial rasters

#[cfg(feature = "gdal")]
mod gdal_io;
#[cfg(not(feature = "gdal"))]
mod native;

#[cfg(feature = "gdal")]
pub use gdal_io::{read_geotiff, read_multiband_geotiff, write_geotiff, GeoTiffOptions};

#[cfg(not(feature = "gdal"))]
pub use native::{read_geotiff, read_multiband_geotiff, write_geotiff, GeoTiffOptions};

use crate::error::{Error, Result};
use crate::raster::{MultiBandRaster, Raster, RasterDataset};
use std::path::Path;

/// Read several raster files and stack all of their bands, in order, into
/// one `f32` dataset. Every file must have the same width and height.
pub fn read_band_stack<P: AsRef<Path>>(paths: &[P]) -> Result<MultiBandRaster<f32>> {
    if paths.is_empty() {
        return Err(Error::RasterAccess("no input rasters given".into()));
    }

    let mut bands: Vec<Raster<f32>> = Vec::new();
    for path in paths {
        let image = read_multiband_geotiff::<f32, _>(path)?;
        for b in 0..image.band_count() {
            bands.push(image.band(b)?);
        }
    }
    MultiBandRaster::stack(&bands)
}
