//! GeoTIFF reading and writing using GDAL

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, MultiBandRaster, Raster, RasterElement};
use gdal::raster::{Buffer, GdalType, RasterCreationOptions};
use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, DriverManager};
use std::path::Path;

/// Options for writing GeoTIFF files
#[derive(Debug, Clone)]
pub struct GeoTiffOptions {
    /// Compression type: "DEFLATE", "LZW", "ZSTD", "NONE"
    pub compression: String,
    /// Tile size for tiled TIFFs (0 for strips)
    pub tile_size: usize,
    /// BigTIFF for files > 4GB
    pub bigtiff: bool,
}

impl Default for GeoTiffOptions {
    fn default() -> Self {
        Self {
            compression: "DEFLATE".to_string(),
            tile_size: 256,
            bigtiff: false,
        }
    }
}

fn open(path: &Path) -> Result<Dataset> {
    Dataset::open(path)
        .map_err(|e| Error::RasterAccess(format!("cannot open {}: {}", path.display(), e)))
}

fn dataset_crs(dataset: &Dataset) -> Option<CRS> {
    let srs = dataset.spatial_ref().ok()?;
    match srs.auth_code() {
        Ok(code) => Some(CRS::from_epsg(code as u32)),
        Err(_) => srs.to_wkt().ok().map(CRS::from_wkt),
    }
}

/// Read one band (0-indexed, default 0) of a raster file
pub fn read_geotiff<T, P>(path: P, band: Option<usize>) -> Result<Raster<T>>
where
    T: RasterElement + GdalType,
    P: AsRef<Path>,
{
    let dataset = open(path.as_ref())?;
    let rasterband = dataset.rasterband(band.unwrap_or(0) + 1)?;
    let (cols, rows) = dataset.raster_size();

    let buffer = rasterband.read_as::<T>((0, 0), (cols, rows), (cols, rows), None)?;
    let mut raster = Raster::from_vec(buffer.data().to_vec(), rows, cols)?;

    if let Ok(gt) = dataset.geo_transform() {
        raster.set_transform(GeoTransform::from_gdal(gt));
    }
    raster.set_crs(dataset_crs(&dataset));
    if let Some(nodata) = rasterband.no_data_value() {
        raster.set_nodata(num_traits::cast(nodata));
    }

    Ok(raster)
}

/// Read every band of a raster file
pub fn read_multiband_geotiff<T, P>(path: P) -> Result<MultiBandRaster<T>>
where
    T: RasterElement + GdalType,
    P: AsRef<Path>,
{
    let dataset = open(path.as_ref())?;
    let (cols, rows) = dataset.raster_size();
    let bands = dataset.raster_count();

    let mut data = Vec::with_capacity(bands * rows * cols);
    let mut nodata = Vec::with_capacity(bands);
    for b in 1..=bands {
        let rasterband = dataset.rasterband(b)?;
        let buffer = rasterband.read_as::<T>((0, 0), (cols, rows), (cols, rows), None)?;
        data.extend_from_slice(buffer.data());
        nodata.push(rasterband.no_data_value().and_then(num_traits::cast));
    }

    let mut raster = MultiBandRaster::from_vec(data, bands, rows, cols)?;
    if let Ok(gt) = dataset.geo_transform() {
        raster.set_transform(GeoTransform::from_gdal(gt));
    }
    raster.set_crs(dataset_crs(&dataset));
    for (band, nd) in nodata.into_iter().enumerate() {
        raster.set_band_nodata(band, nd)?;
    }
    Ok(raster)
}

/// Write a single-band Raster to a GeoTIFF file with its native sample type
pub fn write_geotiff<T, P>(raster: &Raster<T>, path: P, options: Option<GeoTiffOptions>) -> Result<()>
where
    T: RasterElement + GdalType,
    P: AsRef<Path>,
{
    let opts = options.unwrap_or_default();
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let (rows, cols) = raster.shape();

    let mut create_options = vec![format!("COMPRESS={}", opts.compression)];
    if opts.tile_size > 0 {
        create_options.push("TILED=YES".to_string());
        create_options.push(format!("BLOCKXSIZE={}", opts.tile_size));
        create_options.push(format!("BLOCKYSIZE={}", opts.tile_size));
    }
    if opts.bigtiff {
        create_options.push("BIGTIFF=YES".to_string());
    }
    let mut creation_options = RasterCreationOptions::new();
    for option in &create_options {
        creation_options.add_string(option)?;
    }

    let mut dataset = driver.create_with_band_type_with_options::<T, _>(
        path.as_ref(),
        cols,
        rows,
        1,
        &creation_options,
    )?;

    dataset.set_geo_transform(&raster.transform().to_gdal())?;
    if let Some(crs) = raster.crs() {
        let srs = match (crs.epsg(), crs.wkt()) {
            (Some(epsg), _) => Some(SpatialRef::from_epsg(epsg)?),
            (None, Some(wkt)) => Some(SpatialRef::from_wkt(wkt)?),
            (None, None) => None,
        };
        if let Some(srs) = srs {
            dataset.set_spatial_ref(&srs)?;
        }
    }

    let mut band = dataset.rasterband(1)?;
    if let Some(nd) = raster.nodata().and_then(|v| v.to_f64()) {
        band.set_no_data_value(Some(nd))?;
    }
    let data: Vec<T> = raster.data().iter().copied().collect();
    let mut buffer = Buffer::new((cols, rows), data);
    band.write((0, 0), (cols, rows), &mut buffer)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_write_read_roundtrip() {
        let mut raster = Raster::from_vec((0u32..10_000).collect(), 100, 100).unwrap();
        raster.set_transform(GeoTransform::new(0.0, 100.0, 1.0, -1.0));
        raster.set_crs(Some(CRS::from_epsg(4326)));
        raster.set_nodata(Some(u32::MAX));

        let tmp = NamedTempFile::with_suffix(".tif").unwrap();
        write_geotiff(&raster, tmp.path(), None).unwrap();

        let loaded: Raster<u32> = read_geotiff(tmp.path(), None).unwrap();
        assert_eq!(loaded.shape(), raster.shape());
        assert_eq!(loaded.get(50, 50).unwrap(), raster.get(50, 50).unwrap());
    }
}
