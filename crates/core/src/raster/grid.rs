//! Single-band in-memory raster

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::dataset::check_row_access;
use crate::raster::{GeoTransform, RasterDataset, RasterDatasetMut, RasterElement};
use ndarray::Array2;

/// A georeferenced single-band 2D raster grid.
///
/// Labelled rasters (`Raster<u32>`), isolation masks (`Raster<u8>`) and
/// single input bands (`Raster<f32>`) are all this type. It is also a
/// one-band [`RasterDataset`].
///
/// # Example
///
/// ```ignore
/// use rsgis_core::Raster;
///
/// let mut labels: Raster<u32> = Raster::new(100, 100);
/// labels.set(10, 20, 3)?;
/// assert_eq!(labels.get(10, 20)?, 3);
/// ```
#[derive(Debug, Clone)]
pub struct Raster<T: RasterElement> {
    /// Row-major cell values (row, col)
    data: Array2<T>,
    transform: GeoTransform,
    crs: Option<CRS>,
    nodata: Option<T>,
}

impl<T: RasterElement> Raster<T> {
    /// Create a new raster filled with zeros
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::from_array(Array2::zeros((rows, cols)))
    }

    /// Create a new raster filled with a specific value
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self::from_array(Array2::from_elem((rows, cols), value))
    }

    /// Create a raster from row-major data
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }
        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;
        Ok(Self::from_array(array))
    }

    /// Create a raster from an ndarray
    pub fn from_array(data: Array2<T>) -> Self {
        Self {
            data,
            transform: GeoTransform::default(),
            crs: None,
            nodata: None,
        }
    }

    /// Zero-filled raster with the dimensions and georeferencing of `template`
    pub fn from_template<D: RasterDataset + ?Sized>(template: &D) -> Self {
        let mut raster = Self::new(template.height(), template.width());
        raster.transform = template.transform();
        raster.crs = template.crs().cloned();
        raster
    }

    /// Create a raster with the same metadata but different data type
    pub fn with_same_meta<U: RasterElement>(&self) -> Raster<U> {
        Raster {
            data: Array2::zeros(self.data.dim()),
            transform: self.transform,
            crs: self.crs.clone(),
            nodata: None,
        }
    }

    // Dimensions

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // Data access

    /// Get value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Set value at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        let (rows, cols) = self.shape();
        match self.data.get_mut((row, col)) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(Error::IndexOutOfBounds { row, col, rows, cols }),
        }
    }

    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    // Metadata

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    pub fn set_crs(&mut self, crs: Option<CRS>) {
        self.crs = crs;
    }

    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    pub fn set_nodata(&mut self, nodata: Option<T>) {
        self.nodata = nodata;
    }

    /// Cell size (assumes square cells)
    pub fn cell_size(&self) -> f64 {
        self.transform.cell_size()
    }

    /// Geographic bounds (min_x, min_y, max_x, max_y)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.transform.bounds(self.cols(), self.rows())
    }

    /// Basic statistics over valid (non no-data) cells
    pub fn statistics(&self) -> RasterStatistics<T> {
        let mut min: Option<T> = None;
        let mut max: Option<T> = None;
        let mut sum = 0.0;
        let mut count = 0usize;

        for &value in self.data.iter().filter(|v| !v.is_nodata(self.nodata)) {
            if min.map_or(true, |m| value < m) {
                min = Some(value);
            }
            if max.map_or(true, |m| value > m) {
                max = Some(value);
            }
            if let Some(v) = value.to_f64() {
                sum += v;
                count += 1;
            }
        }

        RasterStatistics {
            min,
            max,
            mean: (count > 0).then(|| sum / count as f64),
            valid_count: count,
            nodata_count: self.len() - count,
        }
    }
}

impl<T: RasterElement> RasterDataset for Raster<T> {
    type Cell = T;

    fn width(&self) -> usize {
        self.cols()
    }

    fn height(&self) -> usize {
        self.rows()
    }

    fn band_count(&self) -> usize {
        1
    }

    fn read_row(&self, band: usize, row: usize, buf: &mut [T]) -> Result<()> {
        check_row_access(band, row, buf.len(), 1, self.rows(), self.cols())?;
        for (dst, &src) in buf.iter_mut().zip(self.data.row(row).iter()) {
            *dst = src;
        }
        Ok(())
    }

    fn nodata(&self) -> Option<T> {
        self.nodata
    }

    fn transform(&self) -> GeoTransform {
        self.transform
    }

    fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }
}

impl<T: RasterElement> RasterDatasetMut for Raster<T> {
    fn write_row(&mut self, band: usize, row: usize, data: &[T]) -> Result<()> {
        check_row_access(band, row, data.len(), 1, self.rows(), self.cols())?;
        for (dst, &src) in self.data.row_mut(row).iter_mut().zip(data) {
            *dst = src;
        }
        Ok(())
    }
}

/// Basic statistics for a raster
#[derive(Debug, Clone)]
pub struct RasterStatistics<T> {
    pub min: Option<T>,
    pub max: Option<T>,
    pub mean: Option<f64>,
    pub valid_count: usize,
    pub nodata_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_creation() {
        let raster: Raster<u32> = Raster::new(100, 200);
        assert_eq!(raster.rows(), 100);
        assert_eq!(raster.cols(), 200);
        assert_eq!(raster.band_count(), 1);
    }

    #[test]
    fn test_row_roundtrip() {
        let mut raster: Raster<u32> = Raster::new(3, 4);
        raster.write_row(0, 1, &[1, 2, 3, 4]).unwrap();
        let mut buf = [0u32; 4];
        raster.read_row(0, 1, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3, 4]);
        assert_eq!(raster.get(1, 2).unwrap(), 3);
    }

    #[test]
    fn test_row_access_errors() {
        let raster: Raster<f32> = Raster::new(3, 4);
        let mut buf = [0.0f32; 4];
        assert!(raster.read_row(1, 0, &mut buf).unwrap_err().is_raster_access());
        assert!(raster.read_row(0, 3, &mut buf).unwrap_err().is_raster_access());
        let mut short = [0.0f32; 2];
        assert!(raster.read_row(0, 0, &mut short).unwrap_err().is_raster_access());
    }

    #[test]
    fn test_band_min_max_skips_nodata() {
        let mut raster = Raster::from_vec(vec![-9999.0f32, 3.0, 7.5, f32::NAN], 2, 2).unwrap();
        raster.set_nodata(Some(-9999.0));
        assert_eq!(raster.band_min_max(0).unwrap(), (3.0, 7.5));
    }

    #[test]
    fn test_read_rows_window() {
        let raster = Raster::from_vec((0u32..12).collect(), 4, 3).unwrap();
        let mut buf = vec![0u32; 6];
        raster.read_rows(0, 1, 2, &mut buf).unwrap();
        assert_eq!(buf, vec![3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_raster_statistics() {
        let raster = Raster::from_vec((0u32..100).collect(), 10, 10).unwrap();
        let stats = raster.statistics();
        assert_eq!(stats.min, Some(0));
        assert_eq!(stats.max, Some(99));
        assert_eq!(stats.valid_count, 100);
    }
}
