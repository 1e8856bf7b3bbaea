//! Row-oriented dataset contract shared by in-memory and file-backed rasters
//!
//! Algorithms never touch a whole raster at once: they pull one row (or a
//! small window of rows) of one band at a time, so the same code runs over
//! an `ndarray`-backed grid or a dataset streamed from disk.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, RasterElement};
use num_traits::Zero;

/// Read access to a multi-band 2D raster.
///
/// Bands and rows are 0-indexed.
pub trait RasterDataset {
    /// Cell type of every band
    type Cell: RasterElement;

    /// Number of columns
    fn width(&self) -> usize;

    /// Number of rows
    fn height(&self) -> usize;

    /// Number of bands
    fn band_count(&self) -> usize;

    /// Read one row of one band into `buf` (`buf.len()` must equal `width()`)
    fn read_row(&self, band: usize, row: usize, buf: &mut [Self::Cell]) -> Result<()>;

    /// Read `n` consecutive rows of one band into `buf` in row-major order
    fn read_rows(&self, band: usize, first_row: usize, n: usize, buf: &mut [Self::Cell]) -> Result<()> {
        let width = self.width();
        if buf.len() != width * n {
            return Err(Error::RasterAccess(format!(
                "window buffer holds {} cells, {} rows of width {} need {}",
                buf.len(),
                n,
                width,
                width * n
            )));
        }
        for (i, chunk) in buf.chunks_exact_mut(width.max(1)).enumerate().take(n) {
            self.read_row(band, first_row + i, chunk)?;
        }
        Ok(())
    }

    /// No-data value shared by all bands, if any
    fn nodata(&self) -> Option<Self::Cell> {
        None
    }

    /// No-data value of one band; datasets with a single shared value
    /// return it for every band.
    fn band_nodata(&self, band: usize) -> Option<Self::Cell> {
        let _ = band;
        self.nodata()
    }

    /// Georeferencing of the dataset
    fn transform(&self) -> GeoTransform {
        GeoTransform::default()
    }

    /// Coordinate reference system of the dataset
    fn crs(&self) -> Option<&CRS> {
        None
    }

    /// Minimum and maximum of a band, ignoring no-data and non-finite cells.
    ///
    /// Fails when the band holds no valid cell.
    fn band_min_max(&self, band: usize) -> Result<(f64, f64)> {
        let nodata = self.band_nodata(band);
        let mut buf = vec![<Self::Cell as Zero>::zero(); self.width()];
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for row in 0..self.height() {
            self.read_row(band, row, &mut buf)?;
            for &v in &buf {
                if v.is_nodata(nodata) {
                    continue;
                }
                if let Some(v) = v.to_f64().filter(|v| v.is_finite()) {
                    min = min.min(v);
                    max = max.max(v);
                }
            }
        }

        if min > max {
            return Err(Error::RasterAccess(format!("band {} has no valid cells", band)));
        }
        Ok((min, max))
    }

    /// Fail with [`Error::SizeMismatch`] unless `other` has the same width and height
    fn check_same_size<O: RasterDataset + ?Sized>(&self, other: &O) -> Result<()> {
        if self.height() != other.height() || self.width() != other.width() {
            return Err(Error::SizeMismatch {
                er: self.height(),
                ec: self.width(),
                ar: other.height(),
                ac: other.width(),
            });
        }
        Ok(())
    }
}

/// Write access on top of [`RasterDataset`].
pub trait RasterDatasetMut: RasterDataset {
    /// Overwrite one row of one band (`data.len()` must equal `width()`)
    fn write_row(&mut self, band: usize, row: usize, data: &[Self::Cell]) -> Result<()>;
}

/// Validate a `(band, row, buffer length)` request against dataset dimensions.
pub(crate) fn check_row_access(
    band: usize,
    row: usize,
    len: usize,
    bands: usize,
    rows: usize,
    cols: usize,
) -> Result<()> {
    if band >= bands {
        return Err(Error::RasterAccess(format!(
            "band {} requested from a dataset with {} bands",
            band, bands
        )));
    }
    if row >= rows {
        return Err(Error::IndexOutOfBounds { row, col: 0, rows, cols });
    }
    if len != cols {
        return Err(Error::RasterAccess(format!(
            "row buffer holds {} cells, raster width is {}",
            len, cols
        )));
    }
    Ok(())
}
