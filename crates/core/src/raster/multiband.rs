//! Multi-band in-memory raster

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::dataset::check_row_access;
use crate::raster::{GeoTransform, Raster, RasterDataset, RasterDatasetMut, RasterElement};
use ndarray::{Array3, Axis};

/// A georeferenced stack of equally sized bands, stored `(band, row, col)`.
///
/// This is the usual input of the clustering classifiers: one band per
/// spectral channel.
#[derive(Debug, Clone)]
pub struct MultiBandRaster<T: RasterElement> {
    data: Array3<T>,
    transform: GeoTransform,
    crs: Option<CRS>,
    /// One entry per band
    nodata: Vec<Option<T>>,
}

impl<T: RasterElement> MultiBandRaster<T> {
    /// Zero-filled raster with `bands` bands
    pub fn new(bands: usize, rows: usize, cols: usize) -> Self {
        Self::from_array(Array3::zeros((bands, rows, cols)))
    }

    pub fn from_array(data: Array3<T>) -> Self {
        let bands = data.len_of(Axis(0));
        Self {
            data,
            transform: GeoTransform::default(),
            crs: None,
            nodata: vec![None; bands],
        }
    }

    /// Band-sequential data: all of band 0, then all of band 1, ...
    pub fn from_vec(data: Vec<T>, bands: usize, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != bands * rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }
        let array = Array3::from_shape_vec((bands, rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;
        Ok(Self::from_array(array))
    }

    /// Stack single-band rasters. Georeferencing comes from the first, each
    /// band keeps its own no-data value.
    pub fn stack(bands: &[Raster<T>]) -> Result<Self> {
        let first = bands
            .first()
            .ok_or_else(|| Error::RasterAccess("cannot stack zero bands".into()))?;
        let (rows, cols) = first.shape();

        let mut data = Array3::zeros((bands.len(), rows, cols));
        for (i, band) in bands.iter().enumerate() {
            first.check_same_size(band).map_err(|_| {
                Error::RasterAccess(format!(
                    "band {} is {}x{}, expected {}x{}",
                    i,
                    band.cols(),
                    band.rows(),
                    cols,
                    rows
                ))
            })?;
            data.index_axis_mut(Axis(0), i).assign(band.data());
        }

        let mut stacked = Self::from_array(data);
        stacked.transform = *first.transform();
        stacked.crs = first.crs().cloned();
        stacked.nodata = bands.iter().map(|b| b.nodata()).collect();
        Ok(stacked)
    }

    /// Zero-filled raster with `bands` bands shaped and georeferenced like `template`
    pub fn from_template<D: RasterDataset + ?Sized>(template: &D, bands: usize) -> Self {
        let mut raster = Self::new(bands, template.height(), template.width());
        raster.transform = template.transform();
        raster.crs = template.crs().cloned();
        raster
    }

    /// Copy one band out as a single-band raster
    pub fn band(&self, band: usize) -> Result<Raster<T>> {
        if band >= self.data.len_of(Axis(0)) {
            return Err(Error::RasterAccess(format!(
                "band {} requested from a dataset with {} bands",
                band,
                self.data.len_of(Axis(0))
            )));
        }
        let mut raster = Raster::from_array(self.data.index_axis(Axis(0), band).to_owned());
        raster.set_transform(self.transform);
        raster.set_crs(self.crs.clone());
        raster.set_nodata(self.nodata[band]);
        Ok(raster)
    }

    pub fn set(&mut self, band: usize, row: usize, col: usize, value: T) -> Result<()> {
        let (_, rows, cols) = self.data.dim();
        match self.data.get_mut((band, row, col)) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(Error::IndexOutOfBounds { row, col, rows, cols }),
        }
    }

    pub fn data(&self) -> &Array3<T> {
        &self.data
    }

    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    pub fn set_crs(&mut self, crs: Option<CRS>) {
        self.crs = crs;
    }

    /// Set the same no-data value on every band
    pub fn set_nodata(&mut self, nodata: Option<T>) {
        self.nodata.iter_mut().for_each(|nd| *nd = nodata);
    }

    /// Set the no-data value of one band
    pub fn set_band_nodata(&mut self, band: usize, nodata: Option<T>) -> Result<()> {
        let bands = self.nodata.len();
        let slot = self.nodata.get_mut(band).ok_or_else(|| {
            Error::RasterAccess(format!(
                "band {} requested from a dataset with {} bands",
                band, bands
            ))
        })?;
        *slot = nodata;
        Ok(())
    }
}

impl<T: RasterElement> RasterDataset for MultiBandRaster<T> {
    type Cell = T;

    fn width(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    fn height(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    fn band_count(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    fn read_row(&self, band: usize, row: usize, buf: &mut [T]) -> Result<()> {
        let (bands, rows, cols) = self.data.dim();
        check_row_access(band, row, buf.len(), bands, rows, cols)?;
        for (dst, &src) in buf.iter_mut().zip(self.data.slice(ndarray::s![band, row, ..])) {
            *dst = src;
        }
        Ok(())
    }

    /// Shared no-data value; `None` when the bands disagree
    fn nodata(&self) -> Option<T> {
        let first = *self.nodata.first()?;
        if self.nodata.iter().all(|nd| *nd == first) {
            first
        } else {
            None
        }
    }

    fn band_nodata(&self, band: usize) -> Option<T> {
        self.nodata.get(band).copied().flatten()
    }

    fn transform(&self) -> GeoTransform {
        self.transform
    }

    fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }
}

impl<T: RasterElement> RasterDatasetMut for MultiBandRaster<T> {
    fn write_row(&mut self, band: usize, row: usize, data: &[T]) -> Result<()> {
        let (bands, rows, cols) = self.data.dim();
        check_row_access(band, row, data.len(), bands, rows, cols)?;
        for (dst, &src) in self.data.slice_mut(ndarray::s![band, row, ..]).iter_mut().zip(data) {
            *dst = src;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_reads_each_band() {
        let a = Raster::from_vec(vec![1.0f32, 2.0, 3.0, 4.0], 2, 2).unwrap();
        let b = Raster::from_vec(vec![10.0f32, 20.0, 30.0, 40.0], 2, 2).unwrap();
        let stack = MultiBandRaster::stack(&[a, b]).unwrap();

        assert_eq!(stack.band_count(), 2);
        let mut row = [0.0f32; 2];
        stack.read_row(1, 1, &mut row).unwrap();
        assert_eq!(row, [30.0, 40.0]);
        assert_eq!(stack.band_min_max(0).unwrap(), (1.0, 4.0));
    }

    #[test]
    fn test_stack_dimension_mismatch() {
        let a: Raster<f32> = Raster::new(2, 2);
        let b: Raster<f32> = Raster::new(3, 2);
        let err = MultiBandRaster::stack(&[a, b]).unwrap_err();
        assert!(err.is_raster_access());
    }

    #[test]
    fn test_template_keeps_georeferencing() {
        let mut src: MultiBandRaster<f32> = MultiBandRaster::new(3, 4, 5);
        src.set_transform(GeoTransform::new(100.0, 200.0, 10.0, -10.0));
        src.set_crs(Some(CRS::from_epsg(32630)));

        let labels: Raster<u32> = Raster::from_template(&src);
        assert_eq!(labels.shape(), (4, 5));
        assert_eq!(labels.transform(), &GeoTransform::new(100.0, 200.0, 10.0, -10.0));
        assert_eq!(labels.crs().and_then(|c| c.epsg()), Some(32630));

        let copy = MultiBandRaster::<u8>::from_template(&src, 2);
        assert_eq!(copy.band_count(), 2);
    }

    #[test]
    fn test_write_row_then_extract_band() {
        let mut raster: MultiBandRaster<u32> = MultiBandRaster::new(2, 2, 3);
        raster.write_row(1, 0, &[7, 8, 9]).unwrap();
        let band = raster.band(1).unwrap();
        assert_eq!(band.get(0, 2).unwrap(), 9);
        assert!(raster.band(2).is_err());
    }

    #[test]
    fn test_stack_keeps_nodata_of_each_band() {
        let a = Raster::filled(2, 2, 10.0f32);
        let mut b = Raster::from_vec(vec![20.0f32, 20.0, 20.0, -9999.0], 2, 2).unwrap();
        b.set_nodata(Some(-9999.0));
        let stack = MultiBandRaster::stack(&[a, b]).unwrap();

        assert_eq!(stack.band_nodata(0), None);
        assert_eq!(stack.band_nodata(1), Some(-9999.0));
        // bands disagree, so there is no shared value
        assert_eq!(stack.nodata(), None);
        assert_eq!(stack.band_min_max(1).unwrap(), (20.0, 20.0));
        assert_eq!(stack.band(1).unwrap().nodata(), Some(-9999.0));
        assert_eq!(stack.band(0).unwrap().nodata(), None);
    }

    #[test]
    fn test_shared_nodata() {
        let mut raster: MultiBandRaster<u8> = MultiBandRaster::new(3, 1, 1);
        raster.set_nodata(Some(0));
        assert_eq!(raster.nodata(), Some(0));

        raster.set_band_nodata(2, Some(255)).unwrap();
        assert_eq!(raster.nodata(), None);
        assert_eq!(raster.band_nodata(2), Some(255));
        assert!(raster.set_band_nodata(3, None).unwrap_err().is_raster_access());
    }
}
