//! Row-streaming passes over a multi-band dataset
//!
//! Every classifier pass reads one row of every band at a time and hands
//! the closure a pixel-interleaved row, so memory stays O(width x bands)
//! whatever the raster height.

use super::centre::{nearest_centre, CentreAccumulator};
use crate::maybe_rayon::*;
use rsgis_core::{Error, RasterDataset, RasterDatasetMut, RasterElement, Result};
use tracing::trace;

/// No-data label written for pixels with a missing or non-finite band value
pub const LABEL_NODATA: u32 = u32::MAX;

/// One raster row, pixel-interleaved: `values[col * bands + band]`
pub struct PixelRow<'r> {
    values: &'r [f64],
    valid: &'r [bool],
    bands: usize,
}

impl<'r> PixelRow<'r> {
    pub fn width(&self) -> usize {
        self.valid.len()
    }

    pub fn pixel(&self, col: usize) -> &'r [f64] {
        &self.values[col * self.bands..(col + 1) * self.bands]
    }

    /// False when any band is no-data or non-finite
    pub fn is_valid(&self, col: usize) -> bool {
        self.valid[col]
    }

    /// Nearest centre for every valid pixel of the row
    pub fn nearest(&self, positions: &[Vec<f64>]) -> Vec<Option<(usize, f64)>> {
        (0..self.width())
            .into_par_iter()
            .map(|col| self.is_valid(col).then(|| nearest_centre(self.pixel(col), positions)))
            .collect()
    }
}

/// Reusable row buffers for full passes over one dataset
pub struct PixelScanner<'a, D: RasterDataset> {
    dataset: &'a D,
    band_rows: Vec<Vec<D::Cell>>,
    values: Vec<f64>,
    valid: Vec<bool>,
}

impl<'a, D: RasterDataset> PixelScanner<'a, D> {
    pub fn new(dataset: &'a D) -> Self {
        let (width, bands) = (dataset.width(), dataset.band_count());
        Self {
            dataset,
            band_rows: vec![vec![<D::Cell as num_traits::Zero>::zero(); width]; bands],
            values: vec![0.0; width * bands],
            valid: vec![true; width],
        }
    }

    pub fn bands(&self) -> usize {
        self.band_rows.len()
    }

    /// Run `f` on every row, top to bottom. `pass` names the pass in trace output.
    pub fn for_each_row<F>(&mut self, pass: &str, mut f: F) -> Result<()>
    where
        F: FnMut(usize, &PixelRow<'_>) -> Result<()>,
    {
        let height = self.dataset.height();
        let bands = self.bands();
        let decile = (height / 10).max(1);

        for row in 0..height {
            self.valid.iter_mut().for_each(|v| *v = true);
            for (band, buf) in self.band_rows.iter_mut().enumerate() {
                let nodata = self.dataset.band_nodata(band);
                self.dataset.read_row(band, row, buf)?;
                for (col, &cell) in buf.iter().enumerate() {
                    let value = if cell.is_nodata(nodata) {
                        None
                    } else {
                        cell.to_f64().filter(|v| v.is_finite())
                    };
                    match value {
                        Some(v) => self.values[col * bands + band] = v,
                        None => self.valid[col] = false,
                    }
                }
            }

            f(row, &PixelRow { values: &self.values, valid: &self.valid, bands })?;

            if (row + 1) % decile == 0 {
                trace!(pass, percent = (row + 1) * 100 / height, "pass progress");
            }
        }
        Ok(())
    }
}

/// One assignment pass: sums, counts and distance sums per centre
pub fn accumulate_pass<D: RasterDataset>(
    scanner: &mut PixelScanner<'_, D>,
    positions: &[Vec<f64>],
) -> Result<Vec<CentreAccumulator>> {
    let mut acc = vec![CentreAccumulator::new(scanner.bands()); positions.len()];
    scanner.for_each_row("assign", |_, row| {
        for (col, hit) in row.nearest(positions).into_iter().enumerate() {
            if let Some((idx, dist)) = hit {
                acc[idx].add(row.pixel(col), dist);
            }
        }
        Ok(())
    })?;
    Ok(acc)
}

/// Write the nearest-centre index of every pixel into band 0 of `output`
pub fn label_into<D, O>(dataset: &D, positions: &[Vec<f64>], output: &mut O) -> Result<()>
where
    D: RasterDataset,
    O: RasterDatasetMut<Cell = u32>,
{
    if positions.is_empty() {
        return Err(Error::Classification("cluster centres have not been initialised".into()));
    }
    dataset.check_same_size(&*output)?;

    let mut scanner = PixelScanner::new(dataset);
    let mut labels = vec![LABEL_NODATA; dataset.width()];
    scanner.for_each_row("label", |row_idx, row| {
        for (label, hit) in labels.iter_mut().zip(row.nearest(positions)) {
            *label = hit.map_or(LABEL_NODATA, |(idx, _)| idx as u32);
        }
        output.write_row(0, row_idx, &labels)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsgis_core::{MultiBandRaster, Raster};

    #[test]
    fn test_rows_are_pixel_interleaved() {
        let data = MultiBandRaster::from_vec(vec![1.0f32, 2.0, 3.0, 4.0, 10.0, 20.0, 30.0, 40.0], 2, 2, 2)
            .unwrap();
        let mut scanner = PixelScanner::new(&data);
        let mut seen = Vec::new();
        scanner
            .for_each_row("test", |row_idx, row| {
                for col in 0..row.width() {
                    seen.push((row_idx, row.pixel(col).to_vec()));
                }
                Ok(())
            })
            .unwrap();
        assert_eq!(seen[0], (0, vec![1.0, 10.0]));
        assert_eq!(seen[3], (1, vec![4.0, 40.0]));
    }

    #[test]
    fn test_invalid_pixels_get_nodata_label() {
        let mut raster = Raster::from_vec(vec![1.0f32, f32::NAN, -9999.0, 9.0], 2, 2).unwrap();
        raster.set_nodata(Some(-9999.0));
        let mut labels: Raster<u32> = Raster::from_template(&raster);
        label_into(&raster, &[vec![0.0], vec![10.0]], &mut labels).unwrap();

        assert_eq!(labels.get(0, 0).unwrap(), 0);
        assert_eq!(labels.get(0, 1).unwrap(), LABEL_NODATA);
        assert_eq!(labels.get(1, 0).unwrap(), LABEL_NODATA);
        assert_eq!(labels.get(1, 1).unwrap(), 1);
    }

    #[test]
    fn test_label_size_mismatch() {
        let raster: Raster<f32> = Raster::new(2, 2);
        let mut labels: Raster<u32> = Raster::new(3, 2);
        let err = label_into(&raster, &[vec![0.0]], &mut labels).unwrap_err();
        assert!(err.is_raster_access());
    }
}
