//! Sliding three-row window for neighbourhood passes
//!
//! Holds the rows above, at and below the current row of one band so a
//! 3x3 neighbourhood pass needs O(width) memory whatever the raster height.
//! Advancing rotates buffer slots and refills only the new bottom row.

use crate::error::{Error, Result};
use crate::raster::{RasterDataset, RasterElement};

/// Ring buffer of three rows (above / current / below) of one band.
#[derive(Debug, Clone)]
pub struct RowWindow<T: RasterElement> {
    buffers: [Vec<T>; 3],
    /// Buffer index holding the row above, the current row and the row below
    slots: [usize; 3],
    row: usize,
    height: usize,
    band: usize,
}

impl<T: RasterElement> RowWindow<T> {
    /// Load rows 0 and 1 of `band`, centred on row 0.
    pub fn start<D>(dataset: &D, band: usize) -> Result<Self>
    where
        D: RasterDataset<Cell = T> + ?Sized,
    {
        let (width, height) = (dataset.width(), dataset.height());
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions { width, height });
        }

        let mut window = Self {
            buffers: [vec![T::zero(); width], vec![T::zero(); width], vec![T::zero(); width]],
            slots: [0, 1, 2],
            row: 0,
            height,
            band,
        };
        dataset.read_row(band, 0, &mut window.buffers[1])?;
        if height > 1 {
            dataset.read_row(band, 1, &mut window.buffers[2])?;
        }
        Ok(window)
    }

    /// Move down one row. Returns `false` (and does nothing) on the last row.
    pub fn advance<D>(&mut self, dataset: &D) -> Result<bool>
    where
        D: RasterDataset<Cell = T> + ?Sized,
    {
        if self.row + 1 >= self.height {
            return Ok(false);
        }
        self.slots.rotate_left(1);
        self.row += 1;
        if self.row + 1 < self.height {
            let slot = self.slots[2];
            dataset.read_row(self.band, self.row + 1, &mut self.buffers[slot])?;
        }
        Ok(true)
    }

    /// Index of the current row
    pub fn row(&self) -> usize {
        self.row
    }

    pub fn width(&self) -> usize {
        self.buffers[0].len()
    }

    pub fn above(&self) -> Option<&[T]> {
        (self.row > 0).then(|| self.buffers[self.slots[0]].as_slice())
    }

    pub fn current(&self) -> &[T] {
        &self.buffers[self.slots[1]]
    }

    /// Mutable current row; edits are seen as `above()` after the next advance
    pub fn current_mut(&mut self) -> &mut [T] {
        let slot = self.slots[1];
        &mut self.buffers[slot]
    }

    pub fn below(&self) -> Option<&[T]> {
        (self.row + 1 < self.height).then(|| self.buffers[self.slots[2]].as_slice())
    }

    /// Value at `(row + dr, col + dc)` for `dr` in -1..=1, `None` outside the raster
    pub fn neighbour(&self, col: usize, dr: isize, dc: isize) -> Option<T> {
        let line = match dr {
            -1 => self.above()?,
            0 => self.current(),
            1 => self.below()?,
            _ => return None,
        };
        let c = col.checked_add_signed(dc)?;
        line.get(c).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Raster;

    #[test]
    fn test_window_slides_over_rows() {
        let raster = Raster::from_vec((0u32..12).collect(), 4, 3).unwrap();
        let mut window = RowWindow::start(&raster, 0).unwrap();

        assert!(window.above().is_none());
        assert_eq!(window.current(), &[0, 1, 2]);
        assert_eq!(window.below(), Some(&[3u32, 4, 5][..]));

        assert!(window.advance(&raster).unwrap());
        assert!(window.advance(&raster).unwrap());
        assert_eq!(window.row(), 2);
        assert_eq!(window.above(), Some(&[3u32, 4, 5][..]));
        assert_eq!(window.current(), &[6, 7, 8]);
        assert_eq!(window.below(), Some(&[9u32, 10, 11][..]));

        assert!(window.advance(&raster).unwrap());
        assert!(window.below().is_none());
        assert!(!window.advance(&raster).unwrap());
        assert_eq!(window.row(), 3);
    }

    #[test]
    fn test_neighbour_bounds() {
        let raster = Raster::from_vec((0u32..9).collect(), 3, 3).unwrap();
        let window = RowWindow::start(&raster, 0).unwrap();

        assert_eq!(window.neighbour(0, 0, 1), Some(1));
        assert_eq!(window.neighbour(0, 1, 1), Some(4));
        assert_eq!(window.neighbour(0, -1, 0), None);
        assert_eq!(window.neighbour(0, 0, -1), None);
        assert_eq!(window.neighbour(2, 0, 1), None);
    }

    #[test]
    fn test_edits_carry_into_above() {
        let raster = Raster::from_vec((0u32..6).collect(), 2, 3).unwrap();
        let mut window = RowWindow::start(&raster, 0).unwrap();
        window.current_mut()[1] = 42;
        window.advance(&raster).unwrap();
        assert_eq!(window.above(), Some(&[0u32, 42, 2][..]));
    }

    #[test]
    fn test_single_row_raster() {
        let raster = Raster::from_vec(vec![5u8, 6], 1, 2).unwrap();
        let mut window = RowWindow::start(&raster, 0).unwrap();
        assert!(window.below().is_none());
        assert!(!window.advance(&raster).unwrap());
    }

    #[test]
    fn test_empty_raster_rejected() {
        let raster: Raster<u8> = Raster::new(0, 0);
        assert!(RowWindow::start(&raster, 0).is_err());
    }
}
