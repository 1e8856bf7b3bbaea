//! Single pixel elimination for classified rasters
//!
//! A pixel is isolated when none of its in-bounds neighbours (4- or
//! 8-connected) shares its label. Isolated pixels take the most frequent
//! label among their non-isolated neighbours. Find and replace passes
//! alternate until no isolated pixel is left or a replace pass changes
//! nothing.
//!
//! Both passes stream the raster through a three-row [`RowWindow`], so
//! memory use is O(width).

use std::fmt;

use rsgis_core::raster::Raster;
use rsgis_core::{Error, RasterDataset, RasterDatasetMut, RasterElement, Result, RowWindow};
use tracing::debug;

/// Neighbourhood used to decide isolation and collect replacement values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connectivity {
    /// N, W, E, S
    #[default]
    Four,
    /// All eight surrounding pixels
    Eight,
}

const FOUR: [(isize, isize); 4] = [(-1, 0), (0, -1), (0, 1), (1, 0)];
const EIGHT: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

impl Connectivity {
    /// `(row, col)` offsets in scan order. Frequency ties during
    /// replacement go to the value met first in this order.
    pub fn offsets(self) -> &'static [(isize, isize)] {
        match self {
            Connectivity::Four => &FOUR,
            Connectivity::Eight => &EIGHT,
        }
    }
}

impl TryFrom<u8> for Connectivity {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            4 => Ok(Connectivity::Four),
            8 => Ok(Connectivity::Eight),
            other => Err(Error::AlgorithmConfiguration(format!(
                "connectivity must be 4 or 8, got {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connectivity::Four => write!(f, "4"),
            Connectivity::Eight => write!(f, "8"),
        }
    }
}

/// Outcome of [`SinglePixelEliminator::eliminate`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EliminationSummary {
    /// Replace passes run
    pub iterations: usize,
    /// Pixels changed over all passes
    pub pixels_replaced: usize,
    /// Isolated (non no-data) pixels found by the last find pass
    pub remaining_isolated: usize,
}

enum Phase {
    Scanning,
    Replacing,
}

/// Removes isolated pixels from band 0 of a labelled raster.
///
/// # Example
/// ```ignore
/// let eliminator = SinglePixelEliminator::new(Connectivity::Eight).with_nodata(0u32);
/// let summary = eliminator.eliminate_in_memory(&mut labels)?;
/// ```
#[derive(Debug, Clone)]
pub struct SinglePixelEliminator<T: RasterElement> {
    connectivity: Connectivity,
    nodata: Option<T>,
}

impl<T: RasterElement> SinglePixelEliminator<T> {
    pub fn new(connectivity: Connectivity) -> Self {
        Self {
            connectivity,
            nodata: None,
        }
    }

    /// Pixels equal to `nodata` are masked as isolated, never evaluated
    /// and never used as replacement values.
    pub fn with_nodata(mut self, nodata: T) -> Self {
        self.nodata = Some(nodata);
        self
    }

    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    fn is_nodata(&self, value: T) -> bool {
        value.is_nodata(self.nodata)
    }

    /// Write the isolation mask (1 = isolated or no-data, 0 = not) into
    /// band 0 of `mask`. Returns the number of isolated pixels that are not
    /// no-data.
    pub fn find_single_pixels<R, M>(&self, raster: &R, mask: &mut M) -> Result<usize>
    where
        R: RasterDataset<Cell = T>,
        M: RasterDatasetMut<Cell = u8>,
    {
        raster.check_same_size(&*mask)?;
        let offsets = self.connectivity.offsets();
        let mut window = RowWindow::start(raster, 0)?;
        let mut flags = vec![0u8; raster.width()];
        let mut isolated = 0;

        loop {
            for (col, flag) in flags.iter_mut().enumerate() {
                let value = window.current()[col];
                *flag = if self.is_nodata(value) {
                    1
                } else if offsets
                    .iter()
                    .any(|&(dr, dc)| window.neighbour(col, dr, dc) == Some(value))
                {
                    0
                } else {
                    isolated += 1;
                    1
                };
            }
            mask.write_row(0, window.row(), &flags)?;

            if !window.advance(raster)? {
                break;
            }
        }

        Ok(isolated)
    }

    /// Replace every masked, non no-data pixel that has at least two
    /// unmasked neighbours by their most frequent value. Returns the number
    /// of pixels changed.
    pub fn replace_single_pixels<R, M>(&self, raster: &mut R, mask: &M) -> Result<usize>
    where
        R: RasterDatasetMut<Cell = T>,
        M: RasterDataset<Cell = u8>,
    {
        raster.check_same_size(mask)?;
        let offsets = self.connectivity.offsets();
        let mut pixels = RowWindow::start(&*raster, 0)?;
        let mut flags = RowWindow::start(mask, 0)?;
        let mut counts: Vec<(T, usize)> = Vec::with_capacity(offsets.len());
        let mut replaced = 0;

        loop {
            let mut row_changed = false;
            for col in 0..pixels.width() {
                let value = pixels.current()[col];
                if flags.current()[col] == 0 || self.is_nodata(value) {
                    continue;
                }

                counts.clear();
                let mut collected = 0;
                for &(dr, dc) in offsets {
                    if flags.neighbour(col, dr, dc) != Some(0) {
                        continue;
                    }
                    if let Some(v) = pixels.neighbour(col, dr, dc) {
                        collected += 1;
                        match counts.iter_mut().find(|(c, _)| *c == v) {
                            Some(entry) => entry.1 += 1,
                            None => counts.push((v, 1)),
                        }
                    }
                }
                if collected < 2 {
                    continue;
                }

                // Unmasked neighbours never change in this pass, so editing
                // the current row in place does not affect later pixels.
                let best = most_frequent(&counts);
                if best != value {
                    pixels.current_mut()[col] = best;
                    replaced += 1;
                    row_changed = true;
                }
            }

            if row_changed {
                raster.write_row(0, pixels.row(), pixels.current())?;
            }
            if !pixels.advance(&*raster)? {
                break;
            }
            flags.advance(mask)?;
        }

        Ok(replaced)
    }

    /// Alternate find and replace passes until a fixed point.
    ///
    /// `mask` is scratch space of the raster's size.
    pub fn eliminate<R, M>(&self, raster: &mut R, mask: &mut M) -> Result<EliminationSummary>
    where
        R: RasterDatasetMut<Cell = T>,
        M: RasterDatasetMut<Cell = u8>,
    {
        let mut summary = EliminationSummary::default();
        let mut phase = Phase::Scanning;

        loop {
            phase = match phase {
                Phase::Scanning => {
                    summary.remaining_isolated = self.find_single_pixels(&*raster, mask)?;
                    if summary.remaining_isolated == 0 {
                        break;
                    }
                    Phase::Replacing
                }
                Phase::Replacing => {
                    let changed = self.replace_single_pixels(raster, &*mask)?;
                    summary.iterations += 1;
                    summary.pixels_replaced += changed;
                    debug!(
                        iteration = summary.iterations,
                        isolated = summary.remaining_isolated,
                        changed,
                        "single pixel pass"
                    );
                    if changed == 0 {
                        break;
                    }
                    Phase::Scanning
                }
            };
        }

        Ok(summary)
    }

    /// [`eliminate`](Self::eliminate) with an internally allocated mask
    pub fn eliminate_in_memory(&self, raster: &mut Raster<T>) -> Result<EliminationSummary> {
        let mut mask: Raster<u8> = raster.with_same_meta();
        self.eliminate(raster, &mut mask)
    }
}

/// Highest count wins; ties keep the earliest entry
fn most_frequent<T: Copy>(counts: &[(T, usize)]) -> T {
    let mut best = counts[0];
    for &entry in &counts[1..] {
        if entry.1 > best.1 {
            best = entry;
        }
    }
    best.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring() -> Raster<u32> {
        Raster::from_vec(vec![1, 1, 1, 1, 2, 1, 1, 1, 1], 3, 3).unwrap()
    }

    #[test]
    fn test_ring_four_connected() {
        let mut raster = ring();
        let summary = SinglePixelEliminator::new(Connectivity::Four)
            .eliminate_in_memory(&mut raster)
            .unwrap();

        assert!(raster.data().iter().all(|&v| v == 1));
        assert_eq!(summary.iterations, 1);
        assert_eq!(summary.pixels_replaced, 1);
        assert_eq!(summary.remaining_isolated, 0);
    }

    #[test]
    fn test_ring_eight_connected() {
        let mut raster = ring();
        SinglePixelEliminator::new(Connectivity::Eight)
            .eliminate_in_memory(&mut raster)
            .unwrap();
        assert!(raster.data().iter().all(|&v| v == 1));
    }

    #[test]
    fn test_nodata_pixels_are_masked_and_untouched() {
        let mut raster = ring();
        let eliminator = SinglePixelEliminator::new(Connectivity::Four).with_nodata(1);

        let mut mask: Raster<u8> = raster.with_same_meta();
        let isolated = eliminator.find_single_pixels(&raster, &mut mask).unwrap();
        assert_eq!(isolated, 1);
        assert!(mask.data().iter().all(|&m| m == 1));

        let summary = eliminator.eliminate(&mut raster, &mut mask).unwrap();
        assert_eq!(raster.data(), ring().data());
        assert_eq!(summary.pixels_replaced, 0);
        assert_eq!(summary.remaining_isolated, 1);
    }

    #[test]
    fn test_frequency_tie_goes_to_first_in_scan_order() {
        #[rustfmt::skip]
        let mut raster = Raster::from_vec(vec![
            3, 3, 5,
            5, 9, 5,
            5, 3, 3,
        ], 3, 3).unwrap();
        SinglePixelEliminator::new(Connectivity::Four)
            .eliminate_in_memory(&mut raster)
            .unwrap();
        // N=3, W=5, E=5, S=3
        assert_eq!(raster.get(1, 1).unwrap(), 3u32);
    }

    #[test]
    fn test_eight_connected_tie_starts_at_north_west() {
        #[rustfmt::skip]
        let grid = vec![
            3, 2, 2,
            3, 9, 3,
            2, 2, 3u32,
        ];
        // NW=3, N=2, NE=2, W=3, E=3, SW=2, S=2, SE=3: four of each
        let mut eight = Raster::from_vec(grid.clone(), 3, 3).unwrap();
        let summary = SinglePixelEliminator::new(Connectivity::Eight)
            .eliminate_in_memory(&mut eight)
            .unwrap();
        assert_eq!(eight.get(1, 1).unwrap(), 3);
        assert_eq!(summary.pixels_replaced, 1);

        // N=2, W=3, E=3, S=2: N comes first
        let mut four = Raster::from_vec(grid, 3, 3).unwrap();
        SinglePixelEliminator::new(Connectivity::Four)
            .eliminate_in_memory(&mut four)
            .unwrap();
        assert_eq!(four.get(1, 1).unwrap(), 2);
    }

    #[test]
    fn test_diagonal_neighbours_only_count_for_eight() {
        #[rustfmt::skip]
        let grid = vec![
            5, 1, 1,
            1, 5, 1,
            1, 1, 1u32,
        ];

        let mut four = Raster::from_vec(grid.clone(), 3, 3).unwrap();
        let summary = SinglePixelEliminator::new(Connectivity::Four)
            .eliminate_in_memory(&mut four)
            .unwrap();
        assert!(four.data().iter().all(|&v| v == 1));
        assert_eq!(summary.pixels_replaced, 2);

        // the two 5s touch diagonally
        let mut eight = Raster::from_vec(grid.clone(), 3, 3).unwrap();
        let summary = SinglePixelEliminator::new(Connectivity::Eight)
            .eliminate_in_memory(&mut eight)
            .unwrap();
        assert_eq!(eight.data().as_slice().unwrap(), grid.as_slice());
        assert_eq!(summary.pixels_replaced, 0);
        assert_eq!(summary.remaining_isolated, 0);
    }

    #[test]
    fn test_majority_wins() {
        #[rustfmt::skip]
        let mut raster = Raster::from_vec(vec![
            4, 4, 6,
            7, 9, 4,
            7, 4, 4,
        ], 3, 3).unwrap();
        SinglePixelEliminator::new(Connectivity::Four)
            .eliminate_in_memory(&mut raster)
            .unwrap();
        // N=4, W=7, E=4, S=4
        assert_eq!(raster.get(1, 1).unwrap(), 4u32);
    }

    #[test]
    fn test_single_neighbour_is_not_enough() {
        let mut raster = Raster::from_vec(vec![1u32, 2], 1, 2).unwrap();
        let summary = SinglePixelEliminator::new(Connectivity::Eight)
            .eliminate_in_memory(&mut raster)
            .unwrap();
        assert_eq!(raster.data().as_slice().unwrap(), &[1, 2]);
        assert_eq!(summary.remaining_isolated, 2);
    }

    #[test]
    fn test_second_run_changes_nothing() {
        let data: Vec<u32> = (0..144u32).map(|i| (i * 7919 + i / 5) % 4).collect();
        let mut raster = Raster::from_vec(data, 12, 12).unwrap();
        let eliminator = SinglePixelEliminator::new(Connectivity::Eight);

        eliminator.eliminate_in_memory(&mut raster).unwrap();
        let settled = raster.clone();
        let again = eliminator.eliminate_in_memory(&mut raster).unwrap();

        assert_eq!(again.pixels_replaced, 0);
        assert_eq!(raster.data(), settled.data());
    }

    #[test]
    fn test_connectivity_parsing() {
        assert_eq!(Connectivity::try_from(4).unwrap(), Connectivity::Four);
        assert_eq!(Connectivity::try_from(8).unwrap(), Connectivity::Eight);
        assert!(matches!(
            Connectivity::try_from(6),
            Err(Error::AlgorithmConfiguration(_))
        ));
    }

    #[test]
    fn test_mask_size_mismatch() {
        let raster = ring();
        let mut mask: Raster<u8> = Raster::new(2, 3);
        let err = SinglePixelEliminator::new(Connectivity::Four)
            .find_single_pixels(&raster, &mut mask)
            .unwrap_err();
        assert!(err.is_raster_access());
    }
}
