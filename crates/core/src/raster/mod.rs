//! Raster data structures and the row-oriented dataset contract

mod dataset;
mod element;
mod geotransform;
mod grid;
mod multiband;
mod window;

pub use dataset::{RasterDataset, RasterDatasetMut};
pub use element::RasterElement;
pub use geotransform::GeoTransform;
pub use grid::{Raster, RasterStatistics};
pub use multiband::MultiBandRaster;
pub use window::RowWindow;
