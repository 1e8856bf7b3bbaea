//! # RSGIS Core
//!
//! Core types and I/O for the RSGIS classification toolkit.
//!
//! This crate provides:
//! - `RasterDataset` / `RasterDatasetMut`: row-oriented access to multi-band rasters
//! - `Raster<T>` and `MultiBandRaster<T>`: in-memory datasets
//! - `RowWindow<T>`: three-row sliding window for neighbourhood passes
//! - `GeoTransform` and `CRS` carried from inputs to outputs
//! - GeoTIFF I/O

pub mod crs;
pub mod error;
pub mod io;
pub mod raster;

pub use crs::CRS;
pub use error::{Error, Result};
pub use raster::{
    GeoTransform, MultiBandRaster, Raster, RasterDataset, RasterDatasetMut, RasterElement,
    RowWindow,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{
        GeoTransform, MultiBandRaster, Raster, RasterDataset, RasterDatasetMut, RasterElement,
        RowWindow,
    };
}
