//! # RSGIS Algorithms
//!
//! Unsupervised classification and clean-up of remote-sensing rasters.
//!
//! ## Modules
//!
//! - **classification**: K-means and ISODATA clustering of multi-band images
//! - **filter**: single pixel elimination on labelled rasters

pub mod classification;
pub mod filter;
pub(crate) mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classification::{
        ClusteringSummary, InitMethod, IsodataClassifier, IsodataParams, KMeansClassifier,
        KMeansParams, LABEL_NODATA,
    };
    pub use crate::filter::{Connectivity, EliminationSummary, SinglePixelEliminator};
    pub use rsgis_core::prelude::*;
}
