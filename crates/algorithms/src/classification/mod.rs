//! Unsupervised classification of multi-band rasters
//!
//! - **K-means**: fixed number of clusters
//! - **ISODATA**: clusters are discarded, merged and split between iterations
//!
//! Both classifiers stream the input row by row and label pixels with the
//! index of their nearest centre (mean squared per-band difference).

mod centre;
mod init;
mod isodata;
mod kmeans;
mod scan;
mod table;

pub use centre::{mean_sq_distance, ClusterCentre, IsoClusterCentre};
pub use init::InitMethod;
pub use isodata::{IsodataClassifier, IsodataParams};
pub use kmeans::{ClusteringSummary, KMeansClassifier, KMeansParams};
pub use scan::LABEL_NODATA;
