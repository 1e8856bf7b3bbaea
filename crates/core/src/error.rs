//! Error types for RSGIS

use thiserror::Error;

/// Main error type for RSGIS operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    /// A dataset could not be opened, read or written.
    #[error("Raster access error: {0}")]
    RasterAccess(String),

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("GDAL error: {0}")]
    #[cfg(feature = "gdal")]
    Gdal(String),

    /// Classifier misuse or failure: uninitialized centres, an unknown
    /// initialization method, centre/band mismatch, collapsed centre set.
    #[error("Classification error: {0}")]
    Classification(String),

    /// Unsupported algorithm configuration (e.g. connectivity other than 4 or 8).
    #[error("Algorithm configuration error: {0}")]
    AlgorithmConfiguration(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error belongs to the raster access family.
    pub fn is_raster_access(&self) -> bool {
        matches!(
            self,
            Error::RasterAccess(_)
                | Error::SizeMismatch { .. }
                | Error::IndexOutOfBounds { .. }
                | Error::InvalidDimensions { .. }
        )
    }
}

#[cfg(feature = "gdal")]
impl From<gdal::errors::GdalError> for Error {
    fn from(e: gdal::errors::GdalError) -> Self {
        Error::Gdal(e.to_string())
    }
}

/// Result type alias for RSGIS operations
pub type Result<T> = std::result::Result<T, Error>;
