//! Error types for landseq

use thiserror::Error;

use crate::raster::{Label, Year};

/// Main error type for landseq operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid raster dimensions: {rows}x{cols}x{years}")]
    InvalidDimensions { rows: usize, cols: usize, years: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Year {year} outside of range {first}..={last}")]
    YearOutOfRange { year: Year, first: Year, last: Year },

    #[error("Missing year {year} in pixel sequence")]
    MissingYear { year: Year },

    #[error("Label {label} in year {year} outside of domain {min}..={max}")]
    LabelOutOfDomain {
        label: i64,
        year: Year,
        min: Label,
        max: Label,
    },

    #[error("Pixel ({row}, {col}): {source}")]
    AtPixel {
        row: usize,
        col: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("Invalid rule catalogue: {0}")]
    InvalidCatalogue(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Attach a pixel location to an error raised while handling one sequence
    pub fn at_pixel(self, row: usize, col: usize) -> Self {
        match self {
            located @ Error::AtPixel { .. } => located,
            other => Error::AtPixel {
                row,
                col,
                source: Box::new(other),
            },
        }
    }
}

/// Result type alias for landseq operations
pub type Result<T> = std::result::Result<T, Error>;
