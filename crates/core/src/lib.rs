//! # landseq Core
//!
//! Core types, traits and I/O for landseq, a temporal consistency filter
//! for land-cover classification time series.
//!
//! This crate provides:
//! - `Label` / `LabelDomain`: categorical class codes and their valid range
//! - `YearRange`: the contiguous years of a series
//! - `PixelSequence`: one pixel's year-ordered labels
//! - `LabelStack`: a (row, col, year) grid of labels
//! - Source/sink stores and multi-page TIFF I/O
//! - Algorithm traits for consistent API

pub mod error;
pub mod io;
pub mod raster;

pub use error::{Error, Result};
pub use raster::{Label, LabelDomain, LabelStack, PixelSequence, Year, YearRange};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::io::{Sink, SourceStore, StackMetadata};
    pub use crate::raster::{Label, LabelDomain, LabelStack, PixelSequence, Year, YearRange};
    pub use crate::Algorithm;
}

/// Core trait for all algorithms in landseq.
///
/// Algorithms are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
