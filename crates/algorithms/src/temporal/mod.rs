//! Temporal consistency filtering for land-cover time series
//!
//! Cleans per-pixel class sequences by applying an ordered catalogue of
//! window rules:
//! - **Edge rules**: repair the first / second-to-last year
//! - **Context rules**: explicit 3- or 4-year class patterns with an explicit
//!   replacement (e.g. forest, grassland, grassland, agriculture becomes
//!   forest, agriculture, agriculture, agriculture)
//! - **Class sweeps**: remove 1-, 2- and 3-year dips bracketed by one class

mod catalogue;
mod filter;
mod rule;

pub use catalogue::{Catalogue, CatalogueBuilder};
pub use filter::{filter_sequence, filter_stack, filtered, FilterOutput, FilterParams, FilterReport, TemporalFilter};
pub use rule::{Replacement, Rule};
