//! # landseq Algorithms
//!
//! Algorithms over land-cover classification time series.
//!
//! ## Available Algorithm Categories
//!
//! - **temporal**: rule-based temporal consistency filtering (edge repair,
//!   class-transition context rules, short-dip removal)

pub mod temporal;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::temporal::{
        filter_sequence, filter_stack, filtered, Catalogue, FilterOutput, FilterParams,
        FilterReport, Rule, TemporalFilter,
    };
    pub use landseq_core::prelude::*;
}
