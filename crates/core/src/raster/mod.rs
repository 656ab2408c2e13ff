//! Label stack data structures and operations

mod element;
mod grid;
mod sequence;
mod years;

pub use element::{Label, LabelDomain};
pub use grid::LabelStack;
pub use sequence::PixelSequence;
pub use years::{Year, YearRange, FIRST_YEAR, LAST_YEAR};
