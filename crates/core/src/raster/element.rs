//! Categorical cell values: land-cover labels and the admissible label domain

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::raster::Year;

/// A land-cover class code.
///
/// Labels are opaque enumerated values: two labels are either equal or not,
/// they are never averaged. `Ord` only exists so labels can key sorted maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(pub u8);

impl Label {
    /// The raw class code
    pub const fn code(self) -> u8 {
        self.0
    }

    /// Narrow any numeric cell value to a label.
    ///
    /// Returns `None` for values that have no `u8` representation
    /// (negative, fractional-overflow, NaN).
    pub fn from_numeric<T: num_traits::NumCast + Copy>(value: T) -> Option<Self> {
        num_traits::cast::<T, u8>(value).map(Label)
    }
}

impl From<u8> for Label {
    fn from(code: u8) -> Self {
        Label(code)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Inclusive range of label codes accepted as valid input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelDomain {
    pub min: Label,
    pub max: Label,
}

impl LabelDomain {
    /// Create a domain covering `min..=max`
    pub fn new(min: u8, max: u8) -> Result<Self> {
        if min > max {
            return Err(Error::InvalidParameter {
                name: "label_domain",
                value: format!("{}..={}", min, max),
                reason: "min must not exceed max".into(),
            });
        }
        Ok(Self {
            min: Label(min),
            max: Label(max),
        })
    }

    /// Domain accepting every `u8` code
    pub fn any() -> Self {
        Self {
            min: Label(u8::MIN),
            max: Label(u8::MAX),
        }
    }

    pub fn contains(&self, label: Label) -> bool {
        (self.min.0..=self.max.0).contains(&label.0)
    }

    /// Fail with [`Error::LabelOutOfDomain`] if `label` is not admissible
    pub fn check(&self, label: Label, year: Year) -> Result<()> {
        if self.contains(label) {
            Ok(())
        } else {
            Err(Error::LabelOutOfDomain {
                label: i64::from(label.0),
                year,
                min: self.min,
                max: self.max,
            })
        }
    }
}

/// Legend range of the wetland classification collections (codes 0 to 34).
impl Default for LabelDomain {
    fn default() -> Self {
        Self {
            min: Label(0),
            max: Label(34),
        }
    }
}
