//! Per-pixel label time series

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::raster::{Label, LabelDomain, Year, YearRange};

/// One location's complete, year-ordered series of labels.
///
/// Holds exactly one label per year of its [`YearRange`]; there is no way to
/// build a sequence with gaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelSequence {
    years: YearRange,
    labels: Vec<Label>,
}

impl PixelSequence {
    /// Create a sequence from one label per year, in year order
    pub fn new(years: YearRange, labels: Vec<Label>) -> Result<Self> {
        if labels.len() < years.len() {
            return Err(Error::MissingYear {
                year: years.first() + labels.len() as Year,
            });
        }
        if labels.len() > years.len() {
            return Err(Error::YearOutOfRange {
                year: years.first() + labels.len() as Year - 1,
                first: years.first(),
                last: years.last(),
            });
        }
        Ok(Self { years, labels })
    }

    /// Create a sequence from raw class codes, in year order
    pub fn from_codes(years: YearRange, codes: &[u8]) -> Result<Self> {
        Self::new(years, codes.iter().copied().map(Label).collect())
    }

    /// Create a sequence with every year set to `label`
    pub fn filled(years: YearRange, label: Label) -> Self {
        Self {
            years,
            labels: vec![label; years.len()],
        }
    }

    /// Create a sequence from a year → label map.
    ///
    /// Every year of `years` must be present and no other year may appear.
    pub fn from_map(years: YearRange, map: &BTreeMap<Year, Label>) -> Result<Self> {
        if let Some(&stray) = map.keys().find(|y| !years.contains(**y)) {
            return Err(Error::YearOutOfRange {
                year: stray,
                first: years.first(),
                last: years.last(),
            });
        }
        let labels = years
            .iter()
            .map(|year| map.get(&year).copied().ok_or(Error::MissingYear { year }))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { years, labels })
    }

    pub fn years(&self) -> YearRange {
        self.years
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label at `year`
    pub fn get(&self, year: Year) -> Result<Label> {
        let idx = self.years.index_of(year)?;
        Ok(self.labels[idx])
    }

    /// Overwrite the label at `year`
    pub fn set(&mut self, year: Year, label: Label) -> Result<()> {
        let idx = self.years.index_of(year)?;
        self.labels[idx] = label;
        Ok(())
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Iterate `(year, label)` pairs in year order
    pub fn iter(&self) -> impl Iterator<Item = (Year, Label)> + '_ {
        self.years.iter().zip(self.labels.iter().copied())
    }

    /// Check every label against `domain`
    pub fn validate(&self, domain: &LabelDomain) -> Result<()> {
        self.iter().try_for_each(|(year, label)| domain.check(label, year))
    }

    /// Years whose label differs from `other`
    pub fn diff(&self, other: &PixelSequence) -> Result<Vec<Year>> {
        if self.years != other.years {
            return Err(Error::Other(format!(
                "cannot compare sequences over {} and {}",
                self.years, other.years
            )));
        }
        Ok(self
            .iter()
            .zip(other.labels.iter())
            .filter(|((_, a), b)| a != *b)
            .map(|((year, _), _)| year)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_range() -> YearRange {
        YearRange::new(2000, 2004).unwrap()
    }

    #[test]
    fn test_get_and_set() {
        let mut seq = PixelSequence::from_codes(short_range(), &[3, 3, 12, 3, 3]).unwrap();
        assert_eq!(seq.get(2002).unwrap(), Label(12));
        seq.set(2002, Label(3)).unwrap();
        assert_eq!(seq.get(2002).unwrap(), Label(3));
    }

    #[test]
    fn test_out_of_range_access() {
        let seq = PixelSequence::filled(short_range(), Label(4));
        assert!(matches!(
            seq.get(1999),
            Err(Error::YearOutOfRange { year: 1999, .. })
        ));
        assert!(seq.get(2005).is_err());
    }

    #[test]
    fn test_from_map_missing_year() {
        let mut map: BTreeMap<Year, Label> = short_range().iter().map(|y| (y, Label(11))).collect();
        map.remove(&2003);
        let err = PixelSequence::from_map(short_range(), &map).unwrap_err();
        assert!(matches!(err, Error::MissingYear { year: 2003 }));
    }

    #[test]
    fn test_from_map_stray_year() {
        let mut map: BTreeMap<Year, Label> = short_range().iter().map(|y| (y, Label(11))).collect();
        map.insert(2010, Label(11));
        assert!(PixelSequence::from_map(short_range(), &map).is_err());
    }

    #[test]
    fn test_wrong_length() {
        assert!(PixelSequence::from_codes(short_range(), &[1, 2, 3]).is_err());
    }

    #[test]
    fn test_validate_and_diff() {
        let a = PixelSequence::from_codes(short_range(), &[3, 3, 12, 3, 3]).unwrap();
        let b = PixelSequence::from_codes(short_range(), &[3, 3, 3, 3, 40]).unwrap();
        assert!(a.validate(&LabelDomain::default()).is_ok());
        assert!(matches!(
            b.validate(&LabelDomain::default()),
            Err(Error::LabelOutOfDomain { label: 40, year: 2004, .. })
        ));
        assert_eq!(a.diff(&b).unwrap(), vec![2002, 2004]);
    }
}
