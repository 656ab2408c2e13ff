//! Window rules: pattern matching over a short run of years
//!
//! A window of length `W` anchored at year `y` inspects `y-1 ..= y+W-2`:
//! one look-back year, the anchor, and `W-2` look-ahead years. A match
//! yields a [`Replacement`] naming the contiguous years to rewrite; nothing
//! outside those years is ever touched.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

use landseq_core::raster::{Label, PixelSequence, Year, YearRange};
use landseq_core::{Error, Result};

/// Contiguous years rewritten to a single label by a matched rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Replacement {
    /// First year rewritten
    pub start: Year,
    /// Number of consecutive years rewritten
    pub len: usize,
    /// New label for those years
    pub label: Label,
}

impl Replacement {
    pub fn new(start: Year, len: usize, label: Label) -> Self {
        Self { start, len, label }
    }

    /// Years this replacement writes
    pub fn years(&self) -> RangeInclusive<Year> {
        self.start..=self.start + self.len as Year - 1
    }

    /// Write the replacement into `sequence`.
    ///
    /// Returns whether any label actually changed.
    pub fn apply(&self, sequence: &mut PixelSequence) -> Result<bool> {
        let mut changed = false;
        for year in self.years() {
            if sequence.get(year)? != self.label {
                sequence.set(year, self.label)?;
                changed = true;
            }
        }
        Ok(changed)
    }
}

/// One entry of a rule catalogue.
///
/// Serialized with a `kind` tag, e.g.
/// `{"kind": "fixed-pattern-4", "pattern": [3, 12, 12, 15], "replacement": 15}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Rule {
    /// First year differs from `class`, the next two equal it: repair the first year
    #[serde(rename = "first-edge")]
    FirstEdge { class: Label },
    /// Second-to-last and third-to-last years equal `class`, last year differs:
    /// rewrite the second-to-last year. The last year itself is left alone.
    #[serde(rename = "last-edge")]
    LastEdge { class: Label },
    /// `[y-1, y, y+1] == pattern`: rewrite `y`
    #[serde(rename = "fixed-pattern-3")]
    FixedPattern3 { pattern: [Label; 3], replacement: Label },
    /// `[y-1, y, y+1, y+2] == pattern`: rewrite `y` and `y+1`
    #[serde(rename = "fixed-pattern-4")]
    FixedPattern4 { pattern: [Label; 4], replacement: Label },
    /// Three-year dip bracketed by `class`
    #[serde(rename = "sliding-class-5")]
    SlidingClass5 { class: Label },
    /// Two-year dip bracketed by `class`
    #[serde(rename = "sliding-class-4")]
    SlidingClass4 { class: Label },
    /// One-year dip bracketed by `class`
    #[serde(rename = "sliding-class-3")]
    SlidingClass3 { class: Label },
}

impl Rule {
    /// Short kind name, matching the serialized tag
    pub fn kind(&self) -> &'static str {
        match self {
            Rule::FirstEdge { .. } => "first-edge",
            Rule::LastEdge { .. } => "last-edge",
            Rule::FixedPattern3 { .. } => "fixed-pattern-3",
            Rule::FixedPattern4 { .. } => "fixed-pattern-4",
            Rule::SlidingClass5 { .. } => "sliding-class-5",
            Rule::SlidingClass4 { .. } => "sliding-class-4",
            Rule::SlidingClass3 { .. } => "sliding-class-3",
        }
    }

    /// Number of consecutive years the rule inspects
    pub fn window_len(&self) -> usize {
        match self {
            Rule::FirstEdge { .. } | Rule::LastEdge { .. } => 3,
            Rule::FixedPattern3 { .. } | Rule::SlidingClass3 { .. } => 3,
            Rule::FixedPattern4 { .. } | Rule::SlidingClass4 { .. } => 4,
            Rule::SlidingClass5 { .. } => 5,
        }
    }

    /// Every label the rule matches against or writes
    pub fn labels(&self) -> Vec<Label> {
        match *self {
            Rule::FirstEdge { class }
            | Rule::LastEdge { class }
            | Rule::SlidingClass5 { class }
            | Rule::SlidingClass4 { class }
            | Rule::SlidingClass3 { class } => vec![class],
            Rule::FixedPattern3 { pattern, replacement } => {
                let mut labels = pattern.to_vec();
                labels.push(replacement);
                labels
            }
            Rule::FixedPattern4 { pattern, replacement } => {
                let mut labels = pattern.to_vec();
                labels.push(replacement);
                labels
            }
        }
    }

    /// Anchor years visited by a sweep over `years`, ascending.
    ///
    /// Edge rules have a single anchor: the first year for [`Rule::FirstEdge`],
    /// the second-to-last for [`Rule::LastEdge`]. Sliding and fixed-pattern
    /// rules run from the second year up to the last anchor whose window still
    /// fits. `None` when the range is too short for the window.
    pub fn anchors(&self, years: YearRange) -> Option<RangeInclusive<Year>> {
        let window = self.window_len();
        if years.len() < window {
            return None;
        }
        let (first, last) = (years.first(), years.last());
        Some(match self {
            Rule::FirstEdge { .. } => first..=first,
            Rule::LastEdge { .. } => (last - 1)..=(last - 1),
            _ => (first + 1)..=(last - (window as Year - 2)),
        })
    }

    /// Test the rule at `anchor` without modifying anything.
    ///
    /// Fails with [`Error::YearOutOfRange`] if the window reaches outside the
    /// sequence; [`Rule::anchors`] only yields anchors where it does not.
    pub fn evaluate(&self, sequence: &PixelSequence, anchor: Year) -> Result<Option<Replacement>> {
        let at = |offset: Year| sequence.get(anchor + offset);

        let replacement = match *self {
            Rule::FirstEdge { class } => {
                let hit = at(0)? != class && at(1)? == class && at(2)? == class;
                hit.then(|| Replacement::new(anchor, 1, class))
            }
            Rule::LastEdge { class } => {
                let hit = at(-1)? == class && at(0)? == class && at(1)? != class;
                hit.then(|| Replacement::new(anchor, 1, class))
            }
            Rule::FixedPattern3 { pattern, replacement } => {
                matches_pattern(sequence, anchor, &pattern)?
                    .then(|| Replacement::new(anchor, 1, replacement))
            }
            Rule::FixedPattern4 { pattern, replacement } => {
                matches_pattern(sequence, anchor, &pattern)?
                    .then(|| Replacement::new(anchor, 2, replacement))
            }
            Rule::SlidingClass5 { class } => dip(sequence, anchor, 3, class)?,
            Rule::SlidingClass4 { class } => dip(sequence, anchor, 2, class)?,
            Rule::SlidingClass3 { class } => dip(sequence, anchor, 1, class)?,
        };
        Ok(replacement)
    }

    /// Apply the rule at every anchor in ascending order.
    ///
    /// Each application sees the sequence as left by the previous one.
    /// Returns how many applications changed at least one label.
    pub fn sweep(&self, sequence: &mut PixelSequence) -> Result<usize> {
        let years = sequence.years();
        let anchors = self.anchors(years).ok_or_else(|| {
            Error::InvalidCatalogue(format!("{} has no valid anchor year in {}", self, years))
        })?;

        let mut changed = 0;
        for anchor in anchors {
            if let Some(replacement) = self.evaluate(sequence, anchor)? {
                if replacement.apply(sequence)? {
                    changed += 1;
                }
            }
        }
        Ok(changed)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::FirstEdge { class }
            | Rule::LastEdge { class }
            | Rule::SlidingClass5 { class }
            | Rule::SlidingClass4 { class }
            | Rule::SlidingClass3 { class } => write!(f, "{}({})", self.kind(), class),
            Rule::FixedPattern3 { pattern, replacement } => {
                write!(f, "{}({}, {}, {} -> {})", self.kind(), pattern[0], pattern[1], pattern[2], replacement)
            }
            Rule::FixedPattern4 { pattern, replacement } => write!(
                f,
                "{}({}, {}, {}, {} -> {})",
                self.kind(),
                pattern[0],
                pattern[1],
                pattern[2],
                pattern[3],
                replacement
            ),
        }
    }
}

/// `pattern[i] == label[anchor - 1 + i]` for every position
fn matches_pattern(sequence: &PixelSequence, anchor: Year, pattern: &[Label]) -> Result<bool> {
    for (offset, &expected) in pattern.iter().enumerate() {
        if sequence.get(anchor - 1 + offset as Year)? != expected {
            return Ok(false);
        }
    }
    Ok(true)
}

/// `span` years starting at `anchor` all differ from `class`, and the years
/// right before and right after equal it
fn dip(sequence: &PixelSequence, anchor: Year, span: usize, class: Label) -> Result<Option<Replacement>> {
    if sequence.get(anchor - 1)? != class {
        return Ok(None);
    }
    for offset in 0..span as Year {
        if sequence.get(anchor + offset)? == class {
            return Ok(None);
        }
    }
    if sequence.get(anchor + span as Year)? != class {
        return Ok(None);
    }
    Ok(Some(Replacement::new(anchor, span, class)))
}
