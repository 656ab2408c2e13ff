//! Temporal filter: applies a rule catalogue to every pixel of a stack
//!
//! Within one pixel, rules run strictly in catalogue order over a working
//! copy of the sequence. Across pixels there is no shared state, so the
//! stack is processed tile by tile in parallel.

use std::time::Instant;
use tracing::{debug, info};

use landseq_core::raster::{Label, LabelDomain, LabelStack, PixelSequence, Year, YearRange};
use landseq_core::{Algorithm, Error, Result};
use landseq_parallel::{ProcessingMode, TiledProcessor};

use super::catalogue::Catalogue;

/// Parameters for temporal filtering
#[derive(Debug, Clone)]
pub struct FilterParams {
    /// Rules to apply, in order
    pub catalogue: Catalogue,
    /// Admissible input labels
    pub domain: LabelDomain,
    /// Edge length of the square tiles processed concurrently (default: 256)
    pub tile_size: usize,
    /// Execution mode across tiles
    pub mode: ProcessingMode,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            catalogue: Catalogue::wetlands(),
            domain: LabelDomain::default(),
            tile_size: 256,
            mode: ProcessingMode::Parallel,
        }
    }
}

/// Summary of what a filter pass changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterReport {
    /// Pixel locations processed
    pub pixels: usize,
    /// Pixel locations with at least one rewritten year
    pub changed_pixels: usize,
    /// Rewritten (pixel, year) cells
    pub changed_cells: usize,
    /// Rewritten cells per year, in year order
    pub changes_per_year: Vec<(Year, usize)>,
}

impl FilterReport {
    fn empty(years: YearRange) -> Self {
        Self {
            changes_per_year: years.iter().map(|y| (y, 0)).collect(),
            ..Self::default()
        }
    }

    fn record(&mut self, years: YearRange, before: &[Label], after: &[Label]) {
        if self.changes_per_year.is_empty() {
            *self = Self::empty(years);
        }
        self.pixels += 1;
        let mut any = false;
        for (idx, (b, a)) in before.iter().zip(after).enumerate() {
            if b != a {
                self.changes_per_year[idx].1 += 1;
                self.changed_cells += 1;
                any = true;
            }
        }
        if any {
            self.changed_pixels += 1;
        }
    }

    fn merge(&mut self, other: FilterReport) {
        if other.changes_per_year.is_empty() {
            return;
        }
        if self.changes_per_year.is_empty() {
            *self = other;
            return;
        }
        self.pixels += other.pixels;
        self.changed_pixels += other.changed_pixels;
        self.changed_cells += other.changed_cells;
        for (mine, theirs) in self.changes_per_year.iter_mut().zip(other.changes_per_year) {
            mine.1 += theirs.1;
        }
    }
}

/// Result of filtering a stack
#[derive(Debug, Clone)]
pub struct FilterOutput {
    pub stack: LabelStack,
    pub report: FilterReport,
}

/// Apply every rule of `catalogue` to `sequence`, in order.
///
/// Returns the number of rule applications that changed the sequence.
pub fn filter_sequence(sequence: &mut PixelSequence, catalogue: &Catalogue) -> Result<usize> {
    let mut changed = 0;
    for rule in catalogue.rules() {
        changed += rule.sweep(sequence)?;
    }
    Ok(changed)
}

/// Filtered copy of `sequence`, leaving the input untouched
pub fn filtered(sequence: &PixelSequence, catalogue: &Catalogue) -> Result<PixelSequence> {
    let mut working = sequence.clone();
    filter_sequence(&mut working, catalogue)?;
    Ok(working)
}

/// Filter every pixel of `stack`.
///
/// The catalogue is validated against the stack's years and the label
/// domain before any pixel is touched. A pixel carrying an out-of-domain
/// label fails the whole pass with an [`Error::AtPixel`]; no partially
/// filtered stack is ever returned.
pub fn filter_stack(stack: &LabelStack, params: &FilterParams) -> Result<FilterOutput> {
    let years = stack.years();
    params.catalogue.validate(years, &params.domain)?;
    let processor = TiledProcessor::new(params.tile_size, params.mode)?;

    debug!(
        "Filtering {} x {} pixels over {} with {} rules ({:?}, tiles of {})",
        stack.cols(),
        stack.rows(),
        years,
        params.catalogue.len(),
        params.mode,
        params.tile_size
    );
    let start = Instant::now();

    let (output, tile_reports) = processor.process(stack, |row, col, lane, report: &mut FilterReport| {
        let mut sequence = PixelSequence::new(years, lane.to_vec()).map_err(|e| e.at_pixel(row, col))?;
        sequence
            .validate(&params.domain)
            .map_err(|e| e.at_pixel(row, col))?;
        filter_sequence(&mut sequence, &params.catalogue).map_err(|e| e.at_pixel(row, col))?;

        report.record(years, lane, sequence.labels());
        lane.copy_from_slice(sequence.labels());
        Ok(())
    })?;

    let mut report = FilterReport::empty(years);
    for tile_report in tile_reports {
        report.merge(tile_report);
    }

    info!(
        "Filtered {} pixels in {:.2?}: {} pixels / {} cells changed",
        report.pixels,
        start.elapsed(),
        report.changed_pixels,
        report.changed_cells
    );
    Ok(FilterOutput {
        stack: output,
        report,
    })
}

/// Temporal consistency filter algorithm
#[derive(Debug, Clone, Default)]
pub struct TemporalFilter;

impl Algorithm for TemporalFilter {
    type Input = LabelStack;
    type Output = FilterOutput;
    type Params = FilterParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "TemporalFilter"
    }

    fn description(&self) -> &'static str {
        "Remove short-lived class excursions and enforce class transition rules in a land-cover time series"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        filter_stack(&input, &params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack_with(seq: &PixelSequence, rows: usize, cols: usize) -> LabelStack {
        let mut stack = LabelStack::filled(rows, cols, seq.years(), Label(3));
        for r in 0..rows {
            for c in 0..cols {
                stack.set_sequence(r, c, seq).unwrap();
            }
        }
        stack
    }

    #[test]
    fn test_filtered_leaves_input() {
        let mut seq = PixelSequence::filled(YearRange::default(), Label(12));
        seq.set(2000, Label(3)).unwrap();
        let out = filtered(&seq, &Catalogue::wetlands()).unwrap();
        assert_eq!(seq.get(2000).unwrap(), Label(3));
        assert_eq!(out.get(2000).unwrap(), Label(12));
    }

    #[test]
    fn test_report_counts() {
        let mut seq = PixelSequence::filled(YearRange::default(), Label(12));
        seq.set(2000, Label(3)).unwrap();
        seq.set(2010, Label(15)).unwrap();
        seq.set(2011, Label(15)).unwrap();
        let stack = stack_with(&seq, 5, 4);

        let params = FilterParams {
            tile_size: 2,
            ..FilterParams::default()
        };
        let out = filter_stack(&stack, &params).unwrap();
        assert_eq!(out.report.pixels, 20);
        assert_eq!(out.report.changed_pixels, 20);
        assert_eq!(out.report.changed_cells, 60);
        assert_eq!(out.report.changes_per_year.len(), 36);
        assert!(out.report.changes_per_year.contains(&(2000, 20)));
        assert!(out.report.changes_per_year.contains(&(2011, 20)));
        assert!(out.report.changes_per_year.contains(&(1999, 0)));
    }

    #[test]
    fn test_invalid_catalogue_fails_before_processing() {
        let stack = LabelStack::filled(2, 2, YearRange::new(2000, 2003).unwrap(), Label(3));
        let params = FilterParams::default();
        assert!(matches!(
            filter_stack(&stack, &params),
            Err(Error::InvalidCatalogue(_))
        ));
    }

    #[test]
    fn test_algorithm_trait() {
        let stack = LabelStack::filled(3, 3, YearRange::default(), Label(4));
        let out = TemporalFilter.execute_default(stack.clone()).unwrap();
        assert_eq!(out.stack, stack);
        assert_eq!(out.report.changed_cells, 0);
        assert_eq!(TemporalFilter.name(), "TemporalFilter");
    }
}
