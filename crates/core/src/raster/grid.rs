//! Main label stack type

use ndarray::{s, Array2, Array3, ArrayView1, ArrayView2, Axis};
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::raster::{Label, LabelDomain, PixelSequence, Year, YearRange};

/// A classification time series over a 2D grid.
///
/// `LabelStack` stores one [`Label`] per (row, col, year). Data is laid out
/// with the year axis innermost, so each pixel's sequence is contiguous in
/// memory and can be filtered without gathering strided values.
///
/// # Example
///
/// ```ignore
/// use landseq_core::{Label, LabelStack, YearRange};
///
/// // 100x100 pixels over 1985..=2020, all class 3
/// let mut stack = LabelStack::filled(100, 100, YearRange::default(), Label(3));
///
/// let mut seq = stack.sequence(10, 20)?;
/// seq.set(2000, Label(12))?;
/// stack.set_sequence(10, 20, &seq)?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LabelStack {
    /// Labels indexed by (row, col, year offset)
    data: Array3<Label>,
    /// Years covered by the third axis
    years: YearRange,
}

impl LabelStack {
    /// Create a stack with every cell set to `label`
    pub fn filled(rows: usize, cols: usize, years: YearRange, label: Label) -> Self {
        Self {
            data: Array3::from_elem((rows, cols, years.len()), label),
            years,
        }
    }

    /// Create a stack from pixel-interleaved data: for each row, for each
    /// column, one label per year.
    pub fn from_vec(data: Vec<Label>, rows: usize, cols: usize, years: YearRange) -> Result<Self> {
        if data.len() != rows * cols * years.len() {
            return Err(Error::InvalidDimensions {
                rows,
                cols,
                years: years.len(),
            });
        }
        let data = Array3::from_shape_vec((rows, cols, years.len()), data)
            .map_err(|e| Error::Other(e.to_string()))?;
        Ok(Self { data, years })
    }

    /// Create a stack from one 2D layer per year, in year order
    pub fn from_layers(layers: &[Array2<Label>], years: YearRange) -> Result<Self> {
        if layers.len() != years.len() {
            return Err(Error::MissingYear {
                year: years.first() + layers.len().min(years.len()) as Year,
            });
        }
        let (rows, cols) = layers.first().map(|l| l.dim()).unwrap_or((0, 0));
        let mut data = Array3::from_elem((rows, cols, years.len()), Label::default());
        for (idx, layer) in layers.iter().enumerate() {
            if layer.dim() != (rows, cols) {
                return Err(Error::SizeMismatch {
                    er: rows,
                    ec: cols,
                    ar: layer.nrows(),
                    ac: layer.ncols(),
                });
            }
            data.index_axis_mut(Axis(2), idx).assign(layer);
        }
        Ok(Self { data, years })
    }

    /// Create a stack with the same shape and years, filled with `label`
    pub fn like(&self, label: Label) -> Self {
        Self {
            data: Array3::from_elem(self.data.dim(), label),
            years: self.years,
        }
    }

    // Dimensions

    pub fn rows(&self) -> usize {
        self.data.dim().0
    }

    pub fn cols(&self) -> usize {
        self.data.dim().1
    }

    /// Spatial dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows(), self.cols())
    }

    /// Years covered by the stack
    pub fn years(&self) -> YearRange {
        self.years
    }

    /// Number of pixel locations
    pub fn len(&self) -> usize {
        self.rows() * self.cols()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Data access

    fn check_bounds(&self, row: usize, col: usize) -> Result<()> {
        if row >= self.rows() || col >= self.cols() {
            return Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        Ok(())
    }

    /// Label at (row, col, year)
    pub fn get(&self, row: usize, col: usize, year: Year) -> Result<Label> {
        self.check_bounds(row, col)?;
        let idx = self.years.index_of(year)?;
        Ok(self.data[(row, col, idx)])
    }

    /// Set the label at (row, col, year)
    pub fn set(&mut self, row: usize, col: usize, year: Year, label: Label) -> Result<()> {
        self.check_bounds(row, col)?;
        let idx = self.years.index_of(year)?;
        self.data[(row, col, idx)] = label;
        Ok(())
    }

    /// Year-ordered labels of one pixel, borrowed
    pub fn lane(&self, row: usize, col: usize) -> Result<ArrayView1<'_, Label>> {
        self.check_bounds(row, col)?;
        Ok(self.data.slice(s![row, col, ..]))
    }

    /// Copy out the sequence of one pixel
    pub fn sequence(&self, row: usize, col: usize) -> Result<PixelSequence> {
        let lane = self.lane(row, col)?;
        PixelSequence::new(self.years, lane.to_vec())
    }

    /// Replace the sequence of one pixel
    pub fn set_sequence(&mut self, row: usize, col: usize, sequence: &PixelSequence) -> Result<()> {
        self.check_bounds(row, col)?;
        if sequence.years() != self.years {
            return Err(Error::Other(format!(
                "sequence covers {}, stack covers {}",
                sequence.years(),
                self.years
            )));
        }
        self.data
            .slice_mut(s![row, col, ..])
            .iter_mut()
            .zip(sequence.labels())
            .for_each(|(dst, &src)| *dst = src);
        Ok(())
    }

    /// 2D layer for one year
    pub fn layer(&self, year: Year) -> Result<ArrayView2<'_, Label>> {
        let idx = self.years.index_of(year)?;
        Ok(self.data.index_axis(Axis(2), idx))
    }

    /// Copy out a spatial block covering every year.
    ///
    /// The block is always in standard (row, col, year) layout, so its
    /// backing slice holds whole pixel sequences back to back.
    pub fn block(&self, row_offset: usize, col_offset: usize, rows: usize, cols: usize) -> Result<Array3<Label>> {
        self.check_block(row_offset, col_offset, rows, cols)?;
        let view = self
            .data
            .slice(s![row_offset..row_offset + rows, col_offset..col_offset + cols, ..]);
        Array3::from_shape_vec(view.dim(), view.iter().copied().collect())
            .map_err(|e| Error::Other(e.to_string()))
    }

    /// Write a spatial block covering every year
    pub fn set_block(&mut self, row_offset: usize, col_offset: usize, block: &Array3<Label>) -> Result<()> {
        let (rows, cols, years) = block.dim();
        if years != self.years.len() {
            return Err(Error::InvalidDimensions { rows, cols, years });
        }
        self.check_block(row_offset, col_offset, rows, cols)?;
        self.data
            .slice_mut(s![row_offset..row_offset + rows, col_offset..col_offset + cols, ..])
            .assign(block);
        Ok(())
    }

    fn check_block(&self, row_offset: usize, col_offset: usize, rows: usize, cols: usize) -> Result<()> {
        if row_offset + rows > self.rows() || col_offset + cols > self.cols() {
            return Err(Error::SizeMismatch {
                er: self.rows(),
                ec: self.cols(),
                ar: row_offset + rows,
                ac: col_offset + cols,
            });
        }
        Ok(())
    }

    /// Reference to the underlying array
    pub fn data(&self) -> &Array3<Label> {
        &self.data
    }

    /// Sub-stack restricted to `years`.
    ///
    /// Fails with [`Error::MissingYear`] when the stack does not cover every
    /// requested year.
    pub fn slice_years(&self, years: YearRange) -> Result<LabelStack> {
        if !self.years.covers(&years) {
            let missing = years
                .iter()
                .find(|y| !self.years.contains(*y))
                .unwrap_or(years.first());
            return Err(Error::MissingYear { year: missing });
        }
        let start = self.years.index_of(years.first())?;
        let data = self
            .data
            .slice(s![.., .., start..start + years.len()])
            .to_owned();
        Ok(Self { data, years })
    }

    // Validation

    /// Check every label against `domain`, reporting the first offending pixel
    pub fn validate(&self, domain: &LabelDomain) -> Result<()> {
        for ((row, col, idx), &label) in self.data.indexed_iter() {
            if !domain.contains(label) {
                let year = self.years.first() + idx as Year;
                domain.check(label, year).map_err(|e| e.at_pixel(row, col))?;
            }
        }
        Ok(())
    }

    // Statistics

    /// Pixel count per label in the layer for `year`
    pub fn class_counts(&self, year: Year) -> Result<BTreeMap<Label, usize>> {
        let mut counts = BTreeMap::new();
        for &label in self.layer(year)?.iter() {
            *counts.entry(label).or_insert(0) += 1;
        }
        Ok(counts)
    }
}
