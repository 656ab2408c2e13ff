//! Tiled processing for large label stacks

use landseq_core::raster::{Label, LabelStack};
use landseq_core::{Error, Result};

use crate::strategy::{ParallelStrategy, ProcessingMode};

/// A tile representing a spatial subset of a stack (all years)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// Row offset in the source stack
    pub row_offset: usize,
    /// Column offset in the source stack
    pub col_offset: usize,
    /// Number of rows in this tile
    pub rows: usize,
    /// Number of columns in this tile
    pub cols: usize,
}

impl Tile {
    /// Create a new tile
    pub fn new(row_offset: usize, col_offset: usize, rows: usize, cols: usize) -> Self {
        Self {
            row_offset,
            col_offset,
            rows,
            cols,
        }
    }

    /// Number of pixel locations in the tile
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert tile-local coordinates to source stack coordinates
    pub fn to_source_coords(&self, local_row: usize, local_col: usize) -> (usize, usize) {
        (self.row_offset + local_row, self.col_offset + local_col)
    }
}

/// Iterator over non-overlapping tiles covering a grid.
///
/// Temporal filtering never reads neighboring pixels, so tiles need no halo.
pub struct TileIterator {
    total_rows: usize,
    total_cols: usize,
    tile_size: usize,
    current_row: usize,
    current_col: usize,
}

impl TileIterator {
    /// Create a new tile iterator; a `tile_size` of 0 is treated as 1
    pub fn new(total_rows: usize, total_cols: usize, tile_size: usize) -> Self {
        Self {
            total_rows,
            total_cols,
            tile_size: tile_size.max(1),
            current_row: 0,
            current_col: 0,
        }
    }
}

impl Iterator for TileIterator {
    type Item = Tile;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_row >= self.total_rows || self.total_cols == 0 {
            return None;
        }

        let rows = self.tile_size.min(self.total_rows - self.current_row);
        let cols = self.tile_size.min(self.total_cols - self.current_col);
        let tile = Tile::new(self.current_row, self.current_col, rows, cols);

        // Move to next tile
        self.current_col += self.tile_size;
        if self.current_col >= self.total_cols {
            self.current_col = 0;
            self.current_row += self.tile_size;
        }

        Some(tile)
    }
}

/// Processor for tiled per-pixel operations on label stacks
#[derive(Debug, Clone)]
pub struct TiledProcessor {
    tile_size: usize,
    mode: ProcessingMode,
}

impl TiledProcessor {
    /// Create a new tiled processor
    pub fn new(tile_size: usize, mode: ProcessingMode) -> Result<Self> {
        if tile_size == 0 {
            return Err(Error::InvalidParameter {
                name: "tile_size",
                value: "0".into(),
                reason: "tiles must hold at least one pixel".into(),
            });
        }
        mode.validate()?;
        Ok(Self { tile_size, mode })
    }

    /// Rewrite every pixel's year sequence of `input` with `f`.
    ///
    /// `f` receives the source (row, col), a mutable copy of the pixel's
    /// labels and the accumulator of the tile the pixel belongs to. Tiles run
    /// concurrently according to the processing mode; each tile owns its
    /// output block and accumulator, and blocks are merged into disjoint
    /// regions of the output. Any error fails the whole call.
    ///
    /// Returns the rewritten stack and one accumulator per tile.
    pub fn process<S, F>(&self, input: &LabelStack, f: F) -> Result<(LabelStack, Vec<S>)>
    where
        S: Default + Send,
        F: Fn(usize, usize, &mut [Label], &mut S) -> Result<()> + Sync + Send,
    {
        let (rows, cols) = input.shape();
        let years = input.years().len();
        let tiles: Vec<Tile> = TileIterator::new(rows, cols, self.tile_size).collect();

        let results = self.mode.try_map(tiles, |tile| {
            let mut block = input.block(tile.row_offset, tile.col_offset, tile.rows, tile.cols)?;
            let mut acc = S::default();

            let data = block
                .as_slice_mut()
                .ok_or_else(|| Error::Other("tile block is not contiguous".into()))?;
            for (i, lane) in data.chunks_exact_mut(years).enumerate() {
                let (row, col) = tile.to_source_coords(i / tile.cols, i % tile.cols);
                f(row, col, lane, &mut acc)?;
            }

            Ok((tile, block, acc))
        })?;

        // Merge results into output
        let mut output = input.like(Label::default());
        let mut accumulators = Vec::with_capacity(results.len());
        for (tile, block, acc) in results {
            output.set_block(tile.row_offset, tile.col_offset, &block)?;
            accumulators.push(acc);
        }

        Ok((output, accumulators))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use landseq_core::YearRange;

    #[test]
    fn test_tile_iterator() {
        let tiles: Vec<_> = TileIterator::new(100, 100, 32).collect();
        assert_eq!(tiles.len(), 16);

        // First tile should start at (0, 0)
        assert_eq!(tiles[0], Tile::new(0, 0, 32, 32));
        // Last tile is clipped to the grid
        assert_eq!(tiles[15], Tile::new(96, 96, 4, 4));
    }

    #[test]
    fn test_tile_coverage() {
        let rows = 70;
        let cols = 45;
        let mut covered = vec![vec![0u8; cols]; rows];

        for tile in TileIterator::new(rows, cols, 16) {
            for r in tile.row_offset..tile.row_offset + tile.rows {
                for c in tile.col_offset..tile.col_offset + tile.cols {
                    covered[r][c] += 1;
                }
            }
        }

        // Every cell covered exactly once
        for r in 0..rows {
            for c in 0..cols {
                assert_eq!(covered[r][c], 1, "Cell ({}, {}) covered {} times", r, c, covered[r][c]);
            }
        }
    }

    #[test]
    fn test_empty_grid() {
        assert_eq!(TileIterator::new(0, 10, 4).count(), 0);
        assert_eq!(TileIterator::new(10, 0, 4).count(), 0);
    }

    #[test]
    fn test_process_writes_every_pixel() {
        let years = YearRange::new(2000, 2002).unwrap();
        let input = LabelStack::filled(9, 7, years, Label(3));
        let processor = TiledProcessor::new(4, ProcessingMode::Parallel).unwrap();

        let (output, counts) = processor
            .process(&input, |row, col, lane, count: &mut usize| {
                lane[1] = Label(((row * 7 + col) % 30) as u8);
                *count += 1;
                Ok(())
            })
            .unwrap();

        assert_eq!(counts.iter().sum::<usize>(), 63);
        for row in 0..9 {
            for col in 0..7 {
                assert_eq!(output.get(row, col, 2000).unwrap(), Label(3));
                assert_eq!(output.get(row, col, 2001).unwrap(), Label(((row * 7 + col) % 30) as u8));
            }
        }
    }

    #[test]
    fn test_process_fails_whole_pass() {
        let years = YearRange::new(2000, 2002).unwrap();
        let input = LabelStack::filled(8, 8, years, Label(3));
        let processor = TiledProcessor::new(3, ProcessingMode::Sequential).unwrap();

        let result = processor.process(&input, |row, col, _lane, _acc: &mut ()| {
            if (row, col) == (5, 6) {
                Err(Error::Other("bad pixel".into()))
            } else {
                Ok(())
            }
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(TiledProcessor::new(0, ProcessingMode::Parallel).is_err());
        assert!(TiledProcessor::new(64, ProcessingMode::ParallelWith(0)).is_err());
    }
}
