//! # landseq Parallel
//!
//! Parallel processing strategies for label stacks.
//!
//! This crate provides:
//! - Tiled processing: the stack is cut into spatial tiles, every tile is
//!   processed independently and written back to a disjoint region
//! - Sequential, global-pool and dedicated-pool execution modes using Rayon
//!
//! Without the `parallel` feature every mode runs sequentially.

pub mod strategy;
pub mod tiled;

pub use strategy::{ParallelStrategy, ProcessingMode};
pub use tiled::{Tile, TileIterator, TiledProcessor};
