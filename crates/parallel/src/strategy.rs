//! Parallel processing strategies

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use landseq_core::{Error, Result};

/// Processing mode for algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessingMode {
    /// Single-threaded processing
    Sequential,
    /// Parallel processing using all available cores
    #[default]
    Parallel,
    /// Parallel with specified number of threads
    ParallelWith(usize),
}

impl ProcessingMode {
    /// Reject modes that cannot run (a dedicated pool of zero threads)
    pub fn validate(&self) -> Result<()> {
        if let ProcessingMode::ParallelWith(0) = self {
            return Err(Error::InvalidParameter {
                name: "threads",
                value: "0".into(),
                reason: "thread count must be at least 1".into(),
            });
        }
        Ok(())
    }
}

/// Strategy for executing independent work items
pub trait ParallelStrategy {
    /// Map a fallible function over `items`, preserving order.
    ///
    /// The first error aborts the whole map; no partial result is returned.
    fn try_map<I, T, F>(&self, items: Vec<I>, f: F) -> Result<Vec<T>>
    where
        I: Send,
        T: Send,
        F: Fn(I) -> Result<T> + Sync + Send;
}

impl ParallelStrategy for ProcessingMode {
    #[cfg(feature = "parallel")]
    fn try_map<I, T, F>(&self, items: Vec<I>, f: F) -> Result<Vec<T>>
    where
        I: Send,
        T: Send,
        F: Fn(I) -> Result<T> + Sync + Send,
    {
        self.validate()?;
        match self {
            ProcessingMode::Sequential => items.into_iter().map(f).collect(),
            ProcessingMode::Parallel => items.into_par_iter().map(f).collect(),
            ProcessingMode::ParallelWith(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(*threads)
                    .build()
                    .map_err(|e| Error::Other(format!("Failed to build thread pool: {}", e)))?;
                pool.install(|| items.into_par_iter().map(f).collect())
            }
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn try_map<I, T, F>(&self, items: Vec<I>, f: F) -> Result<Vec<T>>
    where
        I: Send,
        T: Send,
        F: Fn(I) -> Result<T> + Sync + Send,
    {
        self.validate()?;
        items.into_iter().map(f).collect()
    }
}
