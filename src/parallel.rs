use std::ops::Range;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::error::{GradeBookError, Result};

/// Fixed-size pool that splits an index range into one contiguous chunk per
/// worker and sums each chunk into its own slot.
#[derive(Debug)]
pub struct WorkerPool {
    num_workers: usize,
    pool: ThreadPool,
}

impl WorkerPool {
    pub fn new(num_workers: usize) -> Result<Self> {
        if num_workers == 0 {
            return Err(GradeBookError::InvalidWorkerCount);
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(num_workers)
            .thread_name(|i| format!("gradebook-worker-{i}"))
            .build()?;

        Ok(Self { num_workers, pool })
    }

    pub fn default_workers() -> usize {
        num_cpus::get()
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Every chunk but the last has `len / num_workers` indices; the last one
    /// runs to `len` and takes the whole remainder.
    pub fn chunk_bounds(&self, len: usize) -> Vec<Range<usize>> {
        let chunk_size = len / self.num_workers;

        (0..self.num_workers)
            .map(|worker| {
                let start = worker * chunk_size;
                let end = if worker == self.num_workers - 1 {
                    len
                } else {
                    start + chunk_size
                };
                start..end
            })
            .collect()
    }

    /// Runs `f` over every chunk on the pool and blocks until all of them
    /// finish. Slot `i` holds the partial sum of chunk `i`.
    pub fn sum_chunks<F>(&self, len: usize, f: F) -> Vec<i64>
    where
        F: Fn(Range<usize>) -> i64 + Sync,
    {
        let bounds = self.chunk_bounds(len);

        self.pool.install(|| {
            bounds
                .into_par_iter()
                .enumerate()
                .map(|(worker, range)| {
                    let (start, end) = (range.start, range.end);
                    let partial = f(range);
                    debug!(worker, start, end, partial, "chunk summed");
                    partial
                })
                .collect()
        })
    }
}
