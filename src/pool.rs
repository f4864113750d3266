//! Thread pool driver (C3, §4.6): a static, chunk-size-1 parallel loop over
//! a bounded worker count, built on `rayon`. Both exchange strategies drive
//! their per-index transport calls through this driver so a single place
//! owns "how many threads, what chunking" and the aggregate-error policy
//! (§7): the first iteration error wins, but `rayon` still drains the whole
//! range rather than cooperatively cancelling the rest.

use rayon::prelude::*;

use crate::Error;

/// A `rayon` thread pool scoped to the thread count `Transport::enable_mpi_cores`
/// reports (§5).
pub struct ThreadPoolDriver {
    pool: rayon::ThreadPool,
}

impl ThreadPoolDriver {
    pub fn new(threads: usize) -> Result<Self, Error> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .build()
            .map_err(|e| Error::Threading(e.to_string()))?;
        Ok(Self { pool })
    }

    /// Runs `f(i)` for every `i` in `[0, n)`, chunk size 1, across the pool.
    /// Returns the first `Err` any iteration produced, if any.
    pub fn for_each_static<F>(&self, n: usize, f: F) -> Result<(), Error>
    where
        F: Fn(usize) -> Result<(), Error> + Sync + Send,
    {
        self.pool.install(|| {
            (0..n)
                .into_par_iter()
                .with_min_len(1)
                .with_max_len(1)
                .map(f)
                .filter_map(Result::err)
                .find_any(|_| true)
        })
        .map_or(Ok(()), Err)
    }
}
