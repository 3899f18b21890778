//! Data-parallel map over the batch dimension.
//!
//! Batch members are independent, so the builder and the solver express their
//! per-member work as a map from index to result. With the `rayon` feature the
//! map runs on the global Rayon pool; otherwise it runs sequentially. Either
//! way results come back ordered by index.

/// Configure the global Rayon pool. `None` uses one thread per logical CPU.
///
/// Returns the number of threads the global pool runs with. Calling this after
/// the pool has been initialised leaves the existing pool in place.
#[cfg(feature = "rayon")]
pub fn init_thread_pool(num_threads: Option<usize>) -> usize {
    let threads = num_threads.unwrap_or_else(num_cpus::get).max(1);
    if rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .is_err()
    {
        log::debug!("global rayon pool already initialised");
    }
    rayon::current_num_threads()
}

/// Without Rayon every batch runs on the calling thread.
#[cfg(not(feature = "rayon"))]
pub fn init_thread_pool(_num_threads: Option<usize>) -> usize {
    1
}

/// Apply `f` to every index in `0..n`, collecting results in index order.
pub fn map_batch<R, F>(n: usize, f: F) -> Vec<R>
where
    R: Send,
    F: Fn(usize) -> R + Send + Sync,
{
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        (0..n).into_par_iter().map(f).collect()
    }
    #[cfg(not(feature = "rayon"))]
    {
        (0..n).map(f).collect()
    }
}

/// Fallible [`map_batch`]: the first error (by index) aborts the whole map.
///
/// Under Rayon, members after a known failure are skipped rather than run, so
/// work already in flight on other threads is the only work done past it.
pub fn try_map_batch<R, E, F>(n: usize, f: F) -> Result<Vec<R>, E>
where
    R: Send,
    E: Send,
    F: Fn(usize) -> Result<R, E> + Send + Sync,
{
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let first_failure = AtomicUsize::new(usize::MAX);
        let results: Vec<Option<Result<R, E>>> = (0..n)
            .into_par_iter()
            .map(|k| {
                if k > first_failure.load(Ordering::Acquire) {
                    return None;
                }
                let r = f(k);
                if r.is_err() {
                    first_failure.fetch_min(k, Ordering::AcqRel);
                }
                Some(r)
            })
            .collect();
        // every skipped member sits after a recorded error, so the first Err is reached first
        results.into_iter().flatten().collect()
    }
    #[cfg(not(feature = "rayon"))]
    {
        (0..n).map(f).collect()
    }
}
