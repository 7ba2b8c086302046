/// Concurrency management for callseq.
/// Translation units are analyzed in parallel, each with its own builder.

use anyhow::Result;
use tracing::info;

/// Worker count for `requested` threads; `0` means half the cores, minimum 1.
pub fn worker_count(requested: usize) -> usize {
    if requested > 0 {
        requested
    } else {
        std::cmp::max(1, num_cpus::get() / 2)
    }
}

/// Initialize the global rayon thread pool with a controlled worker count.
pub fn init_thread_pool(requested: usize) -> Result<()> {
    let workers = worker_count(requested);

    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build_global()?;

    info!(workers, cores = num_cpus::get(), "initialized thread pool");
    Ok(())
}
