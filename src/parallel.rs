//! Thread pool setup for the voxel-wise aggregation
//!
//! The aggregator runs on Rayon's global pool. Its size is fixed once, from
//! `--threads`, before any volume is processed.

use crate::errors::{Result, VoxStackError};
use log::{debug, info};
use rayon::ThreadPoolBuilder;

/// Size of the global thread pool; `None` lets Rayon use every core
#[derive(Debug, Clone, Default)]
pub struct ParallelConfig {
    pub num_threads: Option<usize>,
}

impl ParallelConfig {
    pub fn new(num_threads: Option<usize>) -> Self {
        Self { num_threads }
    }

    /// Build the global Rayon pool and return the number of worker threads.
    ///
    /// # Errors
    ///
    /// Returns [`VoxStackError::ThreadPoolError`] if a thread count of zero is
    /// requested or the global pool was already built.
    pub fn setup_global_pool(&self) -> Result<usize> {
        match self.num_threads {
            Some(0) => {
                return Err(VoxStackError::ThreadPoolError(
                    "number of threads must be positive".to_string(),
                ))
            }
            Some(num_threads) => {
                ThreadPoolBuilder::new()
                    .num_threads(num_threads)
                    .build_global()
                    .map_err(|e| {
                        VoxStackError::ThreadPoolError(format!(
                            "Failed to initialize thread pool with {num_threads} threads: {e}"
                        ))
                    })?;
                info!("Aggregating with {num_threads} threads");
            }
            None => debug!("Using the default thread pool"),
        }
        Ok(rayon::current_num_threads())
    }
}

/// Snapshot of the threads and cores available to the aggregator
#[derive(Debug, Clone)]
pub struct ParallelInfo {
    pub pool_threads: usize,
    pub available_cores: usize,
}

/// Describe the current parallel environment
pub fn get_parallel_info() -> ParallelInfo {
    ParallelInfo {
        pool_threads: rayon::current_num_threads(),
        available_cores: num_cpus::get(),
    }
}

impl ParallelInfo {
    pub fn log_info(&self) {
        info!(
            "Thread pool: {} threads on {} CPU cores",
            self.pool_threads, self.available_cores
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_threads_rejected() {
        let result = ParallelConfig::new(Some(0)).setup_global_pool();
        assert!(matches!(result, Err(VoxStackError::ThreadPoolError(_))));
    }

    #[test]
    fn test_default_pool_reports_threads() {
        let config = ParallelConfig::default();
        assert!(config.num_threads.is_none());
        assert!(config.setup_global_pool().unwrap() > 0);
    }

    #[test]
    fn test_parallel_info() {
        let info = get_parallel_info();
        assert!(info.pool_threads > 0);
        assert!(info.available_cores > 0);
        info.log_info();
    }
}
