//! Bounded data-parallel task runner.
//!
//! Each task owns its input and writes only to its own output, so no locking
//! is needed while tasks run. [`run_tasks`] returns after every task has
//! finished, with results in input order.

use serde::{Deserialize, Serialize};

use crate::algs::cancel::CancelToken;
use crate::structure_error::StructureError;

/// Worker-pool configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelOptions {
    /// Run tasks on the rayon pool. Ignored without the `rayon` feature.
    pub enabled: bool,
    /// Upper bound on worker threads; `None` uses the global pool.
    pub max_threads: Option<usize>,
}

impl Default for ParallelOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            max_threads: None,
        }
    }
}

impl ParallelOptions {
    pub fn serial() -> Self {
        Self {
            enabled: false,
            max_threads: None,
        }
    }

    pub fn with_max_threads(mut self, n: usize) -> Self {
        self.max_threads = Some(n.max(1));
        self
    }
}

/// Runs `task` over every item and joins.
///
/// The cancel token is checked before each task starts. The first error
/// (including cancellation) is returned once all running tasks have stopped.
pub fn run_tasks<T, R, F>(
    options: &ParallelOptions,
    items: Vec<T>,
    cancel: &CancelToken,
    task: F,
) -> Result<Vec<R>, StructureError>
where
    T: Send,
    R: Send,
    F: Fn(T) -> Result<R, StructureError> + Send + Sync,
{
    let guarded = |item: T| {
        cancel.check()?;
        task(item)
    };

    #[cfg(feature = "rayon")]
    if options.enabled && items.len() > 1 {
        use rayon::prelude::*;
        let run = move || {
            items
                .into_par_iter()
                .map(guarded)
                .collect::<Result<Vec<R>, StructureError>>()
        };
        let result = match options.max_threads {
            Some(n) => match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
                Ok(pool) => pool.install(run),
                Err(e) => {
                    log::warn!("falling back to the global rayon pool: {e}");
                    run()
                }
            },
            None => run(),
        };
        if matches!(result, Err(StructureError::Cancelled)) {
            log::warn!("parallel tasks cancelled");
        }
        return result;
    }

    #[cfg(not(feature = "rayon"))]
    let _ = options;

    items.into_iter().map(guarded).collect()
}
