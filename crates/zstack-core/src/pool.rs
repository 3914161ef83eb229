use tracing::debug;

use crate::error::Result;

/// Where parallel stages run.
///
/// With `max_workers == 0` work goes to rayon's global pool; otherwise a
/// dedicated pool of that many threads caps concurrency regardless of how many
/// frames are in the stack.
pub struct WorkerPool {
    pool: Option<rayon::ThreadPool>,
}

impl WorkerPool {
    pub fn new(max_workers: usize) -> Result<Self> {
        if max_workers == 0 {
            return Ok(Self::global());
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(max_workers)
            .thread_name(|i| format!("zstack-worker-{i}"))
            .build()?;
        debug!(threads = max_workers, "Built dedicated worker pool");
        Ok(Self { pool: Some(pool) })
    }

    pub fn global() -> Self {
        Self { pool: None }
    }

    /// Run `op` inside the pool. Parallel iterators started by `op` use its
    /// threads, and the call returns only after all of them finish.
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    pub fn threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::global()
    }
}
